//! Glyph rendering for card text.
//!
//! Text is drawn with a chain of fonts: a configured font file, then the first
//! CJK system font found in the usual install locations, then the bundled
//! DejaVu Sans Bold. Each character is drawn with the first font in the chain
//! that has a glyph for it, so Hangul and Latin mix on one line.

use super::blend;
use crate::{Error, Result};
use ab_glyph::{point, Font, FontArc, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::OnceLock;

const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Fonts with Hangul coverage, bold faces first.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/truetype/nanum/NanumGothicBold.ttf",
    "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
    "/System/Library/Fonts/AppleSDGothicNeo.ttc",
    "C:\\Windows\\Fonts\\malgunbd.ttf",
    "C:\\Windows\\Fonts\\malgun.ttf",
];

static FONTS: OnceLock<FontChain> = OnceLock::new();

/// Ordered fonts used to draw card text.
#[derive(Clone)]
pub struct FontChain {
    fonts: Vec<FontArc>,
}

impl FontChain {
    /// Only the bundled font.
    pub fn bundled() -> Self {
        let fonts = match FontArc::try_from_slice(BUNDLED_FONT) {
            Ok(font) => vec![font],
            Err(e) => {
                tracing::error!("Bundled font failed to load: {}", e);
                Vec::new()
            }
        };
        Self { fonts }
    }

    /// Read one font file. Collections (`.ttc`) use their first face.
    pub fn load(path: &Path) -> Result<FontArc> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec_and_index(data, 0)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(FontArc::new(font))
    }

    /// Build the chain: `configured`, then a system CJK font, then the bundled font.
    pub fn discover(configured: Option<&Path>) -> Self {
        let mut fonts = Vec::new();

        if let Some(path) = configured {
            match Self::load(path) {
                Ok(font) => fonts.push(font),
                Err(e) => tracing::warn!("Ignoring card font {}: {}", path.display(), e),
            }
        }

        let system = SYSTEM_FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .filter(|path| path.exists())
            .find_map(|path| match Self::load(path) {
                Ok(font) => {
                    tracing::info!("Using system font {} for card text", path.display());
                    Some(font)
                }
                Err(e) => {
                    tracing::debug!("Skipping system font {}: {}", path.display(), e);
                    None
                }
            });
        fonts.extend(system);

        fonts.extend(Self::bundled().fonts);
        Self { fonts }
    }

    /// Set the process-wide chain. Only the first call has an effect.
    pub fn install(configured: Option<&Path>) -> bool {
        let installed = FONTS.set(Self::discover(configured)).is_ok();
        if !installed {
            tracing::debug!("Card fonts already installed");
        }
        installed
    }

    /// The installed chain, discovered without a configured font if
    /// `install` was never called.
    pub fn global() -> &'static FontChain {
        FONTS.get_or_init(|| Self::discover(None))
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    fn font_for(&self, c: char) -> Option<&FontArc> {
        self.fonts
            .iter()
            .find(|font| font.glyph_id(c).0 != 0)
            .or_else(|| self.fonts.last())
    }

    /// Whether some font in the chain has a real glyph for `c`.
    pub fn covers(&self, c: char) -> bool {
        self.fonts.iter().any(|font| font.glyph_id(c).0 != 0)
    }

    /// Advance width of `text` at `size` pixels.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let scale = PxScale::from(size);
        text.chars()
            .filter_map(|c| {
                let font = self.font_for(c)?;
                Some(font.as_scaled(scale).h_advance(font.glyph_id(c)))
            })
            .sum()
    }

    /// Draw one line with its top edge at `y`. Returns the advance width.
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        x: f32,
        y: f32,
        color: Rgba<u8>,
    ) -> f32 {
        let Some(primary) = self.fonts.first() else {
            return 0.0;
        };
        let scale = PxScale::from(size);
        let baseline = y + primary.as_scaled(scale).ascent();
        let (width, height) = canvas.dimensions();
        let mut caret = x;

        for c in text.chars() {
            let Some(font) = self.font_for(c) else {
                continue;
            };
            let id = font.glyph_id(c);
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = bounds.min.x as i64 + gx as i64;
                    let py = bounds.min.y as i64 + gy as i64;
                    if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                        return;
                    }
                    let mut ink = color;
                    ink.0[3] = (color.0[3] as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
                    blend(canvas.get_pixel_mut(px as u32, py as u32), ink);
                });
            }

            caret += font.as_scaled(scale).h_advance(id);
        }

        caret - x
    }

    /// Greedy word wrap to `max_width`; words wider than a line are broken
    /// between characters.
    pub fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut line = String::new();

        for word in text.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if self.measure(&candidate, size) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            for c in word.chars() {
                line.push(c);
                if self.measure(&line, size) > max_width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::replace(&mut line, c.to_string()));
                }
            }
        }

        if !line.is_empty() {
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_bundled_font_covers_latin() {
        let fonts = FontChain::bundled();
        assert_eq!(fonts.len(), 1);
        assert!(fonts.covers('A'));
        assert!(fonts.covers('!'));
    }

    #[test]
    fn test_chain_always_ends_with_bundled_font() {
        let fonts = FontChain::discover(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!fonts.is_empty());
        assert!(fonts.covers('A'));
    }

    #[test]
    fn test_load_rejects_missing_and_garbage_files() {
        let err = FontChain::load(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not a font").unwrap();
        let err = FontChain::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_measure_grows_with_text() {
        let fonts = FontChain::bundled();
        let short = fonts.measure("Hi", 40.0);
        let long = fonts.measure("Hi there", 40.0);
        assert!(short > 0.0);
        assert!(long > short);
        assert!(fonts.measure("Hi", 80.0) > short);
    }

    #[test]
    fn test_draw_inks_pixels_in_color() {
        let fonts = FontChain::bundled();
        let mut canvas = RgbaImage::from_pixel(200, 80, Rgba([0, 0, 0, 255]));

        let advance = fonts.draw(&mut canvas, "HI", 48.0, 10.0, 10.0, Rgba([255, 0, 0, 255]));

        assert!(advance > 0.0);
        assert!(canvas.pixels().any(|p| p.0[0] == 255 && p.0[1] == 0));
        assert_eq!(*canvas.get_pixel(199, 79), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_wrap_respects_width() {
        let fonts = FontChain::bundled();
        let max = fonts.measure("Bigger", 40.0);
        let lines = fonts.wrap("Big views fast now", 40.0, max);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(fonts.measure(line, 40.0) <= max || line.chars().count() == 1);
        }
        assert_eq!(lines.join(" "), "Big views fast now");
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let fonts = FontChain::bundled();
        let max = fonts.measure("WWW", 40.0);
        let lines = fonts.wrap("WWWWWWW", 40.0, max);
        assert_eq!(lines, vec!["WWW", "WWW", "W"]);
    }
}
