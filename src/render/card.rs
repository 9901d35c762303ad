//! 16:9 card layout and rasterization.
//!
//! Mirrors the on-screen card: the title in the text color over a drop
//! shadow, the subtitle in the accent color on a translucent pill, a view
//! count badge and a play badge.

use super::blend;
use super::color::{parse_color, parse_paint, Paint};
use super::text::FontChain;
use crate::models::SuggestionItem;
use image::{Rgba, RgbaImage};

pub const CARD_WIDTH: u32 = 1280;
pub const CARD_HEIGHT: u32 = 720;

const FALLBACK_BACKGROUND: Rgba<u8> = Rgba([0x1f, 0x29, 0x37, 255]);
const FALLBACK_TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FALLBACK_ACCENT: Rgba<u8> = Rgba([0xff, 0x6b, 0x6b, 255]);
const TITLE_SHADOW: Rgba<u8> = Rgba([0, 0, 0, 204]);
const SUBTITLE_SHADOW: Rgba<u8> = Rgba([0, 0, 0, 153]);
const PLAY_BADGE: Rgba<u8> = Rgba([0xdc, 0x26, 0x26, 255]);
const VIEW_BADGE: Rgba<u8> = Rgba([0, 0, 0, 179]);
/// Alpha of the subtitle pill, filled with the text color.
const PILL_ALPHA: u8 = 0x20;

const MARGIN: u32 = 32;
const TITLE_SIZE: f32 = 88.0;
const TITLE_MIN_SIZE: f32 = 56.0;
const TITLE_FIT_LINES: usize = 2;
const TITLE_MAX_LINES: usize = 4;
const TITLE_LINE_HEIGHT: f32 = 1.15;
const TITLE_SHADOW_OFFSET: f32 = 5.0;
const SUBTITLE_SIZE: f32 = 44.0;
const SUBTITLE_SHADOW_OFFSET: f32 = 3.0;
const PILL_PAD_X: u32 = 28;
const PILL_PAD_Y: u32 = 10;
const GAP: u32 = 24;
const VIEW_TEXT: &str = "조회수 1.2만회";
const VIEW_SIZE: f32 = 28.0;
const BADGE_PAD: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    fn centered(width: u32, height: u32, y: u32) -> Self {
        let width = width.min(CARD_WIDTH);
        Self {
            x: (CARD_WIDTH - width) / 2,
            y,
            width,
            height,
        }
    }
}

/// Resolved colors for one card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardPalette {
    pub background: Paint,
    pub text: Rgba<u8>,
    pub accent: Rgba<u8>,
}

impl CardPalette {
    pub fn from_item(item: &SuggestionItem) -> Self {
        let background = parse_paint(&item.background).unwrap_or_else(|| {
            tracing::warn!(id = %item.id, background = %item.background, "Unrecognized background, using default");
            Paint::Solid(FALLBACK_BACKGROUND)
        });
        let text = parse_color(&item.text_color).unwrap_or_else(|| {
            tracing::warn!(id = %item.id, color = %item.text_color, "Unrecognized text color, using default");
            FALLBACK_TEXT
        });
        let accent = parse_color(&item.accent_color).unwrap_or_else(|| {
            tracing::warn!(id = %item.id, color = %item.accent_color, "Unrecognized accent color, using default");
            FALLBACK_ACCENT
        });

        Self {
            background,
            text,
            accent,
        }
    }
}

/// Text and geometry of the card's elements on the 1280×720 canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub title_lines: Vec<String>,
    pub title_size: f32,
    pub title_line_height: u32,
    /// Bounding box of the title block.
    pub title: Rect,
    pub subtitle_text: Option<String>,
    /// The subtitle pill.
    pub subtitle: Option<Rect>,
    pub play_badge: Rect,
    pub view_badge: Rect,
}

fn fit_title(fonts: &FontChain, title: &str, max_width: f32) -> (f32, Vec<String>) {
    let mut size = TITLE_SIZE;
    let mut lines = fonts.wrap(title, size, max_width);
    while lines.len() > TITLE_FIT_LINES && size > TITLE_MIN_SIZE {
        size -= 8.0;
        lines = fonts.wrap(title, size, max_width);
    }
    lines.truncate(TITLE_MAX_LINES);
    (size, lines)
}

impl CardLayout {
    pub fn for_item(item: &SuggestionItem) -> Self {
        Self::with_fonts(item, FontChain::global())
    }

    pub fn with_fonts(item: &SuggestionItem, fonts: &FontChain) -> Self {
        let max_width = CARD_WIDTH - MARGIN * 4;
        let (title_size, title_lines) = fit_title(fonts, item.title.trim(), max_width as f32);
        let title_line_height = (title_size * TITLE_LINE_HEIGHT).round() as u32;
        let title_width = title_lines
            .iter()
            .map(|line| fonts.measure(line, title_size))
            .fold(0.0, f32::max)
            .ceil() as u32;
        let title_height = title_line_height * title_lines.len().max(1) as u32;

        let subtitle_text = item
            .subtitle
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let pill_height = (SUBTITLE_SIZE * 1.25).round() as u32 + PILL_PAD_Y * 2;
        let pill_width = subtitle_text.as_deref().map(|text| {
            (fonts.measure(text, SUBTITLE_SIZE).ceil() as u32 + PILL_PAD_X * 2)
                .min(CARD_WIDTH - MARGIN * 2)
        });

        let block_height = match pill_width {
            Some(_) => title_height + GAP + pill_height,
            None => title_height,
        };
        let top = CARD_HEIGHT.saturating_sub(block_height) / 2;
        let view_width = fonts.measure(VIEW_TEXT, VIEW_SIZE).ceil() as u32 + BADGE_PAD * 2;

        Self {
            title_lines,
            title_size,
            title_line_height,
            title: Rect::centered(title_width.min(max_width), title_height, top),
            subtitle_text,
            subtitle: pill_width
                .map(|width| Rect::centered(width, pill_height, top + title_height + GAP)),
            play_badge: Rect {
                x: CARD_WIDTH - MARGIN - 96,
                y: CARD_HEIGHT - MARGIN - 64,
                width: 96,
                height: 64,
            },
            view_badge: Rect {
                x: MARGIN,
                y: CARD_HEIGHT - MARGIN - 48,
                width: view_width,
                height: 48,
            },
        }
    }
}

fn inside_rounded(rect: Rect, radius: u32, x: u32, y: u32) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    let radius = radius
        .min((rect.width - 1) / 2)
        .min((rect.height - 1) / 2) as i64;
    let (x, y) = (x as i64, y as i64);
    let (left, top) = (rect.x as i64, rect.y as i64);
    let (right, bottom) = (left + rect.width as i64 - 1, top + rect.height as i64 - 1);

    let cx = x.clamp(left + radius, right - radius);
    let cy = y.clamp(top + radius, bottom - radius);
    let (dx, dy) = (x - cx, y - cy);
    dx * dx + dy * dy <= radius * radius
}

fn fill_rounded_rect(canvas: &mut RgbaImage, rect: Rect, radius: u32, color: Rgba<u8>) {
    let x_end = (rect.x + rect.width).min(canvas.width());
    let y_end = (rect.y + rect.height).min(canvas.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            if inside_rounded(rect, radius, x, y) {
                blend(canvas.get_pixel_mut(x, y), color);
            }
        }
    }
}

fn fill_play_triangle(canvas: &mut RgbaImage, badge: Rect, color: Rgba<u8>) {
    // Right-pointing triangle centered in the badge.
    let size = badge.height / 2;
    let left = badge.x + (badge.width - size) / 2 + 4;
    let top = badge.y + (badge.height - size) / 2;
    let half = size as f32 / 2.0;

    for y in top..top + size {
        let from_mid = (y as f32 + 0.5 - top as f32 - half).abs();
        let reach = ((half - from_mid) / half * size as f32).max(0.0) as u32;
        for x in left..left + reach {
            blend(canvas.get_pixel_mut(x, y), color);
        }
    }
}

/// Paint one card onto a fresh 1280×720 canvas. The item is only read.
pub fn rasterize(item: &SuggestionItem) -> RgbaImage {
    rasterize_with(item, FontChain::global())
}

pub fn rasterize_with(item: &SuggestionItem, fonts: &FontChain) -> RgbaImage {
    let palette = CardPalette::from_item(item);
    let layout = CardLayout::with_fonts(item, fonts);
    let shader = palette.background.shader(CARD_WIDTH, CARD_HEIGHT);

    let mut canvas = RgbaImage::from_fn(CARD_WIDTH, CARD_HEIGHT, |x, y| {
        let mut pixel = Rgba([255, 255, 255, 255]);
        blend(&mut pixel, shader.sample(x, y));
        pixel
    });

    for (index, line) in layout.title_lines.iter().enumerate() {
        let size = layout.title_size;
        let x = (CARD_WIDTH as f32 - fonts.measure(line, size)) / 2.0;
        let y = (layout.title.y + index as u32 * layout.title_line_height) as f32;
        let shadow = TITLE_SHADOW_OFFSET;
        fonts.draw(&mut canvas, line, size, x + shadow, y + shadow, TITLE_SHADOW);
        fonts.draw(&mut canvas, line, size, x, y, palette.text);
    }

    if let (Some(pill), Some(text)) = (layout.subtitle, layout.subtitle_text.as_deref()) {
        let mut pill_fill = palette.text;
        pill_fill.0[3] = PILL_ALPHA;
        fill_rounded_rect(&mut canvas, pill, pill.height / 2, pill_fill);

        let x = (pill.x + PILL_PAD_X) as f32;
        let y = (pill.y + PILL_PAD_Y) as f32;
        let shadow = SUBTITLE_SHADOW_OFFSET;
        fonts.draw(&mut canvas, text, SUBTITLE_SIZE, x + shadow, y + shadow, SUBTITLE_SHADOW);
        fonts.draw(&mut canvas, text, SUBTITLE_SIZE, x, y, palette.accent);
    }

    let badge = layout.view_badge;
    fill_rounded_rect(&mut canvas, badge, 8, VIEW_BADGE);
    fonts.draw(
        &mut canvas,
        VIEW_TEXT,
        VIEW_SIZE,
        (badge.x + BADGE_PAD) as f32,
        badge.y as f32 + (badge.height as f32 - VIEW_SIZE * 1.2) / 2.0,
        Rgba([255, 255, 255, 255]),
    );

    fill_rounded_rect(&mut canvas, layout.play_badge, 10, PLAY_BADGE);
    fill_play_triangle(&mut canvas, layout.play_badge, Rgba([255, 255, 255, 255]));

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(background: &str, subtitle: Option<&str>) -> SuggestionItem {
        SuggestionItem {
            id: "thumbnail-1".to_string(),
            title: "대박 실화냐".to_string(),
            subtitle: subtitle.map(str::to_string),
            background: background.to_string(),
            text_color: "#ffffff".to_string(),
            accent_color: "#00ff88".to_string(),
            visual_elements: None,
            emotion: None,
            click_bait: None,
        }
    }

    fn titled(title: &str) -> SuggestionItem {
        SuggestionItem {
            title: title.to_string(),
            ..item("#000000", Some("99% 몰랐던 비밀"))
        }
    }

    fn count_in(canvas: &RgbaImage, rect: Rect, color: Rgba<u8>) -> usize {
        (rect.y..rect.y + rect.height)
            .flat_map(|y| (rect.x..rect.x + rect.width).map(move |x| (x, y)))
            .filter(|&(x, y)| *canvas.get_pixel(x, y) == color)
            .count()
    }

    #[test]
    fn test_rasterize_dimensions_and_background() {
        let canvas = rasterize(&item("#ff1744", None));
        assert_eq!(canvas.dimensions(), (CARD_WIDTH, CARD_HEIGHT));
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([0xff, 0x17, 0x44, 255]));
        assert_eq!(*canvas.get_pixel(CARD_WIDTH - 1, 0), Rgba([0xff, 0x17, 0x44, 255]));
    }

    #[test]
    fn test_rasterize_gradient_corners_differ() {
        let canvas = rasterize(&item(
            "linear-gradient(45deg, #667eea 0%, #764ba2 100%)",
            None,
        ));
        assert_ne!(
            canvas.get_pixel(0, CARD_HEIGHT - 1),
            canvas.get_pixel(CARD_WIDTH - 1, 0)
        );
    }

    #[test]
    fn test_title_glyphs_use_text_color() {
        let fonts = FontChain::bundled();
        let item = titled("BIG NEWS");
        let layout = CardLayout::with_fonts(&item, &fonts);
        let canvas = rasterize_with(&item, &fonts);

        assert_eq!(layout.title_lines, vec!["BIG NEWS"]);
        assert!(count_in(&canvas, layout.title, Rgba([255, 255, 255, 255])) > 500);
    }

    #[test]
    fn test_subtitle_glyphs_use_accent_color() {
        let fonts = FontChain::bundled();
        let item = titled("SALE");
        let layout = CardLayout::with_fonts(&item, &fonts);
        let canvas = rasterize_with(&item, &fonts);

        let pill = layout.subtitle.unwrap();
        assert!(count_in(&canvas, pill, Rgba([0x00, 0xff, 0x88, 255])) > 100);
    }

    #[test]
    fn test_different_titles_produce_different_pixels() {
        for (a, b) in [("충격! 조회수", "대박 실화냐!"), ("BIG NEWS", "HOT TAKE")] {
            let first = rasterize(&titled(a));
            let second = rasterize(&titled(b));
            assert_ne!(first.into_raw(), second.into_raw(), "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_long_title_wraps_inside_margins() {
        let fonts = FontChain::bundled();
        let item = titled("How to grow your channel views with one simple trick nobody tells you");
        let layout = CardLayout::with_fonts(&item, &fonts);

        assert!(layout.title_lines.len() > 1);
        assert!(layout.title_size < TITLE_SIZE);
        assert!(layout.title.width <= CARD_WIDTH - MARGIN * 4);
        assert!(layout.title.x >= MARGIN);
    }

    #[test]
    fn test_layout_subtitle_below_title() {
        let layout = CardLayout::for_item(&item("#000", Some("99% 몰랐던 비밀")));
        let subtitle = layout.subtitle.unwrap();
        assert!(subtitle.y >= layout.title.y + layout.title.height);
        assert!(subtitle.x + subtitle.width <= CARD_WIDTH);
        assert_eq!(layout.subtitle_text.as_deref(), Some("99% 몰랐던 비밀"));

        let without = CardLayout::for_item(&item("#000", Some("   ")));
        assert!(without.subtitle.is_none());
        assert!(without.subtitle_text.is_none());
    }

    #[test]
    fn test_unknown_background_uses_default() {
        let canvas = rasterize(&item("a dramatic sunset photo", None));
        assert_eq!(*canvas.get_pixel(0, 0), FALLBACK_BACKGROUND);
    }

    #[test]
    fn test_rasterize_does_not_change_item() {
        let original = item("#123456", Some("sub"));
        let copy = original.clone();
        rasterize(&original);
        assert_eq!(original, copy);
    }
}
