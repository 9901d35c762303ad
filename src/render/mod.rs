//! Card rendering and PNG export
//!
//! Paints each suggestion as a 16:9 card, text included, and encodes it as a
//! 1280×720 PNG for download.

pub mod card;
pub mod color;
pub mod export;
pub mod text;

pub use card::{rasterize, CardLayout, CardPalette, CARD_HEIGHT, CARD_WIDTH};
pub use export::{to_data_url, PngExporter};
pub use text::FontChain;

use crate::models::{GenerationResponse, SuggestionItem};
use crate::Result;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Source-over compositing of `src` onto `dst`.
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = src.0[3] as u32;
    if alpha == 0 {
        return;
    }
    for c in 0..3 {
        let mixed = (src.0[c] as u32 * alpha + dst.0[c] as u32 * (255 - alpha)) / 255;
        dst.0[c] = mixed as u8;
    }
    dst.0[3] = (alpha + dst.0[3] as u32 * (255 - alpha) / 255).min(255) as u8;
}

/// A rasterized card ready to hand to the user.
pub struct RenderedCard {
    pub file_name: String,
    pub png: Vec<u8>,
}

/// Download name for a card.
pub fn file_name(item: &SuggestionItem) -> String {
    format!("thumbnail-{}.png", item.id)
}

pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn render_png(item: &SuggestionItem) -> Result<RenderedCard> {
    Ok(RenderedCard {
        file_name: file_name(item),
        png: encode_png(&rasterize(item))?,
    })
}

/// Render every card in the batch, in order.
pub fn render_batch(response: &GenerationResponse) -> Result<Vec<RenderedCard>> {
    response.items.iter().map(render_png).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer;

    #[test]
    fn test_file_name_uses_item_id() {
        let batch = normalizer::normalize("nothing", "제목", "키워드").unwrap();
        assert_eq!(file_name(&batch.items[0]), "thumbnail-thumbnail-1.png");
    }

    #[test]
    fn test_render_batch_covers_every_item() {
        let batch = normalizer::normalize("nothing", "제목", "키워드").unwrap();
        let before = batch.clone();

        let cards = render_batch(&batch).unwrap();
        assert_eq!(cards.len(), batch.items.len());
        assert_eq!(batch, before);

        let decoded = image::load_from_memory(&cards[1].png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (CARD_WIDTH, CARD_HEIGHT));
        assert!(cards[1].png.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
    }
}
