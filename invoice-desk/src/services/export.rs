//! PNG export of the invoice preview.
//!
//! The preview is laid out on a fixed 600-unit-wide page as a list of draw
//! operations, then rasterized at `scale` pixels per unit. Text uses the 8x8
//! bitmap glyphs from `font8x8`, so no font files are needed at runtime.

use crate::models::{ExportedImage, InvoicePreview};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::io::Cursor;
use thiserror::Error;

pub const PAGE_WIDTH: f32 = 600.0;
const MARGIN: f32 = 30.0;
const GLYPH_CELLS: f32 = 8.0;
const MAX_SCALE: f32 = 8.0;
/// Tallest image the rasterizer will allocate, in device pixels.
pub const MAX_PIXEL_HEIGHT: u32 = 32_768;

const BODY: f32 = 1.25;
const SMALL: f32 = 1.0;
const TITLE: f32 = 2.5;
const ROW_HEIGHT: f32 = 20.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([33, 37, 41]);
const MUTED: Rgb<u8> = Rgb([108, 117, 125]);
const RULE: Rgb<u8> = Rgb([206, 212, 218]);
const BAND: Rgb<u8> = Rgb([233, 236, 239]);

// Right edges of the numeric columns.
const COL_SNO: f32 = MARGIN + 6.0;
const COL_ITEM: f32 = MARGIN + 46.0;
const COL_QTY: f32 = 350.0;
const COL_RATE: f32 = 440.0;
const COL_GST: f32 = 500.0;
const COL_AMOUNT: f32 = PAGE_WIDTH - MARGIN - 6.0;
const ITEM_NAME_CHARS: usize = 22;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid export scale {0}, expected a value in (0, 8]")]
    InvalidScale(f32),

    #[error("Failed to encode invoice image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Invoice image would be {0} pixels tall, the limit is {}", MAX_PIXEL_HEIGHT)]
    TooLarge(u32),

    #[error("Invoice export was interrupted: {0}")]
    Aborted(String),
}

/// Turns a preview into a downloadable image.
pub trait PreviewExporter: Send + Sync {
    fn export(&self, preview: &InvoicePreview) -> Result<ExportedImage, ExportError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb<u8>,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        color: Rgb<u8>,
        align: Align,
    },
}

/// Page layout in page units: draw operations plus the page height.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
    pub height: f32,
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * GLYPH_CELLS * size
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(2)).collect();
        format!("{}..", kept)
    }
}

struct LayoutBuilder {
    ops: Vec<DrawOp>,
    y: f32,
}

impl LayoutBuilder {
    fn text(&mut self, x: f32, text: impl Into<String>, size: f32, color: Rgb<u8>, align: Align) {
        self.ops.push(DrawOp::Text {
            x,
            y: self.y,
            text: text.into(),
            size,
            color,
            align,
        });
    }

    fn rule(&mut self) {
        self.ops.push(DrawOp::Rect {
            x: MARGIN,
            y: self.y,
            w: PAGE_WIDTH - 2.0 * MARGIN,
            h: 1.0,
            color: RULE,
        });
    }

    fn advance(&mut self, by: f32) {
        self.y += by;
    }
}

/// Lay the preview out top to bottom: header, metadata, item table, totals, footer.
pub fn layout(preview: &InvoicePreview) -> PageLayout {
    let mut page = LayoutBuilder {
        ops: Vec::new(),
        y: MARGIN,
    };
    let right = PAGE_WIDTH - MARGIN;

    page.text(MARGIN, preview.brand.as_str(), TITLE, INK, Align::Left);
    page.text(right, "TAX INVOICE", BODY, MUTED, Align::Right);
    page.advance(28.0);
    page.text(MARGIN, format!("GSTIN: {}", preview.tax_id), SMALL, MUTED, Align::Left);
    page.advance(14.0);
    for line in &preview.address {
        page.text(MARGIN, line.as_str(), SMALL, MUTED, Align::Left);
        page.advance(12.0);
    }
    if let Some(phone) = &preview.phone {
        page.text(MARGIN, format!("Phone: {}", phone), SMALL, MUTED, Align::Left);
        page.advance(12.0);
    }

    page.advance(8.0);
    page.rule();
    page.advance(14.0);

    page.text(MARGIN, format!("Bill to: {}", preview.customer_name), BODY, INK, Align::Left);
    page.text(
        right,
        format!("Invoice No: {}", preview.invoice_number),
        BODY,
        INK,
        Align::Right,
    );
    page.advance(18.0);
    page.text(MARGIN, format!("Mobile: {}", preview.customer_mobile), BODY, INK, Align::Left);
    page.text(right, format!("Date: {}", preview.date), BODY, INK, Align::Right);
    page.advance(24.0);

    page.ops.push(DrawOp::Rect {
        x: MARGIN,
        y: page.y - 5.0,
        w: PAGE_WIDTH - 2.0 * MARGIN,
        h: ROW_HEIGHT,
        color: BAND,
    });
    page.text(COL_SNO, "#", BODY, INK, Align::Left);
    page.text(COL_ITEM, "Item", BODY, INK, Align::Left);
    page.text(COL_QTY, "Qty", BODY, INK, Align::Right);
    page.text(COL_RATE, "Rate", BODY, INK, Align::Right);
    page.text(COL_GST, "GST", BODY, INK, Align::Right);
    page.text(COL_AMOUNT, "Amount", BODY, INK, Align::Right);
    page.advance(ROW_HEIGHT + 4.0);

    for row in &preview.rows {
        page.text(COL_SNO, row.sno.to_string(), BODY, INK, Align::Left);
        page.text(COL_ITEM, truncate(&row.name, ITEM_NAME_CHARS), BODY, INK, Align::Left);
        page.text(COL_QTY, row.quantity.as_str(), BODY, INK, Align::Right);
        page.text(COL_RATE, row.rate.as_str(), BODY, INK, Align::Right);
        page.text(COL_GST, row.gst_percentage.as_str(), BODY, INK, Align::Right);
        page.text(COL_AMOUNT, row.amount.as_str(), BODY, INK, Align::Right);
        page.advance(ROW_HEIGHT);
    }

    page.rule();
    page.advance(12.0);

    for line in &preview.totals {
        let color = if line.emphasize { INK } else { MUTED };
        let size = if line.emphasize { BODY * 1.2 } else { BODY };
        page.text(COL_RATE, line.label.as_str(), size, color, Align::Right);
        page.text(COL_AMOUNT, line.amount.as_str(), size, color, Align::Right);
        page.advance(if line.emphasize { 24.0 } else { 18.0 });
    }

    page.advance(12.0);
    page.text(
        PAGE_WIDTH / 2.0,
        "Thank you for staying with us!",
        SMALL,
        MUTED,
        Align::Center,
    );
    page.advance(12.0 + MARGIN);

    PageLayout {
        ops: page.ops,
        height: page.y,
    }
}

struct Canvas {
    image: RgbImage,
    scale: f32,
}

impl Canvas {
    fn new(width: f32, height: f32, scale: f32) -> Self {
        let w = (width * scale).ceil() as u32;
        let h = (height * scale).ceil() as u32;
        Self {
            image: RgbImage::from_pixel(w.max(1), h.max(1), WHITE),
            scale,
        }
    }

    /// Fill a page-unit rectangle, snapping edges to device pixels.
    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb<u8>) {
        let x0 = (x * self.scale).round().max(0.0) as u32;
        let y0 = (y * self.scale).round().max(0.0) as u32;
        let x1 = (((x + w) * self.scale).round().max(0.0) as u32).min(self.image.width());
        let y1 = (((y + h) * self.scale).round().max(0.0) as u32).min(self.image.height());

        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    fn text(&mut self, x: f32, y: f32, text: &str, size: f32, color: Rgb<u8>, align: Align) {
        let start = match align {
            Align::Left => x,
            Align::Right => x - text_width(text, size),
            Align::Center => x - text_width(text, size) / 2.0,
        };

        for (index, c) in text.chars().enumerate() {
            let glyph = BASIC_FONTS
                .get(c)
                .or_else(|| LATIN_FONTS.get(c))
                .or_else(|| BASIC_FONTS.get('?'))
                .unwrap_or([0; 8]);
            let origin = start + index as f32 * GLYPH_CELLS * size;

            for (gy, bits) in glyph.iter().enumerate() {
                for gx in 0..8 {
                    if bits & (1u8 << gx) != 0 {
                        self.fill(
                            origin + gx as f32 * size,
                            y + gy as f32 * size,
                            size,
                            size,
                            color,
                        );
                    }
                }
            }
        }
    }

    fn draw(&mut self, op: &DrawOp) {
        match op {
            DrawOp::Rect { x, y, w, h, color } => self.fill(*x, *y, *w, *h, *color),
            DrawOp::Text {
                x,
                y,
                text,
                size,
                color,
                align,
            } => self.text(*x, *y, text, *size, *color, *align),
        }
    }
}

/// Rasterizes previews to PNG at a fixed supersampling factor.
#[derive(Debug, Clone)]
pub struct PngExporter {
    scale: f32,
}

impl PngExporter {
    pub fn new(scale: f32) -> Result<Self, ExportError> {
        if !scale.is_finite() || scale <= 0.0 || scale > MAX_SCALE {
            return Err(ExportError::InvalidScale(scale));
        }
        Ok(Self { scale })
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

impl PreviewExporter for PngExporter {
    fn export(&self, preview: &InvoicePreview) -> Result<ExportedImage, ExportError> {
        let page = layout(preview);
        let pixel_height = (page.height * self.scale).ceil() as u32;
        if pixel_height > MAX_PIXEL_HEIGHT {
            return Err(ExportError::TooLarge(pixel_height));
        }
        let mut canvas = Canvas::new(PAGE_WIDTH, page.height, self.scale);
        for op in &page.ops {
            canvas.draw(op);
        }

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(canvas.image).write_to(&mut buffer, ImageOutputFormat::Png)?;

        tracing::debug!(
            invoice_number = %preview.invoice_number,
            bytes = buffer.get_ref().len(),
            "Rasterized invoice preview"
        );

        Ok(ExportedImage {
            invoice_number: preview.invoice_number.clone(),
            file_name: preview.file_name(),
            png: buffer.into_inner(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusinessSettings;
    use crate::models::{InvoiceDraft, LineItem};
    use chrono::NaiveDate;
    use image::GenericImageView;
    use rust_decimal_macros::dec;

    fn preview(items: usize) -> InvoicePreview {
        let business = BusinessSettings {
            brand: "Hotel Sunrise".to_string(),
            tax_id: "29ABCDE1234F1Z5".to_string(),
            address: vec!["12 MG Road".to_string(), "Bengaluru".to_string()],
            phone: Some("+91 80 4000 1234".to_string()),
        };
        let mut draft = InvoiceDraft::default();
        draft.set_customer_name("Asha Rao");
        draft.set_customer_mobile("9876543210");
        draft.items = (0..items)
            .map(|i| LineItem::new(format!("Room night {}", i + 1), dec!(1), dec!(2500), dec!(12)))
            .collect();

        InvoicePreview::render(
            &business,
            &draft,
            "INV-1043",
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        )
    }

    #[test]
    fn rejects_unusable_scales() {
        assert!(matches!(PngExporter::new(0.0), Err(ExportError::InvalidScale(_))));
        assert!(matches!(PngExporter::new(f32::NAN), Err(ExportError::InvalidScale(_))));
        assert!(matches!(PngExporter::new(20.0), Err(ExportError::InvalidScale(_))));
        assert!(PngExporter::new(2.5).is_ok());
    }

    #[test]
    fn layout_grows_with_rows() {
        let short = layout(&preview(1));
        let long = layout(&preview(4));
        assert_eq!(long.height - short.height, 3.0 * ROW_HEIGHT);
    }

    #[test]
    fn oversized_pages_are_refused_before_allocation() {
        let exporter = PngExporter::new(MAX_SCALE).unwrap();
        let err = exporter.export(&preview(500)).unwrap_err();
        assert!(matches!(err, ExportError::TooLarge(h) if h > MAX_PIXEL_HEIGHT));
    }

    #[test]
    fn full_draft_fits_at_default_scale() {
        let page = layout(&preview(crate::models::MAX_ITEMS));
        assert!(((page.height * 2.5).ceil() as u32) <= MAX_PIXEL_HEIGHT);
    }

    #[test]
    fn long_item_names_are_truncated() {
        assert_eq!(truncate("Deluxe", 22), "Deluxe");
        assert_eq!(
            truncate("Presidential Suite with Sea View", 12),
            "Presidenti.."
        );
    }

    #[test]
    fn exports_supersampled_png() {
        let exporter = PngExporter::new(2.5).unwrap();
        let preview = preview(2);
        let page = layout(&preview);

        let exported = exporter.export(&preview).unwrap();
        assert_eq!(exported.file_name, "Hotel Sunrise-Invoice-INV-1043.png");
        assert_eq!(&exported.png[1..4], b"PNG");

        let decoded = image::load_from_memory(&exported.png).unwrap();
        assert_eq!(decoded.width(), (PAGE_WIDTH * 2.5).ceil() as u32);
        assert_eq!(decoded.height(), (page.height * 2.5).ceil() as u32);

        let rgb = decoded.to_rgb8();
        assert!(rgb.pixels().any(|p| *p == INK));
    }
}
