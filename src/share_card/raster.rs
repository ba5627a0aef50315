use std::io::Cursor;
use std::path::Path;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use tracing::{debug, instrument};

use crate::error::RenderError;
use crate::model::ShareCardSpec;
use crate::share_card::layout::{layout_card, CardLayout, Line, TextMeasure};

pub const FOOTER_TEXT: &str = "hyrox-roast-generator.vercel.app";

const FOOTER_SIZE: f32 = 16.0;
const FOOTER_MARGIN: f32 = 10.0;
const SHADOW_OFFSET: f32 = 2.0;

const GRADIENT_START: Rgba<u8> = Rgba([0x1F, 0x29, 0x37, 0xFF]);
const GRADIENT_END: Rgba<u8> = Rgba([0x11, 0x18, 0x27, 0xFF]);
const BANNER: Rgba<u8> = Rgba([0xFF, 0xD7, 0x00, 0xFF]);
const WHITE: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const BLACK: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);

/// Regular and bold faces used on a card.
#[derive(Clone)]
pub struct CardFonts {
    regular: FontArc,
    bold: FontArc,
}

impl CardFonts {
    /// Use `bold` for title and banner, or the regular face if there is none.
    pub fn new(regular: FontArc, bold: Option<FontArc>) -> Self {
        let bold = bold.unwrap_or_else(|| regular.clone());
        Self { regular, bold }
    }

    fn face(&self, bold: bool) -> &FontArc {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }
}

impl TextMeasure for CardFonts {
    fn text_width(&self, text: &str, size: f32, bold: bool) -> f32 {
        let font = self.face(bold).as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = font.glyph_id(c);
            if let Some(previous) = previous {
                width += font.kern(previous, id);
            }
            width += font.h_advance(id);
            previous = Some(id);
        }
        width
    }

    fn text_height(&self, size: f32, bold: bool) -> f32 {
        let font = self.face(bold).as_scaled(PxScale::from(size));
        font.ascent() - font.descent()
    }
}

/// Draws share cards as PNG images.
///
/// Holds the decoded fonts and background; one instance serves every render.
#[derive(Clone)]
pub struct ShareCardRenderer {
    fonts: CardFonts,
    background: Option<RgbaImage>,
}

impl ShareCardRenderer {
    pub fn new(fonts: CardFonts) -> Self {
        Self {
            fonts,
            background: None,
        }
    }

    /// Load fonts and an optional background picture from disk.
    pub fn from_paths(
        font: &Path,
        bold_font: Option<&Path>,
        background: Option<&Path>,
    ) -> Result<Self, RenderError> {
        let regular = load_font(font)?;
        let bold = bold_font.map(load_font).transpose()?;
        let mut renderer = Self::new(CardFonts::new(regular, bold));
        if let Some(path) = background {
            let bytes = read(path)?;
            renderer = renderer.with_background(image::load_from_memory(&bytes)?.to_rgba8());
        }
        Ok(renderer)
    }

    pub fn with_background(mut self, background: RgbaImage) -> Self {
        self.background = Some(background);
        self
    }

    /// Render `spec` and encode it as PNG.
    #[instrument(skip_all, fields(format = %spec.format))]
    pub fn render_png(&self, spec: &ShareCardSpec) -> Result<Vec<u8>, RenderError> {
        let canvas = self.draw(spec);
        let mut png = Cursor::new(Vec::new());
        canvas.write_to(&mut png, ImageFormat::Png)?;
        debug!(bytes = png.get_ref().len(), "encoded share card");
        Ok(png.into_inner())
    }

    pub fn draw(&self, spec: &ShareCardSpec) -> RgbaImage {
        let layout = layout_card(&self.fonts, spec);
        let (width, height) = (layout.metrics.width, layout.metrics.height);

        let mut canvas = match &self.background {
            Some(background) if background.width() > 0 && background.height() > 0 => {
                let mut canvas = cover(background, width, height);
                darken(&mut canvas, 0.5);
                canvas
            }
            _ => gradient(width, height, GRADIENT_START, GRADIENT_END),
        };

        self.draw_content(&mut canvas, &layout);
        canvas
    }

    fn draw_content(&self, canvas: &mut RgbaImage, layout: &CardLayout) {
        let metrics = &layout.metrics;
        let center = metrics.width as f32 / 2.0;

        let title_baseline = layout.title_top + self.ascent(metrics.title_size, true);
        self.draw_shadowed(canvas, &layout.title, metrics.title_size, true, center, title_baseline);

        fill_rows(canvas, layout.banner_top, metrics.banner_height, BANNER);
        let banner_baseline = layout.banner_top
            + metrics.banner_height / 2.0
            + self.middle_offset(metrics.banner_font_size, true);
        self.draw_centered(
            canvas,
            &layout.banner_text,
            metrics.banner_font_size,
            true,
            center,
            banner_baseline,
            BLACK,
            1.0,
        );

        let ascent = self.ascent(layout.font_size, false);
        let mut top = layout.text_top;
        for line in &layout.lines {
            match line {
                Line::Text(text) => {
                    self.draw_shadowed(canvas, text, layout.font_size, false, center, top + ascent);
                    top += layout.line_height();
                }
                Line::ParagraphBreak => top += layout.paragraph_gap(),
            }
        }

        let footer_baseline = metrics.height as f32 - FOOTER_MARGIN + self.descent(FOOTER_SIZE);
        self.draw_centered(canvas, FOOTER_TEXT, FOOTER_SIZE, false, center, footer_baseline, WHITE, 0.6);
    }

    fn draw_shadowed(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        bold: bool,
        center: f32,
        baseline: f32,
    ) {
        self.draw_centered(
            canvas,
            text,
            size,
            bold,
            center + SHADOW_OFFSET,
            baseline + SHADOW_OFFSET,
            BLACK,
            0.8,
        );
        self.draw_centered(canvas, text, size, bold, center, baseline, WHITE, 1.0);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_centered(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        bold: bool,
        center: f32,
        baseline: f32,
        color: Rgba<u8>,
        opacity: f32,
    ) {
        let font = self.fonts.face(bold);
        let scaled = font.as_scaled(PxScale::from(size));
        let mut x = center - self.fonts.text_width(text, size, bold) / 2.0;
        let mut previous = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                x += scaled.kern(previous, id);
            }
            let glyph = id.with_scale_and_position(size, point(x, baseline));
            x += scaled.h_advance(id);
            previous = Some(id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                blend(
                    canvas,
                    bounds.min.x as i64 + gx as i64,
                    bounds.min.y as i64 + gy as i64,
                    color,
                    coverage * opacity,
                );
            });
        }
    }

    fn ascent(&self, size: f32, bold: bool) -> f32 {
        self.fonts.face(bold).as_scaled(PxScale::from(size)).ascent()
    }

    fn descent(&self, size: f32) -> f32 {
        self.fonts.face(false).as_scaled(PxScale::from(size)).descent()
    }

    /// Baseline offset that puts the glyph box's middle on a given y.
    fn middle_offset(&self, size: f32, bold: bool) -> f32 {
        let font = self.fonts.face(bold).as_scaled(PxScale::from(size));
        (font.ascent() + font.descent()) / 2.0
    }
}

fn load_font(path: &Path) -> Result<FontArc, RenderError> {
    FontArc::try_from_vec(read(path)?).map_err(|_| RenderError::InvalidFont {
        path: path.display().to_string(),
    })
}

fn read(path: &Path) -> Result<Vec<u8>, RenderError> {
    std::fs::read(path).map_err(|source| RenderError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Crop `image` to the canvas aspect ratio around its center, then scale
/// the crop to exactly `width`x`height`. Never allocates more than the
/// canvas, whatever the source shape.
pub(crate) fn cover(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (source_width, source_height) = image.dimensions();
    let canvas_aspect = width as f64 / height as f64;
    let (crop_width, crop_height) =
        if source_width as f64 / source_height as f64 > canvas_aspect {
            let crop = (source_height as f64 * canvas_aspect).round() as u32;
            (crop.clamp(1, source_width), source_height)
        } else {
            let crop = (source_width as f64 / canvas_aspect).round() as u32;
            (source_width, crop.clamp(1, source_height))
        };
    let cropped = imageops::crop_imm(
        image,
        (source_width - crop_width) / 2,
        (source_height - crop_height) / 2,
        crop_width,
        crop_height,
    )
    .to_image();
    imageops::resize(&cropped, width, height, FilterType::Triangle)
}

/// Diagonal gradient from the top-left to the bottom-right corner.
pub(crate) fn gradient(width: u32, height: u32, start: Rgba<u8>, end: Rgba<u8>) -> RgbaImage {
    let (w, h) = (width as f32, height as f32);
    let length = w * w + h * h;
    RgbaImage::from_fn(width, height, |x, y| {
        let t = ((x as f32 * w + y as f32 * h) / length).clamp(0.0, 1.0);
        let channel = |i: usize| (start[i] as f32 + (end[i] as f32 - start[i] as f32) * t).round() as u8;
        Rgba([channel(0), channel(1), channel(2), 0xFF])
    })
}

/// Lay black at `opacity` over the whole canvas.
pub(crate) fn darken(canvas: &mut RgbaImage, opacity: f32) {
    for pixel in canvas.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = (*channel as f32 * (1.0 - opacity)).round() as u8;
        }
        pixel.0[3] = 0xFF;
    }
}

fn fill_rows(canvas: &mut RgbaImage, top: f32, height: f32, color: Rgba<u8>) {
    let first = top.round().max(0.0) as u32;
    let last = ((top + height).round().max(0.0) as u32).min(canvas.height());
    for y in first..last {
        for x in 0..canvas.width() {
            canvas.put_pixel(x, y, color);
        }
    }
}

fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        let mixed = pixel[i] as f32 * (1.0 - alpha) + color[i] as f32 * alpha;
        pixel[i] = mixed.round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShareFormat;

    #[test]
    fn test_gradient_corners() {
        let image = gradient(1080, 1080, GRADIENT_START, GRADIENT_END);
        assert_eq!(*image.get_pixel(0, 0), GRADIENT_START);
        let corner = image.get_pixel(1079, 1079);
        assert!(corner.0.iter().zip(GRADIENT_END.0).all(|(a, b)| a.abs_diff(b) <= 1));
    }

    #[test]
    fn test_cover_fills_canvas() {
        let wide = RgbaImage::from_pixel(400, 100, Rgba([10, 20, 30, 255]));
        let covered = cover(&wide, 108, 192);
        assert_eq!(covered.dimensions(), (108, 192));
        assert_eq!(*covered.get_pixel(54, 96), Rgba([10, 20, 30, 255]));

        let tall = RgbaImage::from_pixel(50, 500, Rgba([1, 2, 3, 255]));
        assert_eq!(cover(&tall, 108, 108).dimensions(), (108, 108));
    }

    #[test]
    fn test_cover_crops_extreme_shapes_before_scaling() {
        let sliver = RgbaImage::from_pixel(1, 10_000, Rgba([9, 9, 9, 255]));
        let covered = cover(&sliver, 1080, 1920);
        assert_eq!(covered.dimensions(), (1080, 1920));
        assert_eq!(*covered.get_pixel(540, 960), Rgba([9, 9, 9, 255]));

        let strip = RgbaImage::from_pixel(10_000, 1, Rgba([7, 7, 7, 255]));
        assert_eq!(cover(&strip, 1080, 1080).dimensions(), (1080, 1080));
    }

    #[test]
    fn test_cover_keeps_the_center() {
        // left third red, middle third green, right third blue
        let stripes = RgbaImage::from_fn(300, 100, |x, _| match x / 100 {
            0 => Rgba([255, 0, 0, 255]),
            1 => Rgba([0, 255, 0, 255]),
            _ => Rgba([0, 0, 255, 255]),
        });
        let covered = cover(&stripes, 50, 100);
        assert_eq!(*covered.get_pixel(25, 50), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_darken_halves_channels() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 255]));
        darken(&mut image, 0.5);
        assert_eq!(*image.get_pixel(1, 1), Rgba([100, 50, 25, 255]));
    }

    #[test]
    fn test_fill_rows_clips_to_canvas() {
        let mut image = RgbaImage::from_pixel(4, 4, BLACK);
        fill_rows(&mut image, 2.0, 10.0, BANNER);
        assert_eq!(*image.get_pixel(0, 1), BLACK);
        assert_eq!(*image.get_pixel(3, 3), BANNER);
    }

    #[test]
    fn test_blend_ignores_outside_pixels() {
        let mut image = RgbaImage::from_pixel(2, 2, BLACK);
        blend(&mut image, -1, 0, WHITE, 1.0);
        blend(&mut image, 2, 1, WHITE, 1.0);
        blend(&mut image, 1, 1, WHITE, 0.5);
        assert_eq!(*image.get_pixel(0, 0), BLACK);
        assert_eq!(*image.get_pixel(1, 1), Rgba([128, 128, 128, 255]));
    }

    fn fixture_font(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/fonts")
            .join(name)
    }

    fn renderer() -> ShareCardRenderer {
        ShareCardRenderer::from_paths(
            &fixture_font("DejaVuSans.ttf"),
            Some(&fixture_font("DejaVuSans-Bold.ttf")),
            None,
        )
        .unwrap()
    }

    fn card(format: ShareFormat, roast: &str) -> ShareCardSpec {
        ShareCardSpec {
            format,
            title: "SLED DOG MODE".to_string(),
            total_time: "1:27:43".to_string(),
            roast_text: roast.to_string(),
        }
    }

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_render_png_for_both_formats() {
        let renderer = renderer();
        for (format, size) in [
            (ShareFormat::Stories, (1080, 1920)),
            (ShareFormat::Square, (1080, 1080)),
        ] {
            let spec = card(format, "Seven minutes of wall balls?\n\nThe wall filed a complaint.");
            let png = renderer.render_png(&spec).unwrap();
            assert!(png.starts_with(PNG_SIGNATURE), "{format}");

            let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
            assert_eq!(decoded.dimensions(), size, "{format}");

            let layout = layout_card(&renderer.fonts, &spec);
            let banner_y = layout.banner_top.round() as u32 + 4;
            assert_eq!(*decoded.get_pixel(4, banner_y), BANNER, "{format}");
        }
    }

    #[test]
    fn test_draw_puts_text_on_the_card() {
        let renderer = renderer();
        let spec = card(ShareFormat::Stories, "You finished.");
        let layout = layout_card(&renderer.fonts, &spec);
        let canvas = renderer.draw(&spec);
        let background = gradient(1080, 1920, GRADIENT_START, GRADIENT_END);

        let white_in = |top: f32, bottom: f32| {
            (top.max(0.0) as u32..bottom.min(1920.0) as u32)
                .flat_map(|y| (0..1080).map(move |x| (x, y)))
                .filter(|&(x, y)| *canvas.get_pixel(x, y) == WHITE)
                .count()
        };
        assert!(white_in(layout.title_top, layout.banner_top) > 100, "title");
        assert!(white_in(layout.text_top, layout.text_top + layout.line_height()) > 50, "roast");

        let banner_row = layout.banner_top.round() as u32 + layout.metrics.banner_height as u32 / 2;
        let dark_on_banner = (0..1080)
            .filter(|&x| canvas.get_pixel(x, banner_row)[0] < 64)
            .collect::<Vec<_>>();
        assert!(!dark_on_banner.is_empty(), "banner text");
        let text_center = (dark_on_banner[0] + dark_on_banner[dark_on_banner.len() - 1]) / 2;
        assert!(text_center.abs_diff(540) < 40, "banner text centered at {text_center}");

        let footer_changed = (1880..1920)
            .flat_map(|y| (0..1080).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.get_pixel(x, y) != background.get_pixel(x, y))
            .count();
        assert!(footer_changed > 0, "footer");
    }

    #[test]
    fn test_real_font_lines_fit_the_card() {
        let renderer = renderer();
        let roast = "You rowed like the boat owed you money and lunged like the floor was lava. "
            .repeat(12);
        let layout = layout_card(&renderer.fonts, &card(ShareFormat::Square, &roast));
        assert!(layout.shrinks > 0);
        for line in &layout.lines {
            if let Line::Text(text) = line {
                let width = renderer.fonts.text_width(text, layout.font_size, false);
                assert!(width <= layout.metrics.max_text_width(), "{text:?} is {width}px");
            }
        }
    }

    #[test]
    fn test_background_replaces_gradient() {
        let renderer = renderer().with_background(RgbaImage::from_pixel(
            300,
            300,
            Rgba([200, 100, 50, 255]),
        ));
        let canvas = renderer.draw(&card(ShareFormat::Square, "Nice."));
        assert_eq!(*canvas.get_pixel(2, 2), Rgba([100, 50, 25, 255]));
    }

    #[test]
    fn test_missing_font_is_io_error() {
        let err = ShareCardRenderer::from_paths(Path::new("/nonexistent/font.ttf"), None, None)
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Io { .. }));
    }

    #[test]
    fn test_garbage_font_is_rejected() {
        let path = std::env::temp_dir().join("hyrox-roast-not-a-font.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        let err = ShareCardRenderer::from_paths(&path, None, None).err().unwrap();
        assert!(matches!(err, RenderError::InvalidFont { .. }));
        let _ = std::fs::remove_file(path);
    }
}
