//! # Raster Canvas
//!
//! Thin drawing layer over `image` / `imageproc`: thick lines, polygons,
//! anchored and rotated text, blitting and the "tight" crop applied before a
//! figure is saved. Sizes given in points are converted with the figure dpi.

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut, draw_text_mut, text_size};
use imageproc::point::Point;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);
pub const LIGHT_GRAY: Rgba<u8> = Rgba([211, 211, 211, 255]);

/// Serif fonts tried, in order, when no font is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif.ttf",
    "/usr/share/fonts/dejavu-serif-fonts/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSerif-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
    "/Library/Fonts/Times New Roman.ttf",
    "C:\\Windows\\Fonts\\times.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];

/// Loads the configured font, or the first available system serif font.
///
/// A configured font that cannot be loaded is an error; when nothing is
/// configured and no system font is found the figure is drawn without text.
pub fn load_font(configured: Option<&Path>) -> Result<Option<FontArc>> {
    if let Some(path) = configured {
        let data = fs::read(path)?;
        return Ok(Some(FontArc::try_from_vec(data)?));
    }
    for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
        if !candidate.is_file() {
            continue;
        }
        match fs::read(&candidate).map(FontArc::try_from_vec) {
            Ok(Ok(font)) => {
                debug!("Using font {}", candidate.display());
                return Ok(Some(font));
            }
            _ => debug!("Skipping unreadable font {}", candidate.display()),
        }
    }
    warn!("No usable font found, figure text will be omitted (set font_path in the configuration)");
    Ok(None)
}

/// Horizontal and vertical text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

pub struct Canvas {
    pub img: RgbaImage,
    pub dpi: f32,
    font: Option<FontArc>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, dpi: u32, font: Option<FontArc>) -> Self {
        Canvas {
            img: RgbaImage::from_pixel(width, height, WHITE),
            dpi: dpi as f32,
            font,
        }
    }

    pub fn width(&self) -> f32 {
        self.img.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.img.height() as f32
    }

    /// Points to pixels
    pub fn pt(&self, points: f32) -> f32 {
        points * self.dpi / 72.0
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Rendered size of `text` at `size_pt`, zero without a font
    pub fn text_size(&self, text: &str, size_pt: f32) -> (f32, f32) {
        match &self.font {
            Some(font) => {
                let (w, h) = text_size(PxScale::from(self.pt(size_pt)), font, text);
                (w as f32, h as f32)
            }
            None => (0.0, 0.0),
        }
    }

    pub fn text(&mut self, text: &str, x: f32, y: f32, size_pt: f32, h: HAlign, v: VAlign) {
        let scale = PxScale::from(self.pt(size_pt));
        let (w, ht) = self.text_size(text, size_pt);
        let Some(font) = &self.font else { return };
        let x0 = match h {
            HAlign::Left => x,
            HAlign::Center => x - w / 2.0,
            HAlign::Right => x - w,
        };
        let y0 = match v {
            VAlign::Top => y,
            VAlign::Middle => y - ht / 2.0,
            VAlign::Bottom => y - ht,
        };
        draw_text_mut(&mut self.img, BLACK, x0.round() as i32, y0.round() as i32, scale, font, text);
    }

    /// Text rotated 90° counter-clockwise, centered on `(x, y)`
    pub fn text_vertical(&mut self, text: &str, x: f32, y: f32, size_pt: f32) {
        let scale = PxScale::from(self.pt(size_pt));
        let (w, h) = self.text_size(text, size_pt);
        let Some(font) = &self.font else { return };
        let mut label = RgbaImage::from_pixel(w as u32 + 2, h as u32 + 2, Rgba([0, 0, 0, 0]));
        draw_text_mut(&mut label, BLACK, 1, 1, scale, font, text);
        let rotated = imageops::rotate270(&label);
        let x0 = (x - rotated.width() as f32 / 2.0).round() as i64;
        let y0 = (y - rotated.height() as f32 / 2.0).round() as i64;
        imageops::overlay(&mut self.img, &rotated, x0, y0);
    }

    /// Copies `layer` with its top-left corner at `(x, y)`
    pub fn blit(&mut self, layer: &RgbaImage, x: f32, y: f32) {
        imageops::overlay(&mut self.img, layer, x.round() as i64, y.round() as i64);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        fill_rect(&mut self.img, rect, color);
    }

    pub fn stroke_rect(&mut self, rect: Rect, width: f32, color: Rgba<u8>) {
        let corners = [
            (rect.x, rect.y),
            (rect.right(), rect.y),
            (rect.right(), rect.bottom()),
            (rect.x, rect.bottom()),
        ];
        for i in 0..4 {
            line(&mut self.img, corners[i], corners[(i + 1) % 4], width, color);
        }
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba<u8>) {
        line(&mut self.img, from, to, width, color);
    }

    /// Crops the figure to its non-white content plus `pad_pt` points on each side
    pub fn into_tight_image(self, pad_pt: f32) -> RgbaImage {
        let pad = self.pt(pad_pt).round() as u32;
        match content_bounds(&self.img) {
            Some((x0, y0, x1, y1)) => {
                let x0 = x0.saturating_sub(pad);
                let y0 = y0.saturating_sub(pad);
                let x1 = (x1 + pad).min(self.img.width() - 1);
                let y1 = (y1 + pad).min(self.img.height() - 1);
                imageops::crop_imm(&self.img, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
            }
            None => self.img,
        }
    }
}

/// Bounding box `(x0, y0, x1, y1)` of every non-white pixel
pub fn content_bounds(img: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in img.enumerate_pixels() {
        if *p == WHITE || p[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

pub fn fill_rect(img: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let x0 = rect.x.round().max(0.0) as u32;
    let y0 = rect.y.round().max(0.0) as u32;
    let x1 = (rect.right().round().max(0.0) as u32).min(img.width());
    let y1 = (rect.bottom().round().max(0.0) as u32).min(img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, color);
        }
    }
}

/// Line of the given pixel width; widths up to 1.5 px are drawn as hairlines
pub fn line(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba<u8>) {
    if width <= 1.5 {
        draw_line_segment_mut(img, from, to, color);
        return;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 0.5 {
        return;
    }
    let (nx, ny) = (-dy / len * width / 2.0, dx / len * width / 2.0);
    fill_polygon(
        img,
        &[
            (from.0 + nx, from.1 + ny),
            (to.0 + nx, to.1 + ny),
            (to.0 - nx, to.1 - ny),
            (from.0 - nx, from.1 - ny),
        ],
        color,
    );
}

pub fn polyline(img: &mut RgbaImage, points: &[(f32, f32)], width: f32, color: Rgba<u8>) {
    for pair in points.windows(2) {
        line(img, pair[0], pair[1], width, color);
    }
}

/// Filled polygon. Repeated vertices and the closing vertex are dropped;
/// polygons with fewer than three distinct vertices are ignored.
pub fn fill_polygon(img: &mut RgbaImage, points: &[(f32, f32)], color: Rgba<u8>) {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &(x, y) in points {
        let p = Point::new(x.round() as i32, y.round() as i32);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() >= 3 {
        draw_polygon_mut(img, &poly, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_to_pixels() {
        let canvas = Canvas::new(10, 10, 144, None);
        assert_eq!(canvas.pt(10.0), 20.0);
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut img = RgbaImage::from_pixel(10, 10, WHITE);
        fill_rect(&mut img, Rect { x: 8.0, y: -2.0, w: 5.0, h: 4.0 }, BLACK);
        assert_eq!(*img.get_pixel(9, 0), BLACK);
        assert_eq!(*img.get_pixel(9, 1), BLACK);
        assert_eq!(*img.get_pixel(9, 2), WHITE);
        assert_eq!(*img.get_pixel(7, 0), WHITE);
    }

    #[test]
    fn test_fill_polygon_ignores_degenerate_input() {
        let mut img = RgbaImage::from_pixel(10, 10, WHITE);
        fill_polygon(&mut img, &[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)], BLACK);
        fill_polygon(&mut img, &[(1.0, 1.0), (5.0, 1.0), (1.0, 1.0)], BLACK);
        fill_polygon(&mut img, &[], BLACK);

        // explicitly closed ring
        fill_polygon(&mut img, &[(1.0, 1.0), (8.0, 1.0), (8.0, 8.0), (1.0, 8.0), (1.0, 1.0)], BLACK);
        assert_eq!(*img.get_pixel(4, 4), BLACK);
        assert_eq!(*img.get_pixel(9, 9), WHITE);
    }

    #[test]
    fn test_thick_line() {
        let mut img = RgbaImage::from_pixel(20, 20, WHITE);
        line(&mut img, (2.0, 10.0), (18.0, 10.0), 4.0, BLACK);
        assert_eq!(*img.get_pixel(10, 9), BLACK);
        assert_eq!(*img.get_pixel(10, 11), BLACK);
        assert_eq!(*img.get_pixel(10, 15), WHITE);
    }

    #[test]
    fn test_tight_crop() {
        let mut canvas = Canvas::new(100, 100, 72, None);
        canvas.fill_rect(Rect { x: 40.0, y: 30.0, w: 10.0, h: 20.0 }, BLACK);
        let img = canvas.into_tight_image(2.0);
        assert_eq!(img.dimensions(), (14, 24));

        let blank = Canvas::new(30, 20, 72, None).into_tight_image(2.0);
        assert_eq!(blank.dimensions(), (30, 20));
    }

    #[test]
    fn test_text_without_font_is_a_no_op() {
        let mut canvas = Canvas::new(50, 20, 72, None);
        assert_eq!(canvas.text_size("abc", 10.0), (0.0, 0.0));
        canvas.text("abc", 5.0, 5.0, 10.0, HAlign::Left, VAlign::Top);
        canvas.text_vertical("abc", 25.0, 10.0, 10.0);
        assert!(content_bounds(&canvas.img).is_none());
    }
}
