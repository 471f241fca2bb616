//! Overlay rendering using tiny-skia
//!
//! Paints the reference frame, every committed zone and the unfinished sketch
//! onto an RgbaImage at media resolution. Display scaling is the viewer's job.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;
use tiny_skia::{FillRule, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use super::geometry::{self, marker};
use crate::config::{AppConfig, ShapeColor};
use crate::domain::{MediaDimensions, Point, ToolKind, Zone};

/// Colors and fixed widths used by the overlay
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub zone_color: ShapeColor,
    pub marker_color: ShapeColor,
    pub sketch_color: ShapeColor,
    pub sketch_thickness: f32,
}

impl From<&AppConfig> for OverlayStyle {
    fn from(config: &AppConfig) -> Self {
        Self {
            zone_color: config.zone_color,
            marker_color: config.marker_color,
            sketch_color: config.sketch_color,
            sketch_thickness: config.sketch_thickness,
        }
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Everything the overlay is a function of
#[derive(Clone, Copy, Debug)]
pub struct OverlayScene<'a> {
    pub frame: Option<&'a RgbaImage>,
    pub dims: MediaDimensions,
    pub zones: &'a [Zone],
    pub sketch: &'a [Point],
}

fn paint(color: ShapeColor) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Build a path through `points`, optionally closed back to the first one
fn build_polyline_path(points: &[Point], close: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;

    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

/// Copy an RgbaImage into a (premultiplied) Pixmap
fn image_to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let mut data = img.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a < 255 {
            for c in &mut px[..3] {
                *c = (*c as u16 * a / 255) as u8;
            }
        }
    }
    Pixmap::from_vec(data, size)
}

fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

/// Draw committed zones: outline, plus a direction marker for lines
fn draw_zones(pixmap: &mut Pixmap, zones: &[Zone], dims: MediaDimensions, style: &OverlayStyle) {
    let outline = paint(style.zone_color);
    let fill = paint(style.marker_color);
    let stroke = Stroke {
        width: geometry::zone_stroke_width(dims.width),
        ..Default::default()
    };

    for zone in zones {
        if let Some(path) = build_polyline_path(&zone.points, zone.kind.is_closed()) {
            pixmap.stroke_path(&path, &outline, &stroke, Transform::identity(), None);
        }

        if zone.kind == ToolKind::Line
            && let Some((start, end)) = geometry::line_endpoints(&zone.points)
        {
            let triangle = marker::triangle(start, end, dims.height as f32);
            if let Some(path) = build_polyline_path(&triangle, true) {
                pixmap.fill_path(&path, &fill, FillRule::Winding, Transform::identity(), None);
            }
        }
    }
}

/// Draw the unfinished shape as an open polyline, whatever the tool
fn draw_sketch(pixmap: &mut Pixmap, sketch: &[Point], style: &OverlayStyle) {
    let Some(path) = build_polyline_path(sketch, false) else {
        return;
    };
    let stroke = Stroke {
        width: style.sketch_thickness,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint(style.sketch_color), &stroke, Transform::identity(), None);
}

/// Render the overlay for a scene
///
/// The canvas is exactly `scene.dims`; the frame is drawn unscaled at the
/// origin. Rendering never touches the scene, so equal scenes give equal
/// pixels.
pub fn render_overlay(scene: &OverlayScene<'_>, style: &OverlayStyle) -> Result<RgbaImage> {
    let MediaDimensions { width, height } = scene.dims;
    let mut pixmap = Pixmap::new(width, height)
        .with_context(|| format!("Cannot create a {}x{} canvas", width, height))?;

    if let Some(frame) = scene.frame {
        let src = image_to_pixmap(frame).context("Reference frame has no pixels")?;
        pixmap.draw_pixmap(
            0,
            0,
            src.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    draw_zones(&mut pixmap, scene.zones, scene.dims, style);
    draw_sketch(&mut pixmap, scene.sketch, style);

    log::debug!(
        "Rendered overlay {}x{}: {} zones, {} sketch points",
        width,
        height,
        scene.zones.len(),
        scene.sketch.len()
    );
    Ok(pixmap_to_image(&pixmap))
}

/// Save a rendered overlay (format from the file extension)
pub fn save_overlay(img: &RgbaImage, path: &Path) -> Result<()> {
    img.save(path)
        .with_context(|| format!("Failed to save overlay: {}", path.display()))
}
