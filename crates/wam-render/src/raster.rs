//! Scene graph → PNG via tiny-skia.
//!
//! Draws the same markup interpretation as the SVG renderer, minus text
//! (no font rasterizer is bundled; labels only appear in SVG output).

use crate::frame::{Decoration, RenderOptions, marker_placement};
use kurbo::{Affine, BezPath, PathEl};
use thiserror::Error;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};
use wam_core::{AttrMap, AttrValue, Bounds, Entity, MarkupTag, Point, SceneGraph, TemplateRegistry};

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Render to PNG bytes at the viewport's surface size.
pub fn render_png(
    scene: &SceneGraph,
    registry: &TemplateRegistry,
    options: &RenderOptions,
) -> Result<Vec<u8>, RasterError> {
    let pixmap = render_pixmap(scene, registry, options)?;
    pixmap
        .encode_png()
        .map_err(|e| RasterError::Encode(e.to_string()))
}

/// Render to an RGBA pixmap at the viewport's surface size.
pub fn render_pixmap(
    scene: &SceneGraph,
    registry: &TemplateRegistry,
    options: &RenderOptions,
) -> Result<Pixmap, RasterError> {
    let vp = &options.viewport;
    let (width, height) = (vp.width().round() as u32, vp.height().round() as u32);
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return Err(RasterError::InvalidSize { width, height });
    };
    if let Some(bg) = parse_color(options.theme.background) {
        pixmap.fill(bg);
    }

    // device = scene * zoom + pan
    let zoom = vp.zoom() as f32;
    let transform = Transform::from_scale(zoom, zoom).post_translate(vp.pan().x as f32, vp.pan().y as f32);

    for entity in scene.entities() {
        draw_entity(&mut pixmap, scene, registry, entity, transform);
    }
    for decoration in &options.decorations {
        let theme = &options.theme;
        let (b, fill, stroke) = match decoration {
            Decoration::Overlay(b) | Decoration::ToolFrame(b) => (b, None, theme.overlay_stroke),
            Decoration::RubberBand(b) => (b, Some(theme.rubber_band_fill), theme.rubber_band_stroke),
            Decoration::Handle(h) => (&h.bounds, Some(theme.handle_fill), theme.handle_stroke),
        };
        draw_box(&mut pixmap, b, fill.and_then(parse_color), parse_color(stroke), 1.0, transform);
    }
    Ok(pixmap)
}

fn draw_entity(
    pixmap: &mut Pixmap,
    scene: &SceneGraph,
    registry: &TemplateRegistry,
    entity: &Entity,
    transform: Transform,
) {
    for part in registry.markup_for(entity) {
        let attrs = entity.attrs.get(&part.selector);
        let color = |name: &str| {
            attrs
                .and_then(|a| a.get(name))
                .and_then(AttrValue::as_str)
                .or_else(|| part.attributes.get(name).map(String::as_str))
                .and_then(parse_color)
        };
        let width = attrs
            .and_then(|a| a.get("strokeWidth"))
            .and_then(AttrValue::as_f64)
            .unwrap_or(1.0) as f32;

        match part.tag {
            MarkupTag::Rect => {
                if let Some(shape) = entity.shape() {
                    draw_box(pixmap, &shape.bounds(), color("fill"), color("stroke"), width, transform);
                }
            }
            MarkupTag::Text => {
                log::trace!("skipping text part of {} in raster output", entity.id);
            }
            MarkupTag::Path => {
                let Ok(points) = scene.link_points(entity.id) else { continue };
                let Some(stroke_color) = color("stroke") else { continue };
                draw_polyline(pixmap, &points, stroke_color, width, transform);
                if let Some(marker) = attrs.and_then(|a| a.get("targetMarker")).and_then(AttrValue::as_map) {
                    draw_marker(pixmap, marker, &points, stroke_color, transform);
                }
            }
        }
    }
}

fn draw_box(
    pixmap: &mut Pixmap,
    b: &Bounds,
    fill: Option<Color>,
    stroke: Option<Color>,
    width: f32,
    transform: Transform,
) {
    let Some(rect) = Rect::from_xywh(b.x as f32, b.y as f32, b.width as f32, b.height as f32) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let mut paint = Paint::default();
    paint.anti_alias = true;
    if let Some(fill) = fill {
        paint.set_color(fill);
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }
    if let Some(stroke) = stroke {
        paint.set_color(stroke);
        let style = Stroke {
            width,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &paint, &style, transform, None);
    }
}

fn draw_polyline(pixmap: &mut Pixmap, points: &[Point], color: Color, width: f32, transform: Transform) {
    let [first, rest @ ..] = points else { return };
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    let Some(path) = pb.finish() else { return };
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    let style = Stroke {
        width,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &style, transform, None);
}

fn draw_marker(pixmap: &mut Pixmap, marker: &AttrMap, points: &[Point], line: Color, transform: Transform) {
    let Some(d) = marker.get("d").and_then(AttrValue::as_str) else { return };
    let Some((tip, angle)) = marker_placement(points) else { return };
    let Ok(shape) = BezPath::from_svg(d) else {
        log::debug!("unparseable marker path {d:?}");
        return;
    };
    let placed = Affine::translate((tip.x, tip.y)) * Affine::rotate(angle) * shape;

    let mut pb = PathBuilder::new();
    for el in placed.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(a, p) => pb.quad_to(a.x as f32, a.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(a, b, p) => pb.cubic_to(
                a.x as f32, a.y as f32, b.x as f32, b.y as f32, p.x as f32, p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    let Some(path) = pb.finish() else { return };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    let fill = match marker.get("fill").and_then(AttrValue::as_str) {
        Some(f) => parse_color(f),
        None => Some(line),
    };
    if let Some(fill) = fill {
        paint.set_color(fill);
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }
    paint.set_color(line);
    pixmap.stroke_path(&path, &paint, &Stroke::default(), transform, None);
}

/// `#RGB`, `#RRGGBB` or `#RRGGBBAA`. `none`, `transparent` and anything
/// unrecognized yield `None` (nothing is painted).
pub fn parse_color(s: &str) -> Option<Color> {
    let hex = s.trim().strip_prefix('#')?;
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let nibble = |i: usize| {
        let v = u8::from_str_radix(hex.get(i..i + 1)?, 16).ok()?;
        Some(v * 17)
    };
    let (r, g, b, a) = match hex.len() {
        3 => (nibble(0)?, nibble(1)?, nibble(2)?, 255),
        6 => (byte(0)?, byte(2)?, byte(4)?, 255),
        8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
        _ => return None,
    };
    Some(Color::from_rgba8(r, g, b, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::Viewport;
    use wam_core::{LinkEnd, ShapeFactory};

    fn options(w: f64, h: f64) -> RenderOptions {
        RenderOptions {
            viewport: Viewport::new(w, h),
            ..Default::default()
        }
    }

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
        let c = pixmap.pixel(x, y).unwrap();
        (c.red(), c.green(), c.blue())
    }

    #[test]
    fn colors() {
        assert_eq!(parse_color("#000"), Some(Color::from_rgba8(0, 0, 0, 255)));
        assert_eq!(parse_color("#E9ECEF"), Some(Color::from_rgba8(0xE9, 0xEC, 0xEF, 255)));
        assert_eq!(parse_color("#1E88E533").map(|c| c.alpha() < 0.25), Some(true));
        assert_eq!(parse_color("transparent"), None);
        assert_eq!(parse_color("#12"), None);
    }

    #[test]
    fn shape_fill_lands_in_pixels() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let node = factory.create_node_at("DataProvider", Point::new(10.0, 10.0)).unwrap();
        scene.add_entity(node).unwrap();

        let pixmap = render_pixmap(&scene, factory.registry(), &options(200.0, 120.0)).unwrap();
        // Inside the box: info fill #D1ECF1. Outside: white background.
        assert_eq!(pixel(&pixmap, 60, 50), (0xD1, 0xEC, 0xF1));
        assert_eq!(pixel(&pixmap, 190, 110), (255, 255, 255));
    }

    #[test]
    fn links_and_png_encoding() {
        let factory = ShapeFactory::default();
        let mut scene = SceneGraph::new();
        let link = factory
            .create_edge_between(
                "TrustRelationship",
                LinkEnd::Point(Point::new(10.0, 50.0)),
                LinkEnd::Point(Point::new(190.0, 50.0)),
            )
            .unwrap();
        scene.add_entity(link).unwrap();

        let pixmap = render_pixmap(&scene, factory.registry(), &options(200.0, 100.0)).unwrap();
        assert_eq!(pixel(&pixmap, 100, 50), (0, 0, 0));

        let png = render_png(&scene, factory.registry(), &options(200.0, 100.0)).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn zero_sized_surface_is_an_error() {
        let scene = SceneGraph::new();
        let err = render_png(&scene, &TemplateRegistry::builtin(), &options(0.0, 10.0)).unwrap_err();
        assert!(matches!(err, RasterError::InvalidSize { width: 0, height: 10 }));
    }
}
