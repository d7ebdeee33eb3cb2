//! Scene graph → SVG document.
//!
//! Interprets each entity's markup parts with its presentation attributes:
//! `rect` parts cover the shape's box, `text` parts are centered in it, and
//! `path` parts follow a link's resolved polyline. A link's `targetMarker`
//! is drawn at the target end, rotated along the last segment.

use crate::frame::{Decoration, RenderOptions, kebab_case, marker_placement};
use crate::hit::Handle;
use std::fmt::Write;
use wam_core::{AttrMap, AttrValue, Bounds, Entity, MarkupPart, MarkupTag, SceneGraph, TemplateRegistry};

/// Render the scene through the options' viewport onto a surface of the
/// viewport's size.
pub fn render_svg(scene: &SceneGraph, registry: &TemplateRegistry, options: &RenderOptions) -> String {
    let vp = &options.viewport;
    let (w, h) = (vp.width(), vp.height());
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
    );
    svg.push_str("<style>\n  text { font-family: Inter, system-ui, sans-serif; }\n</style>\n");
    let _ = writeln!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        options.theme.background
    );
    let _ = writeln!(
        svg,
        "<g transform=\"matrix({z} 0 0 {z} {px} {py})\">",
        z = vp.zoom(),
        px = vp.pan().x,
        py = vp.pan().y
    );

    for entity in scene.entities() {
        render_entity(&mut svg, scene, registry, entity, options);
    }
    for decoration in &options.decorations {
        render_decoration(&mut svg, decoration, options);
    }

    svg.push_str("</g>\n</svg>\n");
    svg
}

fn render_entity(
    out: &mut String,
    scene: &SceneGraph,
    registry: &TemplateRegistry,
    entity: &Entity,
    options: &RenderOptions,
) {
    let _ = writeln!(
        out,
        "<g data-id=\"{}\" data-type=\"{}\">",
        escape(entity.id.as_str()),
        entity.type_tag()
    );
    for part in registry.markup_for(entity) {
        let attrs = entity.attrs.get(&part.selector);
        match part.tag {
            MarkupTag::Rect => {
                let Some(shape) = entity.shape() else { continue };
                let b = shape.bounds();
                let _ = write!(
                    out,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
                    b.x, b.y, b.width, b.height
                );
                write_attributes(out, part, attrs);
                out.push_str("/>\n");
            }
            MarkupTag::Text => {
                let Some(text) = attrs.and_then(|a| a.get("text")).and_then(AttrValue::as_str) else {
                    continue;
                };
                let Ok(b) = scene.bounds_of(entity.id) else { continue };
                let c = b.center();
                let _ = write!(
                    out,
                    "<text x=\"{}\" y=\"{}\" dominant-baseline=\"middle\"",
                    c.x, c.y
                );
                if attrs.is_none_or(|a| !a.contains_key("fill")) {
                    let _ = write!(out, " fill=\"{}\"", options.theme.text);
                }
                write_attributes(out, part, attrs);
                let _ = writeln!(out, ">{}</text>", escape(text));
            }
            MarkupTag::Path => {
                let Ok(points) = scene.link_points(entity.id) else { continue };
                if points.len() < 2 {
                    continue;
                }
                let d: Vec<String> = points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("{} {} {}", if i == 0 { "M" } else { "L" }, p.x, p.y))
                    .collect();
                let _ = write!(out, "<path d=\"{}\"", d.join(" "));
                write_attributes(out, part, attrs);
                out.push_str("/>\n");

                if let Some(marker) = attrs.and_then(|a| a.get("targetMarker")).and_then(AttrValue::as_map)
                    && let Some((tip, angle)) = marker_placement(&points)
                {
                    render_marker(out, marker, attrs, tip, angle.to_degrees());
                }
            }
        }
    }
    out.push_str("</g>\n");
}

fn render_marker(
    out: &mut String,
    marker: &AttrMap,
    line: Option<&AttrMap>,
    tip: wam_core::Point,
    degrees: f64,
) {
    let Some(d) = marker.get("d").and_then(AttrValue::as_str) else {
        return;
    };
    let stroke = line
        .and_then(|l| l.get("stroke"))
        .and_then(AttrValue::as_str)
        .unwrap_or("#000000");
    let fill = marker.get("fill").and_then(AttrValue::as_str).unwrap_or(stroke);
    let _ = writeln!(
        out,
        "<path d=\"{}\" fill=\"{}\" stroke=\"{}\" transform=\"translate({} {}) rotate({})\"/>",
        escape(d),
        escape(fill),
        escape(stroke),
        tip.x,
        tip.y,
        degrees
    );
}

/// Template attributes first, then presentation attributes. Nested maps and
/// the `text`/`targetMarker` keys are handled by the caller.
fn write_attributes(out: &mut String, part: &MarkupPart, attrs: Option<&AttrMap>) {
    for (name, value) in &part.attributes {
        if attrs.is_some_and(|a| a.contains_key(name)) {
            continue;
        }
        let _ = write!(out, " {}=\"{}\"", kebab_case(name), escape(value));
    }
    let Some(attrs) = attrs else { return };
    for (name, value) in attrs.iter().filter(|(name, _)| *name != "text") {
        let rendered = match value {
            AttrValue::Text(s) => escape(s),
            AttrValue::Number(n) => n.to_string(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Nested(_) => continue,
        };
        let _ = write!(out, " {}=\"{}\"", kebab_case(name), rendered);
    }
}

fn render_decoration(out: &mut String, decoration: &Decoration, options: &RenderOptions) {
    let theme = &options.theme;
    match decoration {
        Decoration::Overlay(b) => {
            write_box(out, b, "none", theme.overlay_stroke, Some("6 4"));
        }
        Decoration::RubberBand(b) => {
            write_box(out, b, theme.rubber_band_fill, theme.rubber_band_stroke, None);
        }
        Decoration::ToolFrame(b) => {
            write_box(out, b, "none", theme.overlay_stroke, Some("2 2"));
        }
        Decoration::Handle(Handle { bounds, .. }) => {
            write_box(out, bounds, theme.handle_fill, theme.handle_stroke, None);
        }
    }
}

fn write_box(out: &mut String, b: &Bounds, fill: &str, stroke: &str, dash: Option<&str>) {
    let _ = write!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{fill}\" stroke=\"{stroke}\"",
        b.x, b.y, b.width, b.height
    );
    if let Some(dash) = dash {
        let _ = write!(out, " stroke-dasharray=\"{dash}\"");
    }
    out.push_str(" pointer-events=\"none\"/>\n");
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
