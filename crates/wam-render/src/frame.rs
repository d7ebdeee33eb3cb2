//! What a render pass draws besides the scene: theme colors, the viewport
//! transform and editor decorations (overlay, rubber band, handles).

use crate::hit::Handle;
use crate::viewport::Viewport;
use wam_core::{Bounds, Point};

/// Theme-dependent colors for the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasTheme {
    pub background: &'static str,
    pub text: &'static str,
    pub overlay_stroke: &'static str,
    pub handle_fill: &'static str,
    pub handle_stroke: &'static str,
    pub rubber_band_fill: &'static str,
    pub rubber_band_stroke: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            background: "#FFFFFF",
            text: "#333333",
            overlay_stroke: "#1E88E5",
            handle_fill: "#FFFFFF",
            handle_stroke: "#1E88E5",
            rubber_band_fill: "#1E88E533",
            rubber_band_stroke: "#1E88E5",
        }
    }

    pub fn dark() -> Self {
        Self {
            background: "#1C1C1E",
            text: "#F2F2F7",
            overlay_stroke: "#64B5F6",
            handle_fill: "#2C2C2E",
            handle_stroke: "#64B5F6",
            rubber_band_fill: "#64B5F633",
            rubber_band_stroke: "#64B5F6",
        }
    }
}

impl Default for CanvasTheme {
    fn default() -> Self {
        Self::light()
    }
}

/// Editor chrome drawn above the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoration {
    /// Multi-selection overlay box.
    Overlay(Bounds),
    /// Rubber-band rectangle in progress.
    RubberBand(Bounds),
    /// Outline around the entity that has tools attached.
    ToolFrame(Bounds),
    Handle(Handle),
}

/// Everything a renderer needs besides the scene graph.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: CanvasTheme,
    pub viewport: Viewport,
    pub decorations: Vec<Decoration>,
}

/// Where to draw a link's target marker: the target point and the angle
/// (radians) pointing from the target back along the last segment.
pub fn marker_placement(points: &[Point]) -> Option<(Point, f64)> {
    let [.., prev, tip] = points else {
        return None;
    };
    Some((*tip, (prev.y - tip.y).atan2(prev.x - tip.x)))
}

/// `strokeWidth` → `stroke-width`.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_points_back_along_last_segment() {
        let pts = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let (tip, angle) = marker_placement(&pts).unwrap();
        assert_eq!(tip, Point::new(100.0, 0.0));
        assert!((angle - std::f64::consts::PI).abs() < 1e-9);
        assert!(marker_placement(&pts[..1]).is_none());
    }

    #[test]
    fn attribute_names() {
        assert_eq!(kebab_case("strokeWidth"), "stroke-width");
        assert_eq!(kebab_case("fill"), "fill");
    }
}
