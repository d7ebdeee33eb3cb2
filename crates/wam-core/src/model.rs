//! Entity data model.
//!
//! An entity is either a shape (a sized box) or a link (a polyline between
//! two ends). Both carry presentation attributes keyed by markup selector and
//! a structured `CellData` record. Parent/child embedding is not stored on
//! the entity; the scene graph owns it.

use crate::error::FactoryError;
use crate::geometry::{Bounds, Point, Size};
use crate::id::EntityId;
use crate::property::CellData;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ─── Type tags ───────────────────────────────────────────────────────────

/// The closed set of shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Application,
    Service,
    SecurityRealm,
    IdentityProvider,
    ProcessUnit,
    DataProvider,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Application,
        ShapeKind::Service,
        ShapeKind::SecurityRealm,
        ShapeKind::IdentityProvider,
        ShapeKind::ProcessUnit,
        ShapeKind::DataProvider,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "Application",
            Self::Service => "Service",
            Self::SecurityRealm => "SecurityRealm",
            Self::IdentityProvider => "IdentityProvider",
            Self::ProcessUnit => "ProcessUnit",
            Self::DataProvider => "DataProvider",
        }
    }

    /// Whether shapes of this kind accept embedded children.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::SecurityRealm)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = FactoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| FactoryError::UnknownType(s.to_string()))
    }
}

/// The closed set of link kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    Invocation,
    LegacyRelationship,
    TrustRelationship,
}

impl LinkKind {
    pub const ALL: [LinkKind; 3] = [
        LinkKind::Invocation,
        LinkKind::LegacyRelationship,
        LinkKind::TrustRelationship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invocation => "Invocation",
            Self::LegacyRelationship => "LegacyRelationship",
            Self::TrustRelationship => "TrustRelationship",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkKind {
    type Err = FactoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| FactoryError::UnknownType(s.to_string()))
    }
}

// ─── Presentation ────────────────────────────────────────────────────────

/// A presentation attribute value (`fill`, `strokeWidth`, `targetMarker`, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Nested(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, AttrValue>> {
        match self {
            Self::Nested(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Style properties of one markup part.
pub type AttrMap = BTreeMap<String, AttrValue>;

/// Presentation attributes keyed by markup selector (`body`, `label`, `line`, …).
pub type Attrs = BTreeMap<String, AttrMap>;

/// Look up `attrs[selector][name]`.
pub fn attr<'a>(attrs: &'a Attrs, selector: &str, name: &str) -> Option<&'a AttrValue> {
    attrs.get(selector).and_then(|m| m.get(name))
}

/// Overwrite `dst` with every property present in `src`, selector by selector.
pub fn merge_attrs(dst: &mut Attrs, src: &Attrs) {
    for (selector, props) in src {
        let slot = dst.entry(selector.clone()).or_default();
        for (name, value) in props {
            slot.insert(name.clone(), value.clone());
        }
    }
}

/// One element of a data-defined shape descriptor: a drawable primitive and
/// the selector its attributes are looked up under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupPart {
    pub tag: MarkupTag,
    pub selector: String,
    /// Fixed attributes from the template, applied before `Attrs`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Primitive kinds the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupTag {
    Rect,
    Text,
    Path,
}

// ─── Geometry bodies ─────────────────────────────────────────────────────

/// Geometric state of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeBody {
    pub kind: ShapeKind,
    pub position: Point,
    pub size: Size,
}

impl ShapeBody {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_origin_size(self.position, self.size)
    }
}

/// One end of a link: attached to an entity, or pinned to a scene point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkEnd {
    Entity(EntityId),
    Point(Point),
}

impl LinkEnd {
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(*id),
            Self::Point(_) => None,
        }
    }
}

/// Geometric state of a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkBody {
    pub kind: LinkKind,
    pub source: LinkEnd,
    pub target: LinkEnd,
    #[serde(default)]
    pub vertices: SmallVec<[Point; 4]>,
}

impl LinkBody {
    /// Translate every free-floating part of the link: vertices and pinned ends.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.map_points(|p| p.translate(dx, dy));
    }

    /// Apply `f` to the vertices and pinned ends. Entity ends follow their
    /// entity and are left alone.
    pub fn map_points(&mut self, f: impl Fn(Point) -> Point) {
        for v in &mut self.vertices {
            *v = f(*v);
        }
        for end in [&mut self.source, &mut self.target] {
            if let LinkEnd::Point(p) = end {
                *p = f(*p);
            }
        }
    }
}

/// Shape or link geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Shape(ShapeBody),
    Link(LinkBody),
}

// ─── Entity ──────────────────────────────────────────────────────────────

/// A single shape or link in the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub body: Body,
    #[serde(default)]
    pub attrs: Attrs,
    pub data: CellData,
}

impl Entity {
    pub fn is_shape(&self) -> bool {
        matches!(self.body, Body::Shape(_))
    }

    pub fn is_link(&self) -> bool {
        matches!(self.body, Body::Link(_))
    }

    pub fn shape(&self) -> Option<&ShapeBody> {
        match &self.body {
            Body::Shape(s) => Some(s),
            Body::Link(_) => None,
        }
    }

    pub fn shape_mut(&mut self) -> Option<&mut ShapeBody> {
        match &mut self.body {
            Body::Shape(s) => Some(s),
            Body::Link(_) => None,
        }
    }

    pub fn link(&self) -> Option<&LinkBody> {
        match &self.body {
            Body::Link(l) => Some(l),
            Body::Shape(_) => None,
        }
    }

    pub fn link_mut(&mut self) -> Option<&mut LinkBody> {
        match &mut self.body {
            Body::Link(l) => Some(l),
            Body::Shape(_) => None,
        }
    }

    /// The type tag as it appears in the template registry.
    pub fn type_tag(&self) -> &'static str {
        match &self.body {
            Body::Shape(s) => s.kind.as_str(),
            Body::Link(l) => l.kind.as_str(),
        }
    }

    pub fn is_container(&self) -> bool {
        self.shape().is_some_and(|s| s.kind.is_container())
    }

    /// Display text of the `label` part, if any.
    pub fn label(&self) -> Option<&str> {
        attr(&self.attrs, "label", "text").and_then(AttrValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_tags() {
        assert_eq!("SecurityRealm".parse::<ShapeKind>(), Ok(ShapeKind::SecurityRealm));
        assert_eq!("Invocation".parse::<LinkKind>(), Ok(LinkKind::Invocation));
        assert_eq!(
            "Gateway".parse::<ShapeKind>(),
            Err(FactoryError::UnknownType("Gateway".into()))
        );
    }

    #[test]
    fn only_realms_are_containers() {
        let containers: Vec<ShapeKind> =
            ShapeKind::ALL.into_iter().filter(ShapeKind::is_container).collect();
        assert_eq!(containers, vec![ShapeKind::SecurityRealm]);
    }

    #[test]
    fn link_translate_moves_vertices_and_pinned_ends() {
        let anchor = EntityId::intern("model_anchor");
        let mut link = LinkBody {
            kind: LinkKind::Invocation,
            source: LinkEnd::Entity(anchor),
            target: LinkEnd::Point(Point::new(10.0, 10.0)),
            vertices: smallvec::smallvec![Point::new(5.0, 0.0)],
        };
        link.translate(2.0, 3.0);
        assert_eq!(link.source, LinkEnd::Entity(anchor));
        assert_eq!(link.target, LinkEnd::Point(Point::new(12.0, 13.0)));
        assert_eq!(link.vertices[0], Point::new(7.0, 3.0));

        link.map_points(|p| p.scale_about(Point::ZERO, 2.0));
        assert_eq!(link.source, LinkEnd::Entity(anchor));
        assert_eq!(link.target, LinkEnd::Point(Point::new(24.0, 26.0)));
        assert_eq!(link.vertices[0], Point::new(14.0, 6.0));
    }

    #[test]
    fn attrs_merge_per_selector() {
        let mut dst = Attrs::new();
        dst.entry("body".into())
            .or_default()
            .insert("fill".into(), "#fff".into());
        let mut src = Attrs::new();
        src.entry("body".into())
            .or_default()
            .insert("stroke".into(), "#000".into());
        merge_attrs(&mut dst, &src);
        assert_eq!(attr(&dst, "body", "fill"), Some(&AttrValue::from("#fff")));
        assert_eq!(attr(&dst, "body", "stroke"), Some(&AttrValue::from("#000")));
    }
}
