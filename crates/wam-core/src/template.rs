//! Shape factory and the built-in template catalogue.
//!
//! Every shape and link kind has an immutable template: default size,
//! presentation attributes, markup (the data-defined drawing recipe the
//! renderer interprets) and a default `CellData` record. The factory stamps
//! out fresh entities from those templates.

use crate::error::FactoryError;
use crate::geometry::{Point, Size};
use crate::id::EntityId;
use crate::model::*;
use crate::property::{CellData, PropertyDescriptor};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_FILL: &str = "#E9ECEF";
pub const DEFAULT_STROKE: &str = "#000000";
pub const WARNING_FILL: &str = "#FFF3CD";
pub const INFO_FILL: &str = "#D1ECF1";

/// Template for a shape kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeTemplate {
    pub size: Size,
    pub attrs: Attrs,
    pub markup: Vec<MarkupPart>,
    pub data: CellData,
}

/// Template for a link kind.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTemplate {
    pub attrs: Attrs,
    pub markup: Vec<MarkupPart>,
    pub data: CellData,
}

/// Lookup table from kind to template. Configuration, not runtime state.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    shapes: HashMap<ShapeKind, ShapeTemplate>,
    links: HashMap<LinkKind, LinkTemplate>,
}

impl TemplateRegistry {
    /// An empty registry; every lookup fails with `UnknownType`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in catalogue covering every shape and link kind.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        for kind in ShapeKind::ALL {
            reg.insert_shape(kind, builtin_shape(kind));
        }
        for kind in LinkKind::ALL {
            reg.insert_link(kind, builtin_link(kind));
        }
        reg
    }

    pub fn insert_shape(&mut self, kind: ShapeKind, template: ShapeTemplate) {
        self.shapes.insert(kind, template);
    }

    pub fn insert_link(&mut self, kind: LinkKind, template: LinkTemplate) {
        self.links.insert(kind, template);
    }

    pub fn shape(&self, kind: ShapeKind) -> Option<&ShapeTemplate> {
        self.shapes.get(&kind)
    }

    pub fn link(&self, kind: LinkKind) -> Option<&LinkTemplate> {
        self.links.get(&kind)
    }

    /// Markup for an entity's kind, empty if unregistered.
    pub fn markup_for(&self, entity: &Entity) -> &[MarkupPart] {
        match &entity.body {
            Body::Shape(s) => self.shape(s.kind).map(|t| t.markup.as_slice()),
            Body::Link(l) => self.link(l.kind).map(|t| t.markup.as_slice()),
        }
        .unwrap_or_default()
    }
}

/// Creates entities from templates.
#[derive(Debug, Clone)]
pub struct ShapeFactory {
    registry: TemplateRegistry,
}

impl Default for ShapeFactory {
    fn default() -> Self {
        Self::new(TemplateRegistry::builtin())
    }
}

impl ShapeFactory {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Create a shape at the origin.
    ///
    /// # Errors
    /// `UnknownType` if `tag` names no registered shape kind.
    pub fn create_node(&self, tag: &str) -> Result<Entity, FactoryError> {
        self.create_node_at(tag, Point::ZERO)
    }

    /// Create a shape whose top-left corner sits at `position`.
    pub fn create_node_at(&self, tag: &str, position: Point) -> Result<Entity, FactoryError> {
        let kind: ShapeKind = tag.parse()?;
        let template = self
            .registry
            .shape(kind)
            .ok_or_else(|| FactoryError::UnknownType(tag.to_string()))?;
        Ok(Entity {
            id: EntityId::with_prefix(&id_prefix(kind.as_str())),
            body: Body::Shape(ShapeBody {
                kind,
                position,
                size: template.size,
            }),
            attrs: template.attrs.clone(),
            data: template.data.clone(),
        })
    }

    /// Create a free-floating link from (0,0) to (100,0).
    ///
    /// # Errors
    /// `UnknownType` if `tag` names no registered link kind.
    pub fn create_edge(&self, tag: &str) -> Result<Entity, FactoryError> {
        self.create_edge_between(
            tag,
            LinkEnd::Point(Point::ZERO),
            LinkEnd::Point(Point::new(100.0, 0.0)),
        )
    }

    /// Create a link between two ends.
    pub fn create_edge_between(
        &self,
        tag: &str,
        source: LinkEnd,
        target: LinkEnd,
    ) -> Result<Entity, FactoryError> {
        let kind: LinkKind = tag.parse()?;
        let template = self
            .registry
            .link(kind)
            .ok_or_else(|| FactoryError::UnknownType(tag.to_string()))?;
        Ok(Entity {
            id: EntityId::with_prefix(&id_prefix(kind.as_str())),
            body: Body::Link(LinkBody {
                kind,
                source,
                target,
                vertices: SmallVec::new(),
            }),
            attrs: template.attrs.clone(),
            data: template.data.clone(),
        })
    }

    /// The template's default record for an entity's kind.
    pub fn default_data(&self, entity: &Entity) -> Option<&CellData> {
        match &entity.body {
            Body::Shape(s) => self.registry.shape(s.kind).map(|t| &t.data),
            Body::Link(l) => self.registry.link(l.kind).map(|t| &t.data),
        }
    }
}

/// `SecurityRealm` → `security_realm`.
pub(crate) fn id_prefix(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len() + 4);
    for (i, c) in tag.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// ─── Built-in catalogue ──────────────────────────────────────────────────

fn attr_map<const N: usize>(pairs: [(&str, AttrValue); N]) -> AttrMap {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn markup(tag: MarkupTag, selector: &str, attributes: &[(&str, &str)]) -> MarkupPart {
    MarkupPart {
        tag,
        selector: selector.to_string(),
        attributes: attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn builtin_shape(kind: ShapeKind) -> ShapeTemplate {
    let (size, fill) = match kind {
        ShapeKind::ProcessUnit => (Size::new(100.0, 60.0), WARNING_FILL),
        ShapeKind::DataProvider => (Size::new(120.0, 80.0), INFO_FILL),
        _ => (Size::new(120.0, 80.0), DEFAULT_FILL),
    };

    let mut attrs = Attrs::new();
    attrs.insert(
        "body".into(),
        attr_map([
            ("fill", fill.into()),
            ("stroke", DEFAULT_STROKE.into()),
            ("strokeWidth", 2.5.into()),
        ]),
    );
    attrs.insert(
        "label".into(),
        attr_map([
            ("text", kind.as_str().into()),
            ("fontSize", 12.0.into()),
            ("fill", "#333333".into()),
        ]),
    );

    ShapeTemplate {
        size,
        attrs,
        markup: vec![
            markup(MarkupTag::Rect, "body", &[]),
            markup(MarkupTag::Text, "label", &[("text-anchor", "middle")]),
        ],
        data: builtin_shape_data(kind),
    }
}

fn builtin_shape_data(kind: ShapeKind) -> CellData {
    use PropertyDescriptor as P;
    let uri = format!("urn:wam:{}", id_prefix(kind.as_str()));
    match kind {
        ShapeKind::Application => CellData::new("Library", "Application", uri)
            .with_prop("theme", P::text("Theme", "Dark"))
            .with_prop(
                "status",
                P::choice("Status", "draft", &["draft", "review", "final"]),
            )
            .with_prop("maxUsers", P::number("Max Users", 100.0))
            .with_prop("cacheEnabled", P::boolean("Cache Enabled", true))
            .with_prop("license", P::text("License", "MIT"))
            .with_prop("version", P::text("Version", "1.0.0"))
            .with_prop(
                "category",
                P::choice("Category", "core", &["core", "addon", "beta"]),
            )
            .with_prop("owner", P::text("Owner", "Team A")),
        ShapeKind::Service => CellData::new("AuthService", "Service", uri)
            .with_prop("endpoint", P::text("Endpoint", "https://api.app.com/auth"))
            .with_prop(
                "protocol",
                P::choice("Protocol", "HTTPS", &["HTTP", "HTTPS", "gRPC"]),
            )
            .with_prop("port", bounded("Port", 443.0, 1.0, 65535.0))
            .with_prop("retries", bounded("Retries", 3.0, 0.0, 10.0))
            .with_prop("enabled", P::boolean("Enabled", true))
            .with_prop("timeout", P::number("Timeout (ms)", 5000.0))
            .with_prop("version", P::text("Version", "2.1"))
            .with_prop("healthCheck", P::boolean("Health Check", true)),
        ShapeKind::ProcessUnit => CellData::new("ETL Processor", "ProcessUnit", uri)
            .with_prop("threads", bounded("Threads", 4.0, 1.0, 256.0))
            .with_prop("batchSize", P::number("Batch Size", 500.0))
            .with_prop(
                "mode",
                P::choice("Mode", "parallel", &["sequential", "parallel"]),
            )
            .with_prop("logging", P::boolean("Logging", true))
            .with_prop(
                "inputType",
                P::choice("Input Type", "CSV", &["CSV", "JSON", "XML"]),
            )
            .with_prop(
                "outputType",
                P::choice("Output Type", "JSON", &["CSV", "JSON", "XML"]),
            )
            .with_prop("owner", P::text("Owner", "DataOps Team"))
            .with_prop(
                "retryPolicy",
                P::choice(
                    "Retry Policy",
                    "exponential",
                    &["none", "fixed", "exponential"],
                ),
            ),
        ShapeKind::SecurityRealm => CellData::new("AdminRealm", "SecurityRealm", uri)
            .with_prop("realmId", P::text("Realm ID", "admin"))
            .with_prop("description", P::text("Description", "Handles admin users"))
            .with_prop(
                "authMethod",
                P::choice("Auth Method", "password", &["password", "token", "certificate"]),
            )
            .with_prop(
                "sessionTimeout",
                P::number("Session Timeout (min)", 30.0),
            )
            .with_prop("active", P::boolean("Active", true))
            .with_prop(
                "encryption",
                P::choice("Encryption", "AES256", &["AES128", "AES256", "RSA"]),
            )
            .with_prop("owner", P::text("Owner", "Security Team"))
            .with_prop(
                "accessLevel",
                P::choice("Access Level", "high", &["low", "medium", "high"]),
            ),
        ShapeKind::IdentityProvider => CellData::new("GoogleIDP", "IdentityProvider", uri)
            .with_prop("providerName", P::text("Provider Name", "Google"))
            .with_prop(
                "protocol",
                P::choice("Protocol", "OIDC", &["OIDC", "SAML", "LDAP"]),
            )
            .with_prop("clientId", P::text("Client ID", "abc123"))
            .with_prop("clientSecret", P::text("Client Secret", "secret"))
            .with_prop(
                "redirectUri",
                P::text("Redirect URI", "https://app.com/callback"),
            )
            .with_prop("enabled", P::boolean("Enabled", true))
            .with_prop("tokenExpiry", P::number("Token Expiry (s)", 3600.0))
            .with_prop(
                "status",
                P::choice("Status", "active", &["active", "inactive"]),
            ),
        ShapeKind::DataProvider => CellData::new("CustomerStore", "DataProvider", uri)
            .with_prop(
                "engine",
                P::choice("Engine", "PostgreSQL", &["PostgreSQL", "MySQL", "MongoDB"]),
            )
            .with_prop("host", P::text("Host", "db.internal"))
            .with_prop("port", bounded("Port", 5432.0, 1.0, 65535.0))
            .with_prop("readOnly", P::boolean("Read Only", false))
            .with_prop("owner", P::text("Owner", "Data Team")),
    }
}

fn bounded(label: &str, value: f64, min: f64, max: f64) -> PropertyDescriptor {
    PropertyDescriptor::Number {
        value: Some(value),
        min: Some(min),
        max: Some(max),
        step: None,
        label: Some(label.to_string()),
        required: true,
    }
}

fn builtin_link(kind: LinkKind) -> LinkTemplate {
    let mut line = attr_map([
        ("stroke", DEFAULT_STROKE.into()),
        ("strokeWidth", 2.0.into()),
        ("strokeLinejoin", "round".into()),
        ("fill", "none".into()),
    ]);
    match kind {
        LinkKind::Invocation => {
            line.insert(
                "targetMarker".into(),
                AttrValue::Nested(attr_map([
                    ("type", "path".into()),
                    ("d", "M 10 -5 0 0 10 5 z".into()),
                ])),
            );
        }
        LinkKind::TrustRelationship => {
            line.insert(
                "targetMarker".into(),
                AttrValue::Nested(attr_map([
                    ("type", "path".into()),
                    ("d", "M 10 -5 L 0 0 L 10 5".into()),
                    ("fill", "none".into()),
                ])),
            );
        }
        LinkKind::LegacyRelationship => {}
    }

    let mut attrs = Attrs::new();
    attrs.insert("line".into(), line);
    attrs.insert(
        "wrapper".into(),
        attr_map([
            ("strokeWidth", 10.0.into()),
            ("stroke", "transparent".into()),
        ]),
    );

    LinkTemplate {
        attrs,
        markup: vec![
            markup(MarkupTag::Path, "wrapper", &[("fill", "none")]),
            markup(MarkupTag::Path, "line", &[("fill", "none")]),
        ],
        data: CellData {
            name: kind.as_str().to_string(),
            kind: kind.as_str().to_string(),
            uri: format!("urn:wam:{}", id_prefix(kind.as_str())),
            props: BTreeMap::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_node_from_template() {
        let factory = ShapeFactory::default();
        let node = factory.create_node("ProcessUnit").unwrap();
        let shape = node.shape().unwrap();
        assert_eq!(shape.kind, ShapeKind::ProcessUnit);
        assert_eq!(shape.size, Size::new(100.0, 60.0));
        assert_eq!(node.label(), Some("ProcessUnit"));
        assert_eq!(node.data.kind, "ProcessUnit");
        assert!(node.id.as_str().starts_with("process_unit_"));
        assert!(node.data.validate().is_ok());
    }

    #[test]
    fn unknown_tags_fail() {
        let factory = ShapeFactory::default();
        assert_eq!(
            factory.create_node("Invocation").unwrap_err(),
            FactoryError::UnknownType("Invocation".into())
        );
        assert!(factory.create_edge("Service").is_err());
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let factory = ShapeFactory::new(TemplateRegistry::empty());
        assert!(matches!(
            factory.create_node("Service"),
            Err(FactoryError::UnknownType(_))
        ));
    }

    #[test]
    fn create_edge_has_marker_only_for_arrows() {
        let factory = ShapeFactory::default();
        let invocation = factory.create_edge("Invocation").unwrap();
        let legacy = factory.create_edge("LegacyRelationship").unwrap();
        assert!(attr(&invocation.attrs, "line", "targetMarker").is_some());
        assert!(attr(&legacy.attrs, "line", "targetMarker").is_none());
        assert_eq!(
            factory.registry().markup_for(&legacy).len(),
            2,
            "wrapper + line"
        );
    }

    #[test]
    fn every_builtin_record_is_valid() {
        let factory = ShapeFactory::default();
        for kind in ShapeKind::ALL {
            let node = factory.create_node(kind.as_str()).unwrap();
            assert!(node.data.validate().is_ok(), "{kind} defaults invalid");
            for prop in node.data.props.values() {
                assert!(prop.check_structure().is_ok());
            }
        }
    }

    #[test]
    fn prefixes_are_snake_case() {
        assert_eq!(id_prefix("SecurityRealm"), "security_realm");
        assert_eq!(id_prefix("Service"), "service");
    }
}
