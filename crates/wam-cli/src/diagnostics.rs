//! Diagnostics: diagram JSON → a list of problems.

use std::fmt;
use wam_core::{DiagramDocument, EntityId, ImportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The document cannot be imported at all.
    Error,
    /// The document imports but a value fails its constraints.
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// 1-based line and column for JSON syntax errors.
    pub position: Option<(usize, usize)>,
    pub entity: Option<EntityId>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}")?;
        if let Some((line, col)) = self.position {
            write!(f, " [{line}:{col}]")?;
        }
        if let Some(id) = self.entity {
            write!(f, " {id}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Check a diagram document.
///
/// Import failures produce a single error. A document that imports cleanly
/// is then checked value by value; every failing field is a warning.
pub fn check_document(text: &str) -> Vec<Diagnostic> {
    let document = match DiagramDocument::from_json(text) {
        Ok(document) => document,
        Err(err) => return vec![import_diagnostic(&err)],
    };

    let mut out = Vec::new();
    for cell in &document.snapshot.cells {
        let Err(invalid) = cell.entity.data.validate() else {
            continue;
        };
        out.extend(invalid.fields.into_iter().map(|field| Diagnostic {
            severity: Severity::Warning,
            position: None,
            entity: Some(cell.entity.id),
            message: format!("{} ({}): {}", field.label, field.key, field.message),
        }));
    }
    out
}

fn import_diagnostic(err: &ImportError) -> Diagnostic {
    let (position, entity) = match err {
        ImportError::Parse(e) if e.line() > 0 => (Some((e.line(), e.column())), None),
        ImportError::InvalidProperty { entity, .. } => (None, Some(*entity)),
        _ => (None, None),
    };
    Diagnostic {
        severity: Severity::Error,
        position,
        entity,
        message: err.to_string(),
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}
