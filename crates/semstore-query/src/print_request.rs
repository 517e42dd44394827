//! Print requests: the columns a query projects.

use crate::data::PropertyRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "property", rename_all = "snake_case")]
pub enum PrintKind {
    /// The result entity itself.
    This,
    /// The categories of the result entity.
    Categories,
    /// Values of a property of the result entity.
    Property(PropertyRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrintRequest {
    pub label: String,
    pub kind: PrintKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl PrintRequest {
    pub fn this(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: PrintKind::This,
            output_format: None,
        }
    }

    pub fn categories(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: PrintKind::Categories,
            output_format: None,
        }
    }

    pub fn property(property: PropertyRef) -> Self {
        Self {
            label: property.label(),
            kind: PrintKind::Property(property),
            output_format: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    /// Serialisation as written after a query: `?Population#km²=Pop`.
    pub fn serialisation(&self) -> String {
        let mut out = match &self.kind {
            PrintKind::This => "?".to_string(),
            PrintKind::Categories => "?Category".to_string(),
            PrintKind::Property(p) => format!("?{}", p.label()),
        };
        if let Some(format) = &self.output_format {
            out.push('#');
            out.push_str(format);
        }
        let default_label = match &self.kind {
            PrintKind::This => String::new(),
            PrintKind::Categories => "Category".to_string(),
            PrintKind::Property(p) => p.label(),
        };
        if self.label != default_label {
            out.push('=');
            out.push_str(&self.label);
        }
        out
    }
}
