//! Value-level vocabulary shared by descriptions and compilers.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const NS_MAIN: i32 = 0;
pub const NS_USER: i32 = 2;
pub const NS_PROJECT: i32 = 4;
pub const NS_FILE: i32 = 6;
pub const NS_TEMPLATE: i32 = 10;
pub const NS_HELP: i32 = 12;
pub const NS_CATEGORY: i32 = 14;
pub const NS_PROPERTY: i32 = 102;
pub const NS_CONCEPT: i32 = 108;

/// Canonical name of a namespace as used in query text.
///
/// Unknown namespaces fall back to `Ns<id>`, which the parser accepts as a
/// numeric alias.
pub fn namespace_name(namespace: i32) -> String {
    let known = match namespace {
        NS_MAIN => "",
        1 => "Talk",
        NS_USER => "User",
        NS_PROJECT => "Project",
        NS_FILE => "File",
        NS_TEMPLATE => "Template",
        NS_HELP => "Help",
        NS_CATEGORY => "Category",
        NS_PROPERTY => "Property",
        NS_CONCEPT => "Concept",
        other => return format!("Ns{other}"),
    };
    known.to_string()
}

// ============================================================================
// Entities and properties
// ============================================================================

/// Reference to an entity (a page, category, concept or property page).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Title in key form (underscores instead of spaces).
    pub title: String,
    pub namespace: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subobject: String,
}

impl EntityRef {
    pub fn new(title: impl Into<String>, namespace: i32) -> Self {
        Self {
            title: title.into().replace(' ', "_"),
            namespace,
            subobject: String::new(),
        }
    }

    pub fn page(title: impl Into<String>) -> Self {
        Self::new(title, NS_MAIN)
    }

    pub fn category(title: impl Into<String>) -> Self {
        Self::new(title, NS_CATEGORY)
    }

    pub fn concept(title: impl Into<String>) -> Self {
        Self::new(title, NS_CONCEPT)
    }

    pub fn with_subobject(mut self, subobject: impl Into<String>) -> Self {
        self.subobject = subobject.into();
        self
    }

    /// Title in display form (spaces instead of underscores).
    pub fn text(&self) -> String {
        self.title.replace('_', " ")
    }

    /// Display title including the namespace prefix.
    pub fn prefixed_text(&self) -> String {
        let mut out = match namespace_name(self.namespace) {
            ns if ns.is_empty() => self.text(),
            ns => format!("{ns}:{}", self.text()),
        };
        if !self.subobject.is_empty() {
            out.push('#');
            out.push_str(&self.subobject);
        }
        out
    }

    /// Stable identity string: `title#namespace##subobject`.
    pub fn hash(&self) -> String {
        format!("{}#{}##{}", self.title, self.namespace, self.subobject)
    }
}

/// Reference to a property, possibly used in inverse direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyRef {
    pub key: String,
    #[serde(default)]
    pub inverse: bool,
}

impl PropertyRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().replace(' ', "_"),
            inverse: false,
        }
    }

    pub fn inverse(key: impl Into<String>) -> Self {
        Self {
            inverse: true,
            ..Self::new(key)
        }
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// The same property used in forward direction.
    pub fn non_inverse(&self) -> Self {
        Self {
            key: self.key.clone(),
            inverse: false,
        }
    }

    /// Label as written in query text; inverse properties carry a `-` prefix.
    pub fn label(&self) -> String {
        let text = self.key.replace('_', " ");
        if self.inverse {
            format!("-{text}")
        } else {
            text
        }
    }

    /// The property page backing this property.
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.key.clone(), NS_PROPERTY)
    }
}

// ============================================================================
// Data items
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Page,
    Blob,
    Number,
    Boolean,
    Uri,
}

/// A literal value appearing in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DataItem {
    Page(EntityRef),
    Blob(String),
    Number(f64),
    Boolean(bool),
    Uri(String),
}

impl DataItem {
    pub fn kind(&self) -> ValueKind {
        match self {
            DataItem::Page(_) => ValueKind::Page,
            DataItem::Blob(_) => ValueKind::Blob,
            DataItem::Number(_) => ValueKind::Number,
            DataItem::Boolean(_) => ValueKind::Boolean,
            DataItem::Uri(_) => ValueKind::Uri,
        }
    }

    /// Stable identity string of the value (type-local).
    pub fn hash(&self) -> String {
        match self {
            DataItem::Page(page) => page.hash(),
            DataItem::Blob(s) | DataItem::Uri(s) => s.clone(),
            DataItem::Number(n) => format_number(*n),
            DataItem::Boolean(b) => if *b { "t" } else { "f" }.to_string(),
        }
    }

    /// Serialisation used in query text.
    pub fn wiki_value(&self) -> String {
        match self {
            DataItem::Page(page) => page.prefixed_text(),
            DataItem::Blob(s) | DataItem::Uri(s) => s.clone(),
            DataItem::Number(n) => format_number(*n),
            DataItem::Boolean(b) => b.to_string(),
        }
    }
}

/// Render a number the way query text writes it: integral values without a
/// fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ============================================================================
// Comparators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Eq,
    Lt,
    Gt,
    Leq,
    Geq,
    Neq,
    Like,
    NotLike,
}

impl Comparator {
    /// Marker used in query text (`[[Height::>5]]` is `Geq`, `>>` is strict).
    pub fn marker(self) -> &'static str {
        match self {
            Comparator::Eq => "",
            Comparator::Lt => "<<",
            Comparator::Gt => ">>",
            Comparator::Leq => "<",
            Comparator::Geq => ">",
            Comparator::Neq => "!",
            Comparator::Like => "~",
            Comparator::NotLike => "!~",
        }
    }

    /// Short code used in fingerprints.
    pub fn code(self) -> u8 {
        match self {
            Comparator::Eq => 1,
            Comparator::Lt => 2,
            Comparator::Gt => 3,
            Comparator::Leq => 4,
            Comparator::Geq => 5,
            Comparator::Neq => 6,
            Comparator::Like => 7,
            Comparator::NotLike => 8,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Direction of a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_text_uses_namespace_name() {
        assert_eq!(EntityRef::category("Big_Company").prefixed_text(), "Category:Big Company");
        assert_eq!(EntityRef::page("Berlin").prefixed_text(), "Berlin");
        assert_eq!(
            EntityRef::page("Berlin").with_subobject("pop").prefixed_text(),
            "Berlin#pop"
        );
    }

    #[test]
    fn inverse_label_has_dash_prefix() {
        let p = PropertyRef::inverse("Employed by");
        assert_eq!(p.key, "Employed_by");
        assert_eq!(p.label(), "-Employed by");
        assert_eq!(p.non_inverse().label(), "Employed by");
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-2.5), "-2.5");
    }
}
