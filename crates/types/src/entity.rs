use serde::{Deserialize, Serialize};

/// A record that can populate a selector catalog.
///
/// Entities are identified by a numeric id; the option value shown to a
/// selector is always the stringified id.
pub trait CatalogEntity: Clone + std::fmt::Debug + PartialEq {
    /// Numeric identity used for matching and de-duplication.
    fn id(&self) -> i64;

    /// Label rendered for the entity.
    fn display_name(&self) -> &str;

    /// Build an entity for a value that is not (or no longer) in the catalog.
    fn ad_hoc(id: i64, name: String) -> Self;

    /// The option value for this entity.
    fn option_value(&self) -> String {
        self.id().to_string()
    }
}

/// A source system exposing variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub id: i64,
    pub name: String,
}

impl Connection {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

impl CatalogEntity for Connection {
    fn id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn ad_hoc(id: i64, name: String) -> Self {
        Self { id, name }
    }
}

/// A tag exposed by a connection.
///
/// The resource endpoint names the label `variableName`; `name` is accepted as
/// well so hand-written fixtures stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub id: i64,
    #[serde(rename = "variableName", alias = "name")]
    pub name: String,
}

impl Variable {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

impl CatalogEntity for Variable {
    fn id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn ad_hoc(id: i64, name: String) -> Self {
        Self { id, name }
    }
}

/// Derived, render-time option. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOption<E> {
    pub label: String,
    /// Stringified entity id, or the raw text for ad-hoc entries.
    pub value: String,
    /// Backing entity; `None` for ad-hoc options.
    pub source: Option<E>,
}

impl<E: CatalogEntity> SelectionOption<E> {
    pub fn from_entity(entity: &E) -> Self {
        Self {
            label: entity.display_name().to_string(),
            value: entity.option_value(),
            source: Some(entity.clone()),
        }
    }

    pub fn ad_hoc(raw: &str) -> Self {
        Self {
            label: raw.to_string(),
            value: raw.to_string(),
            source: None,
        }
    }

    pub fn is_ad_hoc(&self) -> bool {
        self.source.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_reads_wire_and_fixture_names() {
        let wire: Variable = serde_json::from_str(r#"{"id":4,"variableName":"Tank level"}"#).expect("wire variable");
        let fixture: Variable = serde_json::from_str(r#"{"id":4,"name":"Tank level"}"#).expect("fixture variable");
        assert_eq!(wire, fixture);
        assert_eq!(
            serde_json::to_value(&wire).expect("serialize"),
            serde_json::json!({"id": 4, "variableName": "Tank level"})
        );
    }

    #[test]
    fn option_value_is_stringified_id() {
        let option = SelectionOption::from_entity(&Connection::new(12, "PLC-A"));
        assert_eq!(option.value, "12");
        assert_eq!(option.label, "PLC-A");
        assert!(!option.is_ad_hoc());
        assert!(SelectionOption::<Connection>::ad_hoc("plc-x").is_ad_hoc());
    }
}
