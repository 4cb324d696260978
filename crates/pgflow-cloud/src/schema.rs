//! Attribute schemas for resources and data sources
//!
//! A [`Schema`] names every attribute a resource understands and how it may be
//! set. The host uses it to validate configuration, fill defaults, compute the
//! difference between configuration and state, and hide secrets on display.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute values of a resource, keyed by attribute name
pub type Attributes = BTreeMap<String, Value>;

/// Placeholder shown instead of sensitive values
pub const REDACTED: &str = "(sensitive)";

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    List,
}

impl AttributeType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            AttributeType::String => value.is_string(),
            AttributeType::Bool => value.is_boolean(),
            AttributeType::List => value.is_array(),
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeType::String => write!(f, "string"),
            AttributeType::Bool => write!(f, "bool"),
            AttributeType::List => write!(f, "list"),
        }
    }
}

/// Definition of one attribute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub attr_type: AttributeType,
    pub description: String,

    /// Must be set in configuration
    pub required: bool,

    /// May be set in configuration
    pub optional: bool,

    /// Filled in by the provider
    pub computed: bool,

    /// Hidden on display
    pub sensitive: bool,

    /// A changed value forces delete and re-create
    pub requires_replace: bool,

    /// Static default for an unset optional attribute
    pub default: Option<Value>,
}

impl Attribute {
    fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            description: String::new(),
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            requires_replace: false,
            default: None,
        }
    }

    pub fn required_string() -> Self {
        Self {
            required: true,
            ..Self::new(AttributeType::String)
        }
    }

    pub fn optional_string() -> Self {
        Self {
            optional: true,
            ..Self::new(AttributeType::String)
        }
    }

    pub fn computed_string() -> Self {
        Self {
            computed: true,
            ..Self::new(AttributeType::String)
        }
    }

    pub fn computed_list() -> Self {
        Self {
            computed: true,
            ..Self::new(AttributeType::List)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark an optional attribute as also filled in by the provider
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Whether configuration may set this attribute
    pub fn is_configurable(&self) -> bool {
        self.required || self.optional
    }
}

/// Schema of a resource or data source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

/// Problem found while validating configuration against a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownAttribute(String),
    MissingRequired(String),
    ComputedOnly(String),
    TypeMismatch {
        attribute: String,
        expected: AttributeType,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnknownAttribute(name) => write!(f, "unknown attribute `{}`", name),
            Diagnostic::MissingRequired(name) => {
                write!(f, "missing required attribute `{}`", name)
            }
            Diagnostic::ComputedOnly(name) => {
                write!(f, "attribute `{}` is computed and cannot be set", name)
            }
            Diagnostic::TypeMismatch {
                attribute,
                expected,
            } => write!(f, "attribute `{}` must be a {}", attribute, expected),
        }
    }
}

/// One configurable attribute whose desired value differs from state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub name: String,
    pub old: Option<Value>,
    pub new: Value,
    pub requires_replace: bool,
}

/// Result of [`Schema::diff`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<AttributeChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn requires_replace(&self) -> bool {
        self.changes.iter().any(|c| c.requires_replace)
    }

    pub fn names(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Missing, null and empty strings all count as unset
fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Check configuration against the schema
    ///
    /// Returns every problem found; an empty list means the configuration is
    /// valid.
    pub fn validate(&self, config: &Attributes) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (name, value) in config {
            match self.attributes.get(name) {
                None => diagnostics.push(Diagnostic::UnknownAttribute(name.clone())),
                Some(attr) if !attr.is_configurable() => {
                    diagnostics.push(Diagnostic::ComputedOnly(name.clone()))
                }
                Some(attr) if !value.is_null() && !attr.attr_type.matches(value) => {
                    diagnostics.push(Diagnostic::TypeMismatch {
                        attribute: name.clone(),
                        expected: attr.attr_type,
                    })
                }
                Some(_) => {}
            }
        }

        for (name, attr) in &self.attributes {
            if attr.required && is_unset(config.get(name)) {
                diagnostics.push(Diagnostic::MissingRequired(name.clone()));
            }
        }

        diagnostics
    }

    /// Fill static defaults into unset optional attributes
    pub fn apply_defaults(&self, config: &mut Attributes) {
        for (name, attr) in &self.attributes {
            if let Some(default) = &attr.default {
                if attr.optional && is_unset(config.get(name)) {
                    config.insert(name.clone(), default.clone());
                }
            }
        }
    }

    /// Configurable attributes whose desired value differs from state
    ///
    /// An optional attribute left unset in configuration is not a change:
    /// the provider owns its value.
    pub fn diff(&self, desired: &Attributes, current: &Attributes) -> ChangeSet {
        let mut changes = Vec::new();

        for (name, attr) in &self.attributes {
            if !attr.is_configurable() {
                continue;
            }
            let Some(new) = desired.get(name).filter(|v| !is_unset(Some(v))) else {
                continue;
            };
            let old = current.get(name).filter(|v| !is_unset(Some(v)));
            if old != Some(new) {
                changes.push(AttributeChange {
                    name: name.clone(),
                    old: old.cloned(),
                    new: new.clone(),
                    requires_replace: attr.requires_replace,
                });
            }
        }

        ChangeSet { changes }
    }

    /// Copy of the attributes with sensitive values masked
    ///
    /// Empty strings are left alone so a missing secret stays visible as such.
    pub fn redact(&self, attributes: &Attributes) -> Attributes {
        attributes
            .iter()
            .map(|(name, value)| {
                let sensitive = self.attributes.get(name).is_some_and(|a| a.sensitive);
                let empty = value.as_str().is_some_and(str::is_empty) || value.is_null();
                if sensitive && !empty {
                    (name.clone(), Value::String(REDACTED.to_string()))
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn database_schema() -> Schema {
        Schema::new("database")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().requires_replace())
            .with_attribute(
                "region",
                Attribute::optional_string()
                    .computed()
                    .with_default("us-east-1")
                    .requires_replace(),
            )
            .with_attribute("label", Attribute::optional_string())
            .with_attribute(
                "connection_string",
                Attribute::computed_string().sensitive(),
            )
    }

    fn attrs(value: Value) -> Attributes {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_ok() {
        let schema = database_schema();
        let diags = schema.validate(&attrs(json!({"name": "prod", "region": "eu-west-3"})));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let schema = database_schema();
        let diags = schema.validate(&attrs(json!({
            "id": "db_1",
            "colour": "blue",
            "region": true
        })));

        assert!(diags.contains(&Diagnostic::ComputedOnly("id".to_string())));
        assert!(diags.contains(&Diagnostic::UnknownAttribute("colour".to_string())));
        assert!(diags.contains(&Diagnostic::MissingRequired("name".to_string())));
        assert!(diags.contains(&Diagnostic::TypeMismatch {
            attribute: "region".to_string(),
            expected: AttributeType::String,
        }));
        assert_eq!(diags.len(), 4);
    }

    #[test]
    fn test_null_required_is_missing() {
        let schema = database_schema();
        let diags = schema.validate(&attrs(json!({"name": null})));
        assert_eq!(diags, vec![Diagnostic::MissingRequired("name".to_string())]);
    }

    #[test]
    fn test_apply_defaults() {
        let schema = database_schema();
        let mut config = attrs(json!({"name": "prod"}));
        schema.apply_defaults(&mut config);
        assert_eq!(config["region"], json!("us-east-1"));

        let mut config = attrs(json!({"name": "prod", "region": "eu-west-3"}));
        schema.apply_defaults(&mut config);
        assert_eq!(config["region"], json!("eu-west-3"));
    }

    #[test]
    fn test_diff_replace() {
        let schema = database_schema();
        let current = attrs(json!({"id": "db_1", "name": "prod", "region": "us-east-1"}));
        let desired = attrs(json!({"name": "production", "region": "us-east-1"}));

        let changes = schema.diff(&desired, &current);
        assert_eq!(changes.names(), vec!["name"]);
        assert!(changes.requires_replace());
        assert_eq!(changes.changes[0].old, Some(json!("prod")));
    }

    #[test]
    fn test_diff_in_place_change() {
        let schema = database_schema();
        let current = attrs(json!({"name": "prod"}));
        let desired = attrs(json!({"name": "prod", "label": "primary"}));

        let changes = schema.diff(&desired, &current);
        assert_eq!(changes.names(), vec!["label"]);
        assert!(!changes.requires_replace());
    }

    #[test]
    fn test_diff_ignores_computed_and_unset() {
        let schema = database_schema();
        let current = attrs(json!({"id": "db_1", "name": "prod", "region": "eu-west-3"}));
        let desired = attrs(json!({"id": "other", "name": "prod"}));

        assert!(schema.diff(&desired, &current).is_empty());
    }

    #[test]
    fn test_empty_string_counts_as_unset() {
        let schema = database_schema();
        let mut config = attrs(json!({"name": "prod", "region": ""}));
        schema.apply_defaults(&mut config);
        assert_eq!(config["region"], json!("us-east-1"));

        let current = attrs(json!({"name": "prod", "region": "us-east-1"}));
        let desired = attrs(json!({"name": "prod", "region": ""}));
        assert!(schema.diff(&desired, &current).is_empty());

        let diags = schema.validate(&attrs(json!({"name": ""})));
        assert_eq!(diags, vec![Diagnostic::MissingRequired("name".to_string())]);
    }

    #[test]
    fn test_redact() {
        let schema = database_schema();
        let redacted = schema.redact(&attrs(json!({
            "name": "prod",
            "connection_string": "prisma+postgres://secret"
        })));
        assert_eq!(redacted["name"], json!("prod"));
        assert_eq!(redacted["connection_string"], json!(REDACTED));

        let empty = schema.redact(&attrs(json!({"connection_string": ""})));
        assert_eq!(empty["connection_string"], json!(""));
    }
}
