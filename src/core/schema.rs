/// Column schemas, form field definitions and resource specs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use super::record::{FieldValue, FormPayload, Record};

/// One table column: header label and the record field it shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub key: String,
}

impl Column {
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self { label: label.into(), key: key.into() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
    Boolean,
}

/// Declared input of the create form, as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Regex the whole value must match
    #[serde(default)]
    pub pattern: Option<String>,
}

fn default_required() -> bool {
    true
}

impl FieldDef {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind: FieldKind::Text,
            required: true,
            max_length: None,
            pattern: None,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("resource '{resource}': {reason}")]
    InvalidResource { resource: String, reason: String },

    #[error("field '{field}' has an invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("field '{field}' is declared more than once")]
    DuplicateField { field: String },
}

/// Client-side rejection of one input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be a whole number")]
    NotInteger { field: String },

    #[error("{field} must be yes or no")]
    NotBoolean { field: String },

    #[error("{field} does not match {pattern}")]
    PatternMismatch { field: String, pattern: String },

    #[error("unknown field {field}")]
    Unknown { field: String },
}

#[derive(Debug, Clone)]
struct CompiledField {
    def: FieldDef,
    pattern: Option<Regex>,
}

/// Validated set of form fields
#[derive(Debug, Clone)]
pub struct FormSchema {
    fields: Vec<CompiledField>,
}

impl FormSchema {
    pub fn new(defs: Vec<FieldDef>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        if let Some(dup) = defs.iter().find(|def| !seen.insert(def.name.as_str())) {
            return Err(SchemaError::DuplicateField { field: dup.name.clone() });
        }

        let fields = defs
            .into_iter()
            .map(|def| {
                let pattern = match &def.pattern {
                    Some(p) => Some(Regex::new(&format!("^(?:{})$", p)).map_err(|e| {
                        SchemaError::InvalidPattern { field: def.name.clone(), reason: e.to_string() }
                    })?),
                    None => None,
                };
                Ok(CompiledField { def, pattern })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        Ok(Self { fields })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn defs(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().map(|f| &f.def)
    }

    pub fn def(&self, index: usize) -> Option<&FieldDef> {
        self.fields.get(index).map(|f| &f.def)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.def.name == name)
    }

    /// Validate raw inputs (one per field, in declaration order).
    ///
    /// Returns the typed payload, or every field error keyed by field name.
    pub fn validate(&self, inputs: &[String]) -> Result<FormPayload, BTreeMap<String, FieldError>> {
        let mut payload = FormPayload::new();
        let mut errors = BTreeMap::new();

        for (index, field) in self.fields.iter().enumerate() {
            let raw = inputs.get(index).map(|s| s.trim()).unwrap_or("");
            match field.check(raw) {
                Ok(Some(value)) => payload.insert(field.def.name.clone(), value),
                Ok(None) => {}
                Err(e) => {
                    errors.insert(field.def.name.clone(), e);
                }
            }
        }

        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(errors)
        }
    }

    /// Validate `name=value` pairs, as given on the command line
    pub fn validate_pairs(&self, pairs: &[(String, String)]) -> Result<FormPayload, BTreeMap<String, FieldError>> {
        let mut inputs = vec![String::new(); self.fields.len()];
        let mut unknown = BTreeMap::new();

        for (name, value) in pairs {
            match self.position(name) {
                Some(index) => inputs[index] = value.clone(),
                None => {
                    unknown.insert(name.clone(), FieldError::Unknown { field: name.clone() });
                }
            }
        }

        match self.validate(&inputs) {
            Ok(payload) if unknown.is_empty() => Ok(payload),
            Ok(_) => Err(unknown),
            Err(mut errors) => {
                errors.extend(unknown);
                Err(errors)
            }
        }
    }
}

impl CompiledField {
    fn check(&self, raw: &str) -> Result<Option<FieldValue>, FieldError> {
        let field = self.def.label().to_string();

        if raw.is_empty() {
            return if self.def.required {
                Err(FieldError::Required { field })
            } else {
                Ok(None)
            };
        }

        if let Some(max) = self.def.max_length {
            if raw.chars().count() > max {
                return Err(FieldError::TooLong { field, max });
            }
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(raw) {
                let pattern = self.def.pattern.clone().unwrap_or_default();
                return Err(FieldError::PatternMismatch { field, pattern });
            }
        }

        match self.def.kind {
            FieldKind::Text => Ok(Some(FieldValue::Text(raw.to_string()))),
            FieldKind::Integer => raw
                .parse::<i64>()
                .map(|i| Some(FieldValue::Integer(i)))
                .map_err(|_| FieldError::NotInteger { field }),
            FieldKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "y" | "yes" | "true" | "1" => Ok(Some(FieldValue::Boolean(true))),
                "n" | "no" | "false" | "0" => Ok(Some(FieldValue::Boolean(false))),
                _ => Err(FieldError::NotBoolean { field }),
            },
        }
    }
}

/// A managed collection as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    pub endpoint: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl ResourceSpec {
    /// Architecture records `{ id, code }`
    pub fn architecture() -> Self {
        let mut code = FieldDef::text("code");
        code.label = Some("Architecture".to_string());
        code.max_length = Some(64);

        Self {
            name: "architecture".to_string(),
            title: Some("Architecture".to_string()),
            endpoint: "architecture".to_string(),
            columns: vec![Column::new("ID", "id"), Column::new("Code", "code")],
            fields: vec![code],
        }
    }
}

/// A resource ready to drive a page: columns plus compiled form schema
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub title: String,
    pub endpoint: String,
    pub columns: Vec<Column>,
    pub form: FormSchema,
}

impl TryFrom<ResourceSpec> for Resource {
    type Error = SchemaError;

    fn try_from(spec: ResourceSpec) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| SchemaError::InvalidResource {
            resource: spec.name.clone(),
            reason: reason.to_string(),
        };

        if spec.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if spec.endpoint.trim().is_empty() {
            return Err(invalid("endpoint cannot be empty"));
        }
        if spec.columns.is_empty() {
            return Err(invalid("at least one column is required"));
        }

        let form = FormSchema::new(spec.fields.clone())?;
        Ok(Self {
            title: spec.title.clone().unwrap_or_else(|| spec.name.clone()),
            name: spec.name,
            endpoint: spec.endpoint,
            columns: spec.columns,
            form,
        })
    }
}

impl Resource {
    /// One display row per record, cells in column order
    pub fn row(&self, record: &Record) -> Vec<String> {
        self.columns.iter().map(|c| record.display(&c.key)).collect()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn schema() -> FormSchema {
        let mut build = FieldDef::text("build");
        build.kind = FieldKind::Integer;
        let mut beta = FieldDef::text("beta");
        beta.kind = FieldKind::Boolean;
        beta.required = false;
        let mut version = FieldDef::text("version");
        version.pattern = Some(r"\d+\.\d+".to_string());
        version.max_length = Some(8);

        FormSchema::new(vec![version, build, beta]).unwrap()
    }

    #[test]
    fn test_validate_builds_typed_payload() {
        let payload = schema().validate(&inputs(&["6.2", " 25556 ", "yes"])).unwrap();
        assert_eq!(payload.get("version"), Some(&FieldValue::Text("6.2".into())));
        assert_eq!(payload.get("build"), Some(&FieldValue::Integer(25556)));
        assert_eq!(payload.get("beta"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn test_validate_reports_every_field() {
        let errors = schema().validate(&inputs(&["six", "", "maybe"])).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors["version"], FieldError::PatternMismatch { .. }));
        assert_eq!(errors["build"], FieldError::Required { field: "build".into() });
        assert_eq!(errors["beta"], FieldError::NotBoolean { field: "beta".into() });
    }

    #[test]
    fn test_optional_field_omitted_from_payload() {
        let payload = schema().validate(&inputs(&["7.0", "1", ""])).unwrap();
        assert_eq!(payload.len(), 2);
        assert!(payload.get("beta").is_none());
    }

    #[test]
    fn test_pattern_is_anchored() {
        let errors = schema().validate(&inputs(&["v6.2.1x", "1", ""])).unwrap_err();
        assert!(errors.contains_key("version"));
    }

    #[test]
    fn test_validate_pairs_rejects_unknown_names() {
        let pairs = vec![
            ("version".to_string(), "6.2".to_string()),
            ("build".to_string(), "3".to_string()),
            ("colour".to_string(), "red".to_string()),
        ];
        let errors = schema().validate_pairs(&pairs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors["colour"], FieldError::Unknown { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_a_schema_error() {
        let mut field = FieldDef::text("code");
        field.pattern = Some("(".to_string());
        assert!(matches!(FormSchema::new(vec![field]), Err(SchemaError::InvalidPattern { .. })));
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let result = FormSchema::new(vec![FieldDef::text("code"), FieldDef::text("name"), FieldDef::text("code")]);
        assert_eq!(result.unwrap_err(), SchemaError::DuplicateField { field: "code".into() });

        let mut spec = ResourceSpec::architecture();
        spec.fields.push(FieldDef::text("code"));
        assert!(matches!(Resource::try_from(spec), Err(SchemaError::DuplicateField { .. })));
    }

    #[test]
    fn test_architecture_resource_rows() {
        let resource = Resource::try_from(ResourceSpec::architecture()).unwrap();
        assert_eq!(resource.headers(), vec!["ID", "Code"]);

        let record: Record = serde_json::from_value(json!({"id": 7, "code": "armv8"})).unwrap();
        assert_eq!(resource.row(&record), vec!["7", "armv8"]);

        let errors = resource.form.validate(&inputs(&[&"x".repeat(65)])).unwrap_err();
        assert_eq!(errors["code"], FieldError::TooLong { field: "Architecture".into(), max: 64 });
    }

    #[test]
    fn test_resource_requires_columns_and_endpoint() {
        let mut spec = ResourceSpec::architecture();
        spec.columns.clear();
        assert!(Resource::try_from(spec).is_err());

        let mut spec = ResourceSpec::architecture();
        spec.endpoint = " ".to_string();
        assert!(Resource::try_from(spec).is_err());
    }
}
