use crate::date_format::DateFormat;
use crate::error::Diagnostic;
use crate::sync::Extraction;
use serde::{Deserialize, Serialize};

/// One markup text element as handed over by the document reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    pub id: String,
    #[serde(default, alias = "default")]
    pub default_text: String,
}

impl RawElement {
    pub fn new(id: impl Into<String>, default_text: impl Into<String>) -> Self {
        RawElement {
            id: id.into(),
            default_text: default_text.into(),
        }
    }
}

/// The primitive shape of a resolved field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Upload,
    File,
    Sign,
    Date,
    Email,
    /// Implied by `gen` when the chain names no explicit type.
    Generated,
    /// Implied by any `select_<KEY>` option chain.
    Select,
}

impl FieldType {
    /// Map an explicit type keyword to its type. `generated` and `select`
    /// have no keyword of their own.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "text" => Some(FieldType::Text),
            "textarea" => Some(FieldType::Textarea),
            "upload" => Some(FieldType::Upload),
            "file" => Some(FieldType::File),
            "sign" => Some(FieldType::Sign),
            "date" => Some(FieldType::Date),
            "email" => Some(FieldType::Email),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Upload => "upload",
            FieldType::File => "file",
            FieldType::Sign => "sign",
            FieldType::Date => "date",
            FieldType::Email => "email",
            FieldType::Generated => "generated",
            FieldType::Select => "select",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub generated: bool,
}

/// One entry of a select field, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    /// Literal suffix after `select_`.
    pub key: String,
    /// `key` with underscores shown as spaces.
    pub label: String,
    /// Raw id of the element carrying this option; renderers toggle it.
    pub value: String,
    /// Element text, or the label when the element is empty.
    pub display_text: String,
    #[serde(default)]
    pub is_default_track_role: bool,
}

/// A sync reference: this field mirrors (part of) `target`'s value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<Extraction>,
}

/// A fully resolved field definition, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    pub base_name: String,
    /// Human-readable name derived from the base name.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Raw id of the first element that declared the field.
    pub element_id: String,
    pub default_value: String,
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<DateFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Dependency>,
    #[serde(default)]
    pub tracking_id: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_role: Option<String>,
}

impl ResolvedField {
    pub fn option_keys(&self) -> Vec<&str> {
        self.options
            .iter()
            .flatten()
            .map(|option| option.key.as_str())
            .collect()
    }
}

/// The outcome of one resolution pass: every field that resolved, plus the
/// diagnostics for everything that did not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub fields: Vec<ResolvedField>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn field(&self, base_name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|field| field.base_name == base_name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// `company_name` -> `Company Name`.
pub fn display_name(base_name: &str) -> String {
    base_name
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_title_cases_words() {
        assert_eq!(display_name("company_name"), "Company Name");
        assert_eq!(display_name("Tracking_ID"), "Tracking Id");
        assert_eq!(display_name("Status"), "Status");
    }

    #[test]
    fn raw_element_accepts_default_alias() {
        let element: RawElement =
            serde_json::from_str(r#"{"id": "company_name.text", "default": "Enter"}"#).unwrap();
        assert_eq!(element, RawElement::new("company_name.text", "Enter"));
    }

    #[test]
    fn field_type_keywords() {
        assert_eq!(FieldType::from_keyword("textarea"), Some(FieldType::Textarea));
        assert_eq!(FieldType::from_keyword("select"), None);
        assert_eq!(FieldType::from_keyword("gen"), None);
        assert_eq!(FieldType::Generated.as_str(), "generated");
    }
}
