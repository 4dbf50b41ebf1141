use crate::error::Diagnostic;
use crate::model::{Resolution, ResolvedField};
use serde::Serialize;
use std::collections::BTreeMap;

/// JSON formatting style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonStyle {
    /// Compact: no whitespace between tokens.
    Compact,
    /// Pretty: 2-space indented, one entry per line.
    Pretty,
}

/// The document the CLI prints: the resolution plus, when a seed was
/// supplied, the generated codes.
#[derive(Serialize)]
struct ResolutionDocument<'a> {
    fields: &'a [ResolvedField],
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    generated: Option<&'a BTreeMap<String, String>>,
}

fn write<T: Serialize>(value: &T, style: JsonStyle) -> Result<String, serde_json::Error> {
    match style {
        JsonStyle::Compact => serde_json::to_string(value),
        JsonStyle::Pretty => serde_json::to_string_pretty(value),
    }
}

/// Serialize a resolution as `{"fields": [...], "diagnostics": [...]}`.
pub fn resolution_to_json(
    resolution: &Resolution,
    generated: Option<&BTreeMap<String, String>>,
    style: JsonStyle,
) -> Result<String, serde_json::Error> {
    write(
        &ResolutionDocument {
            fields: &resolution.fields,
            diagnostics: &resolution.diagnostics,
            generated,
        },
        style,
    )
}

/// Serialize diagnostics to a JSON array string.
pub fn diagnostics_to_json(diagnostics: &[Diagnostic]) -> Result<String, serde_json::Error> {
    write(&diagnostics, JsonStyle::Compact)
}
