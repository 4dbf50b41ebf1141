pub mod aggregate;
pub mod ast;
pub mod classifier;
pub mod codegen;
pub mod config;
pub mod date_format;
pub mod error;
pub mod from_json;
pub mod json;
pub mod model;
pub mod resolver;
pub mod sync;
pub mod tokenizer;
pub mod validate;

use ast::Extension;
use resolver::TrackingClaim;
use std::collections::HashSet;

pub use config::ResolveOptions;
pub use error::{Diagnostic, ErrorKind, ResolveError, Severity};
pub use model::{FieldType, RawElement, Resolution, ResolvedField};

// ── Core API ───────────────────────────────────────────────────────

/// Resolve raw elements into field definitions.
///
/// Always succeeds: fields that resolved are returned alongside diagnostics
/// for everything that did not. A base name named by any error diagnostic
/// is left out, as is every field that depends on one that was left out.
/// Output order is the first appearance of each base name.
pub fn resolve_fields(elements: &[RawElement]) -> Resolution {
    let mut diagnostics = Vec::new();
    let mut chains = Vec::with_capacity(elements.len());
    let mut claims = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        let checked = classifier::classify_element(index, element).and_then(|chain| {
            if chain.has(|ext| matches!(ext, Extension::TrackingId)) {
                claims.push(TrackingClaim {
                    base_name: chain.base_name.clone(),
                    element_id: chain.element_id.clone(),
                });
            }
            validate::validate_chain(chain)
        });
        match checked {
            Ok(chain) => chains.push(chain),
            Err(errors) => diagnostics.extend(errors),
        }
    }
    resolver::check_tracking_claims(&claims, &mut diagnostics);

    let fields = aggregate::aggregate(chains, &mut diagnostics);

    let suppressed: HashSet<&str> = diagnostics
        .iter()
        .filter(|diag| diag.is_error())
        .flat_map(|diag| {
            std::iter::once(diag.base_name.as_str())
                .chain(diag.involved.iter().map(String::as_str))
        })
        .collect();
    let fields: Vec<ResolvedField> = fields
        .into_iter()
        .filter(|field| !suppressed.contains(field.base_name.as_str()))
        .collect();

    let fields = resolver::resolve_relationships(fields, &mut diagnostics);

    tracing::info!(
        elements = elements.len(),
        fields = fields.len(),
        diagnostics = diagnostics.len(),
        "resolved field set"
    );

    Resolution {
        fields,
        diagnostics,
    }
}

/// Resolve with options. In strict mode any diagnostic, warnings included,
/// fails the whole resolution.
pub fn resolve(
    elements: &[RawElement],
    options: &ResolveOptions,
) -> Result<Resolution, ResolveError> {
    let resolution = resolve_fields(elements);
    if options.strict && !resolution.diagnostics.is_empty() {
        return Err(ResolveError::Strict {
            diagnostics: resolution.diagnostics,
        });
    }
    Ok(resolution)
}
