use crate::ast::{Chain, Extension, ExtensionToken};
use crate::error::{Diagnostic, ErrorKind};
use crate::model::FieldType;
use std::collections::HashSet;
use std::mem::discriminant;

/// A chain that passed validation, with its field type settled.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidChain {
    pub chain: Chain,
    pub field_type: FieldType,
}

/// Extensions an option chain may carry besides its `select_<KEY>`.
fn allowed_on_option(ext: &Extension) -> bool {
    matches!(
        ext,
        Extension::SelectOption(_) | Extension::Editable | Extension::TrackRole(_)
    )
}

// ── Chain validation ────────────────────────────────────────────────

/// Check one chain against every placement, prerequisite and typing rule.
///
/// All violations are collected; the chain is valid only when none are found.
pub fn validate_chain(chain: Chain) -> Result<ValidChain, Vec<Diagnostic>> {
    let mut errors = Vec::new();
    check_track_role_is_terminal(&chain, &mut errors);
    check_repeats(&chain, &mut errors);
    check_prerequisites(&chain, &mut errors);
    check_constraints(&chain, &mut errors);
    let field_type = infer_type(&chain, &mut errors);

    match field_type {
        Some(field_type) if errors.is_empty() => Ok(ValidChain { chain, field_type }),
        _ => Err(errors),
    }
}

fn token_error(
    chain: &Chain,
    token: &ExtensionToken,
    kind: ErrorKind,
    message: String,
) -> Diagnostic {
    Diagnostic::new(kind, &chain.base_name, message)
        .with_element(&chain.element_id)
        .with_token(&token.raw, token.position)
}

/// `track_<ROLE>` must be the final token; `editable` in particular must
/// come before it.
fn check_track_role_is_terminal(chain: &Chain, errors: &mut Vec<Diagnostic>) {
    let Some(track) = chain.find(|ext| matches!(ext, Extension::TrackRole(_))) else {
        return;
    };
    for token in &chain.tokens[track.position + 1..] {
        let message = match token.extension {
            Extension::Editable => format!("`editable` must appear before `{}`", track.raw),
            _ => format!(
                "`{}` follows `{}`, which must be the last extension",
                token.raw, track.raw
            ),
        };
        errors.push(token_error(chain, token, ErrorKind::ChainOrder, message));
    }
}

/// Single-use extensions may not repeat. Types, options and track roles
/// have their own rules.
fn check_repeats(chain: &Chain, errors: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    for token in &chain.tokens {
        if matches!(
            token.extension,
            Extension::Type(_) | Extension::SelectOption(_) | Extension::TrackRole(_)
        ) {
            continue;
        }
        if !seen.insert(discriminant(&token.extension)) {
            errors.push(token_error(
                chain,
                token,
                ErrorKind::ChainOrder,
                format!("`{}` appears more than once", token.extension.keyword()),
            ));
        }
    }
}

fn check_prerequisites(chain: &Chain, errors: &mut Vec<Diagnostic>) {
    if let Some(gen) = chain.find(|ext| matches!(ext, Extension::Gen)) {
        if !chain.has(|ext| matches!(ext, Extension::Max(_))) {
            errors.push(token_error(
                chain,
                gen,
                ErrorKind::MissingPrerequisite,
                "`gen` requires a `max_<N>` length in the same chain".to_string(),
            ));
        }
    }
}

fn check_constraints(chain: &Chain, errors: &mut Vec<Diagnostic>) {
    for token in &chain.tokens {
        if let Extension::Max(0) = token.extension {
            errors.push(token_error(
                chain,
                token,
                ErrorKind::InvalidConstraint,
                "max length must be a positive integer".to_string(),
            ));
        }
    }
}

// ── Type inference ──────────────────────────────────────────────────

/// Settle the chain's field type. Returns `None` only after pushing at
/// least one error.
fn infer_type(chain: &Chain, errors: &mut Vec<Diagnostic>) -> Option<FieldType> {
    let options: Vec<&ExtensionToken> = chain
        .tokens
        .iter()
        .filter(|t| matches!(t.extension, Extension::SelectOption(_)))
        .collect();
    if !options.is_empty() {
        return infer_option_type(chain, &options, errors);
    }

    let mut explicit: Option<(FieldType, &ExtensionToken)> = None;
    let mut ok = true;
    for token in &chain.tokens {
        let Extension::Type(field_type) = token.extension else {
            continue;
        };
        match explicit {
            None => explicit = Some((field_type, token)),
            Some((first, _)) if first == field_type => {
                errors.push(token_error(
                    chain,
                    token,
                    ErrorKind::ChainOrder,
                    format!("type `{}` appears more than once", field_type.as_str()),
                ));
                ok = false;
            }
            Some((_, first_token)) => {
                errors.push(token_error(
                    chain,
                    token,
                    ErrorKind::ConflictingType,
                    format!(
                        "type `{}` conflicts with `{}`",
                        field_type.as_str(),
                        first_token.raw
                    ),
                ));
                ok = false;
            }
        }
    }

    let date_format = chain.find(|ext| matches!(ext, Extension::DateFormat(_)));
    if let (Some((field_type, type_token)), Some(format_token)) = (explicit, date_format) {
        if field_type != FieldType::Date {
            errors.push(token_error(
                chain,
                format_token,
                ErrorKind::ConflictingType,
                format!(
                    "a date format cannot be applied to type `{}`",
                    type_token.raw
                ),
            ));
            ok = false;
        }
    }

    let inferred = explicit
        .map(|(field_type, _)| field_type)
        .or(date_format.map(|_| FieldType::Date))
        .or(chain
            .has(|ext| matches!(ext, Extension::Gen))
            .then_some(FieldType::Generated));

    match inferred {
        Some(field_type) if ok => Some(field_type),
        Some(_) => None,
        None => {
            errors.push(
                Diagnostic::new(
                    ErrorKind::MalformedId,
                    &chain.base_name,
                    "chain has no type extension",
                )
                .with_element(&chain.element_id),
            );
            None
        }
    }
}

/// An option chain is implicitly `select`: one option, no type markers, and
/// nothing but `editable` or a track role alongside.
fn infer_option_type(
    chain: &Chain,
    options: &[&ExtensionToken],
    errors: &mut Vec<Diagnostic>,
) -> Option<FieldType> {
    let before = errors.len();
    for extra in &options[1..] {
        errors.push(token_error(
            chain,
            extra,
            ErrorKind::ConflictingType,
            format!(
                "element declares more than one select option (first was `{}`)",
                options[0].raw
            ),
        ));
    }
    for token in &chain.tokens {
        if !allowed_on_option(&token.extension) {
            errors.push(token_error(
                chain,
                token,
                ErrorKind::ConflictingType,
                format!("`{}` is not allowed on a select option", token.raw),
            ));
        }
    }
    (errors.len() == before).then_some(FieldType::Select)
}
