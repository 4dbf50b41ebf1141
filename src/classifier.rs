use crate::ast::{Chain, Extension, ExtensionToken};
use crate::date_format;
use crate::error::{Diagnostic, ErrorKind};
use crate::model::{Dependency, FieldType, RawElement};
use crate::sync::Extraction;
use crate::tokenizer::{self, RawToken};
use regex::Regex;
use std::sync::OnceLock;

/// Parameterised extension families, in match order.
const DATE_PREFIX: &str = "date_";
const MAX_PREFIX: &str = "max_";
const SELECT_PREFIX: &str = "select_";
const DEPENDS_PREFIX: &str = "depends_";
const LINK_PREFIX: &str = "link_";
const TRACK_PREFIX: &str = "track_";

/// `TARGET` or `TARGET[w2]` / `TARGET[ch1-4]` after `depends_`.
fn depends_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([^\[\]]+)(?:\[(w|ch)([^\[\]]+)\])?$").expect("depends pattern is valid")
    })
}

/// Why a single token could not be classified.
struct Rejection {
    kind: ErrorKind,
    message: String,
}

impl Rejection {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Rejection {
            kind,
            message: message.into(),
        }
    }
}

/// Tokenize and classify one raw element.
///
/// Every token is classified even after a failure, so a single element can
/// report several bad tokens at once.
pub fn classify_element(
    element_index: usize,
    element: &RawElement,
) -> Result<Chain, Vec<Diagnostic>> {
    let tokenized = tokenizer::tokenize(&element.id).map_err(|diag| vec![diag])?;

    let mut tokens = Vec::with_capacity(tokenized.tokens.len());
    let mut errors = Vec::new();
    for raw in &tokenized.tokens {
        match classify_token(&raw.text) {
            Ok(extension) => tokens.push(ExtensionToken {
                extension,
                raw: raw.text.clone(),
                position: raw.position,
            }),
            Err(rejection) => {
                errors.push(reject(&tokenized.base_name, &element.id, raw, rejection))
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    tracing::debug!(
        base_name = %tokenized.base_name,
        tokens = tokens.len(),
        "classified chain"
    );

    Ok(Chain {
        element_index,
        element_id: element.id.clone(),
        base_name: tokenized.base_name,
        default_text: element.default_text.clone(),
        tokens,
    })
}

fn reject(base_name: &str, element_id: &str, raw: &RawToken, rejection: Rejection) -> Diagnostic {
    Diagnostic::new(rejection.kind, base_name, rejection.message)
        .with_element(element_id)
        .with_token(raw.text.clone(), raw.position)
}

/// Map one token to its extension. Exact keywords are tried before the
/// prefixed families, so `tracking_id` is never read as `track_<ROLE>`.
fn classify_token(token: &str) -> Result<Extension, Rejection> {
    match token {
        "tracking_id" => return Ok(Extension::TrackingId),
        "editable" => return Ok(Extension::Editable),
        "gen" => return Ok(Extension::Gen),
        _ => {}
    }
    if let Some(field_type) = FieldType::from_keyword(token) {
        return Ok(Extension::Type(field_type));
    }

    if let Some(raw) = token.strip_prefix(DATE_PREFIX) {
        return date_format::translate(raw)
            .map(Extension::DateFormat)
            .map_err(|err| Rejection::new(ErrorKind::BadDateFormat, err.to_string()));
    }
    if let Some(raw) = token.strip_prefix(MAX_PREFIX) {
        return classify_max(raw);
    }
    if let Some(key) = token.strip_prefix(SELECT_PREFIX) {
        return non_empty(key, "select option key").map(Extension::SelectOption);
    }
    if let Some(raw) = token.strip_prefix(DEPENDS_PREFIX) {
        return classify_depends(raw);
    }
    if let Some(url) = token.strip_prefix(LINK_PREFIX) {
        return non_empty(url, "link URL").map(Extension::Link);
    }
    if let Some(role) = token.strip_prefix(TRACK_PREFIX) {
        return non_empty(role, "track role").map(Extension::TrackRole);
    }

    Err(Rejection::new(
        ErrorKind::UnknownExtension,
        format!("unrecognized extension `{}`", token),
    ))
}

fn non_empty(payload: &str, what: &str) -> Result<String, Rejection> {
    if payload.is_empty() {
        Err(Rejection::new(
            ErrorKind::MalformedId,
            format!("{} is empty", what),
        ))
    } else {
        Ok(payload.to_string())
    }
}

fn classify_max(raw: &str) -> Result<Extension, Rejection> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Rejection::new(
            ErrorKind::InvalidConstraint,
            format!("max length `{}` is not a positive integer", raw),
        ));
    }
    raw.parse::<u32>().map(Extension::Max).map_err(|_| {
        Rejection::new(
            ErrorKind::InvalidConstraint,
            format!("max length `{}` is out of range", raw),
        )
    })
}

fn classify_depends(raw: &str) -> Result<Extension, Rejection> {
    let malformed = || {
        Rejection::new(
            ErrorKind::MalformedId,
            format!("malformed dependency `{}`", raw),
        )
    };
    let caps = depends_re().captures(raw).ok_or_else(malformed)?;
    let extract = match (caps.get(2), caps.get(3)) {
        (Some(kind), Some(pattern)) => {
            Some(Extraction::parse(kind.as_str(), pattern.as_str()).ok_or_else(malformed)?)
        }
        _ => None,
    };
    Ok(Extension::Depends(Dependency {
        target: caps[1].to_string(),
        extract,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(token: &str) -> Extension {
        match classify_token(token) {
            Ok(ext) => ext,
            Err(rejection) => panic!("`{}` rejected: {}", token, rejection.message),
        }
    }

    fn rejected(token: &str) -> ErrorKind {
        match classify_token(token) {
            Ok(ext) => panic!("`{}` unexpectedly classified as {:?}", token, ext),
            Err(rejection) => rejection.kind,
        }
    }

    #[test]
    fn keywords() {
        assert_eq!(classify("text"), Extension::Type(FieldType::Text));
        assert_eq!(classify("textarea"), Extension::Type(FieldType::Textarea));
        assert_eq!(classify("date"), Extension::Type(FieldType::Date));
        assert_eq!(classify("gen"), Extension::Gen);
        assert_eq!(classify("editable"), Extension::Editable);
    }

    #[test]
    fn tracking_id_is_not_a_track_role() {
        assert_eq!(classify("tracking_id"), Extension::TrackingId);
        assert_eq!(classify("track_id"), Extension::TrackRole("id".to_string()));
    }

    #[test]
    fn parameterised_families() {
        assert_eq!(classify("max_12"), Extension::Max(12));
        assert_eq!(
            classify("select_New_York"),
            Extension::SelectOption("New_York".to_string())
        );
        assert_eq!(
            classify("link_https://example.com/track"),
            Extension::Link("https://example.com/track".to_string())
        );
        assert_eq!(
            classify("track_status"),
            Extension::TrackRole("status".to_string())
        );
        match classify("date_MM/DD/YYYY") {
            Extension::DateFormat(format) => assert_eq!(format.template, "MM/DD/YYYY"),
            other => panic!("expected a date format, got {:?}", other),
        }
    }

    #[test]
    fn depends_with_and_without_selector() {
        assert_eq!(
            classify("depends_Country"),
            Extension::Depends(Dependency {
                target: "Country".to_string(),
                extract: None,
            })
        );
        assert_eq!(
            classify("depends_full_name[ch1-4]"),
            Extension::Depends(Dependency {
                target: "full_name".to_string(),
                extract: Some(Extraction::CharRange { start: 1, end: 4 }),
            })
        );
        assert_eq!(rejected("depends_name[x1]"), ErrorKind::MalformedId);
        assert_eq!(rejected("depends_"), ErrorKind::MalformedId);
    }

    #[test]
    fn bad_payloads() {
        assert_eq!(rejected("max_abc"), ErrorKind::InvalidConstraint);
        assert_eq!(rejected("max_99999999999"), ErrorKind::InvalidConstraint);
        assert_eq!(rejected("date_Q"), ErrorKind::BadDateFormat);
        assert_eq!(rejected("select_"), ErrorKind::MalformedId);
        assert_eq!(rejected("track_"), ErrorKind::MalformedId);
        assert_eq!(rejected("bogus"), ErrorKind::UnknownExtension);
        assert_eq!(rejected("Text"), ErrorKind::UnknownExtension);
    }

    #[test]
    fn element_reports_every_bad_token() {
        let element = RawElement::new("code.bogus.gen.nope", "");
        let errors = classify_element(0, &element).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].raw_token.as_deref(), Some("bogus"));
        assert_eq!(errors[0].token_index, Some(0));
        assert_eq!(errors[1].raw_token.as_deref(), Some("nope"));
        assert_eq!(errors[1].token_index, Some(2));
        assert!(errors
            .iter()
            .all(|e| e.element_id.as_deref() == Some("code.bogus.gen.nope")));
    }
}
