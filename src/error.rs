use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// How a diagnostic affects the field it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The named field is suppressed from the resolved output.
    Error,
    /// Informational; the field still resolves.
    Warning,
}

/// The closed set of problems resolution can report.
///
/// Serializes as the stable kebab-case code returned by [`ErrorKind::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    MalformedId,
    UnknownExtension,
    BadDateFormat,
    ChainOrder,
    ConflictingType,
    DuplicateOption,
    MissingDependencyTarget,
    DependencyCycle,
    DuplicateTrackingId,
    MissingPrerequisite,
    InvalidConstraint,
    UnanchoredLink,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::MalformedId => "malformed-id",
            ErrorKind::UnknownExtension => "unknown-extension",
            ErrorKind::BadDateFormat => "bad-date-format",
            ErrorKind::ChainOrder => "chain-order",
            ErrorKind::ConflictingType => "conflicting-type",
            ErrorKind::DuplicateOption => "duplicate-option",
            ErrorKind::MissingDependencyTarget => "missing-dependency-target",
            ErrorKind::DependencyCycle => "dependency-cycle",
            ErrorKind::DuplicateTrackingId => "duplicate-tracking-id",
            ErrorKind::MissingPrerequisite => "missing-prerequisite",
            ErrorKind::InvalidConstraint => "invalid-constraint",
            ErrorKind::UnanchoredLink => "unanchored-link",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ErrorKind::UnanchoredLink => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A problem found while resolving one chain, one base-name group, or the
/// whole field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Base name of the field the problem belongs to.
    pub base_name: String,
    /// Raw id of the element that produced the problem, if it came from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// The offending extension token, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_token: Option<String>,
    /// 0-based position of `raw_token` within the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_index: Option<usize>,
    #[serde(rename = "errorKind")]
    pub kind: ErrorKind,
    pub severity: Severity,
    /// Every base name taking part in a whole-set problem (cycle members,
    /// competing tracking-id fields).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub involved: Vec<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, base_name: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            base_name: base_name.into(),
            element_id: None,
            raw_token: None,
            token_index: None,
            kind,
            severity: kind.severity(),
            involved: Vec::new(),
            message: message.into(),
        }
    }

    pub fn with_element(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    pub fn with_token(mut self, raw_token: impl Into<String>, token_index: usize) -> Self {
        self.raw_token = Some(raw_token.into());
        self.token_index = Some(token_index);
        self
    }

    pub fn with_involved(mut self, involved: Vec<String>) -> Self {
        self.involved = involved;
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.raw_token, self.token_index) {
            (Some(token), Some(index)) => write!(
                f,
                "{}[{}] `{}`: {} ({})",
                self.base_name,
                index,
                token,
                self.message,
                self.code()
            ),
            _ => write!(f, "{}: {} ({})", self.base_name, self.message, self.code()),
        }
    }
}

/// Failure of a whole resolution pass.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Strict mode turns any diagnostic into a failure of the whole document.
    #[error("strict resolution failed with {} diagnostic(s)", .diagnostics.len())]
    Strict { diagnostics: Vec<Diagnostic> },
}

/// Errors reading inputs or configuration from outside the core.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read standard input: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("invalid element list: {0}")]
    Elements(#[from] serde_json::Error),

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
