//! Intermediate representation produced by the classifier.
//! One `Chain` per raw element; consumed by the validator and aggregator.

use crate::date_format::DateFormat;
use crate::model::{Dependency, FieldType};

/// A typed extension, one per dot-separated token after the base name.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    /// `text`, `textarea`, `upload`, `file`, `sign`, `date`, `email`
    Type(FieldType),
    /// `gen`: random-code generation, needs a `max_<N>` alongside.
    Gen,
    /// `max_<N>`
    Max(u32),
    /// `date_<FORMAT>`, which doubles as the `date` type marker.
    DateFormat(DateFormat),
    /// `select_<KEY>`
    SelectOption(String),
    /// `depends_<TARGET>` with an optional `[w..]`/`[ch..]` selector.
    Depends(Dependency),
    /// `tracking_id`
    TrackingId,
    /// `link_<URL>`, always the rest of the id.
    Link(String),
    /// `editable`
    Editable,
    /// `track_<ROLE>`, must be last.
    TrackRole(String),
}

impl Extension {
    /// Short keyword used in diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            Extension::Type(t) => t.as_str(),
            Extension::Gen => "gen",
            Extension::Max(_) => "max",
            Extension::DateFormat(_) => "date format",
            Extension::SelectOption(_) => "select",
            Extension::Depends(_) => "depends",
            Extension::TrackingId => "tracking_id",
            Extension::Link(_) => "link",
            Extension::Editable => "editable",
            Extension::TrackRole(_) => "track",
        }
    }
}

/// A classified token together with its source text and chain position.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionToken {
    pub extension: Extension,
    pub raw: String,
    /// 0-based position within the chain.
    pub position: usize,
}

/// The classified form of one raw element.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    /// Index of the element in the input sequence.
    pub element_index: usize,
    pub element_id: String,
    pub base_name: String,
    pub default_text: String,
    pub tokens: Vec<ExtensionToken>,
}

impl Chain {
    pub fn find(&self, pred: impl Fn(&Extension) -> bool) -> Option<&ExtensionToken> {
        self.tokens.iter().find(|token| pred(&token.extension))
    }

    pub fn has(&self, pred: impl Fn(&Extension) -> bool) -> bool {
        self.find(pred).is_some()
    }

    pub fn max_length(&self) -> Option<u32> {
        self.tokens.iter().find_map(|token| match token.extension {
            Extension::Max(n) => Some(n),
            _ => None,
        })
    }

    pub fn date_format(&self) -> Option<&DateFormat> {
        self.tokens.iter().find_map(|token| match &token.extension {
            Extension::DateFormat(format) => Some(format),
            _ => None,
        })
    }

    pub fn dependency(&self) -> Option<&Dependency> {
        self.tokens.iter().find_map(|token| match &token.extension {
            Extension::Depends(dep) => Some(dep),
            _ => None,
        })
    }

    pub fn link(&self) -> Option<&str> {
        self.tokens.iter().find_map(|token| match &token.extension {
            Extension::Link(url) => Some(url.as_str()),
            _ => None,
        })
    }

    pub fn track_role(&self) -> Option<&str> {
        self.tokens.iter().find_map(|token| match &token.extension {
            Extension::TrackRole(role) => Some(role.as_str()),
            _ => None,
        })
    }

    pub fn option_key(&self) -> Option<&str> {
        self.tokens.iter().find_map(|token| match &token.extension {
            Extension::SelectOption(key) => Some(key.as_str()),
            _ => None,
        })
    }
}
