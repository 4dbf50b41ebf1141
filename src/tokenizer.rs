use crate::error::{Diagnostic, ErrorKind};

/// Prefix of the one extension that swallows the rest of the id.
const LINK_PREFIX: &str = "link_";

/// One raw extension token, still unclassified.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub text: String,
    /// 0-based position within the chain (the base name is not counted).
    pub position: usize,
    /// Byte offset of the token within the id.
    pub offset: usize,
}

/// An id split into its base name and extension tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedId {
    pub base_name: String,
    pub tokens: Vec<RawToken>,
}

/// Tokenizer state: tracks position in the id.
struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

/// Split an element id into a base name and its ordered extension tokens.
///
/// Tokens are dot-separated, except that a `link_` token runs to the end of
/// the id so URLs keep their dots.
pub fn tokenize(id: &str) -> Result<TokenizedId, Diagnostic> {
    if id.trim().is_empty() {
        return Err(Diagnostic::new(
            ErrorKind::MalformedId,
            "",
            "element id is empty",
        ));
    }

    let mut tokenizer = Tokenizer { input: id, pos: 0 };
    let base_name = tokenizer.take_segment();
    if base_name.is_empty() {
        return Err(Diagnostic::new(
            ErrorKind::MalformedId,
            "",
            format!("element id `{}` has an empty base name", id),
        )
        .with_element(id));
    }

    let mut tokens = Vec::new();
    while tokenizer.eat_char('.') {
        let offset = tokenizer.pos;
        let text = if tokenizer.starts_with(LINK_PREFIX) {
            tokenizer.take_rest()
        } else {
            tokenizer.take_segment()
        };
        if text.is_empty() {
            return Err(tokenizer.error(
                base_name,
                format!("empty extension at offset {}", offset),
            ));
        }
        tokens.push(RawToken {
            text: text.to_string(),
            position: tokens.len(),
            offset,
        });
    }

    if tokens.is_empty() {
        return Err(tokenizer.error(
            base_name,
            "no extensions after the base name; a field type is required".to_string(),
        ));
    }

    Ok(TokenizedId {
        base_name: base_name.to_string(),
        tokens,
    })
}

impl<'a> Tokenizer<'a> {
    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    fn eat_char(&mut self, ch: char) -> bool {
        if self.remaining().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume up to (not including) the next `.`.
    fn take_segment(&mut self) -> &'a str {
        let rest = self.remaining();
        let len = rest.find('.').unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn take_rest(&mut self) -> &'a str {
        let rest = self.remaining();
        self.pos = self.input.len();
        rest
    }

    fn error(&self, base_name: &str, message: String) -> Diagnostic {
        Diagnostic::new(ErrorKind::MalformedId, base_name, message).with_element(self.input)
    }
}
