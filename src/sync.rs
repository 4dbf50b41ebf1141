//! Value synchronisation for `depends_<TARGET>` fields.
//!
//! A dependent field shows its target's value, optionally narrowed by a
//! selector: `[w2]` is the second word, `[ch1]` the first character,
//! `[ch1-4]` an inclusive range, `[ch1,3,5]` a pick list. Indices are 1-based.

use crate::model::ResolvedField;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Extraction {
    Word { index: usize },
    Char { index: usize },
    CharRange { start: usize, end: usize },
    CharPicks { indices: Vec<usize> },
}

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)-(\d+)$").expect("range pattern is valid"))
}

fn picks_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(?:,\d+)+$").expect("picks pattern is valid"))
}

fn one_based(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok().filter(|n| *n >= 1)
}

impl Extraction {
    /// Parse a selector body: `kind` is `w` or `ch`, `pattern` what follows.
    pub fn parse(kind: &str, pattern: &str) -> Option<Self> {
        match kind {
            "w" => one_based(pattern).map(|index| Extraction::Word { index }),
            "ch" => {
                if let Some(caps) = range_re().captures(pattern) {
                    let start = one_based(&caps[1])?;
                    let end = one_based(&caps[2])?;
                    (start <= end).then_some(Extraction::CharRange { start, end })
                } else if picks_re().is_match(pattern) {
                    pattern
                        .split(',')
                        .map(one_based)
                        .collect::<Option<Vec<_>>>()
                        .map(|indices| Extraction::CharPicks { indices })
                } else {
                    one_based(pattern).map(|index| Extraction::Char { index })
                }
            }
            _ => None,
        }
    }

    /// Apply the selector. Out-of-range positions contribute nothing.
    pub fn apply(&self, text: &str) -> String {
        match self {
            Extraction::Word { index } => text
                .split_whitespace()
                .nth(index - 1)
                .unwrap_or_default()
                .to_string(),
            Extraction::Char { index } => {
                text.chars().nth(index - 1).map(String::from).unwrap_or_default()
            }
            Extraction::CharRange { start, end } => text
                .chars()
                .skip(start - 1)
                .take(end.saturating_sub(*start).saturating_add(1))
                .collect(),
            Extraction::CharPicks { indices } => indices
                .iter()
                .filter_map(|i| text.chars().nth(i - 1))
                .collect(),
        }
    }
}

/// Image payloads are copied whole; slicing them would corrupt them.
fn is_opaque_payload(value: &str) -> bool {
    value.starts_with("data:image/") || value.starts_with("blob:")
}

/// Compute the value every field should display, given the values the user
/// entered. Non-dependent fields take their entered value (falling back to
/// their default); dependent fields take their target's computed value,
/// narrowed by the selector, so chains of dependencies propagate.
pub fn compute_values(
    fields: &[ResolvedField],
    entered: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let by_name: HashMap<&str, &ResolvedField> = fields
        .iter()
        .map(|field| (field.base_name.as_str(), field))
        .collect();
    let mut computed = BTreeMap::new();
    for field in fields {
        let mut visiting = HashSet::new();
        compute_one(
            &field.base_name,
            &by_name,
            entered,
            &mut computed,
            &mut visiting,
        );
    }
    computed
}

fn compute_one(
    name: &str,
    by_name: &HashMap<&str, &ResolvedField>,
    entered: &BTreeMap<String, String>,
    computed: &mut BTreeMap<String, String>,
    visiting: &mut HashSet<String>,
) -> String {
    if let Some(value) = computed.get(name) {
        return value.clone();
    }
    let field = match by_name.get(name) {
        Some(field) => *field,
        None => return entered.get(name).cloned().unwrap_or_default(),
    };
    let own = entered
        .get(name)
        .cloned()
        .unwrap_or_else(|| field.default_value.clone());

    let value = match &field.depends_on {
        // A cycle can only reach here when the caller skipped resolution.
        Some(dep) if visiting.insert(name.to_string()) => {
            let source = compute_one(&dep.target, by_name, entered, computed, visiting);
            match &dep.extract {
                Some(extract) if !is_opaque_payload(&source) => extract.apply(&source),
                _ => source,
            }
        }
        _ => own,
    };
    computed.insert(name.to_string(), value.clone());
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolve_fields, RawElement};

    #[test]
    fn parse_selectors() {
        assert_eq!(Extraction::parse("w", "2"), Some(Extraction::Word { index: 2 }));
        assert_eq!(Extraction::parse("ch", "3"), Some(Extraction::Char { index: 3 }));
        assert_eq!(
            Extraction::parse("ch", "1-4"),
            Some(Extraction::CharRange { start: 1, end: 4 })
        );
        assert_eq!(
            Extraction::parse("ch", "1,2,5"),
            Some(Extraction::CharPicks {
                indices: vec![1, 2, 5]
            })
        );
        assert_eq!(Extraction::parse("ch", "4-1"), None);
        assert_eq!(Extraction::parse("w", "0"), None);
        assert_eq!(Extraction::parse("x", "1"), None);
        assert_eq!(Extraction::parse("ch", "a"), None);
    }

    #[test]
    fn apply_selectors() {
        assert_eq!(Extraction::Word { index: 2 }.apply("Jane  Q Public"), "Q");
        assert_eq!(Extraction::Word { index: 9 }.apply("Jane"), "");
        assert_eq!(Extraction::Char { index: 1 }.apply("Jane"), "J");
        assert_eq!(Extraction::CharRange { start: 2, end: 3 }.apply("Jane"), "an");
        assert_eq!(Extraction::CharRange { start: 3, end: 10 }.apply("Jane"), "ne");
        assert_eq!(
            Extraction::CharPicks {
                indices: vec![1, 3, 9]
            }
            .apply("Jane"),
            "Jn"
        );
    }

    #[test]
    fn huge_range_end_reads_to_the_end() {
        let extract = Extraction::parse("ch", &format!("2-{}", usize::MAX)).unwrap();
        assert_eq!(extract.apply("Jane"), "ane");

        let resolution = resolve_fields(&[
            RawElement::new("full.text", "Jane Doe"),
            RawElement::new(format!("part.text.depends_full[ch2-{}]", usize::MAX), ""),
        ]);
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
        let values = compute_values(&resolution.fields, &BTreeMap::new());
        assert_eq!(values["part"], "ane Doe");
    }

    #[test]
    fn dependents_follow_their_targets() {
        let resolution = resolve_fields(&[
            RawElement::new("full_name.text", "Jane Doe"),
            RawElement::new("first.text.depends_full_name[w1]", ""),
            RawElement::new("initial.text.depends_first[ch1]", ""),
            RawElement::new("copy.text.depends_full_name", "ignored"),
        ]);
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);

        let mut entered = BTreeMap::new();
        entered.insert("full_name".to_string(), "John Smith".to_string());
        entered.insert("initial".to_string(), "Z".to_string());
        let values = compute_values(&resolution.fields, &entered);

        assert_eq!(values["full_name"], "John Smith");
        assert_eq!(values["first"], "John");
        assert_eq!(values["initial"], "J");
        assert_eq!(values["copy"], "John Smith");
    }

    #[test]
    fn defaults_when_nothing_entered() {
        let resolution = resolve_fields(&[
            RawElement::new("full_name.text", "Jane Doe"),
            RawElement::new("last.text.depends_full_name[w2]", ""),
        ]);
        let values = compute_values(&resolution.fields, &BTreeMap::new());
        assert_eq!(values["last"], "Doe");
    }

    #[test]
    fn image_payloads_are_not_sliced() {
        let resolution = resolve_fields(&[
            RawElement::new("photo.upload", ""),
            RawElement::new("thumb.upload.depends_photo[ch1-3]", ""),
        ]);
        let mut entered = BTreeMap::new();
        entered.insert("photo".to_string(), "data:image/png;base64,AAAA".to_string());
        let values = compute_values(&resolution.fields, &entered);
        assert_eq!(values["thumb"], "data:image/png;base64,AAAA");
    }
}
