//! The `date_<FORMAT>` mini-language.
//!
//! A raw format such as `MMMM_D,_YYYY` decodes underscores to spaces and
//! keeps every other non-letter verbatim, giving the display template
//! `MMMM D, YYYY`. Letter runs must be made of lexicon tokens.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateFormatError {
    #[error("date format is empty")]
    Empty,

    #[error("unrecognized date token `{run}` at offset {offset}")]
    UnknownToken { run: String, offset: usize },

    #[error("`{value}` is not a canonical YYYY-MM-DD date")]
    InvalidValue { value: String },
}

/// A formatting token, serialized as its pattern text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateToken {
    #[serde(rename = "YYYY")]
    Year,
    #[serde(rename = "YY")]
    YearShort,
    #[serde(rename = "MMMM")]
    MonthName,
    #[serde(rename = "MMM")]
    MonthAbbr,
    #[serde(rename = "MM")]
    MonthPadded,
    #[serde(rename = "M")]
    Month,
    #[serde(rename = "DD")]
    DayPadded,
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "dddd")]
    WeekdayName,
    #[serde(rename = "ddd")]
    WeekdayAbbr,
    #[serde(rename = "HH")]
    Hour24Padded,
    #[serde(rename = "H")]
    Hour24,
    #[serde(rename = "hh")]
    Hour12Padded,
    #[serde(rename = "h")]
    Hour12,
    #[serde(rename = "mm")]
    MinutePadded,
    #[serde(rename = "m")]
    Minute,
    #[serde(rename = "ss")]
    SecondPadded,
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "A")]
    MeridiemUpper,
    #[serde(rename = "a")]
    MeridiemLower,
}

/// Lexicon, longest pattern first so `M` never matches inside `MM`.
const LEXICON: &[(&str, DateToken)] = &[
    ("YYYY", DateToken::Year),
    ("MMMM", DateToken::MonthName),
    ("dddd", DateToken::WeekdayName),
    ("MMM", DateToken::MonthAbbr),
    ("ddd", DateToken::WeekdayAbbr),
    ("YY", DateToken::YearShort),
    ("MM", DateToken::MonthPadded),
    ("DD", DateToken::DayPadded),
    ("HH", DateToken::Hour24Padded),
    ("hh", DateToken::Hour12Padded),
    ("mm", DateToken::MinutePadded),
    ("ss", DateToken::SecondPadded),
    ("M", DateToken::Month),
    ("D", DateToken::Day),
    ("H", DateToken::Hour24),
    ("h", DateToken::Hour12),
    ("m", DateToken::Minute),
    ("s", DateToken::Second),
    ("A", DateToken::MeridiemUpper),
    ("a", DateToken::MeridiemLower),
];

impl DateToken {
    fn render(self, dt: &NaiveDateTime) -> String {
        let (pm, hour12) = dt.hour12();
        match self {
            DateToken::Year => format!("{:04}", dt.year()),
            DateToken::YearShort => format!("{:02}", dt.year().rem_euclid(100)),
            DateToken::MonthName => dt.format("%B").to_string(),
            DateToken::MonthAbbr => dt.format("%b").to_string(),
            DateToken::MonthPadded => format!("{:02}", dt.month()),
            DateToken::Month => dt.month().to_string(),
            DateToken::DayPadded => format!("{:02}", dt.day()),
            DateToken::Day => dt.day().to_string(),
            DateToken::WeekdayName => dt.format("%A").to_string(),
            DateToken::WeekdayAbbr => dt.format("%a").to_string(),
            DateToken::Hour24Padded => format!("{:02}", dt.hour()),
            DateToken::Hour24 => dt.hour().to_string(),
            DateToken::Hour12Padded => format!("{:02}", hour12),
            DateToken::Hour12 => hour12.to_string(),
            DateToken::MinutePadded => format!("{:02}", dt.minute()),
            DateToken::Minute => dt.minute().to_string(),
            DateToken::SecondPadded => format!("{:02}", dt.second()),
            DateToken::Second => dt.second().to_string(),
            DateToken::MeridiemUpper => (if pm { "PM" } else { "AM" }).to_string(),
            DateToken::MeridiemLower => (if pm { "pm" } else { "am" }).to_string(),
        }
    }
}

/// One piece of a display template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DateSegment {
    Literal(String),
    Token(DateToken),
}

/// A translated `date_<FORMAT>` extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFormat {
    /// The format exactly as it appeared after `date_`.
    pub raw: String,
    /// Display template with underscores decoded, e.g. `MMMM D, YYYY`.
    pub template: String,
    pub tokens: Vec<DateSegment>,
}

/// Translate a raw underscore-encoded format into a display template.
pub fn translate(raw: &str) -> Result<DateFormat, DateFormatError> {
    if raw.is_empty() {
        return Err(DateFormatError::Empty);
    }
    let template = raw.replace('_', " ");
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut pos = 0;

    while let Some(ch) = template[pos..].chars().next() {
        if !ch.is_alphabetic() {
            literal.push(ch);
            pos += ch.len_utf8();
            continue;
        }
        let rest = &template[pos..];
        match LEXICON.iter().find(|(pattern, _)| rest.starts_with(*pattern)) {
            Some((pattern, token)) => {
                if !literal.is_empty() {
                    tokens.push(DateSegment::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(DateSegment::Token(*token));
                pos += pattern.len();
            }
            None => {
                let run: String = rest.chars().take_while(|c| c.is_alphabetic()).collect();
                return Err(DateFormatError::UnknownToken { run, offset: pos });
            }
        }
    }
    if !literal.is_empty() {
        tokens.push(DateSegment::Literal(literal));
    }

    Ok(DateFormat {
        raw: raw.to_string(),
        template,
        tokens,
    })
}

impl DateFormat {
    /// Render a canonical `YYYY-MM-DD` value (optionally with a time part)
    /// through this template.
    pub fn render(&self, canonical: &str) -> Result<String, DateFormatError> {
        let dt = parse_canonical(canonical).ok_or_else(|| DateFormatError::InvalidValue {
            value: canonical.to_string(),
        })?;
        let mut out = String::new();
        for segment in &self.tokens {
            match segment {
                DateSegment::Literal(text) => out.push_str(text),
                DateSegment::Token(token) => out.push_str(&token.render(&dt)),
            }
        }
        Ok(out)
    }
}

fn parse_canonical(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(raw: &str, canonical: &str) -> String {
        translate(raw).unwrap().render(canonical).unwrap()
    }

    #[test]
    fn slashes_pass_through() {
        assert_eq!(render("MM/DD/YYYY", "2025-01-10"), "01/10/2025");
    }

    #[test]
    fn underscores_decode_to_spaces() {
        let format = translate("MMMM_D,_YYYY").unwrap();
        assert_eq!(format.template, "MMMM D, YYYY");
        assert_eq!(format.render("2025-01-10").unwrap(), "January 10, 2025");
    }

    #[test]
    fn longest_match_first() {
        let format = translate("MMM-M").unwrap();
        assert_eq!(
            format.tokens,
            vec![
                DateSegment::Token(DateToken::MonthAbbr),
                DateSegment::Literal("-".to_string()),
                DateSegment::Token(DateToken::Month),
            ]
        );
    }

    #[test]
    fn weekday_and_time_tokens() {
        assert_eq!(
            render("dddd_hh:mm_A", "2025-01-10T15:04:05"),
            "Friday 03:04 PM"
        );
        assert_eq!(render("ddd_H:m:s_a", "2025-01-10 09:05:07"), "Fri 9:5:7 am");
        assert_eq!(render("YY-MM-DD", "2025-01-10"), "25-01-10");
    }

    #[test]
    fn date_only_value_is_midnight() {
        assert_eq!(render("HH:mm_A", "2025-01-10"), "00:00 AM");
    }

    #[test]
    fn unknown_letters_are_rejected() {
        assert_eq!(
            translate("DD_Mon_YYYY"),
            Err(DateFormatError::UnknownToken {
                run: "on".to_string(),
                offset: 4,
            })
        );
        assert_eq!(
            translate("Q"),
            Err(DateFormatError::UnknownToken {
                run: "Q".to_string(),
                offset: 0,
            })
        );
        assert_eq!(translate(""), Err(DateFormatError::Empty));
    }

    #[test]
    fn bad_canonical_value() {
        let format = translate("MM/DD/YYYY").unwrap();
        assert!(matches!(
            format.render("10/01/2025"),
            Err(DateFormatError::InvalidValue { .. })
        ));
    }
}
