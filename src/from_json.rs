use crate::error::LoadError;
use crate::model::RawElement;
use serde::Deserialize;

/// Accepted shapes of an element list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ElementList {
    Bare(Vec<RawElement>),
    Wrapped { elements: Vec<RawElement> },
}

/// Deserialize the document reader's output: either a JSON array of
/// `{"id", "defaultText"}` objects, or an object holding that array under
/// `"elements"`. Order is preserved.
pub fn elements_from_json(input: &str) -> Result<Vec<RawElement>, LoadError> {
    let list: ElementList = serde_json::from_str(input)?;
    Ok(match list {
        ElementList::Bare(elements) => elements,
        ElementList::Wrapped { elements } => elements,
    })
}
