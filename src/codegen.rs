use crate::model::ResolvedField;
use rand::Rng;
use std::collections::BTreeMap;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draw a `len`-character code from `A-Z0-9`.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// A fresh code for every generated field, sized by its max length.
///
/// Fields are visited in order, so a seeded generator gives the same codes
/// for the same field set.
pub fn generate_values<R: Rng + ?Sized>(
    fields: &[ResolvedField],
    rng: &mut R,
) -> BTreeMap<String, String> {
    fields
        .iter()
        .filter(|field| field.constraints.generated)
        .filter_map(|field| {
            let len = field.constraints.max_length? as usize;
            Some((field.base_name.clone(), generate_code(rng, len)))
        })
        .collect()
}
