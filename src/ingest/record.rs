//! Record parser: one raw item in, one validated `PersonRecord` out.
//!
//! An item has the shape `"Name, Street Address, City STATE"`. The parser
//! splits on literal commas, trims each field, takes the last space-separated
//! token of the third field as the state code and checks it against
//! `states::STATE_REGISTRY`.
//!
//! # City extraction
//! The service this replaced built the city by right-trimming the
//! *characters* of the state code (plus space) from the city/state field,
//! which eats trailing letters of cities such as `"PUMA MA"` → `"PU"`.
//! `CityTrim::Exact` removes only the trailing `" STATE"` token and is the
//! default; `CityTrim::CharacterSet` reproduces the old output byte for byte.

use serde::Deserialize;

use crate::model::{AddressError, PersonRecord};
use crate::states;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How the city is cut out of the `"City STATE"` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CityTrim {
    /// Remove exactly the trailing state-code token and its separating space.
    #[default]
    Exact,
    /// Right-trim every character that occurs in the state code or is a space.
    CharacterSet,
}

impl std::str::FromStr for CityTrim {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(CityTrim::Exact),
            "character-set" | "charset" => Ok(CityTrim::CharacterSet),
            other => Err(format!("unknown city trim mode '{}'", other)),
        }
    }
}

/// Parser knobs, copied into every request handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub city_trim: CityTrim,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses a single raw item.
///
/// Returns `Ok(None)` for a blank or whitespace-only item (skip, no error),
/// `Ok(Some(record))` for a valid item, and an `AddressError` otherwise:
/// - `MalformedItem` if the item does not have exactly three comma-separated
///   fields, or if its name or street is empty after trimming;
/// - `UnknownState` if the last token of the third field is not whitelisted.
pub fn parse_item(raw: &str, options: ParseOptions) -> Result<Option<PersonRecord>, AddressError> {
    let fields: Vec<&str> = raw.split(',').collect();

    if fields.len() == 1 {
        if fields[0].trim().is_empty() {
            return Ok(None);
        }
        return Err(malformed(raw, "no comma-separated fields"));
    }
    if fields.len() != 3 {
        return Err(malformed(
            raw,
            &format!("expected 3 comma-separated fields, found {}", fields.len()),
        ));
    }

    let name = fields[0].trim();
    let street_address = fields[1].trim();
    let location = fields[2].trim();

    if name.is_empty() {
        return Err(malformed(raw, "empty name"));
    }
    if street_address.is_empty() {
        return Err(malformed(raw, "empty street address"));
    }

    let (city, state_code) = split_location(location, options.city_trim);
    if !states::is_known_state(state_code) {
        return Err(AddressError::UnknownState {
            item: raw.to_string(),
            state: state_code.to_string(),
        });
    }

    Ok(Some(PersonRecord {
        name: name.to_string(),
        street_address: street_address.to_string(),
        city: city.to_string(),
        state_code: state_code.to_string(),
    }))
}

/// Splits a trimmed `"City STATE"` field into `(city, state)`.
///
/// The state is everything after the last single space; a field without a
/// space is all state and no city.
pub fn split_location(location: &str, trim: CityTrim) -> (&str, &str) {
    let (exact_city, state) = match location.rsplit_once(' ') {
        Some((city, state)) => (city, state),
        None => ("", location),
    };

    let city = match trim {
        CityTrim::Exact => exact_city,
        CityTrim::CharacterSet => {
            location.trim_end_matches(|c: char| c == ' ' || state.contains(c))
        }
    };

    (city, state)
}

fn malformed(raw: &str, reason: &str) -> AddressError {
    AddressError::MalformedItem {
        item: raw.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
