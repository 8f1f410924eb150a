use crate::error::ValidationError;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Largest prefix batch accepted by `POST /api/whois`.
pub const MAX_WHOIS_BATCH: usize = 100;

/// An autonomous system number as it appears in a request path.
///
/// Only ASCII digits are accepted, so the value can be placed in an upstream URL
/// as-is. Leading zeros are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asn(String);

impl Asn {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::MissingAsn);
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidAsn);
        }
        Ok(Asn(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Asn {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asn::parse(s)
    }
}

impl fmt::Display for Asn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks the request declares a JSON body.
pub fn require_json_content_type(content_type: Option<&str>) -> Result<(), ValidationError> {
    match content_type {
        Some(value) if value.to_ascii_lowercase().contains("application/json") => Ok(()),
        _ => Err(ValidationError::UnsupportedContentType),
    }
}

/// Extracts the `prefixes` batch from a `POST /api/whois` body.
pub fn parse_prefix_batch(body: &str) -> Result<Vec<String>, ValidationError> {
    let body: Value = serde_json::from_str(body).map_err(|_| ValidationError::InvalidJson)?;

    let prefixes = match body.get("prefixes") {
        None | Some(Value::Null) => return Err(ValidationError::MissingPrefixes),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ValidationError::PrefixesNotArray),
    };

    if prefixes.is_empty() {
        return Err(ValidationError::EmptyPrefixes);
    }
    if prefixes.len() > MAX_WHOIS_BATCH {
        return Err(ValidationError::TooManyPrefixes {
            max: MAX_WHOIS_BATCH,
        });
    }

    prefixes
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(prefix) => Ok(prefix.clone()),
            _ => Err(ValidationError::NonStringPrefix { index }),
        })
        .collect()
}
