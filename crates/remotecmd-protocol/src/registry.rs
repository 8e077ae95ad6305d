//! Explicit registry mapping result classes to payload decoders.
//!
//! A result's `class` field selects the decoder for its `details` section.
//! The table is populated once from [`ResultKind::ALL`]; each class decodes
//! into its own [`ResultDetails`] variant and no other class is accepted.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::listing::FileListing;
use crate::result::{ResultDetails, ResultKind};

/// Turns a raw `details` section into a typed payload.
type DetailsDecoder = fn(&str, Option<&Value>) -> Result<ResultDetails, ProtocolError>;

/// Lookup table of known result classes.
#[derive(Debug, Clone)]
pub struct ResultRegistry {
    decoders: HashMap<&'static str, DetailsDecoder>,
}

impl ResultRegistry {
    /// Registry holding every built-in [`ResultKind`].
    #[must_use]
    pub fn standard() -> Self {
        let decoders = ResultKind::ALL
            .into_iter()
            .map(|kind| (kind.id(), builtin_decoder(kind)))
            .collect();
        Self { decoders }
    }

    /// `true` when `class` has a decoder.
    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.decoders.contains_key(class)
    }

    /// Decodes `details` according to `class`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnregisteredClass`] for unknown classes and
    /// whatever the class decoder reports for malformed payloads.
    pub fn decode(&self, class: &str, details: Option<&Value>) -> Result<ResultDetails, ProtocolError> {
        let decoder = self
            .decoders
            .get(class)
            .ok_or_else(|| ProtocolError::UnregisteredClass {
                class: class.to_owned(),
            })?;
        decoder(class, details)
    }
}

const fn builtin_decoder(kind: ResultKind) -> DetailsDecoder {
    match kind {
        ResultKind::Command => decode_plain,
        ResultKind::FileListing => decode_listing,
        ResultKind::FileContent => decode_content,
    }
}

fn decode_plain(_class: &str, _details: Option<&Value>) -> Result<ResultDetails, ProtocolError> {
    Ok(ResultDetails::None)
}

fn decode_listing(class: &str, details: Option<&Value>) -> Result<ResultDetails, ProtocolError> {
    let Some(value) = details else {
        return Ok(ResultDetails::Listing(FileListing::default()));
    };
    FileListing::deserialize(value)
        .map(ResultDetails::Listing)
        .map_err(|error| invalid(class, &error))
}

#[derive(Deserialize)]
struct ContentDetails {
    #[serde(default)]
    content: String,
}

fn decode_content(class: &str, details: Option<&Value>) -> Result<ResultDetails, ProtocolError> {
    let Some(value) = details else {
        return Ok(ResultDetails::Content(String::new()));
    };
    ContentDetails::deserialize(value)
        .map(|details| ResultDetails::Content(details.content))
        .map_err(|error| invalid(class, &error))
}

fn invalid(class: &str, error: &serde_json::Error) -> ProtocolError {
    ProtocolError::InvalidDetails {
        class: class.to_owned(),
        message: error.to_string(),
    }
}
