//! Command results and their variant-specific payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::listing::FileListing;

/// Outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ResultStatus {
    /// The command completed; encoded as `1`.
    Success,
    /// The command failed; encoded as `0`.
    Failure,
}

impl ResultStatus {
    /// Numeric wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 1,
            Self::Failure => 0,
        }
    }

    /// Decodes a wire code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Success),
            0 => Some(Self::Failure),
            _ => None,
        }
    }
}

impl From<ResultStatus> for u8 {
    fn from(status: ResultStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for ResultStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("invalid result status code {code}"))
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        })
    }
}

/// Discriminator naming the concrete result variant on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    /// Plain result with no payload.
    Command,
    /// Result carrying a [`FileListing`].
    FileListing,
    /// Result carrying file content.
    FileContent,
}

impl ResultKind {
    /// Every built-in kind.
    pub const ALL: [Self; 3] = [Self::Command, Self::FileListing, Self::FileContent];

    /// Wire identifier written to the `class` field.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Command => "remotecmd.CommandResult",
            Self::FileListing => "remotecmd.FileListingResult",
            Self::FileContent => "remotecmd.FileContentResult",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Variant-specific payload of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultDetails {
    /// No payload.
    #[default]
    None,
    /// Directory listing.
    Listing(FileListing),
    /// Raw file content.
    Content(String),
}

impl ResultDetails {
    /// Kind naming this payload on the wire.
    #[must_use]
    pub const fn kind(&self) -> ResultKind {
        match self {
            Self::None => ResultKind::Command,
            Self::Listing(_) => ResultKind::FileListing,
            Self::Content(_) => ResultKind::FileContent,
        }
    }
}

/// Result returned for every dispatched command.
///
/// A failure carries a human-readable `reason` and, when one was captured, a
/// diagnostic `trace` such as subprocess output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    status: ResultStatus,
    reason: Option<String>,
    trace: Option<String>,
    details: ResultDetails,
}

impl CommandResult {
    /// A successful result without reason or payload.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            status: ResultStatus::Success,
            reason: None,
            trace: None,
            details: ResultDetails::None,
        }
    }

    /// A failed result with the given reason.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Failure,
            reason: Some(reason.into()),
            trace: None,
            details: ResultDetails::None,
        }
    }

    /// Assembles a result from all of its parts.
    #[must_use]
    pub const fn from_parts(
        status: ResultStatus,
        reason: Option<String>,
        trace: Option<String>,
        details: ResultDetails,
    ) -> Self {
        Self {
            status,
            reason,
            trace,
            details,
        }
    }

    /// Sets the reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the diagnostic trace.
    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Sets the payload, which also fixes the result kind.
    #[must_use]
    pub fn with_details(mut self, details: ResultDetails) -> Self {
        self.details = details;
        self
    }

    /// Outcome.
    #[must_use]
    pub const fn status(&self) -> ResultStatus {
        self.status
    }

    /// `true` for [`ResultStatus::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    /// Human-readable explanation, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Captured diagnostic detail, if any.
    #[must_use]
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    /// Variant payload.
    #[must_use]
    pub const fn details(&self) -> &ResultDetails {
        &self.details
    }

    /// Concrete result kind.
    #[must_use]
    pub const fn kind(&self) -> ResultKind {
        self.details.kind()
    }
}
