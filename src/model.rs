//! Core data types for the address grouping service.
//!
//! This module defines the shared domain model imported by all other modules:
//! the parsed person record, the JSON request/response envelopes, and the
//! classified error returned by the parsing pipeline.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request kinds
// ---------------------------------------------------------------------------

/// The only request kind the service understands.
pub const REQ_PARSE_ADDRESS: &str = "parseAddress";

/// Value of `result` in a successful response envelope.
pub const RESULT_SUCCESS: &str = "success";

/// Value of `result` in a failed response envelope.
pub const RESULT_FAIL: &str = "fail";

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// One person parsed from a `"Name, Street Address, City STATE"` item.
///
/// `state_code` is always one of the codes in `states::STATE_REGISTRY`;
/// `name` and `street_address` are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub name: String,
    pub street_address: String,
    pub city: String,
    pub state_code: String,
}

// ---------------------------------------------------------------------------
// Envelope types
// ---------------------------------------------------------------------------

/// A single raw entry of the request's `data` array. A missing `item`
/// decodes as blank and is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub item: String,
}

/// Incoming request body: `{"req_type": "...", "data": [{"item": "..."}]}`.
///
/// Missing fields decode as empty so that an absent `req_type` is reported
/// as an unsupported operation rather than as undecodable JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseRequest {
    #[serde(default)]
    pub req_type: String,
    #[serde(default)]
    pub data: Vec<RawItem>,
}

impl ParseRequest {
    /// Builds a `parseAddress` request from plain strings.
    pub fn parse_address<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParseRequest {
            req_type: REQ_PARSE_ADDRESS.to_string(),
            data: items.into_iter().map(|s| RawItem { item: s.into() }).collect(),
        }
    }
}

/// Outgoing response body. `data` holds either the rendered report or
/// the error text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub res_type: String,
    pub result: String,
    pub data: String,
}

impl ResponseEnvelope {
    pub fn success(res_type: &str, report: String) -> Self {
        ResponseEnvelope {
            res_type: res_type.to_string(),
            result: RESULT_SUCCESS.to_string(),
            data: report,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        ResponseEnvelope {
            res_type: String::new(),
            result: RESULT_FAIL.to_string(),
            data: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == RESULT_SUCCESS
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Stable, machine-distinguishable classification of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    UnsupportedOperation,
    MalformedItem,
    UnknownState,
}

/// Errors that abort a parse request. Every variant is terminal for the
/// whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The request's `req_type` is not `parseAddress`.
    UnsupportedOperation { req_type: String },
    /// The item did not split into exactly three comma-separated fields,
    /// or its name or street field was empty.
    MalformedItem { item: String, reason: String },
    /// The last token of the city/state field is not a recognized code.
    UnknownState { item: String, state: String },
}

impl AddressError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AddressError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            AddressError::MalformedItem { .. } => ErrorKind::MalformedItem,
            AddressError::UnknownState { .. } => ErrorKind::UnknownState,
        }
    }

    /// HTTP status the transport reports for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::UnsupportedOperation | ErrorKind::MalformedItem | ErrorKind::UnknownState => 400,
        }
    }
}

impl std::fmt::Display for AddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressError::UnsupportedOperation { req_type } => {
                write!(f, "wrong req_type: '{}'", req_type)
            }
            AddressError::MalformedItem { item, reason } => {
                write!(f, "wrong item struct: {} in '{}'", reason, item)
            }
            AddressError::UnknownState { item, state } => {
                write!(f, "wrong state: '{}' in '{}'", state, item)
            }
        }
    }
}

impl std::error::Error for AddressError {}
