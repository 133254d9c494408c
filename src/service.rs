//! Request orchestration: envelope in, envelope out.
//!
//! `handle_request` is the transport-independent entry point. It validates
//! the request kind, runs every item through the record parser (stopping at
//! the first failure, so a batch either fully succeeds or produces no
//! report), then groups and renders the records.
//!
//! `respond` sits one step closer to the wire: it takes the HTTP method and
//! raw body and always yields a status code plus an envelope to send back.

use crate::analysis::groupings::{build_report, GroupedReport};
use crate::ingest::record::{parse_item, ParseOptions};
use crate::logging::{self, Component};
use crate::model::{
    AddressError, ParseRequest, PersonRecord, RawItem, ResponseEnvelope, REQ_PARSE_ADDRESS,
};

// ---------------------------------------------------------------------------
// Core pipeline
// ---------------------------------------------------------------------------

/// Parses every item of a batch, in order.
///
/// Blank items are skipped. The first invalid item aborts the batch and its
/// error is returned; no records are kept.
pub fn parse_batch(items: &[RawItem], options: ParseOptions) -> Result<Vec<PersonRecord>, AddressError> {
    let mut records = Vec::with_capacity(items.len());
    for (index, raw) in items.iter().enumerate() {
        match parse_item(&raw.item, options) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {
                logging::debug(Component::Parser, Some(&format!("item {}", index)), "blank item skipped");
            }
            Err(err) => {
                logging::log_request_failure(Some(&format!("item {}", index)), &err);
                return Err(err);
            }
        }
    }
    logging::log_batch_summary(items.len(), records.len(), items.len() - records.len());
    Ok(records)
}

/// Validates the request kind and parses the batch into a grouped report.
pub fn build_grouped_report(request: &ParseRequest, options: ParseOptions) -> Result<GroupedReport, AddressError> {
    if request.req_type != REQ_PARSE_ADDRESS {
        let err = AddressError::UnsupportedOperation {
            req_type: request.req_type.clone(),
        };
        logging::log_request_failure(None, &err);
        return Err(err);
    }

    let records = parse_batch(&request.data, options)?;
    Ok(build_report(records))
}

/// Runs the full pipeline and wraps the rendered report in a success
/// envelope that echoes the request kind.
pub fn handle_request(request: &ParseRequest, options: ParseOptions) -> Result<ResponseEnvelope, AddressError> {
    let report = build_grouped_report(request, options)?;
    Ok(ResponseEnvelope::success(&request.req_type, report.render()))
}

// ---------------------------------------------------------------------------
// Transport mapping
// ---------------------------------------------------------------------------

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_METHOD_NOT_ALLOWED: u16 = 405;

/// Maps a raw HTTP request (method and body) to a status code and envelope.
///
/// - non-POST methods → 405
/// - a body that is not a valid request envelope → 400 `"bad JSON"`
/// - a classified `AddressError` → its status code, `"ERROR <message>"`
/// - success → 200
pub fn respond(method: &str, body: &[u8], options: ParseOptions) -> (u16, ResponseEnvelope) {
    if method != "POST" {
        return (
            STATUS_METHOD_NOT_ALLOWED,
            ResponseEnvelope::fail("only POST method allowed"),
        );
    }

    let request: ParseRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            logging::warn(Component::Server, None, &format!("rejecting body: {}", e));
            return (STATUS_BAD_REQUEST, ResponseEnvelope::fail("bad JSON"));
        }
    };

    match handle_request(&request, options) {
        Ok(envelope) => (STATUS_OK, envelope),
        Err(err) => (err.status_code(), ResponseEnvelope::fail(format!("ERROR {}", err))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ErrorKind, RESULT_SUCCESS};

    fn opts() -> ParseOptions {
        ParseOptions::default()
    }

    #[test]
    fn test_unsupported_request_kind() {
        let mut request = ParseRequest::parse_address(["John Daggett, 341 King Road, Plymouth MA"]);
        request.req_type = "parseAddresses".into();

        let err = handle_request(&request, opts()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn test_success_envelope_echoes_request_kind() {
        let request = ParseRequest::parse_address(["John Daggett, 341 King Road, Plymouth MA"]);
        let envelope = handle_request(&request, opts()).unwrap();
        assert_eq!(envelope.res_type, "parseAddress");
        assert_eq!(envelope.result, RESULT_SUCCESS);
        assert_eq!(
            envelope.data,
            "Massachusetts\n..... John Daggett341 King Road Plymouth Massachusetts"
        );
    }

    #[test]
    fn test_invalid_item_after_valid_ones_aborts_batch() {
        let items: Vec<RawItem> = [
            "John Daggett, 341 King Road, Plymouth MA",
            "Alice Ford, 22 East Broadway, Richmond VA",
            "Bob, 1 Main St, Austin TX",
        ]
        .into_iter()
        .map(|s| RawItem { item: s.into() })
        .collect();

        let err = parse_batch(&items, opts()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownState);
    }

    #[test]
    fn test_blank_items_contribute_nothing() {
        let request = ParseRequest::parse_address(["", "Alice Ford, 22 East Broadway, Richmond VA", "   "]);
        let report = build_grouped_report(&request, opts()).unwrap();
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_respond_rejects_non_post() {
        let (status, envelope) = respond("GET", b"", opts());
        assert_eq!(status, STATUS_METHOD_NOT_ALLOWED);
        assert_eq!(envelope.data, "only POST method allowed");
    }

    #[test]
    fn test_respond_rejects_bad_json() {
        let (status, envelope) = respond("POST", b"{not json", opts());
        assert_eq!(status, STATUS_BAD_REQUEST);
        assert_eq!(envelope, ResponseEnvelope::fail("bad JSON"));
    }

    #[test]
    fn test_respond_skips_item_without_text() {
        let body = br#"{"req_type":"parseAddress","data":[{}]}"#;
        let (status, envelope) = respond("POST", body, opts());
        assert_eq!(status, STATUS_OK);
        assert!(envelope.is_success());
        assert_eq!(envelope.data, "");
    }

    #[test]
    fn test_respond_missing_req_type_is_unsupported() {
        let body = br#"{"data":[{"item":"John Daggett, 341 King Road, Plymouth MA"}]}"#;
        let (status, envelope) = respond("POST", body, opts());
        assert_eq!(status, STATUS_BAD_REQUEST);
        assert!(envelope.data.starts_with("ERROR wrong req_type"), "got: {}", envelope.data);
    }

    #[test]
    fn test_respond_reports_classified_error() {
        let body = br#"{"req_type": "parseAddress", "data": [{"item": "no commas here"}]}"#;
        let (status, envelope) = respond("POST", body, opts());
        assert_eq!(status, STATUS_BAD_REQUEST);
        assert!(envelope.data.starts_with("ERROR wrong item struct"), "got: {}", envelope.data);
        assert_eq!(envelope.res_type, "");
    }
}
