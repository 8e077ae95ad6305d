//! Text encoding of envelopes and results.
//!
//! Results are written through an intermediate wire struct so the `class`
//! discriminator and the `details` section can be resolved separately: the
//! class is checked against a [`ResultRegistry`] before the details are
//! interpreted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::arguments::ProcessorArguments;
use crate::envelope::CommandEnvelope;
use crate::error::ProtocolError;
use crate::registry::ResultRegistry;
use crate::result::{CommandResult, ResultDetails, ResultStatus};

#[derive(Serialize)]
struct WireResultOut<'a> {
    class: &'static str,
    #[serde(rename = "type")]
    status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(rename = "stack-trace", skip_serializing_if = "Option::is_none")]
    trace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

#[derive(Deserialize)]
struct WireResultIn {
    class: String,
    #[serde(rename = "type")]
    status: u64,
    #[serde(default)]
    reason: Option<String>,
    #[serde(rename = "stack-trace", default)]
    trace: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

/// Encodes an envelope as a single-line JSON document.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if encoding fails.
pub fn serialize_envelope(envelope: &CommandEnvelope) -> Result<String, ProtocolError> {
    serde_json::to_string(envelope).map_err(ProtocolError::Serialize)
}

/// Decodes an envelope.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] for invalid JSON or a missing `type`.
pub fn deserialize_envelope(text: &str) -> Result<CommandEnvelope, ProtocolError> {
    let envelope: CommandEnvelope =
        serde_json::from_str(text).map_err(ProtocolError::from_json_error)?;
    if envelope.command_type().trim().is_empty() {
        return Err(ProtocolError::malformed("envelope type is empty"));
    }
    Ok(envelope)
}

/// Encodes a result as a single-line JSON document.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if encoding fails.
pub fn serialize_result(result: &CommandResult) -> Result<String, ProtocolError> {
    let details = encode_details(result.details()).map_err(ProtocolError::Serialize)?;
    let wire = WireResultOut {
        class: result.kind().id(),
        status: result.status(),
        reason: result.reason(),
        trace: result.trace(),
        details,
    };
    serde_json::to_string(&wire).map_err(ProtocolError::Serialize)
}

fn encode_details(details: &ResultDetails) -> Result<Option<Value>, serde_json::Error> {
    match details {
        ResultDetails::None => Ok(None),
        ResultDetails::Listing(listing) => serde_json::to_value(listing).map(Some),
        ResultDetails::Content(content) => Ok(Some(serde_json::json!({ "content": content }))),
    }
}

/// Decodes a result, resolving its class through `registry`.
///
/// # Errors
///
/// Returns [`ProtocolError`] for malformed JSON, an invalid status code, an
/// unregistered class, or details that do not fit the class.
pub fn deserialize_result(
    text: &str,
    registry: &ResultRegistry,
) -> Result<CommandResult, ProtocolError> {
    let wire: WireResultIn = serde_json::from_str(text).map_err(ProtocolError::from_json_error)?;
    let status = u8::try_from(wire.status)
        .ok()
        .and_then(ResultStatus::from_code)
        .ok_or(ProtocolError::InvalidStatus { code: wire.status })?;
    let details = registry.decode(&wire.class, wire.details.as_ref())?;
    Ok(CommandResult::from_parts(
        status,
        wire.reason,
        wire.trace,
        details,
    ))
}

/// Parses a standalone argument document: a JSON array of argument nodes.
///
/// Used by the command-line entry points, which read arguments from a file.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] when the text is not an array of
/// nodes.
pub fn parse_arguments(text: &str) -> Result<ProcessorArguments, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::from_json_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::ArgumentNode;
    use crate::envelope::Credentials;
    use crate::listing::{DirectoryListing, FileEntry, FileListing};
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> ResultRegistry {
        ResultRegistry::standard()
    }

    fn vhost_envelope() -> CommandEnvelope {
        let host = ArgumentNode::new("virtual_host")
            .with_child(ArgumentNode::leaf("ip", "10.0.0.1"))
            .with_child(ArgumentNode::leaf("server_name", "foo.com"))
            .with_child(
                ArgumentNode::new("Directory")
                    .with_attribute("path", "/var/www/foo")
                    .with_child(ArgumentNode::leaf("AllowOverride", "None")),
            );
        let mut arguments = ProcessorArguments::new();
        arguments.add_argument("website_id", "42").expect("add id");
        arguments.push(host.clone());
        arguments.push(host);
        CommandEnvelope::new(
            Credentials::new("admin", "secret"),
            "remotecmd.ApacheVirtualHostEditor",
            arguments,
        )
    }

    #[test]
    fn envelope_round_trips() {
        let envelope = vhost_envelope();
        let text = serialize_envelope(&envelope).expect("serialize");
        let decoded = deserialize_envelope(&text).expect("deserialize");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn envelope_uses_wire_field_names() {
        let text = serialize_envelope(&vhost_envelope()).expect("serialize");
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["username"], "admin");
        assert_eq!(value["password"], "secret");
        assert_eq!(value["type"], "remotecmd.ApacheVirtualHostEditor");
        assert_eq!(value["processor-arguments"][0]["name"], "website_id");
        assert!(!text.contains('\n'));
    }

    #[test]
    fn envelope_without_credentials_defaults_to_empty() {
        let decoded = deserialize_envelope(r#"{"type":"remotecmd.FileLister"}"#)
            .expect("deserialize");
        assert_eq!(decoded.credentials(), &Credentials::default());
        assert!(decoded.arguments().is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("{")]
    #[case(r#"{"username":"a"}"#)]
    #[case(r#"{"type":"  "}"#)]
    fn malformed_envelopes_are_rejected(#[case] text: &str) {
        assert!(matches!(
            deserialize_envelope(text),
            Err(ProtocolError::Malformed { .. })
        ));
    }

    fn listing() -> FileListing {
        FileListing {
            directories: vec![DirectoryListing {
                path: "/var/log".to_owned(),
                files: vec![FileEntry {
                    name: "messages".to_owned(),
                    last_modified: 1_700_000_000_123,
                    size: 4096,
                }],
            }],
        }
    }

    #[rstest]
    #[case(CommandResult::success())]
    #[case(CommandResult::failure("disk full").with_trace("write: ENOSPC\r\n"))]
    #[case(CommandResult::success().with_details(ResultDetails::Listing(listing())))]
    #[case(CommandResult::success().with_details(ResultDetails::Content("line\nline".to_owned())))]
    #[case(CommandResult::failure("missing").with_details(ResultDetails::Content(String::new())))]
    fn results_round_trip(registry: ResultRegistry, #[case] result: CommandResult) {
        let text = serialize_result(&result).expect("serialize");
        let decoded = deserialize_result(&text, &registry).expect("deserialize");
        assert_eq!(decoded, result);
        assert_eq!(decoded.kind(), result.kind());
    }

    #[test]
    fn listing_result_uses_wire_field_names() {
        let result = CommandResult::success().with_details(ResultDetails::Listing(listing()));
        let value: Value =
            serde_json::from_str(&serialize_result(&result).expect("serialize")).expect("json");
        assert_eq!(value["class"], "remotecmd.FileListingResult");
        assert_eq!(value["type"], 1);
        let entry = &value["details"]["listing"][0]["files"][0];
        assert_eq!(entry["lastModified"], 1_700_000_000_123_u64);
        assert_eq!(entry["size"], 4096);
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn failure_result_carries_reason_and_trace() {
        let result = CommandResult::failure("boom").with_trace("stderr\r\n");
        let value: Value =
            serde_json::from_str(&serialize_result(&result).expect("serialize")).expect("json");
        assert_eq!(value["type"], 0);
        assert_eq!(value["reason"], "boom");
        assert_eq!(value["stack-trace"], "stderr\r\n");
    }

    #[rstest]
    fn unregistered_class_is_rejected(registry: ResultRegistry) {
        let text = r#"{"class":"acme.PhotoResult","type":1}"#;
        assert!(matches!(
            deserialize_result(text, &registry),
            Err(ProtocolError::UnregisteredClass { ref class }) if class == "acme.PhotoResult"
        ));
    }

    #[rstest]
    #[case(2)]
    #[case(300)]
    fn invalid_status_is_rejected(registry: ResultRegistry, #[case] code: u64) {
        let text = format!(r#"{{"class":"remotecmd.CommandResult","type":{code}}}"#);
        assert!(matches!(
            deserialize_result(&text, &registry),
            Err(ProtocolError::InvalidStatus { code: found }) if found == code
        ));
    }

    #[test]
    fn argument_documents_parse_nested_nodes() {
        let text = r#"[
            {"name": "command", "value": "restart"},
            {"name": "directory", "value": "/srv", "attributes": {"filter": "*.log"}}
        ]"#;
        let arguments = parse_arguments(text).expect("parse");
        assert_eq!(arguments.value_of("command"), Some("restart"));
        assert_eq!(
            arguments.first("directory").and_then(|node| node.attribute("filter")),
            Some("*.log")
        );
    }
}
