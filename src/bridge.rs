//! Newline-delimited JSON bridge over stdin/stdout.
//!
//! Each input line is a [`CommandEnvelope`]; each is answered by exactly one
//! [`ResponseEnvelope`] line. Commands are handled one at a time, in order.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serp_extract::{ExtractError, MarkupSource};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::error::{LookupError, Result};
use crate::service::LookupService;

/// Contract version for command/response envelopes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Commands understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "search")]
    Search,
    #[serde(rename = "search.markup")]
    SearchMarkup,
    #[serde(rename = "resolve")]
    Resolve,
    #[serde(rename = "fetch")]
    Fetch,
    #[serde(rename = "store.stats")]
    StoreStats,
    #[serde(rename = "shutdown")]
    Shutdown,
}

/// A request from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(default = "protocol_version")]
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    /// Build a current-version command envelope.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.v != PROTOCOL_VERSION {
            return Err(format!(
                "unsupported contract version {}; expected {PROTOCOL_VERSION}",
                self.v
            ));
        }
        if self.request_id.trim().is_empty() {
            return Err("request_id cannot be empty".to_owned());
        }
        Ok(())
    }
}

/// The answer to one [`CommandEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}

fn protocol_version() -> u32 {
    PROTOCOL_VERSION
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    query: String,
    num_results: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SearchMarkupPayload {
    query: String,
    markup: String,
    num_results: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct IdPayload {
    id: String,
}

/// Negative counts mean "no results requested".
fn clamp_count(n: Option<i64>) -> Option<usize> {
    n.map(|n| usize::try_from(n).unwrap_or(0))
}

fn parse_payload<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| LookupError::InvalidRequest(format!("invalid payload: {e}")))
}

fn to_payload<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| LookupError::Bridge(format!("serialize failed: {e}")))
}

/// User-facing message for a failed command.
fn error_message(err: &LookupError) -> String {
    match err {
        LookupError::Extract(ExtractError::NotFound(id)) => {
            format!("could not find a result with id {id}")
        }
        LookupError::Extract(ExtractError::NoLink(id)) => {
            format!("result {id} has no link to fetch")
        }
        other => other.to_string(),
    }
}

/// Handle one command against `service`.
pub async fn dispatch<S: MarkupSource>(
    service: &LookupService<S>,
    envelope: CommandEnvelope,
) -> ResponseEnvelope {
    if let Err(message) = envelope.validate() {
        return ResponseEnvelope::error(envelope.request_id, message);
    }
    let request_id = envelope.request_id;
    match handle(service, envelope.command, envelope.payload).await {
        Ok(payload) => ResponseEnvelope::ok(request_id, payload),
        Err(err) => {
            tracing::debug!(%request_id, error = %err, "command failed");
            ResponseEnvelope::error(request_id, error_message(&err))
        }
    }
}

async fn handle<S: MarkupSource>(
    service: &LookupService<S>,
    command: CommandName,
    payload: serde_json::Value,
) -> Result<serde_json::Value> {
    match command {
        CommandName::Search => {
            let p: SearchPayload = parse_payload(payload)?;
            let results = service.search(&p.query, clamp_count(p.num_results)).await?;
            Ok(serde_json::json!({ "results": to_payload(&results)? }))
        }
        CommandName::SearchMarkup => {
            let p: SearchMarkupPayload = parse_payload(payload)?;
            let results = service.search_markup(&p.query, &p.markup, clamp_count(p.num_results))?;
            Ok(serde_json::json!({ "results": to_payload(&results)? }))
        }
        CommandName::Resolve => {
            let p: IdPayload = parse_payload(payload)?;
            to_payload(&service.resolve(&p.id)?)
        }
        CommandName::Fetch => {
            let p: IdPayload = parse_payload(payload)?;
            to_payload(&service.fetch(&p.id).await?)
        }
        CommandName::StoreStats => to_payload(&service.stats()),
        CommandName::Shutdown => Ok(serde_json::json!({ "stopping": true })),
    }
}

/// Serve commands from `reader`, writing responses to `writer`, until EOF or
/// a `shutdown` command.
///
/// # Errors
///
/// Returns [`LookupError::Bridge`] if reading input or writing a response
/// fails. Malformed lines are answered with a `parse-error` response and do
/// not stop the loop.
pub async fn run_bridge<S, R, W>(service: &LookupService<S>, reader: R, writer: W) -> Result<()>
where
    S: MarkupSource,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut writer = writer;

    loop {
        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| LookupError::Bridge(format!("failed to read input: {e}")))?
        else {
            tracing::info!("input closed (EOF); shutting down bridge");
            break;
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope: CommandEnvelope = match serde_json::from_str(trimmed) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse command envelope");
                let response = ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                );
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        let is_shutdown = envelope.command == CommandName::Shutdown;
        let response = dispatch(service, envelope).await;
        write_response(&mut writer, &response).await?;

        if is_shutdown && response.ok {
            tracing::info!("shutdown received; stopping bridge");
            break;
        }
    }

    Ok(())
}

/// [`run_bridge`] over the process's stdin and stdout.
///
/// # Errors
///
/// Same as [`run_bridge`].
pub async fn run_stdio_bridge<S: MarkupSource>(service: &LookupService<S>) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());
    run_bridge(service, reader, writer).await
}

/// Write one JSON line and flush.
async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &ResponseEnvelope,
) -> Result<()> {
    let mut json = serde_json::to_string(response)
        .map_err(|e| LookupError::Bridge(format!("failed to serialize response: {e}")))?;
    json.push('\n');
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| LookupError::Bridge(format!("failed to write output: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| LookupError::Bridge(format!("failed to flush output: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_use_wire_format() {
        let json = serde_json::to_string(&CommandName::SearchMarkup).expect("serialize");
        assert_eq!(json, "\"search.markup\"");
        let parsed: CommandName = serde_json::from_str("\"store.stats\"").expect("parse");
        assert_eq!(parsed, CommandName::StoreStats);
    }

    #[test]
    fn envelope_version_and_payload_default() {
        let env: CommandEnvelope =
            serde_json::from_str(r#"{"request_id":"r1","command":"store.stats"}"#).expect("parse");
        assert_eq!(env.v, PROTOCOL_VERSION);
        assert!(env.payload.is_null());
        assert!(env.validate().is_ok());
    }

    #[test]
    fn envelope_validation() {
        let mut env = CommandEnvelope::new("r1", CommandName::Resolve, serde_json::json!({}));
        env.v = 99;
        assert!(env.validate().unwrap_err().contains("unsupported contract version"));

        let env = CommandEnvelope::new("  ", CommandName::Resolve, serde_json::json!({}));
        assert!(env.validate().unwrap_err().contains("request_id"));
    }

    #[test]
    fn unknown_command_fails_to_parse() {
        let parsed: std::result::Result<CommandEnvelope, _> =
            serde_json::from_str(r#"{"request_id":"r1","command":"explode"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(clamp_count(Some(-3)), Some(0));
        assert_eq!(clamp_count(Some(4)), Some(4));
        assert_eq!(clamp_count(None), None);
    }

    #[test]
    fn not_found_message_is_user_facing() {
        let err = LookupError::Extract(ExtractError::NotFound("result-9".into()));
        assert_eq!(error_message(&err), "could not find a result with id result-9");
    }

    #[test]
    fn response_envelope_roundtrip_json() {
        let resp = ResponseEnvelope::ok("req-1", serde_json::json!({"stopping": true}));
        let json = serde_json::to_string(&resp).expect("serialize in test");
        let parsed: ResponseEnvelope = serde_json::from_str(&json).expect("deserialize in test");
        assert_eq!(parsed, resp);
    }
}
