use crate::error::{ParseFailure, ParseReason};
use crate::types::{ProjectName, SessionId, TokenCounts, UsageEvent};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Parse one raw log line into a canonical `UsageEvent`.
///
/// Returns `Ok(None)` for well-formed lines that carry no usage data
/// (user turns, summaries); transcripts interleave these with assistant
/// records and they are not load errors. Returns a `ParseFailure` naming
/// the violated constraint for malformed usage records. Pure function
/// over the line's content; never aborts a load.
pub fn parse_line(line: &str) -> Result<Option<UsageEvent>, ParseFailure> {
    extract(line).map_err(|reason| ParseFailure::new(line, reason))
}

fn extract(line: &str) -> Result<Option<UsageEvent>, ParseReason> {
    let value: Value = serde_json::from_str(line).map_err(|_| ParseReason::InvalidJson)?;

    // Only assistant records carry usage data
    if value.get("type").and_then(Value::as_str) != Some("assistant") {
        return Ok(None);
    }
    let message = match value.get("message") {
        Some(m) => m,
        None => return Ok(None),
    };
    let usage = match message.get("usage") {
        Some(u) => u,
        None => return Ok(None),
    };

    let session = value
        .get("sessionId")
        .and_then(Value::as_str)
        .ok_or(ParseReason::MissingField("sessionId"))?;
    if session.trim().is_empty() {
        return Err(ParseReason::EmptySessionId);
    }

    let raw_timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or(ParseReason::MissingField("timestamp"))?;
    let timestamp = raw_timestamp
        .parse::<DateTime<Utc>>()
        .map_err(|_| ParseReason::InvalidTimestamp(raw_timestamp.to_string()))?;

    let model = message
        .get("model")
        .and_then(Value::as_str)
        .ok_or(ParseReason::MissingField("model"))?;

    let tokens = TokenCounts {
        input: token_count(usage, "input_tokens")?,
        output: token_count(usage, "output_tokens")?,
        cache_creation: token_count(usage, "cache_creation_input_tokens")?,
        cache_read: token_count(usage, "cache_read_input_tokens")?,
    };

    let project = value
        .get("projectName")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(ProjectName::from);

    Ok(Some(UsageEvent {
        session: SessionId::from(session),
        project,
        model: model.to_string(),
        timestamp,
        tokens,
    }))
}

/// Absent count fields default to 0 (older records omit the cache
/// categories); present fields must be non-negative integers.
fn token_count(usage: &Value, field: &'static str) -> Result<u64, ParseReason> {
    match usage.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v.as_u64().ok_or(ParseReason::InvalidTokenCount(field)),
    }
}
