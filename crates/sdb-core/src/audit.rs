use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{
    errors::Error,
    events::{EventSink, OpsEvent, TracingSink},
    Result,
};

const AUDIT_MAX_TEXT: usize = 500;

/// RFC3339 timestamp in UTC.
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Clone, Debug, Serialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub event: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    pub fn from_event(event: &OpsEvent) -> Self {
        let mut rec = Self {
            timestamp: iso_timestamp_utc(),
            event: event.kind().to_string(),
            message: event.to_string(),
            chat_id: None,
            message_id: None,
            user_id: None,
            delay_seconds: None,
            error: None,
        };

        match event {
            OpsEvent::DeletionScheduled {
                target,
                delay_seconds,
            }
            | OpsEvent::DeletionFired {
                target,
                delay_seconds,
            } => {
                rec.chat_id = Some(target.chat_id.0);
                rec.message_id = Some(target.message_id.0);
                rec.delay_seconds = Some(*delay_seconds);
            }
            OpsEvent::DeletionReplaced { target } | OpsEvent::DeletionCancelled { target } => {
                rec.chat_id = Some(target.chat_id.0);
                rec.message_id = Some(target.message_id.0);
            }
            OpsEvent::DeleteFailed { target, error } => {
                rec.chat_id = Some(target.chat_id.0);
                rec.message_id = Some(target.message_id.0);
                rec.error = Some(error.clone());
            }
            OpsEvent::PermissionDenied { chat_id, user_id } => {
                rec.chat_id = Some(chat_id.0);
                rec.user_id = Some(user_id.0);
            }
            OpsEvent::LookupFailed {
                chat_id,
                user_id,
                error,
            } => {
                rec.chat_id = Some(chat_id.0);
                rec.user_id = Some(user_id.0);
                rec.error = Some(error.clone());
            }
            OpsEvent::UpdateDropped { reason } => {
                rec.error = Some(reason.clone());
            }
            OpsEvent::ReplyFailed { chat_id, error } => {
                rec.chat_id = Some(chat_id.0);
                rec.error = Some(error.clone());
            }
        }

        rec
    }
}

/// Append-only audit file for operational events.
///
/// Every event is also forwarded to tracing, so this sink can replace
/// [`TracingSink`] rather than sit next to it.
#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut record: AuditRecord) -> Result<()> {
        record.message = truncate_text(&record.message, AUDIT_MAX_TEXT);
        if let Some(s) = &record.error {
            record.error = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&record)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&record)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit record is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            out.push_str(&json_value_to_display(v));
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

impl EventSink for AuditLogger {
    fn record(&self, event: OpsEvent) {
        let record = AuditRecord::from_event(&event);
        TracingSink.record(event);
        if let Err(e) = self.write(record) {
            tracing::warn!("failed to write audit record to {}: {e}", self.path.display());
        }
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

fn json_value_to_display(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
