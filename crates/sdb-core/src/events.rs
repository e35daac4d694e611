//! Operational events (timer fired, delete failed, permission denied, ...).
//!
//! Sinks are fire-and-forget: `record()` is synchronous and must never block the core.

use std::fmt;

use crate::domain::{ChatId, MessageRef, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpsEvent {
    DeletionScheduled { target: MessageRef, delay_seconds: u32 },
    DeletionReplaced { target: MessageRef },
    DeletionCancelled { target: MessageRef },
    DeletionFired { target: MessageRef, delay_seconds: u32 },
    DeleteFailed { target: MessageRef, error: String },
    PermissionDenied { chat_id: ChatId, user_id: UserId },
    LookupFailed { chat_id: ChatId, user_id: UserId, error: String },
    UpdateDropped { reason: String },
    ReplyFailed { chat_id: ChatId, error: String },
}

impl OpsEvent {
    /// Short machine-friendly name, used as the `event` field in the audit log.
    pub fn kind(&self) -> &'static str {
        match self {
            OpsEvent::DeletionScheduled { .. } => "deletion_scheduled",
            OpsEvent::DeletionReplaced { .. } => "deletion_replaced",
            OpsEvent::DeletionCancelled { .. } => "deletion_cancelled",
            OpsEvent::DeletionFired { .. } => "deletion_fired",
            OpsEvent::DeleteFailed { .. } => "delete_failed",
            OpsEvent::PermissionDenied { .. } => "permission_denied",
            OpsEvent::LookupFailed { .. } => "lookup_failed",
            OpsEvent::UpdateDropped { .. } => "update_dropped",
            OpsEvent::ReplyFailed { .. } => "reply_failed",
        }
    }

    /// Soft failures are logged at `warn`; everything else is routine.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OpsEvent::DeleteFailed { .. }
                | OpsEvent::LookupFailed { .. }
                | OpsEvent::UpdateDropped { .. }
                | OpsEvent::ReplyFailed { .. }
        )
    }
}

impl fmt::Display for OpsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpsEvent::DeletionScheduled {
                target,
                delay_seconds,
            } => write!(f, "message {target} scheduled for deletion in {delay_seconds}s"),
            OpsEvent::DeletionReplaced { target } => {
                write!(f, "previous deletion timer for message {target} replaced")
            }
            OpsEvent::DeletionCancelled { target } => {
                write!(f, "deletion of message {target} cancelled")
            }
            OpsEvent::DeletionFired {
                target,
                delay_seconds,
            } => write!(f, "message {target} deleted after {delay_seconds}s"),
            OpsEvent::DeleteFailed { target, error } => {
                write!(f, "failed to delete message {target}: {error}")
            }
            OpsEvent::PermissionDenied { chat_id, user_id } => write!(
                f,
                "user {} denied settings access in chat {}",
                user_id.0, chat_id.0
            ),
            OpsEvent::LookupFailed {
                chat_id,
                user_id,
                error,
            } => write!(
                f,
                "membership lookup for user {} in chat {} failed: {error}",
                user_id.0, chat_id.0
            ),
            OpsEvent::UpdateDropped { reason } => write!(f, "update dropped: {reason}"),
            OpsEvent::ReplyFailed { chat_id, error } => {
                write!(f, "reply to chat {} failed: {error}", chat_id.0)
            }
        }
    }
}

pub trait EventSink: Send + Sync {
    fn record(&self, event: OpsEvent);
}

/// Default sink: structured log lines via `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: OpsEvent) {
        if event.is_failure() {
            tracing::warn!(event = event.kind(), "{event}");
        } else {
            tracing::info!(event = event.kind(), "{event}");
        }
    }
}
