//! Who may change a group's deletion policy.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, UserId},
    events::{EventSink, OpsEvent},
    Result,
};

/// Membership role as reported by the messaging platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Owner,
    Administrator,
    Member,
    Other,
}

impl Role {
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Owner | Role::Administrator)
    }
}

/// Port: chat-membership lookup.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    async fn get_role(&self, chat_id: ChatId, user_id: UserId) -> Result<Role>;
}

/// Fail-closed privilege check: a lookup error never grants access.
pub struct PermissionGate {
    lookup: Arc<dyn MembershipLookup>,
    sink: Arc<dyn EventSink>,
}

impl PermissionGate {
    pub fn new(lookup: Arc<dyn MembershipLookup>, sink: Arc<dyn EventSink>) -> Self {
        Self { lookup, sink }
    }

    pub async fn is_authorized(&self, chat_id: ChatId, user_id: UserId) -> bool {
        match self.lookup.get_role(chat_id, user_id).await {
            Ok(role) if role.is_privileged() => true,
            Ok(_) => {
                self.sink
                    .record(OpsEvent::PermissionDenied { chat_id, user_id });
                false
            }
            Err(e) => {
                self.sink.record(OpsEvent::LookupFailed {
                    chat_id,
                    user_id,
                    error: e.to_string(),
                });
                false
            }
        }
    }
}
