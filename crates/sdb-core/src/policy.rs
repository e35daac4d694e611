//! Per-chat deletion policy.

use std::collections::HashMap;

use crate::domain::ChatId;

pub const DEFAULT_DELAY_SECONDS: u32 = 60;
pub const MAX_DELAY_SECONDS: u32 = 86_400;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatPolicy {
    pub deletion_enabled: bool,
    pub default_delay_seconds: u32,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            deletion_enabled: true,
            default_delay_seconds: DEFAULT_DELAY_SECONDS,
        }
    }
}

/// In-memory policy map. Chats without an entry read as `defaults`.
#[derive(Clone, Debug, Default)]
pub struct PolicyStore {
    defaults: ChatPolicy,
    policies: HashMap<ChatId, ChatPolicy>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: ChatPolicy) -> Self {
        Self {
            defaults,
            policies: HashMap::new(),
        }
    }

    pub fn get_policy(&self, chat_id: ChatId) -> ChatPolicy {
        self.policies
            .get(&chat_id)
            .copied()
            .unwrap_or(self.defaults)
    }

    pub fn set_enabled(&mut self, chat_id: ChatId, enabled: bool) {
        self.entry(chat_id).deletion_enabled = enabled;
    }

    /// Stored verbatim; callers clamp.
    pub fn set_default_delay(&mut self, chat_id: ChatId, seconds: u32) {
        self.entry(chat_id).default_delay_seconds = seconds;
    }

    /// Add `delta_seconds` to the default delay, clamped to `[0, MAX_DELAY_SECONDS]`.
    pub fn adjust_default_delay(&mut self, chat_id: ChatId, delta_seconds: i64) -> u32 {
        let policy = self.entry(chat_id);
        let next = (policy.default_delay_seconds as i64)
            .saturating_add(delta_seconds)
            .clamp(0, MAX_DELAY_SECONDS as i64) as u32;
        policy.default_delay_seconds = next;
        next
    }

    fn entry(&mut self, chat_id: ChatId) -> &mut ChatPolicy {
        self.policies.entry(chat_id).or_insert(self.defaults)
    }
}
