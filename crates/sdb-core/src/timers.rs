//! Per-(user, chat) custom timer values behind the "⏱️ Custom Time" screen.

use std::collections::HashMap;

use crate::domain::{ChatId, UserId};

pub const DEFAULT_CUSTOM_SECONDS: u32 = 3600;
pub const MIN_CUSTOM_SECONDS: u32 = 60;
pub const MAX_CUSTOM_SECONDS: u32 = 86_400;
pub const CUSTOM_STEP_SECONDS: u32 = 3600;

#[derive(Clone, Debug, Default)]
pub struct CustomTimerStore {
    timers: HashMap<(UserId, ChatId), u32>,
}

impl CustomTimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, without creating an entry.
    pub fn get(&self, user_id: UserId, chat_id: ChatId) -> u32 {
        self.timers
            .get(&(user_id, chat_id))
            .copied()
            .unwrap_or(DEFAULT_CUSTOM_SECONDS)
    }

    /// Current value, creating the entry on first use.
    pub fn open(&mut self, user_id: UserId, chat_id: ChatId) -> u32 {
        *self.entry(user_id, chat_id)
    }

    pub fn increase(&mut self, user_id: UserId, chat_id: ChatId) -> u32 {
        let v = self.entry(user_id, chat_id);
        *v = v.saturating_add(CUSTOM_STEP_SECONDS).min(MAX_CUSTOM_SECONDS);
        *v
    }

    pub fn decrease(&mut self, user_id: UserId, chat_id: ChatId) -> u32 {
        let v = self.entry(user_id, chat_id);
        *v = v.saturating_sub(CUSTOM_STEP_SECONDS).max(MIN_CUSTOM_SECONDS);
        *v
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn entry(&mut self, user_id: UserId, chat_id: ChatId) -> &mut u32 {
        self.timers
            .entry((user_id, chat_id))
            .or_insert(DEFAULT_CUSTOM_SECONDS)
    }
}
