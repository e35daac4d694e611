//! Typed callback selectors and bot commands.
//!
//! Callback data on the wire stays compatible with the classic `timer_30` /
//! `set_custom_7200` / `time_600` layout.

use std::{fmt, str::FromStr};

use crate::errors::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    // Private-chat timer picker.
    Timer(u32),
    CustomTime,
    IncreaseHour,
    DecreaseHour,
    SetCustom(u32),
    CancelCustom,
    ShowTime,

    // Main menu / group settings.
    StartSettings,
    EnableDelete,
    DisableDelete,
    SetDefault(u32),
    IncreaseDefault,
    DecreaseDefault,
    ShowDefault,
    SaveChanges,
}

impl Selector {
    /// Selectors that read or change group policy; group chats gate them on privilege.
    pub fn requires_privilege(self) -> bool {
        matches!(
            self,
            Selector::StartSettings
                | Selector::EnableDelete
                | Selector::DisableDelete
                | Selector::SetDefault(_)
                | Selector::IncreaseDefault
                | Selector::DecreaseDefault
                | Selector::SaveChanges
        )
    }
}

fn parse_seconds(raw: &str, data: &str) -> Result<u32, Error> {
    raw.parse::<u32>()
        .map_err(|_| Error::InvalidSelector(data.to_string()))
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let sel = match data {
            "custom_time" => Selector::CustomTime,
            "increase_hour" => Selector::IncreaseHour,
            "decrease_hour" => Selector::DecreaseHour,
            "cancel_custom" => Selector::CancelCustom,
            "show_time" => Selector::ShowTime,
            "start_settings" => Selector::StartSettings,
            "enable_delete" => Selector::EnableDelete,
            "disable_delete" => Selector::DisableDelete,
            "increase_default_time" => Selector::IncreaseDefault,
            "decrease_default_time" => Selector::DecreaseDefault,
            "show_default_time" => Selector::ShowDefault,
            "save_changes" => Selector::SaveChanges,
            _ => {
                if let Some(n) = data.strip_prefix("timer_") {
                    Selector::Timer(parse_seconds(n, data)?)
                } else if let Some(n) = data.strip_prefix("set_custom_") {
                    Selector::SetCustom(parse_seconds(n, data)?)
                } else if let Some(n) = data.strip_prefix("time_") {
                    Selector::SetDefault(parse_seconds(n, data)?)
                } else {
                    return Err(Error::InvalidSelector(data.to_string()));
                }
            }
        };
        Ok(sel)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Timer(n) => write!(f, "timer_{n}"),
            Selector::CustomTime => f.write_str("custom_time"),
            Selector::IncreaseHour => f.write_str("increase_hour"),
            Selector::DecreaseHour => f.write_str("decrease_hour"),
            Selector::SetCustom(n) => write!(f, "set_custom_{n}"),
            Selector::CancelCustom => f.write_str("cancel_custom"),
            Selector::ShowTime => f.write_str("show_time"),
            Selector::StartSettings => f.write_str("start_settings"),
            Selector::EnableDelete => f.write_str("enable_delete"),
            Selector::DisableDelete => f.write_str("disable_delete"),
            Selector::SetDefault(n) => write!(f, "time_{n}"),
            Selector::IncreaseDefault => f.write_str("increase_default_time"),
            Selector::DecreaseDefault => f.write_str("decrease_default_time"),
            Selector::ShowDefault => f.write_str("show_default_time"),
            Selector::SaveChanges => f.write_str("save_changes"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Settings,
}

impl BotCommand {
    /// Recognize `/start`, `/help`, `/settings` (optionally `/cmd@botname args`).
    ///
    /// Anything else, including unknown commands, is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.trim().split_whitespace().next()?;
        let name = first.strip_prefix('/')?.split('@').next()?.to_lowercase();
        match name.as_str() {
            "start" => Some(BotCommand::Start),
            "help" => Some(BotCommand::Help),
            "settings" => Some(BotCommand::Settings),
            _ => None,
        }
    }
}
