//! Screen texts and inline keyboards.

use crate::{
    formatting::{format_compact, format_duration, format_hours_minutes},
    messaging::types::{InlineButton, InlineKeyboard},
    policy::ChatPolicy,
    selector::Selector,
};

pub const PERMISSION_DENIED: &str = "❌ You don't have permission to change settings.\n\
Only group owners and moderators can modify settings.";
pub const DELETION_DISABLED: &str = "⚠️ Message deletion is currently disabled in this group.";
pub const SETTINGS_GROUP_ONLY: &str = "⚙️ Settings are only available in groups.";
pub const TIMER_PROMPT: &str = "⏱️ Select a time for this message to self-destruct:";

const TIMER_PRESETS: [(&str, u32); 7] = [
    ("5 seconds", 5),
    ("10 seconds", 10),
    ("30 seconds", 30),
    ("1 minute", 60),
    ("5 minutes", 300),
    ("10 minutes", 600),
    ("1 hour", 3600),
];

const DEFAULT_PRESETS: [(&str, u32); 6] = [
    ("1 min", 60),
    ("5 min", 300),
    ("10 min", 600),
    ("6 hour", 21_600),
    ("12 hour", 43_200),
    ("24 hour", 86_400),
];

/// A rendered screen: HTML text plus an optional keyboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    pub html: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl Screen {
    fn text(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(html: impl Into<String>, keyboard: InlineKeyboard) -> Self {
        Self {
            html: html.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Links shown on the welcome menu. Missing links are simply not rendered.
#[derive(Clone, Debug, Default)]
pub struct MenuLinks {
    pub owner_url: Option<String>,
    pub channel_url: Option<String>,
    pub bot_username: Option<String>,
}

impl MenuLinks {
    fn add_to_group_url(&self) -> Option<String> {
        self.bot_username
            .as_deref()
            .map(|u| format!("https://t.me/{u}?startgroup=true"))
    }
}

fn callback(label: impl Into<String>, sel: Selector) -> InlineButton {
    InlineButton::callback(label, sel)
}

pub fn welcome(links: &MenuLinks) -> Screen {
    let html = "🌟 <b>Welcome to Message Self-Destructor Bot!</b> 🌟\n\n\
I can help you send self-destructing messages in groups and private chats.\n\n\
<b>How to use:</b>\n\
• Send any message and I'll offer to make it self-destruct\n\
• Use /help for more commands";

    let mut link_row = Vec::new();
    if let Some(url) = &links.owner_url {
        link_row.push(InlineButton::url("Mention Owner", url.clone()));
    }
    if let Some(url) = &links.channel_url {
        link_row.push(InlineButton::url("Channel", url.clone()));
    }
    let group_row = links
        .add_to_group_url()
        .map(|url| vec![InlineButton::url("Add to Group", url)])
        .unwrap_or_default();

    let keyboard = InlineKeyboard::default()
        .row(link_row)
        .row(group_row)
        .row(vec![callback("⚙️ Settings", Selector::StartSettings)]);

    Screen::with_keyboard(html, keyboard)
}

pub fn help() -> Screen {
    Screen::text(
        "📖 <b>Help - Message Self-Destructor Bot</b> 📖\n\n\
<b>Commands:</b>\n\
/start - Start the bot\n\
/help - Show this help message\n\
/settings - Change group settings (owners/moderators only)\n\n\
<b>Features:</b>\n\
• Send any message to make it self-destruct\n\
• Choose from various timer options\n\
• Use custom time with + and - buttons\n\
• Enable/disable message deletion in groups",
    )
}

pub fn timer_keyboard() -> InlineKeyboard {
    let buttons: Vec<InlineButton> = TIMER_PRESETS
        .iter()
        .map(|(label, secs)| callback(*label, Selector::Timer(*secs)))
        .collect();

    let mut kb = InlineKeyboard::default();
    for pair in buttons.chunks(2) {
        kb = kb.row(pair.to_vec());
    }
    kb.row(vec![callback("⏱️ Custom Time", Selector::CustomTime)])
}

pub fn timer_picker() -> Screen {
    Screen::with_keyboard(TIMER_PROMPT, timer_keyboard())
}

pub fn custom_timer(seconds: u32) -> Screen {
    let html = format!(
        "⏱️ <b>Custom Timer Settings</b> ⏱️\n\n\
Current time: <b>{}</b>\n\n\
Use the buttons below to adjust the time:",
        format_duration(seconds)
    );
    let keyboard = InlineKeyboard::default()
        .row(vec![
            callback("- Hour", Selector::DecreaseHour),
            callback(format_hours_minutes(seconds), Selector::ShowTime),
            callback("+ Hour", Selector::IncreaseHour),
        ])
        .row(vec![
            callback("Set Time", Selector::SetCustom(seconds)),
            callback("Cancel", Selector::CancelCustom),
        ]);
    Screen::with_keyboard(html, keyboard)
}

pub fn custom_cancelled() -> Screen {
    Screen::with_keyboard(
        "⏱️ <b>Custom Timer Settings</b> ⏱️\n\nTimer selection cancelled.",
        timer_keyboard(),
    )
}

/// Confirmation shown in place of the picker once a timer is chosen.
pub fn timer_confirmed(seconds: u32, custom: bool) -> Screen {
    let t = format_duration(seconds);
    let head = if custom {
        "Custom timer set"
    } else {
        "Selected timer"
    };
    Screen::text(format!(
        "⏱️ {head}: {t}.\nThe message will self-destruct in {t}!"
    ))
}

pub fn group_settings(policy: ChatPolicy) -> Screen {
    let status = if policy.deletion_enabled {
        "Enabled"
    } else {
        "Disabled"
    };
    let html = format!(
        "🔧 <b>Group Settings</b> 🔧\n\n\
Message deletion: <b>{status}</b>\n\n\
Default deletion time: <b>{}</b>\n\n\
Adjust settings below:",
        format_duration(policy.default_delay_seconds)
    );
    Screen::with_keyboard(html, group_settings_keyboard(policy))
}

pub fn group_settings_keyboard(policy: ChatPolicy) -> InlineKeyboard {
    let toggle = if policy.deletion_enabled {
        callback("Disable Message Deletion", Selector::DisableDelete)
    } else {
        callback("Enable Message Deletion", Selector::EnableDelete)
    };

    let presets: Vec<InlineButton> = DEFAULT_PRESETS
        .iter()
        .map(|(label, secs)| callback(*label, Selector::SetDefault(*secs)))
        .collect();

    let mut kb = InlineKeyboard::default().row(vec![toggle]);
    for triple in presets.chunks(3) {
        kb = kb.row(triple.to_vec());
    }
    kb.row(vec![
        callback("- Hour", Selector::DecreaseDefault),
        callback(
            format_compact(policy.default_delay_seconds),
            Selector::ShowDefault,
        ),
        callback("+ Hour", Selector::IncreaseDefault),
    ])
    .row(vec![callback("Save Changes", Selector::SaveChanges)])
}

pub fn settings_saved(policy: ChatPolicy) -> Screen {
    let status = if policy.deletion_enabled {
        "Enabled"
    } else {
        "Disabled"
    };
    Screen::text(format!(
        "✅ <b>Settings Saved Successfully!</b> ✅\n\n\
• Message deletion: <b>{status}</b>\n\
• Default deletion time: <b>{}</b>\n\n\
All changes have been applied to this group.",
        format_duration(policy.default_delay_seconds)
    ))
}

pub fn private_settings_info() -> Screen {
    Screen::text(
        "🔧 <b>Settings Menu</b> 🔧\n\n\
This bot doesn't have personal settings.\n\n\
Use this bot in groups where owners and moderators can configure:\n\
• Enable/disable message deletion\n\
• Set default deletion time\n\n\
Use /settings in a group to manage group settings.",
    )
}
