//! Update dispatcher: routes incoming messages and button presses to the
//! policy/timer stores, the permission gate and the deletion scheduler.
//!
//! Nothing here returns an error to the caller. Failures are reported to the
//! event sink and the update is dropped.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, ChatKind, MessageId, MessageRef, UserId},
    events::{EventSink, OpsEvent},
    formatting::format_duration,
    menus::{self, MenuLinks, Screen},
    messaging::port::MessagingPort,
    permission::PermissionGate,
    policy::{ChatPolicy, PolicyStore, MAX_DELAY_SECONDS},
    scheduler::DeletionScheduler,
    selector::{BotCommand, Selector},
    timers::CustomTimerStore,
};

const DEFAULT_STEP_SECONDS: i64 = 3600;

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub message_id: MessageId,
    pub user_id: Option<UserId>,
    pub text: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ButtonPress {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub user_id: UserId,
    pub callback_id: String,
    /// Raw callback data; parsed into a [`Selector`] by the dispatcher.
    pub data: String,
    /// The keyboard message that was pressed.
    pub message: MessageRef,
    /// The message that keyboard replies to, if any.
    pub reply_to: Option<MessageRef>,
}

impl ButtonPress {
    /// The message a timer selection applies to.
    pub fn deletion_target(&self) -> MessageRef {
        self.reply_to.unwrap_or(self.message)
    }
}

#[derive(Clone, Debug)]
pub enum Update {
    Message(IncomingMessage),
    Button(ButtonPress),
}

pub struct UpdateDispatcher {
    policies: Mutex<PolicyStore>,
    timers: Mutex<CustomTimerStore>,
    gate: PermissionGate,
    scheduler: DeletionScheduler,
    messenger: Arc<dyn MessagingPort>,
    sink: Arc<dyn EventSink>,
    links: MenuLinks,
}

impl UpdateDispatcher {
    pub fn new(
        policies: PolicyStore,
        gate: PermissionGate,
        scheduler: DeletionScheduler,
        messenger: Arc<dyn MessagingPort>,
        sink: Arc<dyn EventSink>,
        links: MenuLinks,
    ) -> Self {
        Self {
            policies: Mutex::new(policies),
            timers: Mutex::new(CustomTimerStore::new()),
            gate,
            scheduler,
            messenger,
            sink,
            links,
        }
    }

    pub fn scheduler(&self) -> &DeletionScheduler {
        &self.scheduler
    }

    pub async fn policy(&self, chat_id: ChatId) -> ChatPolicy {
        self.policies.lock().await.get_policy(chat_id)
    }

    pub async fn dispatch(&self, update: Update) {
        match update {
            Update::Message(m) => self.on_message(m).await,
            Update::Button(b) => self.on_button(b).await,
        }
    }

    async fn on_message(&self, m: IncomingMessage) {
        if let Some(cmd) = m.text.as_deref().and_then(BotCommand::parse) {
            return self.on_command(&m, cmd).await;
        }

        match m.chat_kind {
            ChatKind::Group => {
                let policy = self.policy(m.chat_id).await;
                if !policy.deletion_enabled {
                    self.send(m.chat_id, menus::DELETION_DISABLED).await;
                    return;
                }
                self.scheduler
                    .schedule(
                        MessageRef::new(m.chat_id, m.message_id),
                        policy.default_delay_seconds,
                    )
                    .await;
            }
            ChatKind::Private => {
                // Reply to the user message so the button press can find it again.
                self.send_screen(m.chat_id, menus::timer_picker(), Some(m.message_id))
                    .await;
            }
        }
    }

    async fn on_command(&self, m: &IncomingMessage, cmd: BotCommand) {
        match cmd {
            BotCommand::Start => {
                self.send_screen(m.chat_id, menus::welcome(&self.links), None)
                    .await
            }
            BotCommand::Help => self.send_screen(m.chat_id, menus::help(), None).await,
            BotCommand::Settings => {
                if !m.chat_kind.is_group() {
                    self.send(m.chat_id, menus::SETTINGS_GROUP_ONLY).await;
                    return;
                }
                let authorized = match m.user_id {
                    Some(user_id) => self.gate.is_authorized(m.chat_id, user_id).await,
                    None => false,
                };
                if !authorized {
                    self.send(m.chat_id, menus::PERMISSION_DENIED).await;
                    return;
                }
                let policy = self.policy(m.chat_id).await;
                self.send_screen(m.chat_id, menus::group_settings(policy), None)
                    .await;
            }
        }
    }

    async fn on_button(&self, b: ButtonPress) {
        let sel = match b.data.parse::<Selector>() {
            Ok(sel) => sel,
            Err(e) => {
                self.sink.record(OpsEvent::UpdateDropped {
                    reason: e.to_string(),
                });
                self.answer(&b, None, false).await;
                return;
            }
        };

        if sel.requires_privilege() {
            if b.chat_kind.is_group() {
                if !self.gate.is_authorized(b.chat_id, b.user_id).await {
                    self.answer(&b, Some(menus::PERMISSION_DENIED), true).await;
                    return;
                }
            } else if sel != Selector::StartSettings {
                self.answer(&b, Some(menus::SETTINGS_GROUP_ONLY), false)
                    .await;
                return;
            }
        }

        match sel {
            Selector::Timer(secs) => self.confirm_timer(&b, secs, false).await,
            Selector::SetCustom(secs) => self.confirm_timer(&b, secs, true).await,
            Selector::CustomTime => {
                let secs = self.timers.lock().await.open(b.user_id, b.chat_id);
                self.edit(&b, menus::custom_timer(secs)).await;
                self.answer(&b, None, false).await;
            }
            Selector::IncreaseHour => {
                let secs = self.timers.lock().await.increase(b.user_id, b.chat_id);
                self.edit(&b, menus::custom_timer(secs)).await;
                let text = format!("Time increased to {}", format_duration(secs));
                self.answer(&b, Some(&text), false).await;
            }
            Selector::DecreaseHour => {
                let secs = self.timers.lock().await.decrease(b.user_id, b.chat_id);
                self.edit(&b, menus::custom_timer(secs)).await;
                let text = format!("Time decreased to {}", format_duration(secs));
                self.answer(&b, Some(&text), false).await;
            }
            Selector::CancelCustom => {
                self.edit(&b, menus::custom_cancelled()).await;
                self.answer(&b, None, false).await;
            }
            Selector::ShowTime => {
                let secs = self.timers.lock().await.get(b.user_id, b.chat_id);
                let text = format!("Current time: {}", format_duration(secs));
                self.answer(&b, Some(&text), false).await;
            }
            Selector::StartSettings => {
                let screen = if b.chat_kind.is_group() {
                    menus::group_settings(self.policy(b.chat_id).await)
                } else {
                    menus::private_settings_info()
                };
                self.edit(&b, screen).await;
                self.answer(&b, None, false).await;
            }
            Selector::EnableDelete | Selector::DisableDelete => {
                let enabled = sel == Selector::EnableDelete;
                let policy = {
                    let mut store = self.policies.lock().await;
                    store.set_enabled(b.chat_id, enabled);
                    store.get_policy(b.chat_id)
                };
                let text = if enabled {
                    "✅ Message deletion enabled in this group!"
                } else {
                    "❌ Message deletion disabled in this group!"
                };
                self.answer(&b, Some(text), false).await;
                self.edit(&b, menus::group_settings(policy)).await;
            }
            Selector::SetDefault(secs) => {
                let secs = secs.min(MAX_DELAY_SECONDS);
                let policy = {
                    let mut store = self.policies.lock().await;
                    store.set_default_delay(b.chat_id, secs);
                    store.get_policy(b.chat_id)
                };
                self.edit(&b, menus::group_settings(policy)).await;
                let text = format!("Default time set to {}", format_duration(secs));
                self.answer(&b, Some(&text), false).await;
            }
            Selector::IncreaseDefault | Selector::DecreaseDefault => {
                let (delta, verb) = if sel == Selector::IncreaseDefault {
                    (DEFAULT_STEP_SECONDS, "increased")
                } else {
                    (-DEFAULT_STEP_SECONDS, "decreased")
                };
                let policy = {
                    let mut store = self.policies.lock().await;
                    store.adjust_default_delay(b.chat_id, delta);
                    store.get_policy(b.chat_id)
                };
                self.edit(&b, menus::group_settings(policy)).await;
                let text = format!(
                    "Default time {verb} to {}",
                    format_duration(policy.default_delay_seconds)
                );
                self.answer(&b, Some(&text), false).await;
            }
            Selector::ShowDefault => {
                let policy = self.policy(b.chat_id).await;
                let text = format!(
                    "Current default time: {}",
                    format_duration(policy.default_delay_seconds)
                );
                self.answer(&b, Some(&text), false).await;
            }
            Selector::SaveChanges => {
                let policy = self.policy(b.chat_id).await;
                self.edit(&b, menus::settings_saved(policy)).await;
                self.answer(&b, Some("Settings saved successfully!"), false)
                    .await;
            }
        }
    }

    async fn confirm_timer(&self, b: &ButtonPress, secs: u32, custom: bool) {
        let secs = secs.min(MAX_DELAY_SECONDS);
        let t = format_duration(secs);
        let text = if custom {
            format!("⏰ Custom timer set to {t}! Message will self-destruct after this time.")
        } else {
            format!("⏰ Timer set to {t}! Message will self-destruct after this time.")
        };
        self.answer(b, Some(&text), false).await;

        self.scheduler.schedule(b.deletion_target(), secs).await;
        self.edit(b, menus::timer_confirmed(secs, custom)).await;
    }

    async fn send(&self, chat_id: ChatId, html: &str) {
        if let Err(e) = self.messenger.send_html(chat_id, html).await {
            self.reply_failed(chat_id, e);
        }
    }

    async fn send_screen(&self, chat_id: ChatId, screen: Screen, reply_to: Option<MessageId>) {
        let res = match screen.keyboard {
            Some(kb) => {
                self.messenger
                    .send_keyboard(chat_id, &screen.html, kb, reply_to)
                    .await
            }
            None => self.messenger.send_html(chat_id, &screen.html).await,
        };
        if let Err(e) = res {
            self.reply_failed(chat_id, e);
        }
    }

    async fn edit(&self, b: &ButtonPress, screen: Screen) {
        if let Err(e) = self
            .messenger
            .edit_html(b.message, &screen.html, screen.keyboard)
            .await
        {
            self.reply_failed(b.chat_id, e);
        }
    }

    async fn answer(&self, b: &ButtonPress, text: Option<&str>, show_alert: bool) {
        if let Err(e) = self
            .messenger
            .answer_callback(&b.callback_id, text, show_alert)
            .await
        {
            self.reply_failed(b.chat_id, e);
        }
    }

    fn reply_failed(&self, chat_id: ChatId, e: crate::Error) {
        self.sink.record(OpsEvent::ReplyFailed {
            chat_id,
            error: e.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex as StdMutex, time::Duration};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        errors::Error,
        events::testing::RecordingSink,
        messaging::types::InlineKeyboard,
        permission::{MembershipLookup, Role},
        scheduler::testing::FakeDeleter,
        Result,
    };

    const GROUP: ChatId = ChatId(-100);
    const PRIVATE: ChatId = ChatId(55);
    const ADMIN: UserId = UserId(1);
    const MEMBER: UserId = UserId(2);

    #[derive(Clone, Debug)]
    struct Sent {
        chat_id: ChatId,
        html: String,
        keyboard: Option<InlineKeyboard>,
        reply_to: Option<MessageId>,
    }

    #[derive(Default)]
    struct FakeMessenger {
        next_id: StdMutex<i32>,
        sent: StdMutex<Vec<Sent>>,
        edits: StdMutex<Vec<(MessageRef, String, Option<InlineKeyboard>)>>,
        answers: StdMutex<Vec<(String, Option<String>, bool)>>,
    }

    impl FakeMessenger {
        fn alloc(&self, chat_id: ChatId) -> MessageRef {
            let mut guard = self.next_id.lock().unwrap();
            *guard += 1;
            MessageRef::new(chat_id, MessageId(1000 + *guard))
        }

        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn edits(&self) -> Vec<(MessageRef, String, Option<InlineKeyboard>)> {
            self.edits.lock().unwrap().clone()
        }

        fn answers(&self) -> Vec<(String, Option<String>, bool)> {
            self.answers.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
            self.sent.lock().unwrap().push(Sent {
                chat_id,
                html: html.to_string(),
                keyboard: None,
                reply_to: None,
            });
            Ok(self.alloc(chat_id))
        }

        async fn send_keyboard(
            &self,
            chat_id: ChatId,
            html: &str,
            keyboard: InlineKeyboard,
            reply_to: Option<MessageId>,
        ) -> Result<MessageRef> {
            self.sent.lock().unwrap().push(Sent {
                chat_id,
                html: html.to_string(),
                keyboard: Some(keyboard),
                reply_to,
            });
            Ok(self.alloc(chat_id))
        }

        async fn edit_html(
            &self,
            msg: MessageRef,
            html: &str,
            keyboard: Option<InlineKeyboard>,
        ) -> Result<()> {
            self.edits
                .lock()
                .unwrap()
                .push((msg, html.to_string(), keyboard));
            Ok(())
        }

        async fn answer_callback(
            &self,
            callback_id: &str,
            text: Option<&str>,
            show_alert: bool,
        ) -> Result<()> {
            self.answers.lock().unwrap().push((
                callback_id.to_string(),
                text.map(|s| s.to_string()),
                show_alert,
            ));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RoleTable {
        roles: HashMap<UserId, Role>,
        fail: bool,
    }

    #[async_trait]
    impl MembershipLookup for RoleTable {
        async fn get_role(&self, _chat_id: ChatId, user_id: UserId) -> Result<Role> {
            if self.fail {
                return Err(Error::External("telegram error: timed out".to_string()));
            }
            Ok(self.roles.get(&user_id).copied().unwrap_or(Role::Member))
        }
    }

    struct Harness {
        d: UpdateDispatcher,
        messenger: Arc<FakeMessenger>,
        deleter: Arc<FakeDeleter>,
        sink: Arc<RecordingSink>,
    }

    fn harness_with(lookup: RoleTable) -> Harness {
        let messenger = Arc::new(FakeMessenger::default());
        let deleter = Arc::new(FakeDeleter::default());
        let sink = Arc::new(RecordingSink::default());
        let gate = PermissionGate::new(Arc::new(lookup), sink.clone());
        let scheduler = DeletionScheduler::new(deleter.clone(), sink.clone());
        let d = UpdateDispatcher::new(
            PolicyStore::new(),
            gate,
            scheduler,
            messenger.clone(),
            sink.clone(),
            MenuLinks::default(),
        );
        Harness {
            d,
            messenger,
            deleter,
            sink,
        }
    }

    fn harness() -> Harness {
        let mut roles = HashMap::new();
        roles.insert(ADMIN, Role::Administrator);
        harness_with(RoleTable { roles, fail: false })
    }

    fn message(chat_id: ChatId, kind: ChatKind, id: i32, text: &str) -> Update {
        Update::Message(IncomingMessage {
            chat_id,
            chat_kind: kind,
            message_id: MessageId(id),
            user_id: Some(MEMBER),
            text: Some(text.to_string()),
        })
    }

    fn command(chat_id: ChatId, kind: ChatKind, user: UserId, text: &str) -> Update {
        Update::Message(IncomingMessage {
            chat_id,
            chat_kind: kind,
            message_id: MessageId(900),
            user_id: Some(user),
            text: Some(text.to_string()),
        })
    }

    fn press(
        chat_id: ChatId,
        kind: ChatKind,
        user: UserId,
        data: &str,
        reply_to: Option<i32>,
    ) -> Update {
        Update::Button(ButtonPress {
            chat_id,
            chat_kind: kind,
            user_id: user,
            callback_id: format!("cb-{data}"),
            data: data.to_string(),
            message: MessageRef::new(chat_id, MessageId(500)),
            reply_to: reply_to.map(|id| MessageRef::new(chat_id, MessageId(id))),
        })
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn group_message_is_deleted_after_default_delay() {
        let h = harness();
        let target = MessageRef::new(GROUP, MessageId(7));

        h.d.dispatch(message(GROUP, ChatKind::Group, 7, "hello")).await;
        assert!(h.d.scheduler().is_pending(target).await);
        assert!(h.messenger.sent().is_empty());

        advance(59).await;
        assert!(h.deleter.calls().is_empty());

        advance(2).await;
        assert_eq!(h.deleter.calls(), vec![target]);
        assert!(!h.d.scheduler().is_pending(target).await);

        advance(600).await;
        assert_eq!(h.deleter.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_group_schedules_nothing() {
        let h = harness();
        h.d.dispatch(press(GROUP, ChatKind::Group, ADMIN, "disable_delete", None))
            .await;
        assert!(!h.d.policy(GROUP).await.deletion_enabled);

        h.d.dispatch(message(GROUP, ChatKind::Group, 8, "hello")).await;
        assert_eq!(h.d.scheduler().pending_count().await, 0);
        assert_eq!(h.sink.count("deletion_scheduled"), 0);

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].html, menus::DELETION_DISABLED);

        advance(86_400).await;
        assert!(h.deleter.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn private_message_gets_timer_picker_as_reply() {
        let h = harness();
        h.d.dispatch(message(PRIVATE, ChatKind::Private, 12, "secret"))
            .await;

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, PRIVATE);
        assert_eq!(sent[0].html, menus::TIMER_PROMPT);
        assert_eq!(sent[0].reply_to, Some(MessageId(12)));
        assert_eq!(sent[0].keyboard, Some(menus::timer_keyboard()));
        assert_eq!(h.d.scheduler().pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_timer_presses_fire_once_at_last_choice() {
        let h = harness();
        let target = MessageRef::new(PRIVATE, MessageId(12));

        h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "timer_5", Some(12)))
            .await;
        h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "timer_30", Some(12)))
            .await;
        assert_eq!(h.d.scheduler().pending_count().await, 1);

        advance(10).await;
        assert!(h.deleter.calls().is_empty());

        advance(25).await;
        assert_eq!(h.deleter.calls(), vec![target]);

        let answers = h.messenger.answers();
        assert_eq!(answers.len(), 2);
        assert_eq!(
            answers[1].1.as_deref(),
            Some("⏰ Timer set to 30 seconds! Message will self-destruct after this time.")
        );
        let edits = h.messenger.edits();
        assert_eq!(edits.last().unwrap().1, menus::timer_confirmed(30, false).html);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_without_reply_targets_keyboard_message() {
        let h = harness();
        h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "timer_10", None))
            .await;
        assert!(h
            .d
            .scheduler()
            .is_pending(MessageRef::new(PRIVATE, MessageId(500)))
            .await);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_timer_flow() {
        let h = harness();

        h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "custom_time", Some(12)))
            .await;
        h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "increase_hour", Some(12)))
            .await;

        let edits = h.messenger.edits();
        assert_eq!(edits.len(), 2);
        assert!(edits[1].1.contains("2 hours"));
        let kb = edits[1].2.clone().unwrap();
        assert!(kb.callback_data().contains(&"set_custom_7200"));
        assert_eq!(
            h.messenger.answers()[1].1.as_deref(),
            Some("Time increased to 2 hours")
        );

        h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "set_custom_7200", Some(12)))
            .await;
        let target = MessageRef::new(PRIVATE, MessageId(12));
        let fire_at = h.d.scheduler().fire_at(target).await.unwrap();
        assert_eq!(
            fire_at - tokio::time::Instant::now(),
            Duration::from_secs(7200)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn decrease_hour_stops_at_a_minute() {
        let h = harness();
        for _ in 0..3 {
            h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "decrease_hour", None))
                .await;
        }
        assert_eq!(
            h.messenger.answers().last().unwrap().1.as_deref(),
            Some("Time decreased to 1 minute")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn member_cannot_change_group_policy() {
        let h = harness();
        for data in ["disable_delete", "time_600", "increase_default_time", "save_changes"] {
            h.d.dispatch(press(GROUP, ChatKind::Group, MEMBER, data, None))
                .await;
        }

        assert_eq!(h.d.policy(GROUP).await, ChatPolicy::default());
        assert!(h.messenger.edits().is_empty());
        let answers = h.messenger.answers();
        assert_eq!(answers.len(), 4);
        assert!(answers
            .iter()
            .all(|(_, text, alert)| text.as_deref() == Some(menus::PERMISSION_DENIED) && *alert));
        assert_eq!(h.sink.count("permission_denied"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_failure_is_denial() {
        let mut roles = HashMap::new();
        roles.insert(ADMIN, Role::Owner);
        let h = harness_with(RoleTable { roles, fail: true });

        h.d.dispatch(press(GROUP, ChatKind::Group, ADMIN, "disable_delete", None))
            .await;
        assert!(h.d.policy(GROUP).await.deletion_enabled);
        assert_eq!(h.sink.count("lookup_failed"), 1);
        assert!(h.messenger.answers()[0].2);
    }

    #[tokio::test(start_paused = true)]
    async fn admin_adjusts_default_delay() {
        let h = harness();
        h.d.dispatch(press(GROUP, ChatKind::Group, ADMIN, "increase_default_time", None))
            .await;
        assert_eq!(h.d.policy(GROUP).await.default_delay_seconds, 3660);
        assert_eq!(
            h.messenger.answers()[0].1.as_deref(),
            Some("Default time increased to 1 hour 1 minute")
        );
        assert!(h.messenger.edits()[0].1.contains("1 hour 1 minute"));

        h.d.dispatch(press(GROUP, ChatKind::Group, ADMIN, "time_999999", None))
            .await;
        assert_eq!(
            h.d.policy(GROUP).await.default_delay_seconds,
            MAX_DELAY_SECONDS
        );

        h.d.dispatch(press(GROUP, ChatKind::Group, ADMIN, "time_300", None))
            .await;
        h.d.dispatch(message(GROUP, ChatKind::Group, 3, "hi")).await;
        let fire_at = h
            .d
            .scheduler()
            .fire_at(MessageRef::new(GROUP, MessageId(3)))
            .await
            .unwrap();
        assert_eq!(
            fire_at - tokio::time::Instant::now(),
            Duration::from_secs(300)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn policy_buttons_in_private_chat_are_refused() {
        let h = harness();
        h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "disable_delete", None))
            .await;
        assert!(h.d.policy(PRIVATE).await.deletion_enabled);
        assert_eq!(
            h.messenger.answers()[0].1.as_deref(),
            Some(menus::SETTINGS_GROUP_ONLY)
        );

        h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "start_settings", None))
            .await;
        assert_eq!(
            h.messenger.edits()[0].1,
            menus::private_settings_info().html
        );
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_callback_is_dropped() {
        let h = harness();
        h.d.dispatch(press(PRIVATE, ChatKind::Private, MEMBER, "timer_soon", Some(1)))
            .await;
        assert_eq!(h.d.scheduler().pending_count().await, 0);
        assert_eq!(h.sink.count("update_dropped"), 1);
        assert_eq!(h.messenger.answers().len(), 1);
        assert!(h.messenger.edits().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn settings_command_is_gated() {
        let h = harness();

        h.d.dispatch(command(PRIVATE, ChatKind::Private, MEMBER, "/settings"))
            .await;
        h.d.dispatch(command(GROUP, ChatKind::Group, MEMBER, "/settings"))
            .await;
        h.d.dispatch(command(GROUP, ChatKind::Group, ADMIN, "/settings@sdb_bot"))
            .await;

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].html, menus::SETTINGS_GROUP_ONLY);
        assert_eq!(sent[1].html, menus::PERMISSION_DENIED);
        assert_eq!(sent[2].html, menus::group_settings(ChatPolicy::default()).html);
        assert!(sent[2].keyboard.is_some());

        // Commands are never scheduled for deletion.
        assert_eq!(h.d.scheduler().pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_command_is_an_ordinary_message() {
        let h = harness();
        h.d.dispatch(message(GROUP, ChatKind::Group, 4, "/dance")).await;
        assert!(h
            .d
            .scheduler()
            .is_pending(MessageRef::new(GROUP, MessageId(4)))
            .await);
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_help_reply_with_menus() {
        let h = harness();
        h.d.dispatch(command(PRIVATE, ChatKind::Private, MEMBER, "/start"))
            .await;
        h.d.dispatch(command(PRIVATE, ChatKind::Private, MEMBER, "/help"))
            .await;

        let sent = h.messenger.sent();
        assert!(sent[0].html.contains("Welcome"));
        assert!(sent[0].keyboard.is_some());
        assert!(sent[1].html.contains("/settings"));
        assert!(sent[1].keyboard.is_none());
    }
}
