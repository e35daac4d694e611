use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use sdb_core::{
    audit::AuditLogger,
    config::Config,
    dispatch::UpdateDispatcher,
    events::{EventSink, TracingSink},
    menus::MenuLinks,
    messaging::port::MessagingPort,
    permission::PermissionGate,
    policy::{ChatPolicy, PolicyStore},
    scheduler::DeletionScheduler,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<UpdateDispatcher>,
    pub sink: Arc<dyn EventSink>,
}

fn build_sink(cfg: &Config) -> Arc<dyn EventSink> {
    match &cfg.audit_log_path {
        Some(path) => Arc::new(AuditLogger::new(path.clone(), cfg.audit_log_json)),
        None => Arc::new(TracingSink),
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot.get_me().await?;
    let bot_username = me.username.clone();
    tracing::info!(
        bot = bot_username.as_deref().unwrap_or("?"),
        default_delay = cfg.default_delete_delay,
        "self-destruct bot started"
    );

    if cfg.drop_pending_updates {
        bot.delete_webhook().drop_pending_updates(true).await?;
        tracing::info!("dropped pending updates");
    }

    let sink = build_sink(&cfg);
    if let Some(path) = &cfg.audit_log_path {
        tracing::info!(path = %path.display(), json = cfg.audit_log_json, "audit log enabled");
    }

    let telegram = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = telegram.clone();
    let scheduler = DeletionScheduler::new(telegram.clone(), sink.clone());
    let gate = PermissionGate::new(telegram, sink.clone());

    let policies = PolicyStore::with_defaults(ChatPolicy {
        deletion_enabled: true,
        default_delay_seconds: cfg.default_delete_delay,
    });
    let links = MenuLinks {
        owner_url: cfg.owner_url.clone(),
        channel_url: cfg.channel_url.clone(),
        bot_username,
    };

    let dispatcher = Arc::new(UpdateDispatcher::new(
        policies,
        gate,
        scheduler.clone(),
        messenger,
        sink.clone(),
        links,
    ));
    let state = Arc::new(AppState { dispatcher, sink });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build();

    spawn_sigterm_listener(dispatcher.shutdown_token());

    dispatcher.dispatch().await;

    let cancelled = scheduler.shutdown().await;
    tracing::info!(cancelled, "shutdown complete; pending deletions discarded");

    Ok(())
}

#[cfg(unix)]
fn spawn_sigterm_listener(token: teloxide::dispatching::ShutdownToken) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut term = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        term.recv().await;
        tracing::info!("SIGTERM received, stopping dispatcher");
        match token.shutdown() {
            Ok(done) => done.await,
            Err(e) => tracing::warn!(error = %e, "dispatcher was not running"),
        }
    });
}

#[cfg(not(unix))]
fn spawn_sigterm_listener(_token: teloxide::dispatching::ShutdownToken) {}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn cfg(audit: Option<&str>) -> Config {
        let mut cfg = Config::from_lookup(|k| (k == "BOT_TOKEN").then(|| "1:x".to_string()))
            .unwrap();
        cfg.audit_log_path = audit.map(PathBuf::from);
        cfg
    }

    #[test]
    fn sink_choice_follows_audit_path() {
        // Both variants accept events without panicking.
        for c in [cfg(None), cfg(Some("/tmp/sdb-router-audit.log"))] {
            let sink = build_sink(&c);
            sink.record(sdb_core::events::OpsEvent::UpdateDropped {
                reason: "test".to_string(),
            });
        }
        let _ = std::fs::remove_file("/tmp/sdb-router-audit.log");
    }
}
