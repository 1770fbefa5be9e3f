// tests/dispatcher_tests.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chirpbot_core::{
    auth::CredentialManager,
    eventbus::{BotEvent, EventBus},
    platforms::ChatSender,
    repositories::SqliteResponseRepository,
    services::{BotContext, CommandRouter, EventDispatcher, ResponseStore, RouterConfig},
    services::builtin_commands::{ADD_COMMAND_USAGE, DEFAULT_SOCIALS_LINK},
    services::event_dispatcher::handle_event,
    test_utils::{
        chat_message_from, sample_chat_message, FlakyCredentialsRepository, RecordingChatSender,
        RecordingSession, StaticValidator, TEST_BROADCASTER_ID,
    },
    Database, Error,
};

struct Harness {
    ctx: Arc<BotContext>,
    chat: Arc<RecordingChatSender>,
}

async fn harness_with(chat: Arc<dyn ChatSender>, recorder: Arc<RecordingChatSender>) -> Result<Harness, Error> {
    let responses_db = Database::in_memory().await?;
    let repo = SqliteResponseRepository::new(responses_db.clone());
    repo.init().await?;
    let store = Arc::new(ResponseStore::new(Arc::new(repo)));

    let credentials = Arc::new(CredentialManager::new(
        Arc::new(FlakyCredentialsRepository::new()),
        Arc::new(StaticValidator::new()),
        Arc::new(RecordingSession::new()),
    ));
    let router = CommandRouter::new(
        store,
        RouterConfig { owner_user_id: Some("9000".into()), ..RouterConfig::default() },
    );

    let ctx = BotContext::new(Database::in_memory().await?, responses_db, credentials, router, chat);
    Ok(Harness { ctx: Arc::new(ctx), chat: recorder })
}

async fn harness() -> Result<Harness, Error> {
    let chat = Arc::new(RecordingChatSender::new());
    harness_with(chat.clone(), chat).await
}

async fn say(h: &Harness, text: &str, badges: &[&str]) -> Result<(), Error> {
    handle_event(&h.ctx, BotEvent::ChatMessage(sample_chat_message(text, badges))).await
}

#[tokio::test]
async fn test_hello_then_unknown_command() -> Result<(), Error> {
    let h = harness().await?;

    say(&h, "!hello", &[]).await?;
    say(&h, "!nonexistent", &[]).await?;

    let sent = h.chat.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "Hello @viewer!");
    assert_eq!(sent[0].broadcaster_id, TEST_BROADCASTER_ID);
    assert!(sent[0].reply_to.is_some());
    Ok(())
}

#[tokio::test]
async fn test_socials_sends_link() -> Result<(), Error> {
    let h = harness().await?;
    say(&h, "!socials", &[]).await?;
    assert_eq!(h.chat.texts(), vec![DEFAULT_SOCIALS_LINK.to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_moderator_adds_command_then_viewer_uses_it() -> Result<(), Error> {
    let h = harness().await?;

    say(&h, "!addcommand lurk enjoy the lurk!", &["moderator"]).await?;
    say(&h, "!lurk", &[]).await?;

    assert_eq!(
        h.chat.texts(),
        vec!["Added command !lurk".to_string(), "enjoy the lurk!".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_owner_without_badges_is_elevated() -> Result<(), Error> {
    let h = harness().await?;
    let msg = chat_message_from("9000", "Owner", "!addcommand ping pong", &[]);
    handle_event(&h.ctx, BotEvent::ChatMessage(msg)).await?;

    assert_eq!(h.ctx.responses.get_response("ping").as_deref(), Some("pong"));
    Ok(())
}

#[tokio::test]
async fn test_non_elevated_add_is_denied() -> Result<(), Error> {
    let h = harness().await?;

    say(&h, "!addcommand foo bar", &["vip"]).await?;

    assert_eq!(h.ctx.responses.get_response("foo"), None);
    let texts = h.chat.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("only moderators"), "got {texts:?}");
    Ok(())
}

#[tokio::test]
async fn test_add_without_response_shows_usage() -> Result<(), Error> {
    let h = harness().await?;

    say(&h, "!addcommand foo", &["moderator"]).await?;
    say(&h, "!addcommand", &["moderator"]).await?;

    assert!(h.ctx.responses.is_empty());
    assert_eq!(h.chat.texts(), vec![ADD_COMMAND_USAGE.to_string(), ADD_COMMAND_USAGE.to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_builtin_wins_over_dynamic_of_same_name() -> Result<(), Error> {
    let h = harness().await?;
    h.ctx.responses.set_response("hi", "x").await?;

    say(&h, "!hi", &[]).await?;
    assert_eq!(h.chat.texts(), vec!["Hello @viewer!".to_string()]);
    Ok(())
}

/// Panics on one specific line, records everything else.
struct PanickyChatSender {
    inner: Arc<RecordingChatSender>,
}

#[async_trait]
impl ChatSender for PanickyChatSender {
    async fn send_chat_message(&self, broadcaster_id: &str, text: &str, reply_to: Option<&str>) -> Result<(), Error> {
        if text == "boom" {
            panic!("chat sender exploded");
        }
        self.inner.send_chat_message(broadcaster_id, text, reply_to).await
    }
}

#[tokio::test]
async fn test_dispatcher_survives_failing_and_panicking_handlers() -> Result<(), Error> {
    let recorder = Arc::new(RecordingChatSender::new());
    let h = harness_with(Arc::new(PanickyChatSender { inner: recorder.clone() }), recorder).await?;
    h.ctx.responses.set_response("explode", "boom").await?;

    let bus = Arc::new(EventBus::new());
    let rx = bus.subscribe().expect("first subscriber");
    let dispatcher = EventDispatcher::new(h.ctx.clone());
    let shutdown_rx = bus.shutdown_rx.clone();
    let run = tokio::spawn(async move { dispatcher.run(rx, shutdown_rx).await });

    bus.publish(BotEvent::ChatMessage(sample_chat_message("!explode", &[]))).await;
    bus.publish(BotEvent::ChatMessage(sample_chat_message("!hey", &[]))).await;

    for _ in 0..50 {
        if !h.chat.sent().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    bus.shutdown();
    let dispatched = tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("dispatcher exits after shutdown")
        .expect("dispatcher itself never panics");

    assert_eq!(dispatched, 2);
    assert_eq!(h.chat.texts(), vec!["Hello @viewer!".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_send_failure_is_reported_not_swallowed() -> Result<(), Error> {
    let h = harness().await?;
    h.chat.fail_sends(true);

    let res = say(&h, "!hi", &[]).await;
    assert!(matches!(res, Err(Error::Platform(_))));
    Ok(())
}

#[tokio::test]
async fn test_shutdown_drains_and_closes_storage() -> Result<(), Error> {
    let h = harness().await?;
    let bus = EventBus::new();
    let rx = bus.subscribe().expect("first subscriber");

    for i in 0..10 {
        bus.publish(BotEvent::ChatMessage(sample_chat_message(&format!("chatter line {i}"), &[]))).await;
    }
    bus.publish(BotEvent::ChatMessage(sample_chat_message("!howdy", &[]))).await;
    drop(bus);

    // Producer gone: the dispatcher runs the queue dry and stops.
    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let dispatched = EventDispatcher::new(h.ctx.clone()).run(rx, shutdown_rx).await;
    assert_eq!(dispatched, 11);
    assert_eq!(h.chat.texts(), vec!["Hello @viewer!".to_string()]);

    h.ctx.close().await;
    assert!(h.ctx.tokens_db.is_closed());
    assert!(h.ctx.responses_db.is_closed());
    Ok(())
}
