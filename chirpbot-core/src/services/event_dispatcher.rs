// File: chirpbot-core/src/services/event_dispatcher.rs
//
// Single consumer of the event bus. Each event runs on its own task so a slow
// chat send never holds up the next message, and a failing or panicking
// handler only loses its own event.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::Error;
use crate::eventbus::BotEvent;
use crate::platforms::twitch_eventsub::events::{ChannelChatMessage, StreamOnline};
use crate::services::bot_context::BotContext;

pub struct EventDispatcher {
    ctx: Arc<BotContext>,
}

impl EventDispatcher {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// Runs until shutdown is signalled or every producer is gone, then waits
    /// for in-flight handlers. Returns how many events were dispatched.
    pub async fn run(
        &self,
        mut rx: mpsc::Receiver<BotEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> usize {
        let mut in_flight: JoinSet<()> = JoinSet::new();
        let mut dispatched = 0usize;

        if *shutdown_rx.borrow() {
            debug!("dispatcher: shutdown already signalled");
            return 0;
        }

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("dispatcher: shutdown signal received");
                        break;
                    }
                }

                maybe_evt = rx.recv() => {
                    let Some(event) = maybe_evt else {
                        debug!("dispatcher: event stream closed");
                        break;
                    };
                    dispatched += 1;
                    let ctx = self.ctx.clone();
                    in_flight.spawn(async move {
                        let kind = event.event_type();
                        if let Err(e) = handle_event(&ctx, event).await {
                            error!("handler for {} failed: {}", kind, e);
                        }
                    });
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join(joined);
                }
            }
        }

        // No new events past this point.
        rx.close();
        if !in_flight.is_empty() {
            info!("dispatcher: waiting on {} in-flight handler(s)", in_flight.len());
        }
        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }
        dispatched
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("event handler panicked: {}", e);
        } else {
            warn!("event handler cancelled: {}", e);
        }
    }
}

pub async fn handle_event(ctx: &BotContext, event: BotEvent) -> Result<(), Error> {
    match event {
        BotEvent::ChatMessage(msg) => handle_chat_message(ctx, &msg).await,
        BotEvent::StreamOnline(evt) => {
            handle_stream_online(&evt);
            Ok(())
        }
    }
}

async fn handle_chat_message(ctx: &BotContext, msg: &ChannelChatMessage) -> Result<(), Error> {
    info!(
        "[{}] - {}: {}",
        msg.broadcaster_user_login, msg.chatter_user_name, msg.text()
    );

    let Some(reply) = ctx.router.route(msg).await? else {
        return Ok(());
    };

    ctx.chat
        .send_chat_message(&msg.broadcaster_user_id, &reply.text, reply.reply_to.as_deref())
        .await
}

fn handle_stream_online(evt: &StreamOnline) {
    info!(
        "{} went live ({}) at {}",
        evt.broadcaster_user_login, evt.r#type, evt.started_at
    );
}
