//! chirpbot-server/src/context.rs
//!
//! Builds the process-wide object graph once, at startup.

use std::sync::Arc;
use tracing::info;

use chirpbot_core::auth::CredentialManager;
use chirpbot_core::db::Database;
use chirpbot_core::eventbus::EventBus;
use chirpbot_core::platforms::twitch::{TwitchAuthenticator, TwitchHelixClient, TwitchSession};
use chirpbot_core::platforms::twitch_eventsub::subscriptions::default_subscriptions;
use chirpbot_core::platforms::twitch_eventsub::TwitchEventSubPlatform;
use chirpbot_core::repositories::{SqliteCredentialsRepository, SqliteResponseRepository};
use chirpbot_core::services::{BotContext, CommandRouter, ResponseStore, RouterConfig};
use chirpbot_core::Error;

use crate::config::{Args, TwitchConfig};

pub struct ServerContext {
    pub event_bus: Arc<EventBus>,
    pub helix: TwitchHelixClient,
    pub bot: Arc<BotContext>,
    pub twitch: TwitchConfig,
}

impl ServerContext {
    pub async fn new(args: &Args, twitch: TwitchConfig) -> Result<Self, Error> {
        let tokens_db = Database::new(&args.tokens_db).await?;
        let responses_db = match Database::new(&args.responses_db).await {
            Ok(db) => db,
            Err(e) => {
                tokens_db.close().await;
                return Err(e);
            }
        };

        let ctx = Self::assemble(args, twitch, tokens_db.clone(), responses_db.clone()).await;
        if ctx.is_err() {
            tokens_db.close().await;
            responses_db.close().await;
        }
        ctx
    }

    async fn assemble(
        args: &Args,
        twitch: TwitchConfig,
        tokens_db: Database,
        responses_db: Database,
    ) -> Result<Self, Error> {
        let creds_repo = SqliteCredentialsRepository::new(tokens_db.clone());
        creds_repo.init().await?;
        let responses_repo = SqliteResponseRepository::new(responses_db.clone());
        responses_repo.init().await?;

        let session = Arc::new(TwitchSession::new());
        let authenticator = Arc::new(TwitchAuthenticator::new(
            twitch.client_id.clone(),
            Some(twitch.client_secret.clone()),
        ));
        let credentials = Arc::new(
            CredentialManager::new(Arc::new(creds_repo), authenticator.clone(), session.clone())
                .with_refresher(authenticator),
        );

        let store = Arc::new(ResponseStore::new(Arc::new(responses_repo)));
        let router = CommandRouter::new(
            store,
            RouterConfig {
                owner_user_id: Some(twitch.owner_id.clone()),
                socials_link: args.socials_link.clone(),
            },
        );

        let helix = TwitchHelixClient::new(&twitch.client_id, &twitch.bot_id, session.clone());
        let bot = Arc::new(BotContext::new(
            tokens_db,
            responses_db,
            credentials,
            router,
            Arc::new(helix.clone()),
        ));

        info!("server context ready (tokens={}, responses={})", args.tokens_db, args.responses_db);
        Ok(Self {
            event_bus: Arc::new(EventBus::new()),
            helix,
            bot,
            twitch,
        })
    }

    pub fn eventsub_runtime(&self) -> TwitchEventSubPlatform {
        TwitchEventSubPlatform::new(
            self.helix.clone(),
            default_subscriptions(&self.twitch.owner_id, &self.twitch.bot_id),
            self.event_bus.clone(),
        )
    }
}
