// File: chirpbot-core/src/services/bot_context.rs

use std::sync::Arc;
use tracing::info;

use crate::auth::CredentialManager;
use crate::db::Database;
use crate::platforms::ChatSender;
use crate::services::command_router::CommandRouter;
use crate::services::response_store::ResponseStore;

/// Everything an event handler may reach, passed as one object instead of
/// living in globals.
pub struct BotContext {
    pub tokens_db: Database,
    pub responses_db: Database,
    pub credentials: Arc<CredentialManager>,
    pub responses: Arc<ResponseStore>,
    pub chat: Arc<dyn ChatSender>,
    pub router: CommandRouter,
}

impl BotContext {
    pub fn new(
        tokens_db: Database,
        responses_db: Database,
        credentials: Arc<CredentialManager>,
        router: CommandRouter,
        chat: Arc<dyn ChatSender>,
    ) -> Self {
        let responses = router.store().clone();
        Self {
            tokens_db,
            responses_db,
            credentials,
            responses,
            chat,
            router,
        }
    }

    /// Release both storage pools. Call once the dispatcher has drained.
    pub async fn close(&self) {
        self.tokens_db.close().await;
        self.responses_db.close().await;
        info!("storage pools closed");
    }
}
