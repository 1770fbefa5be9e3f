//! Helix ⟶ POST /eventsub/subscriptions (websocket transport)

use serde_json::json;
use tracing::debug;

use crate::Error;
use crate::platforms::twitch::client::TwitchHelixClient;
use crate::platforms::twitch_eventsub::subscriptions::SubscriptionDescriptor;

impl TwitchHelixClient {
    /// Attach one subscription to the websocket session `session_id`.
    pub async fn create_eventsub_subscription(
        &self,
        session_id: &str,
        descriptor: &SubscriptionDescriptor,
    ) -> Result<(), Error> {
        let body = json!({
            "type": descriptor.kind.event_type(),
            "version": descriptor.kind.version(),
            "condition": descriptor.condition(),
            "transport": {
                "method": "websocket",
                "session_id": session_id
            }
        });
        debug!("Subscribing to {} => {:?}", descriptor.kind.event_type(), body);

        let resp = self
            .http_client()
            .post(self.url("eventsub/subscriptions"))
            .header("Client-Id", self.client_id())
            .header("Authorization", format!("Bearer {}", self.bearer_token()?))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Platform(format!(
                "Error posting subscribe for {}: {e}",
                descriptor.kind.event_type()
            )))?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Validation(format!(
                "subscribe {} rejected: HTTP {status} ⇒ {text}",
                descriptor.kind.event_type()
            )));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Platform(format!(
                "Could not subscribe to {} => HTTP {} => {}",
                descriptor.kind.event_type(),
                status,
                text
            )));
        }
        Ok(())
    }
}
