//! Helix ⟶ POST /chat/messages

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Error;
use crate::platforms::ChatSender;
use crate::platforms::twitch::client::TwitchHelixClient;

/// JSON body sent to Helix.
#[derive(Debug, Serialize)]
pub(crate) struct SendChatMessageRequest<'a> {
    pub broadcaster_id: &'a str,
    pub sender_id: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parent_message_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendChatMessageResponse {
    data: Vec<SendChatMessageResult>,
}

#[derive(Debug, Deserialize)]
struct SendChatMessageResult {
    message_id: String,
    is_sent: bool,
    #[serde(default)]
    drop_reason: Option<DropReason>,
}

#[derive(Debug, Deserialize)]
struct DropReason {
    code: String,
    message: String,
}

#[async_trait]
impl ChatSender for TwitchHelixClient {
    async fn send_chat_message(
        &self,
        broadcaster_id: &str,
        text: &str,
        reply_to_message_id: Option<&str>,
    ) -> Result<(), Error> {
        let body = SendChatMessageRequest {
            broadcaster_id,
            sender_id: self.bot_user_id(),
            message: text,
            reply_parent_message_id: reply_to_message_id,
        };

        let resp = self
            .http_client()
            .post(self.url("chat/messages"))
            .header("Client-Id", self.client_id())
            .header("Authorization", format!("Bearer {}", self.bearer_token()?))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Platform(format!("send_chat_message network error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Platform(format!("send_chat_message: HTTP {status} ⇒ {text}")));
        }

        let parsed: SendChatMessageResponse = resp
            .json()
            .await
            .map_err(|e| Error::Platform(format!("send_chat_message parse error: {e}")))?;

        match parsed.data.first() {
            Some(r) if r.is_sent => {
                debug!("sent chat message id={} to broadcaster={}", r.message_id, broadcaster_id);
                Ok(())
            }
            Some(r) => {
                let reason = r
                    .drop_reason
                    .as_ref()
                    .map(|d| format!("{}: {}", d.code, d.message))
                    .unwrap_or_else(|| "unknown".into());
                warn!("chat message to broadcaster={} dropped ⇒ {}", broadcaster_id, reason);
                Err(Error::Platform(format!("message dropped: {reason}")))
            }
            None => Err(Error::Platform("send_chat_message: empty response".into())),
        }
    }
}
