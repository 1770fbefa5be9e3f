// File: chirpbot-core/src/test_utils/mocks.rs
//
// Hand-written doubles for the platform seams and repositories, shared by the
// unit tests and the integration tests under `tests/`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use chirpbot_common::models::{CredentialRecord, DynamicCommand, ValidatedIdentity};
use chirpbot_common::traits::repository_traits::{CredentialsRepository, ResponseRepository};

use crate::platforms::{ChatSender, IdentityValidator, SessionManager};
use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentChat {
    pub broadcaster_id: String,
    pub text: String,
    pub reply_to: Option<String>,
}

/// Records every outgoing chat line instead of hitting Helix.
#[derive(Default)]
pub struct RecordingChatSender {
    sent: Mutex<Vec<SentChat>>,
    fail: AtomicBool,
}

impl RecordingChatSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with a platform error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentChat> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }
}

#[async_trait]
impl ChatSender for RecordingChatSender {
    async fn send_chat_message(
        &self,
        broadcaster_id: &str,
        text: &str,
        reply_to_message_id: Option<&str>,
    ) -> Result<(), Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Platform("chat send refused".into()));
        }
        self.sent.lock().unwrap().push(SentChat {
            broadcaster_id: broadcaster_id.to_string(),
            text: text.to_string(),
            reply_to: reply_to_message_id.map(str::to_string),
        });
        Ok(())
    }
}

/// Accepts exactly the access tokens it was told about.
#[derive(Default)]
pub struct StaticValidator {
    accepted: Mutex<HashMap<String, ValidatedIdentity>>,
}

impl StaticValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&self, access_token: &str, identity: ValidatedIdentity) {
        self.accepted
            .lock()
            .unwrap()
            .insert(access_token.to_string(), identity);
    }

    pub fn revoke(&self, access_token: &str) {
        self.accepted.lock().unwrap().remove(access_token);
    }
}

#[async_trait]
impl IdentityValidator for StaticValidator {
    async fn validate(&self, access_token: &str, _refresh_token: &str) -> Result<ValidatedIdentity, Error> {
        self.accepted
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or_else(|| Error::Validation("invalid access token".into()))
    }
}

/// Session double that only remembers who was registered with which pair.
#[derive(Default)]
pub struct RecordingSession {
    registered: Mutex<HashMap<String, (String, String)>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair_for(&self, user_id: &str) -> Option<(String, String)> {
        self.registered.lock().unwrap().get(user_id).cloned()
    }

    pub fn registered_count(&self) -> usize {
        self.registered.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionManager for RecordingSession {
    async fn register_credential(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), Error> {
        self.registered.lock().unwrap().insert(
            user_id.to_string(),
            (access_token.to_string(), refresh_token.to_string()),
        );
        Ok(())
    }
}

/// In-memory response table whose writes can be made to fail.
#[derive(Default)]
pub struct FlakyResponseRepository {
    rows: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl FlakyResponseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::Storage("disk I/O error".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ResponseRepository for FlakyResponseRepository {
    async fn upsert_response(&self, cmd: &DynamicCommand) -> Result<(), Error> {
        self.check()?;
        self.rows
            .lock()
            .unwrap()
            .insert(cmd.command_name.clone(), cmd.response_text.clone());
        Ok(())
    }

    async fn get_all_responses(&self) -> Result<Vec<DynamicCommand>, Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| DynamicCommand::new(k.clone(), v.clone()))
            .collect())
    }

    async fn delete_response(&self, command_name: &str) -> Result<bool, Error> {
        self.check()?;
        Ok(self.rows.lock().unwrap().remove(command_name).is_some())
    }
}

/// In-memory credentials table whose reads can be made to fail.
#[derive(Default)]
pub struct FlakyCredentialsRepository {
    rows: Mutex<HashMap<String, CredentialRecord>>,
    fail_reads: AtomicBool,
}

impl FlakyCredentialsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialsRepository for FlakyCredentialsRepository {
    async fn upsert_credential(&self, cred: &CredentialRecord) -> Result<(), Error> {
        self.rows
            .lock()
            .unwrap()
            .insert(cred.user_id.clone(), cred.clone());
        Ok(())
    }

    async fn get_all_credentials(&self) -> Result<Vec<CredentialRecord>, Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage("unable to open database file".into()));
        }
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn delete_credential(&self, user_id: &str) -> Result<bool, Error> {
        Ok(self.rows.lock().unwrap().remove(user_id).is_some())
    }
}
