use async_trait::async_trait;
use crate::error::Error;
use crate::models::{CredentialRecord, DynamicCommand};

/// Storage for OAuth token pairs, one row per platform user id.
#[async_trait]
pub trait CredentialsRepository: Send + Sync {
    /// Insert or overwrite the pair stored for `cred.user_id`.
    async fn upsert_credential(&self, cred: &CredentialRecord) -> Result<(), Error>;
    async fn get_all_credentials(&self) -> Result<Vec<CredentialRecord>, Error>;
    /// Returns `true` if a row was removed.
    async fn delete_credential(&self, user_id: &str) -> Result<bool, Error>;
}

/// Storage for dynamic command responses, one row per command name.
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    async fn upsert_response(&self, cmd: &DynamicCommand) -> Result<(), Error>;
    async fn get_all_responses(&self) -> Result<Vec<DynamicCommand>, Error>;
    /// Returns `true` if a row was removed.
    async fn delete_response(&self, command_name: &str) -> Result<bool, Error>;
}
