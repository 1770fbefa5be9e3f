//! src/repositories/sqlite/credentials.rs
use async_trait::async_trait;
use chirpbot_common::models::CredentialRecord;
use chirpbot_common::traits::repository_traits::CredentialsRepository;

use crate::db::{Database, KvRecord, TableSchema};
use crate::Error;

/// `tokens(user_id PRIMARY KEY, token, refresh)`
pub const TOKENS_TABLE: TableSchema = TableSchema {
    name: "tokens",
    key_column: "user_id",
    value_columns: &["token", "refresh"],
};

#[derive(Clone)]
pub struct SqliteCredentialsRepository {
    db: Database,
}

impl SqliteCredentialsRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates the `tokens` table if it does not exist yet.
    pub async fn init(&self) -> Result<(), Error> {
        self.db.create_table_if_absent(&TOKENS_TABLE).await
    }
}

fn record_from_row(row: KvRecord) -> Result<CredentialRecord, Error> {
    let mut values = row.values.into_iter();
    match (values.next(), values.next()) {
        (Some(access_token), Some(refresh_token)) => Ok(CredentialRecord {
            user_id: row.key,
            access_token,
            refresh_token,
        }),
        _ => Err(Error::Storage(format!("malformed tokens row for user_id={}", row.key))),
    }
}

#[async_trait]
impl CredentialsRepository for SqliteCredentialsRepository {
    async fn upsert_credential(&self, cred: &CredentialRecord) -> Result<(), Error> {
        self.db
            .upsert(
                &TOKENS_TABLE,
                &cred.user_id,
                &[&cred.access_token, &cred.refresh_token],
            )
            .await
    }

    async fn get_all_credentials(&self) -> Result<Vec<CredentialRecord>, Error> {
        self.db
            .fetch_all(&TOKENS_TABLE)
            .await?
            .into_iter()
            .map(record_from_row)
            .collect()
    }

    async fn delete_credential(&self, user_id: &str) -> Result<bool, Error> {
        self.db.delete(&TOKENS_TABLE, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(user_id: &str, access: &str, refresh: &str) -> CredentialRecord {
        CredentialRecord {
            user_id: user_id.into(),
            access_token: access.into(),
            refresh_token: refresh.into(),
        }
    }

    #[tokio::test]
    async fn second_upsert_for_same_user_wins() -> Result<(), Error> {
        let repo = SqliteCredentialsRepository::new(Database::in_memory().await?);
        repo.init().await?;

        repo.upsert_credential(&cred("42", "a1", "r1")).await?;
        repo.upsert_credential(&cred("42", "a2", "r2")).await?;

        assert_eq!(repo.get_all_credentials().await?, vec![cred("42", "a2", "r2")]);
        Ok(())
    }

    #[tokio::test]
    async fn delete_credential_removes_only_that_user() -> Result<(), Error> {
        let repo = SqliteCredentialsRepository::new(Database::in_memory().await?);
        repo.init().await?;
        repo.upsert_credential(&cred("1", "a", "r")).await?;
        repo.upsert_credential(&cred("2", "b", "s")).await?;

        assert!(repo.delete_credential("1").await?);
        assert_eq!(repo.get_all_credentials().await?, vec![cred("2", "b", "s")]);
        Ok(())
    }
}
