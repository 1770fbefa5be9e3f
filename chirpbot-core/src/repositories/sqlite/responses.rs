//! src/repositories/sqlite/responses.rs
use async_trait::async_trait;
use chirpbot_common::models::DynamicCommand;
use chirpbot_common::traits::repository_traits::ResponseRepository;

use crate::db::{Database, TableSchema};
use crate::Error;

/// `responses(command PRIMARY KEY, response)`
pub const RESPONSES_TABLE: TableSchema = TableSchema {
    name: "responses",
    key_column: "command",
    value_columns: &["response"],
};

#[derive(Clone)]
pub struct SqliteResponseRepository {
    db: Database,
}

impl SqliteResponseRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn init(&self) -> Result<(), Error> {
        self.db.create_table_if_absent(&RESPONSES_TABLE).await
    }
}

#[async_trait]
impl ResponseRepository for SqliteResponseRepository {
    async fn upsert_response(&self, cmd: &DynamicCommand) -> Result<(), Error> {
        self.db
            .upsert(&RESPONSES_TABLE, &cmd.command_name, &[&cmd.response_text])
            .await
    }

    async fn get_all_responses(&self) -> Result<Vec<DynamicCommand>, Error> {
        let rows = self.db.fetch_all(&RESPONSES_TABLE).await?;
        rows.into_iter()
            .map(|row| {
                let response = row.values.into_iter().next().ok_or_else(|| {
                    Error::Storage(format!("malformed responses row for command={}", row.key))
                })?;
                Ok(DynamicCommand::new(row.key, response))
            })
            .collect()
    }

    async fn delete_response(&self, command_name: &str) -> Result<bool, Error> {
        self.db.delete(&RESPONSES_TABLE, command_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_twice_keeps_one_row() -> Result<(), Error> {
        let repo = SqliteResponseRepository::new(Database::in_memory().await?);
        repo.init().await?;

        repo.upsert_response(&DynamicCommand::new("foo", "bar")).await?;
        repo.upsert_response(&DynamicCommand::new("foo", "bar")).await?;

        assert_eq!(repo.get_all_responses().await?, vec![DynamicCommand::new("foo", "bar")]);
        Ok(())
    }

    #[tokio::test]
    async fn command_names_are_case_sensitive() -> Result<(), Error> {
        let repo = SqliteResponseRepository::new(Database::in_memory().await?);
        repo.init().await?;

        repo.upsert_response(&DynamicCommand::new("Lurk", "upper")).await?;
        repo.upsert_response(&DynamicCommand::new("lurk", "lower")).await?;

        assert_eq!(repo.get_all_responses().await?.len(), 2);
        Ok(())
    }
}
