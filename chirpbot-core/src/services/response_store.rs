// File: chirpbot-core/src/services/response_store.rs
//
// In-memory view of the `responses` table. Lookups never touch storage;
// every mutation is persisted first and only then applied to the cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tracing::{debug, info};

use chirpbot_common::models::DynamicCommand;
use chirpbot_common::traits::repository_traits::ResponseRepository;

use crate::Error;

pub struct ResponseStore {
    repo: Arc<dyn ResponseRepository>,
    cache: RwLock<HashMap<String, String>>,
    /// Held across persist + cache update so both see mutations in one order.
    write_lock: Mutex<()>,
}

impl ResponseStore {
    pub fn new(repo: Arc<dyn ResponseRepository>) -> Self {
        Self {
            repo,
            cache: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.cache.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.cache.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Replace the in-memory table with whatever storage holds.
    pub async fn load_all(&self) -> Result<usize, Error> {
        let _w = self.write_lock.lock().await;
        let rows = self.repo.get_all_responses().await?;
        let fresh: HashMap<String, String> = rows
            .into_iter()
            .map(|c| (c.command_name, c.response_text))
            .collect();
        let count = fresh.len();
        *self.write_cache() = fresh;
        info!("loaded {} dynamic command(s)", count);
        Ok(count)
    }

    pub fn get_response(&self, command_name: &str) -> Option<String> {
        self.read_cache().get(command_name).cloned()
    }

    pub async fn set_response(&self, command_name: &str, response_text: &str) -> Result<(), Error> {
        validate_command_name(command_name)?;
        if response_text.trim().is_empty() {
            return Err(Error::Validation("response text must not be empty".into()));
        }

        let _w = self.write_lock.lock().await;
        self.repo
            .upsert_response(&DynamicCommand::new(command_name, response_text))
            .await?;
        self.write_cache()
            .insert(command_name.to_string(), response_text.to_string());
        debug!("set response for !{}", command_name);
        Ok(())
    }

    /// Returns whether a stored command was removed.
    pub async fn remove_response(&self, command_name: &str) -> Result<bool, Error> {
        let _w = self.write_lock.lock().await;
        let removed = self.repo.delete_response(command_name).await?;
        self.write_cache().remove(command_name);
        if removed {
            debug!("removed response for !{}", command_name);
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.read_cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_cache().is_empty()
    }
}

fn validate_command_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::Validation("command name must not be empty".into()));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(Error::Validation(format!(
            "command name '{name}' must not contain whitespace"
        )));
    }
    Ok(())
}
