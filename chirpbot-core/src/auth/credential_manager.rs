// chirpbot-core/src/auth/credential_manager.rs
//
// Owns the OAuth token pairs: validate upstream, persist, hand to the live
// session. Reload at startup tolerates tokens that were revoked meanwhile.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use chirpbot_common::models::{CredentialRecord, ValidatedIdentity};
use chirpbot_common::traits::repository_traits::CredentialsRepository;

use crate::Error;
use crate::platforms::{IdentityValidator, SessionManager, TokenRefresher};

/// Upper bound on a single `/validate` round trip.
pub const DEFAULT_VALIDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of [`CredentialManager::load_all_credentials`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<ValidatedIdentity>,
    /// `(user_id as stored, reason)` for every record that did not come back.
    pub failed: Vec<(String, String)>,
}

pub struct CredentialManager {
    repo: Arc<dyn CredentialsRepository>,
    validator: Arc<dyn IdentityValidator>,
    session: Arc<dyn SessionManager>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    validate_timeout: Duration,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Last identity seen per user id.
    identities: DashMap<String, ValidatedIdentity>,
    /// When each user's access token stops working, fixed at validation time.
    expires_at: DashMap<String, Instant>,
}

impl CredentialManager {
    pub fn new(
        repo: Arc<dyn CredentialsRepository>,
        validator: Arc<dyn IdentityValidator>,
        session: Arc<dyn SessionManager>,
    ) -> Self {
        Self {
            repo,
            validator,
            session,
            refresher: None,
            validate_timeout: DEFAULT_VALIDATE_TIMEOUT,
            user_locks: DashMap::new(),
            identities: DashMap::new(),
            expires_at: DashMap::new(),
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn with_validate_timeout(mut self, timeout: Duration) -> Self {
        self.validate_timeout = timeout;
        self
    }

    fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Validate the pair upstream, persist it under the canonical user id,
    /// then register it with the live session. Nothing is persisted when
    /// validation fails.
    pub async fn add_credential(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<ValidatedIdentity, Error> {
        let identity = match tokio::time::timeout(
            self.validate_timeout,
            self.validator.validate(access_token, refresh_token),
        )
        .await
        {
            Ok(res) => res?,
            Err(_) => {
                return Err(Error::Validation(format!(
                    "token validation timed out after {:?}",
                    self.validate_timeout
                )));
            }
        };

        // Persist + register must not interleave with another writer for the
        // same identity, or the store and the session could end up disagreeing.
        let lock = self.lock_for(&identity.user_id);
        let _guard = lock.lock().await;

        let record = CredentialRecord {
            user_id: identity.user_id.clone(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        };
        self.repo.upsert_credential(&record).await?;
        self.session
            .register_credential(&identity.user_id, access_token, refresh_token)
            .await?;
        self.record_expiry(&identity.user_id, identity.expires_in);
        self.identities.insert(identity.user_id.clone(), identity.clone());

        info!("Added token to the database for user: {}", identity.user_id);
        Ok(identity)
    }

    /// Startup recovery: re-validate and re-register every stored pair.
    /// One bad record never blocks the others.
    pub async fn load_all_credentials(&self) -> Result<LoadReport, Error> {
        let records = self.repo.get_all_credentials().await?;
        debug!("loading {} stored credential(s)", records.len());

        let mut report = LoadReport::default();
        for rec in records {
            match self.add_credential(&rec.access_token, &rec.refresh_token).await {
                Ok(identity) => {
                    if identity.user_id != rec.user_id {
                        warn!(
                            "stored token for user_id={} now validates as user_id={}",
                            rec.user_id, identity.user_id
                        );
                    }
                    report.loaded.push(identity);
                }
                Err(e) => {
                    warn!("skipping stored credential for user_id={}: {}", rec.user_id, e);
                    report.failed.push((rec.user_id, e.to_string()));
                }
            }
        }

        info!(
            "credential reload finished: {} loaded, {} skipped",
            report.loaded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Rotate the pair stored for `user_id` through the token endpoint and
    /// persist the new one.
    pub async fn refresh_credential(&self, user_id: &str) -> Result<ValidatedIdentity, Error> {
        let refresher = self
            .refresher
            .as_ref()
            .ok_or_else(|| Error::Config("no token refresher configured".into()))?;

        let stored = self
            .repo
            .get_all_credentials()
            .await?
            .into_iter()
            .find(|c| c.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("no stored credential for user_id={user_id}")))?;

        let pair = refresher.refresh(&stored.refresh_token).await?;
        let identity = self.add_credential(&pair.access_token, &pair.refresh_token).await?;
        // /validate may omit the lifetime; the token endpoint's answer is as good.
        if identity.expires_in.is_none() && pair.expires_in.is_some() {
            self.record_expiry(&identity.user_id, pair.expires_in);
        }
        Ok(identity)
    }

    fn record_expiry(&self, user_id: &str, expires_in: Option<u64>) {
        match expires_in {
            Some(secs) => {
                self.expires_at
                    .insert(user_id.to_string(), Instant::now() + Duration::from_secs(secs));
            }
            None => {
                self.expires_at.remove(user_id);
            }
        }
    }

    /// User ids whose access token has at most `margin` left (or is already
    /// expired). Identities that never reported an expiry are skipped.
    pub fn expiring_within(&self, margin: Duration) -> Vec<String> {
        let now = Instant::now();
        let mut ids: Vec<String> = self
            .expires_at
            .iter()
            .filter(|e| e.value().saturating_duration_since(now) <= margin)
            .map(|e| e.key().clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn identity(&self, user_id: &str) -> Option<ValidatedIdentity> {
        self.identities.get(user_id).map(|e| e.value().clone())
    }
}
