// tests/credential_tests.rs

use std::sync::Arc;

use chirpbot_common::models::CredentialRecord;
use chirpbot_core::{
    auth::CredentialManager,
    repositories::{CredentialsRepository, SqliteCredentialsRepository},
    test_utils::{identity_for, FlakyCredentialsRepository, RecordingSession, StaticValidator},
    Database, Error,
};

async fn sqlite_repo(db: Database) -> Result<Arc<SqliteCredentialsRepository>, Error> {
    let repo = SqliteCredentialsRepository::new(db);
    repo.init().await?;
    Ok(Arc::new(repo))
}

#[tokio::test]
async fn test_credential_upsert_keeps_latest_pair() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tokens.db");
    let path = path.to_string_lossy();

    let validator = Arc::new(StaticValidator::new());
    validator.accept("a1", identity_for("123"));
    validator.accept("a2", identity_for("123"));
    let session = Arc::new(RecordingSession::new());

    {
        let db = Database::new(&path).await?;
        let manager = CredentialManager::new(sqlite_repo(db.clone()).await?, validator.clone(), session.clone());
        manager.add_credential("a1", "r1").await?;
        manager.add_credential("a2", "r2").await?;
        db.close().await;
    }

    let db = Database::new(&path).await?;
    let stored = sqlite_repo(db.clone()).await?.get_all_credentials().await?;
    assert_eq!(
        stored,
        vec![CredentialRecord {
            user_id: "123".into(),
            access_token: "a2".into(),
            refresh_token: "r2".into(),
        }]
    );
    assert_eq!(session.pair_for("123"), Some(("a2".into(), "r2".into())));
    db.close().await;
    Ok(())
}

#[tokio::test]
async fn test_reload_survives_one_revoked_token() -> Result<(), Error> {
    let repo = sqlite_repo(Database::in_memory().await?).await?;
    for (user, access) in [("1", "t1"), ("2", "t2"), ("3", "t3")] {
        repo.upsert_credential(&CredentialRecord {
            user_id: user.into(),
            access_token: access.into(),
            refresh_token: format!("r{user}"),
        })
        .await?;
    }

    let validator = Arc::new(StaticValidator::new());
    validator.accept("t1", identity_for("1"));
    validator.accept("t3", identity_for("3"));
    let session = Arc::new(RecordingSession::new());

    let manager = CredentialManager::new(repo.clone(), validator, session.clone());
    let report = manager.load_all_credentials().await?;

    assert_eq!(report.loaded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "2");
    assert_eq!(session.registered_count(), 2);
    assert!(session.pair_for("2").is_none());
    // Skipped records are left in place, not deleted.
    assert_eq!(repo.get_all_credentials().await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_rejected_token_is_not_stored() -> Result<(), Error> {
    let repo = sqlite_repo(Database::in_memory().await?).await?;
    let session = Arc::new(RecordingSession::new());
    let manager = CredentialManager::new(repo.clone(), Arc::new(StaticValidator::new()), session.clone());

    let res = manager.add_credential("revoked", "r").await;
    assert!(matches!(res, Err(Error::Validation(_))));
    assert!(repo.get_all_credentials().await?.is_empty());
    assert_eq!(session.registered_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_reload_propagates_storage_failure() {
    let repo = Arc::new(FlakyCredentialsRepository::new());
    repo.fail_reads(true);
    let manager = CredentialManager::new(
        repo,
        Arc::new(StaticValidator::new()),
        Arc::new(RecordingSession::new()),
    );

    let res = manager.load_all_credentials().await;
    assert!(matches!(res, Err(Error::Storage(_))));
}

#[tokio::test]
async fn test_concurrent_adds_for_one_user_leave_one_record() -> Result<(), Error> {
    let repo = sqlite_repo(Database::in_memory().await?).await?;
    let validator = Arc::new(StaticValidator::new());
    for i in 0..8 {
        validator.accept(&format!("a{i}"), identity_for("77"));
    }
    let session = Arc::new(RecordingSession::new());
    let manager = Arc::new(CredentialManager::new(repo.clone(), validator, session.clone()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let m = manager.clone();
        handles.push(tokio::spawn(async move {
            m.add_credential(&format!("a{i}"), &format!("r{i}")).await
        }));
    }
    for h in handles {
        tokio_test::assert_ok!(h.await.expect("join"));
    }

    let stored = repo.get_all_credentials().await?;
    assert_eq!(stored.len(), 1);
    // Store and session agree on whichever writer went last.
    let (access, refresh) = session.pair_for("77").expect("registered");
    assert_eq!(stored[0].access_token, access);
    assert_eq!(stored[0].refresh_token, refresh);
    Ok(())
}
