// File: src/tasks/mod.rs

pub mod credential_refresh;

pub use credential_refresh::{refresh_expiring_credentials, spawn_credential_refresh_task};
