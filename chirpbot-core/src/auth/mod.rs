// chirpbot-core/src/auth/mod.rs

pub mod credential_manager;

pub use credential_manager::{CredentialManager, LoadReport, DEFAULT_VALIDATE_TIMEOUT};
