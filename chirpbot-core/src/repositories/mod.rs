// src/repositories/mod.rs

pub mod sqlite;

pub use chirpbot_common::traits::repository_traits::{CredentialsRepository, ResponseRepository};
pub use sqlite::credentials::SqliteCredentialsRepository;
pub use sqlite::responses::SqliteResponseRepository;
