// src/lib.rs

pub mod db;
pub mod repositories;
pub mod platforms;
pub mod auth;
pub mod tasks;
pub mod eventbus;
pub mod services;
pub mod test_utils;

pub use db::Database;
pub use chirpbot_common::error::Error;
