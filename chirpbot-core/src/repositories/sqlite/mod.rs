// src/repositories/sqlite/mod.rs

pub mod credentials;
pub mod responses;
