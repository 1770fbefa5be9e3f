// File: chirpbot-core/src/test_utils/mod.rs

pub mod helpers;
pub mod mocks;

pub use helpers::*;
pub use mocks::*;
