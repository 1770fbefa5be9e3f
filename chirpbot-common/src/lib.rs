// chirpbot-common/src/lib.rs
//
// Types shared by the core library and the server binary: the error
// taxonomy, the persisted records and the repository traits.

pub mod error;
pub mod models;
pub mod traits;

pub use error::Error;
