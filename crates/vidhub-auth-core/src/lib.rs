//! Vidhub Auth Core - Account and session business logic
//!
//! Core account functionality: credential verification, access/refresh
//! token issuance with single-token rotation, profile media handling and
//! channel profile lookups.

pub mod config;
pub mod crypto;
pub mod error;
pub mod media;
pub mod service;
pub mod session;
pub mod token;

pub use config::*;
pub use crypto::*;
pub use error::*;
pub use media::*;
pub use service::*;
pub use session::*;
pub use token::*;
