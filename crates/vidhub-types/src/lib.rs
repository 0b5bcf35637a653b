//! Vidhub Types - Shared domain types
//!
//! This crate contains domain types used across Vidhub services:
//! - User identity and the sanitized public view of an account
//! - Channel profile aggregates built from subscription edges
//! - The uniform JSON response envelope

pub mod api;
pub mod subscription;
pub mod user;

pub use api::*;
pub use subscription::*;
pub use user::*;
