//! HTTP handlers

mod account;
mod auth;
mod channel;
mod fallback;
mod health;

pub use account::{current_user, update_account, update_avatar, update_cover_image};
pub use auth::{change_password, login, logout, refresh, register};
pub use channel::channel_profile;
pub use fallback::{method_not_allowed, not_found};
pub use health::{health, ready};
