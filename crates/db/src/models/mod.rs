//! Row models and DTOs.

pub mod account;
pub mod notify_config;

pub use account::{Account, CreateAccount};
pub use notify_config::{ConfigStateUpdate, NotifyConfig, UpsertNotifySettings};
