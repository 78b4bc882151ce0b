//! Shared utilities

pub mod config;
pub mod errors;
pub mod fs;
pub mod notify;
pub mod process;

pub use config::Config;
pub use errors::BuildError;
pub use notify::{Notification, Notifier};
