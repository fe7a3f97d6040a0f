pub mod config;
pub mod error;
pub mod homework;
pub mod logging;
pub mod notifier;
pub mod practicum;
pub mod telegram;
