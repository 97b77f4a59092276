pub mod briefing;
pub mod config;
pub mod registry;
pub mod tools;
pub mod transcript;
