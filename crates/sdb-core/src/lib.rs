//! Core domain + application logic for the self-destruct bot.
//!
//! This crate is framework-agnostic. Telegram lives behind ports (traits)
//! implemented in the adapter crate.

pub mod audit;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod events;
pub mod formatting;
pub mod logging;
pub mod menus;
pub mod messaging;
pub mod permission;
pub mod policy;
pub mod scheduler;
pub mod selector;
pub mod timers;

pub use errors::{Error, Result};
