//! # taglist-core
//!
//! Core library for the taglist CLI providing:
//! - The [`Settings`] record every command runs against
//! - Layered settings loading (defaults, settings file, environment)
//! - The shared error type

pub mod config;
pub mod error;
pub mod types;

pub use config::{LoadedSettings, SettingsLoader};
pub use error::{Error, Result};
pub use types::{OutputFormat, Settings, SettingsOverrides};
