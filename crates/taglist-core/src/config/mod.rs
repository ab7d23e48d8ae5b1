//! Settings loading

mod loader;

pub use loader::{LoadedSettings, SettingsLoader, DEFAULT_CONFIG_FILE_NAME, ENV_PREFIX};
