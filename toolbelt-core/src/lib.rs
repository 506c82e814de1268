//! Toolbelt core library — configuration model, persistence, errors.
//!
//! - [`config`] — [`Config`], load / save / env overrides
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;

pub use config::{Config, TempPlacement, BUFFER_SIZE_ENV, DEFAULT_READ_BUFFER_SIZE};
pub use error::ConfigError;
