//! # ldapkit-core
//!
//! Shared types for the ldapkit directory engine.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy for bind, inference, templating and change-list failures
//! - [`config`] - The resolved configuration object sessions are built from

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::DirectoryConfig;
pub use error::{Error, RejectedChange, Result};
