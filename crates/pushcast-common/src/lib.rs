//! Pushcast-Common: Shared error types and path utilities.
//!
//! This crate provides common functionality used across pushcast:
//!
//! - **Error Handling**: The start-up error taxonomy and a result alias
//! - **Path Utilities**: Suffix matching for segment files and mount-path
//!   request targets
//!
//! # Examples
//!
//! ```
//! use pushcast_common::paths::{has_suffix, mount_target};
//! use pushcast_common::{Error, Result};
//!
//! assert!(has_suffix("segment-001.m4s", ".m4s"));
//! assert_eq!(mount_target("public", "segment-001.m4s"), "/public/segment-001.m4s");
//!
//! fn example() -> Result<()> {
//!     Err(Error::startup_config("missing listen address"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod paths;

pub use error::{Error, Result};
