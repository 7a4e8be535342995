//! Shared foundational types used across the Weld build pipeline.
//!
//! This crate provides core types including content hashing, build
//! architecture names, serve-path text utilities, and common result types.

#![warn(missing_docs)]

pub mod arch;
pub mod hash;
pub mod result;
pub mod text;

pub use arch::Arch;
pub use hash::ContentHash;
pub use result::{InternalError, WeldResult};
pub use text::{convert_colons, normalize_line_endings};
