//! # Inkpost Core
//!
//! The domain layer of the Inkpost blog backend.
//! This crate contains posts, validation, access rules and the ports
//! infrastructure must implement. It has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::{DomainError, RepoError};
