//! # Userdir Shared Library
//!
//! This crate contains the types and business logic shared by the userdir
//! API server: the canonical user model, the record-store access layer and
//! the protocol-agnostic directory core that both wire adapters call into.
//!
//! ## Module Organization
//!
//! - `models`: canonical user record and input shapes
//! - `db`: record store contract, MongoDB implementation, in-memory test store
//! - `directory`: protocol-agnostic directory operations and error taxonomy

pub mod db;
pub mod directory;
pub mod models;

/// Current version of the userdir shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
