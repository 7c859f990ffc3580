/// Data models for the user directory
///
/// This module contains the canonical user record and the input shapes
/// accepted by the directory core:
///
/// - `user`: User, UserRole, CreateUser, UpdateUser, UserFields

pub mod user;

pub use user::{CreateUser, UpdateUser, User, UserFields, UserRole};
