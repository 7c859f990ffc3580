/// REST route handlers
///
/// This module contains all REST handlers organized by resource:
///
/// - `health`: Health probe (store connectivity)
/// - `users`: User CRUD and search endpoints

pub mod health;
pub mod users;
