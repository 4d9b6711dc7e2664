//! Core business logic for forum-rs.

pub mod services;

pub use services::*;
