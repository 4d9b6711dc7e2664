//! Common utilities and shared types for forum-rs.
//!
//! This crate provides foundational components used across all forum-rs
//! crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
