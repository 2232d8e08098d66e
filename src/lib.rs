//! Daybook library
//!
//! This library exposes the core functionality of the daybook backend for
//! testing and potential future library use.

pub mod api;
pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
