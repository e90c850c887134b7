//! Type system utilities and aliases.
//!
//! This module provides type aliases and utilities for commonly used
//! complex types throughout the codebase.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Arc<Mutex<T>>` and `Arc<RwLock<T>>`

pub mod aliases;

pub use aliases::*;
