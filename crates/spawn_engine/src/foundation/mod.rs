//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the scheduler:
//! - Math types and operations
//! - Tick clock and armed deadlines
//! - Injectable random sources
//! - Logging utilities

pub mod logging;
pub mod math;
pub mod random;
pub mod time;
