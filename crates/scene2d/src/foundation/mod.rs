//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the runtime:
//! - Math types and operations
//! - Frame timing and fixed-step accumulation
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
