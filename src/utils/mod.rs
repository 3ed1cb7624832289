//! Utility modules for repostats.
//!
//! # Available Utilities
//!
//! - [`datetime`] - Date and time formatting, parsing, comparison and arithmetic

pub mod datetime;
