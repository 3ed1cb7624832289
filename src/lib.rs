//! repostats - client for a GitHub repository statistics dashboard API
//!
//! This library provides the client half of a repository statistics dashboard:
//! date utilities for displaying activity, a fetcher that talks to the stats API
//! with hard timeouts, retries and polling, and typed access to each dashboard
//! panel.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`utils::datetime`] - Date parsing, formatting and arithmetic
//! * [`backend`] - Transport to the stats API
//! * [`fetch`] - Retry and polling state machine with a shared loading indicator
//! * [`api`] - Typed panel requests and response models
//! * [`stats`] - Commit aggregation and contribution heatmaps
//! * [`report`] - Plain-text rendering of panel data
//! * [`config`] - Application configuration management

/// Typed requests and models for the dashboard endpoints
pub mod api;

/// Transport abstraction for the stats API
pub mod backend;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// Fetching with timeouts, retries and polling
pub mod fetch;

/// Logging setup
pub mod logger;

/// Text rendering for the terminal driver
pub mod report;

/// Commit aggregation and heatmap layout
pub mod stats;

/// Utility functions for date/time handling
pub mod utils;

pub use api::{Frequency, Panel, RepoRef, StatsApi};
pub use fetch::{FetchError, FetchOptions, FetchResult, Fetcher, LoadingContext, Subscription};
