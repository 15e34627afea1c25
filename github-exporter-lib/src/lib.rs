#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for github-exporter
//!
//! This library consolidates all functionality for the github-exporter tool, which
//! scrapes GitHub Actions and API rate limit state and renders it as Prometheus metrics.
//!
//! # Module Organization
//!
//! - [`transport`]: Layered HTTP pipeline (cache, revalidation, throttle, rate limit)
//! - [`cache`]: Storage for serialized responses
//! - [`validators`]: Freshness policies consulted by the revalidation layer
//! - [`throttler`]: Fixed-rate request pacing
//! - [`github`]: Typed GitHub REST API client
//! - [`metrics`]: Metric descriptors, samples and text exposition
//! - [`collectors`]: Sub-collectors and the scrape coordinator
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod cache;
pub mod collectors;
pub mod github;
pub mod metrics;
pub mod throttler;
pub mod transport;
pub mod validators;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub use crate::commands::{Host, run};
