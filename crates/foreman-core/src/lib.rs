// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Foreman tier router.
//!
//! This crate provides the error type, the response and parameter types, and
//! the [`TierClient`] trait that every backend integration implements. The
//! router and the clients depend on it; it depends on neither.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ForemanError;
pub use traits::TierClient;
pub use types::{
    BackendKind, HealthStatus, PARAM_MODEL, PARAM_PROVIDER_ID, RouteParams, TierResponse,
};
