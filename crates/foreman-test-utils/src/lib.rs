// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Foreman integration tests.
//!
//! Provides scripted tier clients for fast, deterministic, CI-runnable tests
//! without external services.
//!
//! # Components
//!
//! - [`MockTierClient`] - Tier client with a scripted queue of outcomes

pub mod mock_tier_client;

pub use mock_tier_client::{MockOutcome, MockTierClient};
