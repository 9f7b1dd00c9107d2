// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for pluggable backends.
//!
//! Backends use `#[async_trait]` for dynamic dispatch compatibility, so the
//! router can hold them as `Arc<dyn TierClient>`.

pub mod tier_client;

pub use tier_client::TierClient;
