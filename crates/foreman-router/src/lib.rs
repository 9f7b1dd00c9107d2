// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Complexity classification and cascading tier routing for Foreman.
//!
//! This crate provides:
//! - [`ComplexityClassifier`]: heuristic classification with execution history
//! - [`Tier`]: the static backend tier catalog
//! - [`ResponseCache`]: bounded TTL/LRU response cache
//! - [`CascadeRouter`]: cache > classify > select > escalate-on-failure routing
//! - [`RoutingDecision`]: the immutable record of each routed request
//!
//! The router picks the cheapest tier likely to answer a planning command and
//! escalates to more capable tiers when a call fails.

pub mod cache;
pub mod classifier;
pub mod complexity;
pub mod decision;
pub mod metrics;
pub mod router;
pub mod tier;

pub use cache::{CacheStats, ResponseCache, cache_key};
pub use classifier::{ComplexityClassifier, signature};
pub use complexity::TaskComplexity;
pub use decision::{DecisionError, RoutingDecision, RoutingDecisionBuilder};
pub use metrics::{MetricsSnapshot, RouterMetrics, TierUsage, register_metrics};
pub use router::{CascadeRouter, CascadeRouterBuilder};
pub use tier::{Tier, TierSpec};
