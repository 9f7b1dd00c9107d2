// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router counters and metric recording helpers.
//!
//! [`RouterMetrics`] keeps lock-free in-process counters that back the
//! router's accessors. Every update is mirrored to the `metrics` facade so
//! any installed recorder (Prometheus, statsd, etc.) can collect it.

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{describe_counter, describe_gauge, describe_histogram};
use serde::Serialize;

use crate::tier::Tier;

/// Register all Foreman metric descriptions.
///
/// Call once at startup after a recorder is installed.
pub fn register_metrics() {
    describe_counter!("foreman_route_requests_total", "Total routed requests");
    describe_counter!(
        "foreman_cache_hits_total",
        "Requests served from the response cache"
    );
    describe_counter!(
        "foreman_fallbacks_total",
        "Requests served by a tier other than the selected one"
    );
    describe_counter!(
        "foreman_route_failures_total",
        "Requests that exhausted every tier"
    );
    describe_gauge!(
        "foreman_tier_cost_usd_total",
        "Estimated spend per tier in USD"
    );
    describe_histogram!(
        "foreman_route_latency_seconds",
        "End-to-end routing latency in seconds"
    );
}

/// Record end-to-end latency of one routed request.
pub fn record_latency(seconds: f64) {
    metrics::histogram!("foreman_route_latency_seconds").record(seconds);
}

/// Add `delta` to an f64 stored as bits, retrying on contention.
fn add_f64(cell: &AtomicU64, delta: f64) {
    let mut current = cell.load(Ordering::Relaxed);
    loop {
        let next = (f64::from_bits(current) + delta).to_bits();
        match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return,
            Err(actual) => current = actual,
        }
    }
}

fn slot(tier: Tier) -> usize {
    tier as usize
}

/// Lock-free routing counters.
#[derive(Debug, Default)]
pub struct RouterMetrics {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    fallbacks: AtomicU64,
    failures: AtomicU64,
    tier_usage: [AtomicU64; Tier::ALL.len()],
    tier_cost_bits: [AtomicU64; Tier::ALL.len()],
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request answered from the response cache.
    pub fn record_cache_hit(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.tier_usage[slot(Tier::Cache)].fetch_add(1, Ordering::Relaxed);

        metrics::counter!("foreman_route_requests_total", "outcome" => "cache_hit").increment(1);
        metrics::counter!("foreman_cache_hits_total").increment(1);
    }

    /// A request answered by `actual` at `cost` USD.
    pub fn record_success(&self, actual: Tier, cost: f64, fell_back: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.tier_usage[slot(actual)].fetch_add(1, Ordering::Relaxed);
        add_f64(&self.tier_cost_bits[slot(actual)], cost);
        if fell_back {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("foreman_fallbacks_total").increment(1);
        }

        metrics::counter!("foreman_route_requests_total", "outcome" => "success").increment(1);
        // Counters are integral, so fractional spend goes to a gauge.
        metrics::gauge!("foreman_tier_cost_usd_total", "tier" => actual.id()).increment(cost);
    }

    /// A request that exhausted every tier.
    pub fn record_failure(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);

        metrics::counter!("foreman_route_requests_total", "outcome" => "failure").increment(1);
        metrics::counter!("foreman_route_failures_total").increment(1);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Share of routed requests answered from cache (0 before any request).
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.cache_hits() as f64 / total as f64
        }
    }

    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn tier_usage(&self, tier: Tier) -> u64 {
        self.tier_usage[slot(tier)].load(Ordering::Relaxed)
    }

    pub fn tier_cost(&self, tier: Tier) -> f64 {
        f64::from_bits(self.tier_cost_bits[slot(tier)].load(Ordering::Relaxed))
    }

    pub fn total_cost(&self) -> f64 {
        Tier::ALL.iter().map(|t| self.tier_cost(*t)).sum()
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.fallbacks.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        for cell in self.tier_usage.iter().chain(self.tier_cost_bits.iter()) {
            // 0u64 is also the bit pattern of 0.0f64.
            cell.store(0, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests(),
            cache_hits: self.cache_hits(),
            cache_hit_rate: self.cache_hit_rate(),
            fallbacks: self.fallbacks(),
            failures: self.failures(),
            total_cost: self.total_cost(),
            tiers: Tier::ALL
                .iter()
                .map(|&tier| TierUsage {
                    tier,
                    requests: self.tier_usage(tier),
                    cost: self.tier_cost(tier),
                })
                .collect(),
        }
    }
}

/// Per-tier usage in a [`MetricsSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierUsage {
    pub tier: Tier,
    pub requests: u64,
    pub cost: f64,
}

/// Serializable point-in-time copy of the router counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_hit_rate: f64,
    pub fallbacks: u64,
    pub failures: u64,
    pub total_cost: f64,
    pub tiers: Vec<TierUsage>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn counters_track_outcomes() {
        let m = RouterMetrics::new();
        m.record_cache_hit();
        m.record_success(Tier::Fast, 0.00001, false);
        m.record_success(Tier::Balanced, 0.0002, true);
        m.record_failure();

        assert_eq!(m.total_requests(), 4);
        assert_eq!(m.cache_hits(), 1);
        assert_eq!(m.fallbacks(), 1);
        assert_eq!(m.failures(), 1);
        assert_eq!(m.tier_usage(Tier::Cache), 1);
        assert_eq!(m.tier_usage(Tier::Fast), 1);
        assert_eq!(m.tier_usage(Tier::Balanced), 1);
        assert!((m.cache_hit_rate() - 0.25).abs() < 1e-12);
        assert!((m.total_cost() - 0.00021).abs() < 1e-12);
    }

    #[test]
    fn reset_zeroes_everything() {
        let m = RouterMetrics::new();
        m.record_success(Tier::Smart, 0.5, true);
        m.reset();
        assert_eq!(m.snapshot(), RouterMetrics::new().snapshot());
        assert_eq!(m.cache_hit_rate(), 0.0);
    }

    #[test]
    fn concurrent_cost_accumulation_is_exact() {
        let m = Arc::new(RouterMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&m);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        m.record_success(Tier::Smart, 0.25, false);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(m.tier_usage(Tier::Smart), 8000);
        // 0.25 is exact in binary, so the sum is too.
        assert_eq!(m.tier_cost(Tier::Smart), 2000.0);
    }

    #[test]
    fn snapshot_lists_every_tier() {
        let snap = RouterMetrics::new().snapshot();
        let tiers: Vec<Tier> = snap.tiers.iter().map(|t| t.tier).collect();
        assert_eq!(tiers, Tier::ALL.to_vec());
        let json = serde_json::to_value(&snap).expect("should serialize");
        assert_eq!(json["tiers"][2]["tier"], "fast");
    }
}
