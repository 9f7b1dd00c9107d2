// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cascading tier router.
//!
//! Orchestrates one request: cache lookup > classify > select tier > call the
//! tier, escalating to the next more capable tier on failure > record metrics
//! and the routing decision. Escalation is strictly sequential so a request
//! never pays for two tiers at once.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use foreman_config::ForemanConfig;
use foreman_core::{
    ForemanError, HealthStatus, PARAM_MODEL, PARAM_PROVIDER_ID, RouteParams, TierClient,
    TierResponse,
};
use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ResponseCache};
use crate::classifier::ComplexityClassifier;
use crate::complexity::TaskComplexity;
use crate::decision::RoutingDecision;
use crate::metrics::{MetricsSnapshot, RouterMetrics, record_latency};
use crate::tier::Tier;

/// Routes commands across tier clients with caching and escalation.
///
/// Owns all of its state; share it between callers with `Arc`.
pub struct CascadeRouter {
    classifier: ComplexityClassifier,
    cache: ResponseCache,
    clients: HashMap<Tier, Arc<dyn TierClient>>,
    metrics: RouterMetrics,
    recent: Mutex<VecDeque<RoutingDecision>>,
    caching_enabled: bool,
    max_recent_decisions: usize,
    tier_timeout: Duration,
}

impl CascadeRouter {
    /// Start building a router from defaults.
    pub fn builder() -> CascadeRouterBuilder {
        CascadeRouterBuilder::new(&ForemanConfig::default())
    }

    /// Start building a router from loaded configuration.
    pub fn from_config(config: &ForemanConfig) -> CascadeRouterBuilder {
        CascadeRouterBuilder::new(config)
    }

    /// Route a command to the cheapest tier able to answer it.
    ///
    /// `params` may carry `model` and `providerId`, which only shape the cache
    /// key; the whole map is forwarded to the tier client.
    pub async fn route(
        &self,
        command: &str,
        params: &RouteParams,
    ) -> Result<TierResponse, ForemanError> {
        let started = Instant::now();
        let model = param(params, PARAM_MODEL);
        let provider_id = param(params, PARAM_PROVIDER_ID);

        if self.caching_enabled {
            if let Some(hit) = self.cache.get(command, model, provider_id) {
                let latency_ms = elapsed_ms(started);
                self.metrics.record_cache_hit();
                self.push_decision(RoutingDecision::cache_hit(
                    command,
                    TaskComplexity::Trivial,
                    latency_ms,
                ));
                record_latency(started.elapsed().as_secs_f64());
                debug!(latency_ms, "served from cache");
                return Ok(hit);
            }
        }

        let complexity = self.classifier.analyze(command, &[]);
        let selected = self.select_tier(complexity);
        debug!(%complexity, %selected, "tier selected");

        let mut tier = selected;
        let mut last_error = None;
        for _ in 0..Tier::ALL.len() {
            match self.call_tier(tier, command, params).await {
                Ok(response) => {
                    let latency_ms = elapsed_ms(started);
                    let cost = tier.estimate_cost(response.tokens_used);

                    if self.caching_enabled && tier.requires_backend_call() {
                        self.cache.put(command, model, provider_id, &response);
                    }
                    self.metrics.record_success(tier, cost, tier != selected);

                    let decision = RoutingDecision::success(
                        command,
                        complexity,
                        selected,
                        tier,
                        latency_ms,
                        response.tokens_used,
                    );
                    info!(
                        %complexity,
                        %selected,
                        actual = %tier,
                        latency_ms,
                        tokens = response.tokens_used,
                        cost,
                        fallback = decision.fallback_reason().as_deref().unwrap_or("none"),
                        "request routed"
                    );
                    self.push_decision(decision);
                    record_latency(started.elapsed().as_secs_f64());
                    return Ok(response);
                }
                Err(err) => {
                    warn!(tier = %tier, error = %err, "tier failed");
                    last_error = Some(err);
                    let next = tier.next_higher();
                    if next == tier {
                        break;
                    }
                    tier = next;
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no tier attempted".to_string());
        self.metrics.record_failure();
        self.push_decision(RoutingDecision::failure(
            command,
            complexity,
            selected,
            tier,
            elapsed_ms(started),
            message.clone(),
        ));
        record_latency(started.elapsed().as_secs_f64());
        warn!(%selected, last_tier = %tier, error = %message, "all tiers exhausted");

        Err(ForemanError::CascadeExhausted {
            selected: selected.to_string(),
            last_tier: tier.to_string(),
            message,
        })
    }

    /// Tier a complexity class starts at. Unavailable tiers move up the catalog.
    pub fn select_tier(&self, complexity: TaskComplexity) -> Tier {
        let tier = Tier::for_complexity(complexity);
        if tier.is_available() {
            tier
        } else {
            tier.next_higher()
        }
    }

    async fn call_tier(
        &self,
        tier: Tier,
        command: &str,
        params: &RouteParams,
    ) -> Result<TierResponse, ForemanError> {
        if !tier.requires_backend_call() || !tier.is_available() {
            return Err(ForemanError::TierUnavailable {
                tier: tier.to_string(),
            });
        }
        let client = self
            .clients
            .get(&tier)
            .ok_or_else(|| ForemanError::TierUnavailable {
                tier: tier.to_string(),
            })?;

        match tokio::time::timeout(self.tier_timeout, client.send(command, params)).await {
            Ok(result) => result,
            Err(_) => Err(ForemanError::Timeout {
                duration: self.tier_timeout,
            }),
        }
    }

    fn push_decision(&self, decision: RoutingDecision) {
        if let Err(err) = decision.validate() {
            debug!(error = %err, "recording decision for an invalid command");
        }
        let mut recent = self.recent_guard();
        recent.push_back(decision);
        while recent.len() > self.max_recent_decisions {
            recent.pop_front();
        }
    }

    /// A poisoned decision log is recovered empty.
    fn recent_guard(&self) -> MutexGuard<'_, VecDeque<RoutingDecision>> {
        self.recent.lock().unwrap_or_else(|poisoned| {
            warn!("recent decisions lock poisoned, discarding the log");
            let mut recent = poisoned.into_inner();
            recent.clear();
            self.recent.clear_poison();
            recent
        })
    }

    pub fn total_requests(&self) -> u64 {
        self.metrics.total_requests()
    }

    pub fn cache_hits(&self) -> u64 {
        self.metrics.cache_hits()
    }

    /// `cache_hits / total_requests`, or 0 before the first request.
    pub fn cache_hit_rate(&self) -> f64 {
        self.metrics.cache_hit_rate()
    }

    pub fn fallbacks(&self) -> u64 {
        self.metrics.fallbacks()
    }

    pub fn failures(&self) -> u64 {
        self.metrics.failures()
    }

    pub fn tier_usage(&self, tier: Tier) -> u64 {
        self.metrics.tier_usage(tier)
    }

    pub fn tier_cost(&self, tier: Tier) -> f64 {
        self.metrics.tier_cost(tier)
    }

    pub fn total_cost(&self) -> f64 {
        self.metrics.total_cost()
    }

    /// Most recent decisions, oldest first.
    pub fn recent_decisions(&self) -> Vec<RoutingDecision> {
        self.recent_guard().iter().cloned().collect()
    }

    /// Serializable copy of every counter.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The classifier, for history inspection.
    pub fn classifier(&self) -> &ComplexityClassifier {
        &self.classifier
    }

    /// The response cache, for warming and inspection.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Zero every counter and forget recent decisions.
    ///
    /// The response cache and the classifier history are left alone.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
        self.recent_guard().clear();
        info!("router metrics reset");
    }

    /// Log a one-line summary of the counters.
    pub fn log_stats(&self) {
        let snap = self.metrics.snapshot();
        let usage = snap
            .tiers
            .iter()
            .filter(|t| t.requests > 0)
            .map(|t| format!("{}={}", t.tier, t.requests))
            .collect::<Vec<_>>()
            .join(" ");
        info!(
            total = snap.total_requests,
            cache_hits = snap.cache_hits,
            hit_rate = snap.cache_hit_rate,
            fallbacks = snap.fallbacks,
            failures = snap.failures,
            total_cost = snap.total_cost,
            usage = %usage,
            "cascade router stats"
        );
    }

    /// Ask every registered client for its health, in capability order.
    ///
    /// Probes run concurrently; a probe error reports the tier as unhealthy.
    pub async fn health(&self) -> Vec<(Tier, HealthStatus)> {
        let probes = Tier::ALL.into_iter().filter_map(|tier| {
            let client = self.clients.get(&tier)?;
            Some(async move {
                let status = client
                    .health_check()
                    .await
                    .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
                (tier, status)
            })
        });
        join_all(probes).await
    }

    /// Tiers that have a client registered.
    pub fn configured_tiers(&self) -> Vec<Tier> {
        Tier::ALL
            .into_iter()
            .filter(|t| self.clients.contains_key(t))
            .collect()
    }
}

/// Builder for [`CascadeRouter`].
pub struct CascadeRouterBuilder {
    classifier: ComplexityClassifier,
    cache: ResponseCache,
    clients: HashMap<Tier, Arc<dyn TierClient>>,
    caching_enabled: bool,
    max_recent_decisions: usize,
    tier_timeout: Duration,
}

impl CascadeRouterBuilder {
    fn new(config: &ForemanConfig) -> Self {
        Self {
            classifier: ComplexityClassifier::from_config(&config.classifier),
            cache: ResponseCache::from_config(&config.cache),
            clients: HashMap::new(),
            caching_enabled: config.cascade.caching_enabled,
            max_recent_decisions: config.cascade.max_recent_decisions.max(1),
            tier_timeout: Duration::from_secs(config.cascade.tier_timeout_secs),
        }
    }

    /// Register the client that serves `tier`, replacing any previous one.
    pub fn client(mut self, tier: Tier, client: Arc<dyn TierClient>) -> Self {
        if !tier.requires_backend_call() {
            warn!(%tier, "tier never calls a backend, client ignored");
            return self;
        }
        self.clients.insert(tier, client);
        self
    }

    pub fn caching_enabled(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    pub fn tier_timeout(mut self, timeout: Duration) -> Self {
        self.tier_timeout = timeout;
        self
    }

    pub fn max_recent_decisions(mut self, max: usize) -> Self {
        self.max_recent_decisions = max.max(1);
        self
    }

    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn classifier(mut self, classifier: ComplexityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn build(self) -> CascadeRouter {
        CascadeRouter {
            classifier: self.classifier,
            cache: self.cache,
            clients: self.clients,
            metrics: RouterMetrics::new(),
            recent: Mutex::new(VecDeque::with_capacity(self.max_recent_decisions)),
            caching_enabled: self.caching_enabled,
            max_recent_decisions: self.max_recent_decisions,
            tier_timeout: self.tier_timeout,
        }
    }
}

fn param<'a>(params: &'a RouteParams, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or("")
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_tier_mapping() {
        let router = CascadeRouter::builder().build();
        assert_eq!(router.select_tier(TaskComplexity::Trivial), Tier::Cache);
        assert_eq!(router.select_tier(TaskComplexity::Simple), Tier::Fast);
        assert_eq!(router.select_tier(TaskComplexity::Moderate), Tier::Balanced);
        assert_eq!(router.select_tier(TaskComplexity::Complex), Tier::Smart);
        assert_eq!(router.select_tier(TaskComplexity::Novel), Tier::Smart);
    }

    #[test]
    fn builder_uses_config_values() {
        let mut config = ForemanConfig::default();
        config.cascade.max_recent_decisions = 7;
        config.cascade.tier_timeout_secs = 3;
        config.cascade.caching_enabled = false;
        let router = CascadeRouter::from_config(&config).build();
        assert_eq!(router.max_recent_decisions, 7);
        assert_eq!(router.tier_timeout, Duration::from_secs(3));
        assert!(!router.caching_enabled);
    }

    #[test]
    fn missing_params_default_to_empty() {
        let params = RouteParams::new();
        assert_eq!(param(&params, PARAM_MODEL), "");
    }

    #[tokio::test]
    async fn no_clients_exhausts_cascade() {
        let router = CascadeRouter::builder().build();
        let err = router
            .route("mine 10 iron", &RouteParams::new())
            .await
            .expect_err("no client can answer");
        match err {
            ForemanError::CascadeExhausted {
                selected,
                last_tier,
                ..
            } => {
                assert_eq!(selected, "smart");
                assert_eq!(last_tier, "smart");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(router.failures(), 1);
        assert_eq!(router.total_requests(), 1);
    }

    #[tokio::test]
    async fn poisoned_decision_log_recovers() {
        let router = Arc::new(CascadeRouter::builder().build());
        let _ = router.route("stop", &RouteParams::new()).await;
        assert_eq!(router.recent_decisions().len(), 1);

        let poisoner = Arc::clone(&router);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.recent.lock().expect("first lock succeeds");
            panic!("poison the decision log");
        })
        .join();

        assert!(router.recent_decisions().is_empty());
        let _ = router.route("stop", &RouteParams::new()).await;
        assert_eq!(router.recent_decisions().len(), 1);
    }

    #[test]
    fn metrics_on_fresh_router_are_zero() {
        let router = CascadeRouter::builder().build();
        assert_eq!(router.cache_hit_rate(), 0.0);
        assert_eq!(router.total_cost(), 0.0);
        assert!(router.recent_decisions().is_empty());
        assert!(router.configured_tiers().is_empty());
    }
}
