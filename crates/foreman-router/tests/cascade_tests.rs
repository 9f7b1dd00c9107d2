// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end routing tests against scripted tier clients.
//!
//! Each test builds its own router with mock clients; no network is used.

use std::sync::Arc;
use std::time::Duration;

use foreman_core::{
    ForemanError, HealthStatus, PARAM_MODEL, PARAM_PROVIDER_ID, RouteParams, TierResponse,
};
use foreman_router::{CascadeRouter, TaskComplexity, Tier};
use foreman_test_utils::{MockOutcome, MockTierClient};
use tracing_test::traced_test;

fn params(model: &str, provider: &str) -> RouteParams {
    let mut p = RouteParams::new();
    p.insert(PARAM_MODEL.to_string(), model.to_string());
    p.insert(PARAM_PROVIDER_ID.to_string(), provider.to_string());
    p
}

fn succeeding(provider: &str) -> Arc<MockTierClient> {
    Arc::new(MockTierClient::succeeding(format!("{provider} plan"), 200).with_provider_id(provider))
}

fn failing(provider: &str) -> Arc<MockTierClient> {
    Arc::new(MockTierClient::failing("HTTP 503 Service Unavailable").with_provider_id(provider))
}

// ---- Cache ----

#[tokio::test]
async fn test_prewarmed_cache_answers_without_calling_a_tier() {
    let smart = succeeding("openai");
    let router = CascadeRouter::builder()
        .client(Tier::Smart, smart.clone())
        .build();

    let cached = TierResponse::new("cached plan", "gpt-3.5-turbo", "openai", 50, 120);
    router
        .cache()
        .put("mine 10 iron", "gpt-3.5-turbo", "openai", &cached);

    let resp = router
        .route("mine 10 iron", &params("gpt-3.5-turbo", "openai"))
        .await
        .unwrap();

    assert!(resp.from_cache);
    assert_eq!(resp.content, "cached plan");
    assert_eq!(smart.calls(), 0);
    assert_eq!(router.cache_hits(), 1);
    assert_eq!(router.tier_usage(Tier::Cache), 1);

    let decision = router.recent_decisions().pop().unwrap();
    assert!(decision.is_from_cache());
    assert_eq!(decision.actual_tier(), Tier::Cache);
    assert_eq!(decision.tokens_used(), 0);
}

#[tokio::test]
async fn test_one_miss_then_two_hits_gives_two_thirds_hit_rate() {
    let smart = succeeding("openai");
    let router = CascadeRouter::builder()
        .client(Tier::Smart, smart.clone())
        .build();
    let p = params("gpt-4", "openai");

    let first = router.route("build a house", &p).await.unwrap();
    let second = router.route("build a house", &p).await.unwrap();
    let third = router.route("build a house", &p).await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert!(third.from_cache);
    assert_eq!(smart.calls(), 1);
    assert_eq!(router.total_requests(), 3);
    assert!((router.cache_hit_rate() - 0.667).abs() < 0.001);
}

#[tokio::test]
async fn test_caching_disabled_always_calls_a_tier() {
    let smart = succeeding("openai");
    let router = CascadeRouter::builder()
        .client(Tier::Smart, smart.clone())
        .caching_enabled(false)
        .build();

    router.route("build a house", &RouteParams::new()).await.unwrap();
    router.route("build a house", &RouteParams::new()).await.unwrap();

    assert_eq!(router.cache_hits(), 0);
    assert!(router.cache().is_empty());
    // Second call is MODERATE, served by the first available tier above it.
    assert_eq!(smart.calls(), 2);
}

#[tokio::test]
async fn test_failed_requests_are_not_cached() {
    let router = CascadeRouter::builder()
        .client(Tier::Smart, failing("openai"))
        .build();

    let _ = router.route("mine 10 iron", &RouteParams::new()).await;
    assert!(router.cache().is_empty());
}

// ---- Tier selection and escalation ----

#[tokio::test]
async fn test_novel_command_goes_to_smart_tier() {
    let fast = succeeding("groq");
    let smart = succeeding("openai");
    let router = CascadeRouter::builder()
        .client(Tier::Fast, fast.clone())
        .client(Tier::Smart, smart.clone())
        .build();

    let resp = router
        .route("mine 10 iron", &RouteParams::new())
        .await
        .unwrap();

    assert_eq!(resp.provider_id, "openai");
    assert_eq!(fast.calls(), 0);
    let decision = router.recent_decisions().pop().unwrap();
    assert_eq!(decision.detected_complexity(), TaskComplexity::Novel);
    assert!(!decision.has_fallback());
}

#[tokio::test]
async fn test_failed_tier_escalates_to_next_tier() {
    let fast = failing("groq");
    let balanced = succeeding("groq-70b");
    let router = CascadeRouter::builder()
        .client(Tier::Fast, fast.clone())
        .client(Tier::Balanced, balanced.clone())
        .caching_enabled(false)
        .build();

    // Second sighting of a simple order classifies as SIMPLE.
    router.classifier().analyze("mine 10 iron", &[]);
    let resp = router
        .route("mine 10 iron", &RouteParams::new())
        .await
        .unwrap();

    assert_eq!(resp.provider_id, "groq-70b");
    assert_eq!(fast.calls(), 1);
    assert_eq!(balanced.calls(), 1);
    assert_eq!(router.fallbacks(), 1);
    assert_eq!(router.tier_usage(Tier::Balanced), 1);
    assert_eq!(router.tier_usage(Tier::Fast), 0);

    let decision = router.recent_decisions().pop().unwrap();
    assert_eq!(decision.selected_tier(), Tier::Fast);
    assert_eq!(decision.actual_tier(), Tier::Balanced);
    assert_eq!(
        decision.fallback_reason().as_deref(),
        Some("Escalated: fast -> balanced")
    );
}

#[tokio::test]
async fn test_trivial_cache_miss_escalates_past_local() {
    let fast = succeeding("groq");
    let router = CascadeRouter::builder()
        .client(Tier::Fast, fast.clone())
        .build();

    let resp = router.route("stop", &RouteParams::new()).await.unwrap();

    assert_eq!(resp.provider_id, "groq");
    assert_eq!(fast.calls(), 1);
    let decision = router.recent_decisions().pop().unwrap();
    assert_eq!(decision.detected_complexity(), TaskComplexity::Trivial);
    assert_eq!(decision.selected_tier(), Tier::Cache);
    assert_eq!(decision.actual_tier(), Tier::Fast);
    assert_eq!(router.fallbacks(), 1);
}

#[tokio::test]
async fn test_all_tiers_failing_exhausts_cascade() {
    let fast = failing("groq");
    let balanced = failing("groq-70b");
    let smart = failing("openai");
    let router = CascadeRouter::builder()
        .client(Tier::Fast, fast.clone())
        .client(Tier::Balanced, balanced.clone())
        .client(Tier::Smart, smart.clone())
        .build();

    router.classifier().analyze("mine 10 iron", &[]);
    let err = router
        .route("mine 10 iron", &RouteParams::new())
        .await
        .unwrap_err();

    match &err {
        ForemanError::CascadeExhausted {
            selected,
            last_tier,
            message,
        } => {
            assert_eq!(selected, "fast");
            assert_eq!(last_tier, "smart");
            assert!(message.contains("503"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_terminal());
    assert_eq!((fast.calls(), balanced.calls(), smart.calls()), (1, 1, 1));
    assert_eq!(router.failures(), 1);
    assert_eq!(router.total_cost(), 0.0);

    let decision = router.recent_decisions().pop().unwrap();
    assert!(!decision.is_successful());
    assert!(decision.error_message().is_some());
}

#[tokio::test]
async fn test_failure_at_top_tier_ends_cascade() {
    let smart = Arc::new(MockTierClient::scripted(vec![
        MockOutcome::failure("HTTP 429"),
        MockOutcome::success("second try", 10),
    ]));
    let router = CascadeRouter::builder()
        .client(Tier::Smart, smart.clone())
        .build();

    // Smart is the top tier, so a failure there ends the cascade.
    assert!(router.route("craft a pickaxe", &RouteParams::new()).await.is_err());
    let resp = router
        .route("craft a pickaxe", &RouteParams::new())
        .await
        .unwrap();
    assert_eq!(resp.content, "second try");
}

#[tokio::test(start_paused = true)]
async fn test_slow_tier_times_out_and_escalates() {
    let fast = Arc::new(
        MockTierClient::succeeding("too late", 10)
            .with_provider_id("groq")
            .with_delay(Duration::from_secs(60)),
    );
    let balanced = succeeding("groq-70b");
    let router = CascadeRouter::builder()
        .client(Tier::Fast, fast.clone())
        .client(Tier::Balanced, balanced.clone())
        .tier_timeout(Duration::from_secs(5))
        .caching_enabled(false)
        .build();

    router.classifier().analyze("mine 10 iron", &[]);
    let resp = router
        .route("mine 10 iron", &RouteParams::new())
        .await
        .unwrap();

    assert_eq!(resp.provider_id, "groq-70b");
    assert_eq!(fast.calls(), 1);
    assert_eq!(router.fallbacks(), 1);
}

// ---- Metrics and decisions ----

#[tokio::test]
async fn test_cost_is_priced_at_actual_tier() {
    let smart = Arc::new(MockTierClient::succeeding("plan", 1000).with_provider_id("openai"));
    let router = CascadeRouter::builder()
        .client(Tier::Smart, smart)
        .build();

    router.route("mine 10 iron", &RouteParams::new()).await.unwrap();

    let expected = Tier::Smart.estimate_cost(1000);
    assert!((router.tier_cost(Tier::Smart) - expected).abs() < 1e-12);
    assert!((router.total_cost() - expected).abs() < 1e-12);
}

#[tokio::test]
async fn test_reset_metrics_keeps_cache() {
    let smart = succeeding("openai");
    let router = CascadeRouter::builder()
        .client(Tier::Smart, smart.clone())
        .build();
    let p = params("gpt-4", "openai");

    router.route("build a house", &p).await.unwrap();
    router.reset_metrics();

    assert_eq!(router.total_requests(), 0);
    assert_eq!(router.cache_hit_rate(), 0.0);
    assert!(router.recent_decisions().is_empty());
    assert_eq!(router.cache().len(), 1);

    let resp = router.route("build a house", &p).await.unwrap();
    assert!(resp.from_cache);
    assert_eq!(smart.calls(), 1);
}

#[tokio::test]
async fn test_recent_decisions_are_bounded_oldest_first() {
    let router = CascadeRouter::builder()
        .client(Tier::Smart, succeeding("openai"))
        .max_recent_decisions(5)
        .build();

    for i in 0..8 {
        router
            .route(&format!("gather wood batch {i}"), &RouteParams::new())
            .await
            .unwrap();
    }

    let recent = router.recent_decisions();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0].command(), "gather wood batch 3");
    assert_eq!(recent[4].command(), "gather wood batch 7");
}

#[tokio::test]
async fn test_default_recent_decisions_cap_is_one_hundred() {
    let router = CascadeRouter::builder()
        .client(Tier::Smart, succeeding("openai"))
        .caching_enabled(false)
        .build();

    for i in 0..120 {
        router
            .route(&format!("place torch {i}"), &RouteParams::new())
            .await
            .unwrap();
    }
    assert_eq!(router.recent_decisions().len(), 100);
    assert_eq!(router.total_requests(), 120);
}

#[tokio::test]
async fn test_metrics_snapshot_serializes() {
    let router = CascadeRouter::builder()
        .client(Tier::Smart, succeeding("openai"))
        .build();
    router.route("mine 10 iron", &RouteParams::new()).await.unwrap();

    let json = serde_json::to_value(router.metrics()).unwrap();
    assert_eq!(json["total_requests"], 1);
    assert_eq!(json["tiers"][4]["tier"], "smart");
    assert_eq!(json["tiers"][4]["requests"], 1);
}

#[tokio::test]
async fn test_health_reports_registered_tiers_in_order() {
    let router = CascadeRouter::builder()
        .client(
            Tier::Smart,
            Arc::new(MockTierClient::succeeding("x", 1).with_health(HealthStatus::Unhealthy(
                "401 Unauthorized".into(),
            ))),
        )
        .client(Tier::Fast, succeeding("groq"))
        .client(Tier::Cache, succeeding("ignored"))
        .build();

    assert_eq!(router.configured_tiers(), vec![Tier::Fast, Tier::Smart]);
    let report = router.health().await;
    assert_eq!(report.len(), 2);
    assert_eq!(report[0], (Tier::Fast, HealthStatus::Healthy));
    assert!(!report[1].1.is_usable());
}

// ---- Concurrency ----

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_routes_are_all_counted() {
    let smart = succeeding("openai");
    let router = Arc::new(
        CascadeRouter::builder()
            .client(Tier::Fast, succeeding("groq"))
            .client(Tier::Balanced, succeeding("groq-70b"))
            .client(Tier::Smart, smart.clone())
            .build(),
    );

    let mut handles = Vec::new();
    for i in 0..50 {
        let router = Arc::clone(&router);
        handles.push(tokio::spawn(async move {
            let command = format!("mine {} iron", i % 5);
            router.route(&command, &RouteParams::new()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(router.total_requests(), 50);
    let served: u64 = Tier::ALL.iter().map(|t| router.tier_usage(*t)).sum();
    assert_eq!(served, 50);
    assert_eq!(router.recent_decisions().len(), 50);
    // All five commands share one signature; every request either hit the
    // cache or was classified.
    let classified = router.classifier().execution_count("mine 1 iron");
    assert_eq!(classified + router.cache_hits(), 50);
}

// ---- Logging ----

#[tokio::test]
#[traced_test]
async fn test_routing_emits_structured_logs() {
    let router = CascadeRouter::builder()
        .client(Tier::Fast, failing("groq"))
        .client(Tier::Balanced, succeeding("groq-70b"))
        .caching_enabled(false)
        .build();

    router.classifier().analyze("mine 10 iron", &[]);
    router
        .route("mine 10 iron", &RouteParams::new())
        .await
        .unwrap();
    router.log_stats();

    assert!(logs_contain("tier failed"));
    assert!(logs_contain("request routed"));
    assert!(logs_contain("Escalated: fast -> balanced"));
    assert!(logs_contain("cascade router stats"));
}
