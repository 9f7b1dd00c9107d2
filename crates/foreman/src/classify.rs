// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `foreman classify` command implementation.

use foreman_config::ForemanConfig;
use foreman_router::{CascadeRouter, TaskComplexity, Tier, signature};
use serde::Serialize;

/// One classified command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub command: String,
    pub signature: String,
    pub complexity: TaskComplexity,
    pub category: &'static str,
    pub tier: Tier,
}

/// Classify `commands` in order with a fresh history.
///
/// The three commands before each one are passed as conversational context.
pub fn classify_commands(config: &ForemanConfig, commands: &[String]) -> Vec<Classification> {
    let router = CascadeRouter::from_config(config).build();
    let mut seen: Vec<&str> = Vec::with_capacity(commands.len());

    commands
        .iter()
        .map(|command| {
            let complexity = router.classifier().analyze(command, &seen);
            seen.push(command);
            Classification {
                command: command.clone(),
                signature: signature(command),
                complexity,
                category: complexity.category(),
                tier: router.select_tier(complexity),
            }
        })
        .collect()
}

/// Run the `foreman classify` command.
pub fn run_classify(config: &ForemanConfig, commands: &[String], json: bool) {
    for row in classify_commands(config, commands) {
        if json {
            println!(
                "{}",
                serde_json::to_string(&row).unwrap_or_else(|_| "{}".to_string())
            );
        } else {
            println!(
                "{:<8} {:<13} -> {:<8} {}",
                row.complexity, row.category, row.tier, row.command
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmds(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn repeated_command_goes_from_novel_to_simple() {
        let rows = classify_commands(
            &ForemanConfig::default(),
            &cmds(&["mine 10 iron", "mine 32 iron"]),
        );
        assert_eq!(rows[0].complexity, TaskComplexity::Novel);
        assert_eq!(rows[0].tier, Tier::Smart);
        assert_eq!(rows[1].complexity, TaskComplexity::Simple);
        assert_eq!(rows[1].tier, Tier::Fast);
        assert_eq!(rows[1].signature, "mine # iron");
    }

    #[test]
    fn trivial_utterance_maps_to_cache() {
        let rows = classify_commands(&ForemanConfig::default(), &cmds(&["stop"]));
        assert_eq!(rows[0].complexity, TaskComplexity::Trivial);
        assert_eq!(rows[0].tier, Tier::Cache);
    }

    #[test]
    fn classification_serializes_lowercase() {
        let rows = classify_commands(&ForemanConfig::default(), &cmds(&["stop"]));
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["complexity"], "trivial");
        assert_eq!(json["category"], "single-action");
        assert_eq!(json["tier"], "cache");
    }
}
