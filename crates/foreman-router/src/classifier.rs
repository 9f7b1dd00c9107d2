// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic command complexity classification with execution history.
//!
//! Classifies planning commands into [`TaskComplexity`] classes using
//! zero-cost rules (no model pre-call). A bounded per-signature execution
//! history drives novelty detection and frequency decay: the first sighting
//! of a command shape is NOVEL, and commands that keep coming back get
//! cheaper over time.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use foreman_config::ClassifierConfig;
use regex::Regex;
use tracing::debug;

use crate::complexity::TaskComplexity;

/// Utterances that are always TRIVIAL (exact match after normalization).
const TRIVIAL_UTTERANCES: &[&str] = &[
    "stop",
    "wait",
    "status",
    "report",
    "follow me",
    "stay here",
    "come here",
];

/// Phrases that mean several agents must act together.
const COORDINATION_PHRASES: &[&str] = &[
    "everyone",
    "all agents",
    "coordinate",
    "collaborate",
    "team up",
    "work together",
];

/// Words that hint at planning effort.
const COMPLEXITY_KEYWORDS: &[&str] = &[
    "coordinate",
    "collaborate",
    "together",
    "team",
    "strategy",
    "plan",
    "optimize",
    "efficient",
    "automated",
    "complex",
    "advanced",
    "multiple",
    "simultaneous",
    "parallel",
    "synchronize",
];

/// Leading verbs of multi-step construction work.
const MODERATE_PREFIXES: &[&str] = &[
    "build",
    "create",
    "construct",
    "farm",
    "setup",
    "organize",
    "gather resources for",
    "clear area",
];

/// Leading verbs of short single-purpose orders.
const SIMPLE_PREFIXES: &[&str] = &[
    "mine", "gather", "craft", "place", "attack", "go to", "walk to", "pathfind", "look at",
];

const CONJUNCTIONS: &[&str] = &["and", "then", "after", "while"];

const LONG_COMMAND_WORDS: usize = 25;
const SHORT_COMMAND_WORDS: usize = 10;
const MOMENTUM_WINDOW: usize = 3;

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)?").expect("numeric literal regex should be valid")
});

/// Normalize a command to its history signature.
///
/// Lowercases, replaces numeric literals with `#`, and collapses whitespace,
/// so "Mine 10 iron" and "mine  32 iron" share the signature "mine # iron".
pub fn signature(command: &str) -> String {
    let lower = command.to_lowercase();
    let numbered = NUMERIC_LITERAL.replace_all(&lower, "#");
    numbered.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    count: u64,
    last_seen: u64,
}

/// Command complexity classifier with a bounded execution history.
///
/// Safe to share across tasks; per-signature increments are atomic.
pub struct ComplexityClassifier {
    history: DashMap<String, HistoryEntry>,
    clock: AtomicU64,
    max_history: usize,
    simple_decay_threshold: u64,
    moderate_decay_threshold: u64,
}

impl ComplexityClassifier {
    /// Create a classifier with default history cap and decay thresholds.
    pub fn new() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }

    /// Create a classifier from the `[classifier]` config section.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            history: DashMap::new(),
            clock: AtomicU64::new(0),
            max_history: config.max_history.max(1),
            simple_decay_threshold: config.simple_decay_threshold,
            moderate_decay_threshold: config.moderate_decay_threshold,
        }
    }

    /// Classify a command.
    ///
    /// `recent` lists previously issued commands, oldest first. When at least
    /// two of the last three look complex, a SIMPLE command is raised to
    /// MODERATE to follow the momentum of the conversation.
    pub fn analyze(&self, command: &str, recent: &[&str]) -> TaskComplexity {
        if command.trim().is_empty() {
            return TaskComplexity::Trivial;
        }

        let sig = signature(command);
        let count = self.record(&sig);

        if TRIVIAL_UTTERANCES.contains(&sig.as_str()) {
            debug!(signature = %sig, count, "trivial utterance");
            return TaskComplexity::Trivial;
        }

        if count == 1 {
            debug!(signature = %sig, "first sighting, novel");
            return TaskComplexity::Novel;
        }

        let mut complexity = Self::base_classification(command);
        if complexity == TaskComplexity::Simple && Self::has_complex_momentum(recent) {
            complexity = TaskComplexity::Moderate;
        }
        let decayed = self.apply_decay(complexity, count);

        debug!(
            signature = %sig,
            count,
            base = %complexity,
            complexity = %decayed,
            "classified command"
        );
        decayed
    }

    /// Number of times the command's signature has been analyzed.
    pub fn execution_count(&self, command: &str) -> u64 {
        self.history
            .get(&signature(command))
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    /// Number of signatures currently tracked.
    pub fn history_size(&self) -> usize {
        self.history.len()
    }

    /// Forget every signature.
    pub fn clear_history(&self) {
        self.history.clear();
    }

    /// Increment the signature's count and return the new value.
    fn record(&self, sig: &str) -> u64 {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        let count = {
            let mut entry = self
                .history
                .entry(sig.to_string())
                .or_insert(HistoryEntry {
                    count: 0,
                    last_seen: tick,
                });
            entry.count += 1;
            entry.last_seen = tick;
            entry.count
        };

        if count == 1 {
            self.evict_over_cap(sig);
        }
        count
    }

    /// Drop least-recently-seen signatures until the cap holds, sparing `keep`.
    fn evict_over_cap(&self, keep: &str) {
        // Each pass removes at most one entry; bound the passes by the overshoot.
        let overshoot = self.history.len().saturating_sub(self.max_history);
        for _ in 0..overshoot {
            let oldest = self
                .history
                .iter()
                .filter(|item| item.key() != keep)
                .min_by_key(|item| item.value().last_seen)
                .map(|item| item.key().clone());

            match oldest {
                Some(key) => {
                    self.history.remove(&key);
                    debug!(signature = %key, "evicted from command history");
                }
                None => break,
            }
        }
    }

    fn apply_decay(&self, complexity: TaskComplexity, count: u64) -> TaskComplexity {
        match complexity {
            TaskComplexity::Moderate if count >= self.moderate_decay_threshold => {
                TaskComplexity::Simple
            }
            TaskComplexity::Simple if count >= self.simple_decay_threshold => {
                TaskComplexity::Trivial
            }
            other => other,
        }
    }

    fn base_classification(command: &str) -> TaskComplexity {
        let words = tokenize(command);

        if COORDINATION_PHRASES.iter().any(|p| contains_phrase(&words, p)) {
            return TaskComplexity::Complex;
        }

        let keywords = count_distinct(&words, COMPLEXITY_KEYWORDS);
        if keywords >= 2 {
            return TaskComplexity::Complex;
        }

        let word_count = command.split_whitespace().count();
        let sentences = count_sentences(command);
        let conjunctions = count_distinct(&words, CONJUNCTIONS);
        if word_count > LONG_COMMAND_WORDS || sentences > 2 || conjunctions > 2 {
            return TaskComplexity::Complex;
        }

        if MODERATE_PREFIXES.iter().any(|p| starts_with_phrase(&words, p)) {
            return TaskComplexity::Moderate;
        }

        if sentences > 1 || conjunctions > 0 {
            return TaskComplexity::Moderate;
        }

        if SIMPLE_PREFIXES.iter().any(|p| starts_with_phrase(&words, p)) {
            return TaskComplexity::Simple;
        }

        if keywords == 1 {
            return TaskComplexity::Moderate;
        }

        if word_count <= SHORT_COMMAND_WORDS {
            TaskComplexity::Simple
        } else {
            TaskComplexity::Moderate
        }
    }

    fn has_complex_momentum(recent: &[&str]) -> bool {
        let window = &recent[recent.len().saturating_sub(MOMENTUM_WINDOW)..];
        let complex = window
            .iter()
            .filter(|cmd| {
                let words = tokenize(cmd);
                COORDINATION_PHRASES.iter().any(|p| contains_phrase(&words, p))
                    || count_distinct(&words, COMPLEXITY_KEYWORDS) > 0
            })
            .count();
        complex >= 2
    }
}

impl Default for ComplexityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase alphanumeric words; punctuation separates words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn phrase_words(phrase: &str) -> Vec<&str> {
    phrase.split_whitespace().collect()
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let needle = phrase_words(phrase);
    words
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
}

fn starts_with_phrase(words: &[String], phrase: &str) -> bool {
    let needle = phrase_words(phrase);
    words.len() >= needle.len() && words.iter().zip(&needle).all(|(w, n)| w == n)
}

fn count_distinct(words: &[String], vocabulary: &[&str]) -> usize {
    vocabulary
        .iter()
        .filter(|v| words.iter().any(|w| w == *v))
        .count()
}

fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1)
}
