// SPDX-FileCopyrightText: 2026 Foreman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task complexity classes produced by the classifier.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Complexity class of a planning command, ordered from cheapest to costliest.
///
/// `Novel` means "never seen before" and routes like `Complex`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TaskComplexity {
    /// Single well-known action ("stop", "follow me").
    Trivial,
    /// A few straightforward actions.
    Simple,
    /// Multi-step work that needs some reasoning.
    Moderate,
    /// Coordinated, multi-agent work.
    Complex,
    /// First time this command shape has been seen.
    Novel,
}

impl TaskComplexity {
    /// All classes in ascending order.
    pub const ALL: [TaskComplexity; 5] = [
        TaskComplexity::Trivial,
        TaskComplexity::Simple,
        TaskComplexity::Moderate,
        TaskComplexity::Complex,
        TaskComplexity::Novel,
    ];

    /// Short label for reports, e.g. `multi-step`.
    pub fn category(self) -> &'static str {
        match self {
            TaskComplexity::Trivial => "single-action",
            TaskComplexity::Simple => "few-actions",
            TaskComplexity::Moderate => "multi-step",
            TaskComplexity::Complex => "coordinated",
            TaskComplexity::Novel => "unknown",
        }
    }
}
