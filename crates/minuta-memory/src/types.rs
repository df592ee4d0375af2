// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result types of a memory lookup.

use serde::Serialize;

/// How confident a lookup is, decided by fixed score tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Near-verbatim repeat: the stored answer can be reused as the reply.
    Exact,
    /// Related exchange: pass it to the model as context.
    Contextual,
    /// Nothing usable.
    None,
}

impl MatchTier {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Contextual => "contextual",
            MatchTier::None => "none",
        }
    }
}

/// Outcome of a lookup: `("", 0.0)` means no memory at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryMatch {
    /// Stored answer (exact), full stored exchange (contextual) or empty.
    pub text: String,
    /// Best score seen, reported even when below threshold.
    pub score: f32,
    pub tier: MatchTier,
}

impl MemoryMatch {
    pub fn none() -> Self {
        Self::below_threshold(0.0)
    }

    pub fn below_threshold(score: f32) -> Self {
        Self {
            text: String::new(),
            score,
            tier: MatchTier::None,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.tier != MatchTier::None
    }
}
