//! Top bubbles leaderboard
//!
//! Ranks live bubbles by reflection count, top 10.

use serde::{Deserialize, Serialize};

use crate::sim::Bubble;

/// Maximum number of ranked bubbles
pub const MAX_TOP_BUBBLES: usize = 10;

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopBubbleEntry {
    pub id: String,
    pub label: String,
    pub reflection_count: u32,
    /// Epoch millis
    pub created_at_ms: i64,
}

/// Most-reflected bubbles, best first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TopBubbles {
    pub entries: Vec<TopBubbleEntry>,
}

impl TopBubbles {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Rank a set of bubbles. Ties go to the older bubble, then to id.
    pub fn rank<'a>(bubbles: impl IntoIterator<Item = &'a Bubble>) -> Self {
        let mut entries: Vec<TopBubbleEntry> = bubbles
            .into_iter()
            .map(|b| TopBubbleEntry {
                id: b.id.clone(),
                label: b.label.clone(),
                reflection_count: b.reflection_count,
                created_at_ms: b.created_at_ms,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.reflection_count
                .cmp(&a.reflection_count)
                .then(a.created_at_ms.cmp(&b.created_at_ms))
                .then_with(|| a.id.cmp(&b.id))
        });
        entries.truncate(MAX_TOP_BUBBLES);
        Self { entries }
    }

    /// Rank of a bubble (1-indexed), None if it did not place
    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id).map(|i| i + 1)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The leading bubble (if any)
    pub fn leader(&self) -> Option<&TopBubbleEntry> {
        self.entries.first()
    }
}
