use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of visitor reactions. Anything else is rejected at the
/// request boundary, never stored.
///
/// The declaration order is the canonical display priority used to break
/// count ties, so panels with equal counts render identically across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Kerze,
    Liebe,
    Blume,
    Taube,
    Stern,
}

impl ReactionType {
    pub const ALL: [ReactionType; 5] = [
        ReactionType::Kerze,
        ReactionType::Liebe,
        ReactionType::Blume,
        ReactionType::Taube,
        ReactionType::Stern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Kerze => "kerze",
            ReactionType::Liebe => "liebe",
            ReactionType::Blume => "blume",
            ReactionType::Taube => "taube",
            ReactionType::Stern => "stern",
        }
    }

    /// Position in the canonical priority order (lower = shown first on ties).
    pub fn priority(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(Self::ALL.len())
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionType {
    type Err = UnknownReaction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownReaction(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReaction(pub String);

impl fmt::Display for UnknownReaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown reaction type '{}'", self.0)
    }
}

impl std::error::Error for UnknownReaction {}

/// Authoritative reaction state for one memorial as seen by one caller:
/// per-type counts plus the caller's own active types (empty when anonymous).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSnapshot {
    pub counts: BTreeMap<ReactionType, u64>,
    pub user_reactions: Vec<ReactionType>,
}

impl ReactionSnapshot {
    /// An empty snapshot with all five counts present and zero.
    pub fn empty() -> Self {
        Self {
            counts: ReactionType::ALL.into_iter().map(|t| (t, 0)).collect(),
            user_reactions: Vec::new(),
        }
    }

    pub fn count(&self, ty: ReactionType) -> u64 {
        self.counts.get(&ty).copied().unwrap_or(0)
    }

    pub fn is_active(&self, ty: ReactionType) -> bool {
        self.user_reactions.contains(&ty)
    }

    /// Types in display order: count descending, canonical priority on ties.
    pub fn display_order(&self) -> Vec<ReactionType> {
        let mut types = ReactionType::ALL.to_vec();
        types.sort_by(|a, b| {
            self.count(*b)
                .cmp(&self.count(*a))
                .then_with(|| a.priority().cmp(&b.priority()))
        });
        types
    }
}

impl Default for ReactionSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!("kerze".parse::<ReactionType>().unwrap(), ReactionType::Kerze);
        assert!("thumbsup".parse::<ReactionType>().is_err());
        assert!("KERZE".parse::<ReactionType>().is_err());
    }

    #[test]
    fn display_order_sorts_by_count_then_priority() {
        let mut snap = ReactionSnapshot::empty();
        snap.counts.insert(ReactionType::Stern, 3);
        snap.counts.insert(ReactionType::Blume, 3);
        snap.counts.insert(ReactionType::Liebe, 7);

        let order = snap.display_order();
        assert_eq!(order[0], ReactionType::Liebe);
        // Blume before Stern: equal counts fall back to canonical priority.
        assert_eq!(order[1], ReactionType::Blume);
        assert_eq!(order[2], ReactionType::Stern);
        // Zero-count types keep canonical order at the tail.
        assert_eq!(order[3], ReactionType::Kerze);
        assert_eq!(order[4], ReactionType::Taube);
    }

    #[test]
    fn wire_format_is_lowercase() {
        let json = serde_json::to_string(&ReactionType::Taube).unwrap();
        assert_eq!(json, "\"taube\"");
    }
}
