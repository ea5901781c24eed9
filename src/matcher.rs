// 🔍 Similarity Matcher - Decide when two readings are the same plate
// Two signals: Levenshtein distance (near-misses) and substring
// containment (partial reads)

use serde::{Deserialize, Serialize};

// ============================================================================
// MATCH REASON
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchReason {
    /// One key contains the other (partial read of the same plate)
    Containment,

    /// Keys are within the edit-distance threshold (OCR near-miss)
    EditDistance { distance: usize },
}

// ============================================================================
// SIMILARITY MATCHER
// ============================================================================

pub struct SimilarityMatcher {
    /// Maximum Levenshtein distance for two keys to match (default: 2)
    pub max_edit_distance: usize,
}

impl SimilarityMatcher {
    /// Create matcher with default threshold
    pub fn new() -> Self {
        SimilarityMatcher {
            max_edit_distance: 2,
        }
    }

    /// Check whether two normalized keys read as the same physical plate.
    ///
    /// The predicate is symmetric: containment accepts either direction,
    /// and edit distance is symmetric by definition. Callers must filter
    /// keys through `is_valid_candidate` first - the empty string is a
    /// substring of everything.
    pub fn matches(&self, a: &str, b: &str) -> bool {
        self.match_reason(a, b).is_some()
    }

    /// Like `matches`, but reports which signal fired.
    ///
    /// Containment is checked first; a pair that satisfies both signals
    /// reports `Containment`.
    pub fn match_reason(&self, a: &str, b: &str) -> Option<MatchReason> {
        if a.contains(b) || b.contains(a) {
            return Some(MatchReason::Containment);
        }

        let distance = levenshtein_distance(a, b);
        if distance <= self.max_edit_distance {
            return Some(MatchReason::EditDistance { distance });
        }

        None
    }
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Calculate Levenshtein distance between two strings
///
/// Minimum number of single-character edits (insertions, deletions,
/// substitutions) to change one string into another. Unit cost each.
/// Uses two rolling rows instead of the full matrix.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };

            curr[j] = std::cmp::min(
                std::cmp::min(
                    prev[j] + 1,     // deletion
                    curr[j - 1] + 1, // insertion
                ),
                prev[j - 1] + cost, // substitution
            );
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("", "ABC"), 3);
        assert_eq!(levenshtein_distance("ABC", ""), 3);
        assert_eq!(levenshtein_distance("ABC", "ABC"), 0);
        assert_eq!(levenshtein_distance("ABC", "ABD"), 1);
        assert_eq!(levenshtein_distance("ABC", "AB"), 1);
        assert_eq!(levenshtein_distance("ABC", "ABCD"), 1);
        assert_eq!(levenshtein_distance("KITTEN", "SITTING"), 3);
        assert_eq!(levenshtein_distance("KA01AB1234", "KA01AB1235"), 1);
    }

    #[test]
    fn test_match_within_distance_threshold() {
        let matcher = SimilarityMatcher::new();

        // One substitution
        assert!(matcher.matches("KA01AB1234", "KA01AB1235"));
        // Two substitutions - still within default threshold
        assert!(matcher.matches("KA01AB1234", "KA01AB1299"));
        // Three edits - too far
        assert!(!matcher.matches("KA01AB1234", "KA01AB1999"));
    }

    #[test]
    fn test_match_containment_either_direction() {
        let matcher = SimilarityMatcher::new();

        // Partial read is a substring of the full plate: edit distance
        // alone (4 missing chars) would miss it
        assert_eq!(levenshtein_distance("KA01AB1234", "AB1234"), 4);
        assert!(matcher.matches("KA01AB1234", "AB1234"));
        assert!(matcher.matches("AB1234", "KA01AB1234"));
    }

    #[test]
    fn test_match_reason_reporting() {
        let matcher = SimilarityMatcher::new();

        assert_eq!(
            matcher.match_reason("KA01AB1234", "01AB1234"),
            Some(MatchReason::Containment)
        );
        assert_eq!(
            matcher.match_reason("KA01AB1234", "KA01AB1235"),
            Some(MatchReason::EditDistance { distance: 1 })
        );
        // Equal keys contain each other
        assert_eq!(
            matcher.match_reason("KA01AB1234", "KA01AB1234"),
            Some(MatchReason::Containment)
        );
        assert_eq!(matcher.match_reason("KA01AB1234", "MH12ZZ9999"), None);
    }

    #[test]
    fn test_match_predicate_is_symmetric() {
        let matcher = SimilarityMatcher::new();

        let pairs = [
            ("KA01AB1234", "KA01AB1235"),
            ("KA01AB1234", "01AB1234"),
            ("KA01AB1234", "MH12ZZ9999"),
            ("1234", "1234"),
        ];

        for (a, b) in pairs {
            assert_eq!(
                matcher.matches(a, b),
                matcher.matches(b, a),
                "symmetry broken for {} / {}",
                a,
                b
            );
        }
    }

    #[test]
    fn test_custom_threshold() {
        let strict = SimilarityMatcher {
            max_edit_distance: 0,
        };

        assert!(!strict.matches("KA01AB1234", "KA01AB1235"));
        // Containment still applies regardless of threshold
        assert!(strict.matches("KA01AB1234", "01AB1234"));
    }
}
