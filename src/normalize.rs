// 🔤 Normalizer - Comparison keys for raw OCR readings
// Strips noise characters and filters out fragments before matching

/// Minimum normalized length for a reading to count as a plate.
pub const MIN_KEY_LENGTH: usize = 4;

/// Reduce a raw OCR reading to its comparison key.
///
/// Keeps `[A-Za-z0-9]` only and upper-cases the rest. The key is used
/// exclusively for matching; the raw reading stays the display value.
///
/// Example: "ka-01 ab·1234" → "KA01AB1234"
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Check whether a normalized key looks like a real plate reading.
///
/// OCR emits plenty of fragments ("AB", "12", "----"). A key qualifies
/// only if it has at least [`MIN_KEY_LENGTH`] characters and contains at
/// least one digit. Failing keys are dropped silently upstream; they are
/// expected noise, not errors.
pub fn is_valid_candidate(normalized: &str) -> bool {
    normalized.len() >= MIN_KEY_LENGTH && normalized.chars().any(|c| c.is_ascii_digit())
}

// ============================================================================
// TESTS
// ============================================================================
