// 📒 Plate Ledger - Accumulating set of distinct plate identities
// Each incoming batch is merged against the current entries: near-misses
// and partial reads collapse into one entry, new plates are appended.
//
// Concurrency: the ledger carries NO internal locking. `ingest` mutates
// through `&mut self`, so Rust enforces a single writer within one
// thread; sharing one ledger across threads requires external
// serialization (the server binary wraps it in Arc<Mutex<..>>).
// Concurrent ingest without that serialization is unsupported.

use crate::matcher::SimilarityMatcher;
use crate::normalize::{is_valid_candidate, normalize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// LEDGER ENTRY
// ============================================================================

/// One distinct plate observed this session.
///
/// `plate` is always a raw detector reading verbatim - the variant with
/// the longest normalized form merged into this entry so far. The
/// normalized key is derived on demand, never stored for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Display text (best raw variant seen so far)
    pub plate: String,

    /// How many readings merged into this entry, the first included
    pub observations: u64,

    /// When the first reading of this plate arrived
    pub first_seen: DateTime<Utc>,

    /// When the last reading merged into this entry
    pub last_updated: DateTime<Utc>,
}

impl LedgerEntry {
    fn new(raw: &str) -> Self {
        let now = Utc::now();
        LedgerEntry {
            plate: raw.to_string(),
            observations: 1,
            first_seen: now,
            last_updated: now,
        }
    }
}

// ============================================================================
// INPUT ERROR
// ============================================================================

/// A malformed batch at the JSON boundary.
///
/// The whole batch is rejected before any entry is processed; ledger
/// state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The payload was not a JSON array
    NotAnArray { found: &'static str },

    /// An array element was not a string
    NotAString { index: usize, found: &'static str },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::NotAnArray { found } => {
                write!(f, "batch must be an array of strings, got {}", found)
            }
            InputError::NotAString { index, found } => {
                write!(f, "batch entry {} is not a string, got {}", index, found)
            }
        }
    }
}

impl std::error::Error for InputError {}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// RECONCILE REPORT
// ============================================================================

/// One entry-to-entry merge performed by `reconcile`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedEntry {
    /// Display text of the surviving entry (after the merge)
    pub kept: String,

    /// Display text of the absorbed entry
    pub absorbed: String,
}

/// Outcome of an explicit `reconcile` pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub merged: Vec<MergedEntry>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.merged.is_empty()
    }
}

// ============================================================================
// PLATE LEDGER
// ============================================================================

pub struct PlateLedger {
    matcher: SimilarityMatcher,
    entries: Vec<LedgerEntry>,
    session_id: String,
}

impl PlateLedger {
    /// Create an empty ledger with the default matcher
    pub fn new() -> Self {
        Self::with_matcher(SimilarityMatcher::new())
    }

    /// Create an empty ledger with a custom matcher
    pub fn with_matcher(matcher: SimilarityMatcher) -> Self {
        PlateLedger {
            matcher,
            entries: Vec::new(),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Apply one batch of raw detector readings.
    ///
    /// For each reading in batch order:
    /// - normalize it; fragments (shorter than 4 chars or without a
    ///   digit) are dropped silently,
    /// - every existing entry whose key matches is upgraded in place:
    ///   the stored text is replaced iff the new reading's normalized
    ///   form is strictly longer (ties keep the stored value),
    /// - if nothing matched, the reading is appended as a new entry.
    ///
    /// Each reading scans the ledger as of its own turn, so upgrades
    /// made by earlier readings of the same batch are visible. A reading
    /// may match several entries; each is upgraded independently and the
    /// entries are not re-validated against each other afterwards (see
    /// `reconcile`).
    ///
    /// Returns the full ledger display texts, in first-seen order.
    pub fn ingest<S: AsRef<str>>(&mut self, batch: &[S]) -> Vec<String> {
        for raw in batch {
            let raw = raw.as_ref();
            let clean_new = normalize(raw);
            if !is_valid_candidate(&clean_new) {
                continue;
            }

            let mut matched = false;
            for entry in &mut self.entries {
                let clean_existing = normalize(&entry.plate);
                if self.matcher.matches(&clean_new, &clean_existing) {
                    matched = true;
                    if clean_new.len() > clean_existing.len() {
                        entry.plate = raw.to_string();
                    }
                    entry.observations += 1;
                    entry.last_updated = Utc::now();
                }
            }

            if !matched {
                self.entries.push(LedgerEntry::new(raw));
            }
        }

        self.display()
    }

    /// Apply a batch arriving as a JSON value (the detector wire shape).
    ///
    /// The value must be an array of strings. Anything else rejects the
    /// whole batch with an [`InputError`] before any processing - no
    /// partial ingest, ledger state unchanged.
    pub fn ingest_value(&mut self, batch: &Value) -> Result<Vec<String>, InputError> {
        let items = batch.as_array().ok_or(InputError::NotAnArray {
            found: json_type_name(batch),
        })?;

        let mut candidates = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => candidates.push(s),
                None => {
                    return Err(InputError::NotAString {
                        index,
                        found: json_type_name(item),
                    })
                }
            }
        }

        Ok(self.ingest(&candidates))
    }

    /// Clear the session: drop all entries, regenerate the session id.
    ///
    /// When to reset is the caller's policy (new still image, source
    /// switch), not the ledger's.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.session_id = uuid::Uuid::new_v4().to_string();
    }

    /// Collapse entries that match each other.
    ///
    /// `ingest` deliberately never re-validates entries against each
    /// other, so an upgrade can leave two entries that now read as the
    /// same plate. This explicit pass merges such pairs - the earlier
    /// entry survives in place, keeps the longer display form and the
    /// combined observation count - and repeats until a full scan makes
    /// no merge. Opt-in only; ingest behavior is unchanged.
    pub fn reconcile(&mut self) -> ReconcileReport {
        let mut merged = Vec::new();

        'rescan: loop {
            for i in 0..self.entries.len() {
                for j in (i + 1)..self.entries.len() {
                    let key_i = normalize(&self.entries[i].plate);
                    let key_j = normalize(&self.entries[j].plate);
                    if !self.matcher.matches(&key_i, &key_j) {
                        continue;
                    }

                    let absorbed = self.entries.remove(j);
                    let entry = &mut self.entries[i];
                    if key_j.len() > key_i.len() {
                        entry.plate = absorbed.plate.clone();
                    }
                    entry.observations += absorbed.observations;
                    if absorbed.first_seen < entry.first_seen {
                        entry.first_seen = absorbed.first_seen;
                    }
                    entry.last_updated = Utc::now();

                    merged.push(MergedEntry {
                        kept: entry.plate.clone(),
                        absorbed: absorbed.plate,
                    });
                    continue 'rescan;
                }
            }
            break;
        }

        ReconcileReport { merged }
    }

    /// Current entries, in first-seen order
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Current display texts, in first-seen order
    pub fn display(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.plate.clone()).collect()
    }

    /// Identity of the current session (regenerated on reset)
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PlateLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let mut ledger = PlateLedger::new();

        assert_eq!(ledger.ingest::<&str>(&[]), Vec::<String>::new());

        ledger.ingest(&["KA01AB1234"]);
        let before = ledger.display();
        assert_eq!(ledger.ingest::<&str>(&[]), before);

        ledger.reset();
        assert_eq!(ledger.ingest::<&str>(&[]), Vec::<String>::new());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_noise_is_filtered_silently() {
        let mut ledger = PlateLedger::new();

        // "AB" has no digit, "12" is too short, "----" normalizes to empty
        let result = ledger.ingest(&["AB", "12", "----"]);

        assert!(result.is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_exact_duplicate_collapses() {
        let mut ledger = PlateLedger::new();

        ledger.ingest(&["KA01AB1234"]);
        let result = ledger.ingest(&["KA01AB1234"]);

        assert_eq!(result, vec!["KA01AB1234"]);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].observations, 2);
    }

    #[test]
    fn test_near_miss_collapses_and_keeps_first_stored() {
        let mut ledger = PlateLedger::new();

        ledger.ingest(&["KA01AB1234"]);
        let result = ledger.ingest(&["KA01AB1235"]); // distance 1

        // Equal normalized length: tie keeps the already-stored value
        assert_eq!(result, vec!["KA01AB1234"]);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_partial_read_keeps_longer_form() {
        let mut ledger = PlateLedger::new();

        ledger.ingest(&["KA01AB1234"]);
        let result = ledger.ingest(&["01AB1234"]);

        assert_eq!(result, vec!["KA01AB1234"]);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_longer_read_upgrades_entry() {
        let mut ledger = PlateLedger::new();

        ledger.ingest(&["01AB1234"]);
        let result = ledger.ingest(&["KA01AB1234"]);

        assert_eq!(result, vec!["KA01AB1234"]);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_upgrade_preserves_first_seen_and_counts_merges() {
        let mut ledger = PlateLedger::new();

        ledger.ingest(&["01AB1234"]);
        let first_seen = ledger.entries()[0].first_seen;

        ledger.ingest(&["KA01AB1234"]);

        let entry = &ledger.entries()[0];
        assert_eq!(entry.plate, "KA01AB1234");
        assert_eq!(entry.observations, 2);
        assert_eq!(entry.first_seen, first_seen);
        assert!(entry.last_updated >= first_seen);
    }

    #[test]
    fn test_distinct_plates_stay_distinct_in_order() {
        let mut ledger = PlateLedger::new();

        let result = ledger.ingest(&["KA01AB1234", "MH12ZZ9999"]);

        assert_eq!(result, vec!["KA01AB1234", "MH12ZZ9999"]);
    }

    #[test]
    fn test_display_is_verbatim_raw_not_normalized() {
        let mut ledger = PlateLedger::new();

        let result = ledger.ingest(&["ka-01 ab 1234"]);

        assert_eq!(result, vec!["ka-01 ab 1234"]);
    }

    #[test]
    fn test_batch_sees_upgrades_from_earlier_in_same_batch() {
        let mut ledger = PlateLedger::new();

        // Second reading upgrades the entry; third must be compared
        // against the upgraded text, not a stale snapshot
        let result = ledger.ingest(&["01AB1234", "KA01AB1234", "KA01AB1235"]);

        assert_eq!(result, vec!["KA01AB1234"]);
        assert_eq!(ledger.entries()[0].observations, 3);
    }

    #[test]
    fn test_multi_match_upgrades_each_entry_independently() {
        let mut ledger = PlateLedger::new();

        // Far enough apart to be two distinct entries
        ledger.ingest(&["AB1234"]);
        ledger.ingest(&["CDAB9934"]);
        assert_eq!(ledger.len(), 2);

        // Superstring of the first AND distance 2 from the second:
        // both entries match and are upgraded independently - the two
        // are NOT merged with each other afterwards
        let result = ledger.ingest(&["CDAB1234"]);

        assert_eq!(result, vec!["CDAB1234", "CDAB9934"]);
        assert_eq!(ledger.entries()[0].observations, 2);
        assert_eq!(ledger.entries()[1].observations, 2);
    }

    #[test]
    fn test_reconcile_collapses_multi_match_leftovers() {
        let mut ledger = PlateLedger::new();

        ledger.ingest(&["AB1234"]);
        ledger.ingest(&["CDAB9934"]);
        ledger.ingest(&["CDAB1234"]);

        // The multi-match upgrade left two entries that now read as the
        // same plate (distance 2)
        assert_eq!(ledger.len(), 2);

        let report = ledger.reconcile();

        assert_eq!(report.merged.len(), 1);
        assert_eq!(report.merged[0].kept, "CDAB1234");
        assert_eq!(report.merged[0].absorbed, "CDAB9934");
        assert_eq!(ledger.display(), vec!["CDAB1234"]);
        assert_eq!(ledger.entries()[0].observations, 4);
    }

    #[test]
    fn test_reconcile_on_clean_ledger_reports_nothing() {
        let mut ledger = PlateLedger::new();

        ledger.ingest(&["KA01AB1234", "MH12ZZ9999"]);
        let report = ledger.reconcile();

        assert!(report.is_clean());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_reset_clears_entries_and_rotates_session() {
        let mut ledger = PlateLedger::new();

        ledger.ingest(&["KA01AB1234"]);
        let old_session = ledger.session_id().to_string();

        ledger.reset();

        assert!(ledger.is_empty());
        assert_ne!(ledger.session_id(), old_session);
    }

    #[test]
    fn test_ingest_value_accepts_string_array() {
        let mut ledger = PlateLedger::new();

        let result = ledger
            .ingest_value(&json!(["KA01AB1234", "MH12ZZ9999"]))
            .unwrap();

        assert_eq!(result, vec!["KA01AB1234", "MH12ZZ9999"]);
    }

    #[test]
    fn test_ingest_value_rejects_whole_batch_on_non_string() {
        let mut ledger = PlateLedger::new();
        ledger.ingest(&["KA01AB1234"]);
        let before = ledger.display();

        let err = ledger
            .ingest_value(&json!(["MH12ZZ9999", 42, "DL8CX5555"]))
            .unwrap_err();

        assert_eq!(
            err,
            InputError::NotAString {
                index: 1,
                found: "number"
            }
        );
        // Nothing from the malformed batch was applied
        assert_eq!(ledger.display(), before);
    }

    #[test]
    fn test_ingest_value_rejects_non_array() {
        let mut ledger = PlateLedger::new();

        let err = ledger.ingest_value(&json!({"plates": []})).unwrap_err();

        assert_eq!(err, InputError::NotAnArray { found: "object" });
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_input_error_messages() {
        let err = InputError::NotAString {
            index: 3,
            found: "null",
        };
        assert_eq!(err.to_string(), "batch entry 3 is not a string, got null");

        let err = InputError::NotAnArray { found: "string" };
        assert_eq!(
            err.to_string(),
            "batch must be an array of strings, got string"
        );
    }
}
