// 📼 Replay Source - Recorded detection sessions from CSV
// Rows are `frame,text`; rows sharing a frame id become one batch, and
// batches are replayed in ascending frame order through the detector
// seam.

use crate::capture::{Detection, PlateDetector};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One CSV row of a recorded session
#[derive(Debug, Deserialize)]
struct ReplayRow {
    frame: u64,
    text: String,
}

/// One detector invocation's worth of readings
#[derive(Debug, Clone)]
pub struct ReplayFrame {
    pub frame: u64,
    pub candidates: Vec<String>,
}

// ============================================================================
// REPLAY SOURCE
// ============================================================================

#[derive(Debug)]
pub struct ReplaySource {
    frames: Vec<ReplayFrame>,
    cursor: usize,
}

impl ReplaySource {
    /// Load a recorded session from a CSV file with a `frame,text` header
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open replay session: {}", path.display()))?;
        Self::from_csv(reader)
    }

    /// Load a recorded session from any reader (used by tests)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let mut rows: Vec<ReplayRow> = Vec::new();
        for (index, result) in reader.deserialize().enumerate() {
            let row: ReplayRow =
                result.with_context(|| format!("Bad replay row at line {}", index + 2))?;
            rows.push(row);
        }

        // Group rows into per-frame batches, frames ascending
        rows.sort_by_key(|row| row.frame);

        let mut frames: Vec<ReplayFrame> = Vec::new();
        for row in rows {
            match frames.last_mut() {
                Some(last) if last.frame == row.frame => last.candidates.push(row.text),
                _ => frames.push(ReplayFrame {
                    frame: row.frame,
                    candidates: vec![row.text],
                }),
            }
        }

        Ok(ReplaySource { frames, cursor: 0 })
    }

    /// Total number of recorded frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frames already replayed
    pub fn frames_played(&self) -> usize {
        self.cursor
    }

    /// True once every recorded frame has been replayed
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.frames.len()
    }
}

impl PlateDetector for ReplaySource {
    /// Emit the next recorded frame's batch. The image bytes are
    /// ignored - the session was already detected when it was recorded.
    /// Past the end, yields empty batches.
    fn detect(&mut self, _image: &[u8]) -> Result<Detection> {
        let candidates = match self.frames.get(self.cursor) {
            Some(frame) => {
                self.cursor += 1;
                frame.candidates.clone()
            }
            None => Vec::new(),
        };

        Ok(Detection {
            candidates,
            rendered: None,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = "\
frame,text
1,KA01AB1234
1,MH12ZZ9999
2,KA01AB1235
3,01AB1234
";

    #[test]
    fn test_rows_group_into_frame_batches() {
        let source = ReplaySource::from_reader(SESSION.as_bytes()).unwrap();

        assert_eq!(source.frame_count(), 3);
        assert_eq!(source.frames[0].frame, 1);
        assert_eq!(source.frames[0].candidates, vec!["KA01AB1234", "MH12ZZ9999"]);
        assert_eq!(source.frames[1].candidates, vec!["KA01AB1235"]);
        assert_eq!(source.frames[2].candidates, vec!["01AB1234"]);
    }

    #[test]
    fn test_out_of_order_rows_are_sorted_by_frame() {
        let shuffled = "\
frame,text
3,DL8CX5555
1,KA01AB1234
3,MH12ZZ9999
1,KA01AB1235
";
        let source = ReplaySource::from_reader(shuffled.as_bytes()).unwrap();

        assert_eq!(source.frame_count(), 2);
        assert_eq!(source.frames[0].frame, 1);
        assert_eq!(source.frames[0].candidates, vec!["KA01AB1234", "KA01AB1235"]);
        assert_eq!(source.frames[1].frame, 3);
        assert_eq!(source.frames[1].candidates, vec!["DL8CX5555", "MH12ZZ9999"]);
    }

    #[test]
    fn test_detect_advances_and_exhausts() {
        let mut source = ReplaySource::from_reader(SESSION.as_bytes()).unwrap();

        assert!(!source.is_exhausted());

        let first = source.detect(&[]).unwrap();
        assert_eq!(first.candidates, vec!["KA01AB1234", "MH12ZZ9999"]);
        assert_eq!(source.frames_played(), 1);

        source.detect(&[]).unwrap();
        source.detect(&[]).unwrap();
        assert!(source.is_exhausted());

        // Past the end: empty batches, no error
        let past = source.detect(&[]).unwrap();
        assert!(past.candidates.is_empty());
    }

    #[test]
    fn test_empty_session_is_valid() {
        let source = ReplaySource::from_reader("frame,text\n".as_bytes()).unwrap();

        assert_eq!(source.frame_count(), 0);
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_non_numeric_frame_id_fails_with_line_context() {
        let bad = "\
frame,text
1,KA01AB1234
oops,MH12ZZ9999
";
        let err = ReplaySource::from_reader(bad.as_bytes()).unwrap_err();

        assert!(err.to_string().contains("line 3"));
    }
}
