// 🎥 Capture Controller - Serializes detector batches into the ledger
// Owns the session-reset policy and the in-flight guard: a capture
// request that arrives while a frame is still being processed is
// skipped, never queued.

use crate::ledger::PlateLedger;
use anyhow::Result;
use serde::{Deserialize, Serialize};

// ============================================================================
// DETECTOR CONTRACT
// ============================================================================

/// What the upstream detector returns for one frame
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Raw plate text guesses, in detector order (possibly empty)
    pub candidates: Vec<String>,

    /// Rendered image with detection overlays, if the detector draws one
    pub rendered: Option<Vec<u8>>,
}

/// Upstream plate detector.
///
/// Implementations wrap whatever actually reads plates out of an image -
/// an HTTP detection backend, a recorded session replay. The controller
/// only consumes the candidate strings; rendering is passed through for
/// display.
pub trait PlateDetector: Send {
    fn detect(&mut self, image: &[u8]) -> Result<Detection>;
}

// ============================================================================
// CAPTURE STATE & MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Ready for the next frame
    Idle,

    /// A frame is being detected/ingested; new requests are skipped
    Capturing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    /// One uploaded image per session
    Still,

    /// Frames sampled from a video file
    Video,

    /// Frames sampled from a live webcam
    Webcam,
}

impl CaptureMode {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            CaptureMode::Still => "Still image",
            CaptureMode::Video => "Video",
            CaptureMode::Webcam => "Webcam",
        }
    }
}

// ============================================================================
// CAPTURE OUTCOME
// ============================================================================

/// Result of one accepted capture: the updated ledger plus whatever the
/// detector rendered for this frame
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub plates: Vec<String>,
    pub rendered: Option<Vec<u8>>,
}

// ============================================================================
// CAPTURE CONTROLLER
// ============================================================================

pub struct CaptureController {
    detector: Box<dyn PlateDetector>,
    ledger: PlateLedger,
    state: CaptureState,
    mode: CaptureMode,
}

impl CaptureController {
    pub fn new(detector: Box<dyn PlateDetector>, mode: CaptureMode) -> Self {
        CaptureController {
            detector,
            ledger: PlateLedger::new(),
            state: CaptureState::Idle,
            mode,
        }
    }

    /// Run one frame through the detector and merge the result.
    ///
    /// Returns `Ok(None)` when a capture is already in flight - the
    /// frame is dropped, matching the skip-don't-queue policy of
    /// timer-driven capture. Detector failures propagate after the
    /// controller returns to Idle, so one bad frame does not wedge the
    /// session.
    pub fn capture(&mut self, image: &[u8]) -> Result<Option<CaptureOutcome>> {
        if self.state == CaptureState::Capturing {
            return Ok(None);
        }

        self.state = CaptureState::Capturing;
        let detection = self.detector.detect(image);
        self.state = CaptureState::Idle;

        let detection = detection?;
        let plates = self.ledger.ingest(&detection.candidates);

        Ok(Some(CaptureOutcome {
            plates,
            rendered: detection.rendered,
        }))
    }

    /// Switch the input source. A different mode starts a logically new
    /// session, so the ledger is reset; re-selecting the current mode is
    /// a no-op.
    pub fn set_mode(&mut self, mode: CaptureMode) {
        if self.mode != mode {
            self.mode = mode;
            self.ledger.reset();
        }
    }

    /// A fresh upload in Still mode replaces the session
    pub fn new_still_image(&mut self) {
        self.ledger.reset();
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn ledger(&self) -> &PlateLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut PlateLedger {
        &mut self.ledger
    }
}

// ============================================================================
// TESTS
// ============================================================================
