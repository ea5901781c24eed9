// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use std::env;
use std::path::Path;

use plate_ledger::{CaptureController, CaptureMode, ReplaySource};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "replay" {
        // Batch replay mode
        run_replay(&args)?;
    } else {
        // UI mode (default)
        run_ui_mode(&args)?;
    }

    Ok(())
}

fn session_path(args: &[String], index: usize) -> Result<&Path> {
    match args.get(index) {
        Some(path) => Ok(Path::new(path)),
        None => bail!(
            "Usage: plate-ledger replay <session.csv>\n       plate-ledger <session.csv>   (interactive)"
        ),
    }
}

fn run_replay(args: &[String]) -> Result<()> {
    println!("📼 Plate Ledger - Recorded Session Replay");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let path = session_path(args, 2)?;

    // 1. Load the recorded session
    println!("\n📂 Loading session...");
    let source = ReplaySource::from_path(path)?;
    let total_frames = source.frame_count();
    println!("✓ Loaded {} frames from {}", total_frames, path.display());

    // 2. Stream every frame through the controller
    println!("\n🎞️  Replaying...");
    let mut controller = CaptureController::new(Box::new(source), CaptureMode::Video);

    for frame in 1..=total_frames {
        if let Some(outcome) = controller.capture(&[])? {
            println!(
                "  Frame {:>4}: {} distinct plate(s)",
                frame,
                outcome.plates.len()
            );
        }
    }

    // 3. Final ledger
    println!("\n🔢 Distinct plates this session: {}", controller.ledger().len());
    for entry in controller.ledger().entries() {
        println!(
            "   {}  (seen {}×, first {})",
            entry.plate,
            entry.observations,
            entry.first_seen.format("%H:%M:%S")
        );
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(args: &[String]) -> Result<()> {
    println!("🖥️  Loading Plate Ledger UI...\n");

    let path = session_path(args, 1)?;

    println!("📂 Loading session...");
    let source = ReplaySource::from_path(path)?;
    println!("✓ Loaded {} frames\n", source.frame_count());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(source);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_args: &[String]) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or replay a session: plate-ledger replay <session.csv>");
    std::process::exit(1);
}
