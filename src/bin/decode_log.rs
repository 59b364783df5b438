//! Captured frame log decoder
//! Replays a text capture of the serial stream and shows the resulting registers

use pp1_monitor::{decode_line, MemoryView};
use std::env;
use std::fs;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <capture.txt> [--summary]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} capture.txt             # Show every frame, then the registers", args[0]);
        eprintln!("  {} capture.txt --summary   # Show only the final registers", args[0]);
        std::process::exit(1);
    }

    let capture_file = &args[1];
    let summary_only = match args.get(2).map(|s| s.as_str()) {
        None => false,
        Some("--summary") => true,
        Some(other) => anyhow::bail!("Unknown option {}", other),
    };

    println!("Reading capture: {}", capture_file);
    let bytes = fs::read(capture_file)?;
    // Captures may contain line noise that is not valid UTF-8
    let text = String::from_utf8_lossy(&bytes);

    let view = MemoryView::new();
    let mut dropped = 0usize;

    for (line_num, line) in text.lines().enumerate() {
        match decode_line(line) {
            Ok(frame) => {
                if !summary_only {
                    println!("{:>6}: {:<6} -> {}", line_num + 1, line, frame);
                }
                view.apply(&frame);
            }
            Err(e) => {
                if !summary_only {
                    println!("{:>6}: dropped ({})", line_num + 1, e);
                }
                dropped += 1;
            }
        }
    }

    println!("\n=== Registers ===\n");
    print!("{}", view.snapshot());
    println!(
        "\n{} frames decoded, {} dropped",
        view.update_count(),
        dropped
    );

    Ok(())
}
