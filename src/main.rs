use clap::{Parser, Subcommand};
use cowbuf::script::{run_script_file, Event, Report};
use cowbuf::CowBuffer;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cowbuf", about = "Copy-on-write byte buffer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSON script of buffer operations and print the trace
    Run {
        script: PathBuf,
        /// Print the full report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Walk through the canonical sharing scenario step by step
    Demo,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {

        // ── Run ──────────────────────────────────────────────────────────────
        Commands::Run { script, json } => {
            let report = run_script_file(&script)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_table(&report);
            }
        }

        // ── Demo ─────────────────────────────────────────────────────────────
        Commands::Demo => demo(),
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn print_table(report: &Report) {
    println!("{:<10} {:<8} {:>3} {:>6} {:>14}  Bytes",
             "Op", "Handle", "Ok", "Count", "Storage");
    for e in &report.events {
        print_event(e);
    }
}

fn print_event(e: &Event) {
    println!("{:<10} {:<8} {:>3} {:>6} {:>14}  {}{}",
        e.op, e.handle,
        if e.ok { "yes" } else { "no" },
        e.share_count,
        &e.storage_id,
        e.bytes,
        e.error.as_deref().map(|m| format!("  ({})", m)).unwrap_or_default());
}

fn demo() {
    let show = |step: &str, name: &str, buf: &CowBuffer| {
        println!("  {:<44} {:<8} count={} storage={:x} bytes={}",
                 step, name, buf.share_count(), buf.storage_id(),
                 String::from_utf8_lossy(buf.as_bytes()));
    };

    println!("── CowBuffer demo ───────────────────────────────────────");
    let mut original = CowBuffer::new(b"abcd".to_vec());
    show("construct \"abcd\"", "original", &original);

    let copy1 = original.clone();
    let copy2 = original.clone();
    show("clone x2 (no bytes copied)", "copy1", &copy1);
    show("", "copy2", &copy2);

    original.update(0, b'g').expect("in-bounds update");
    show("update(0,'g') detaches the writer", "original", &original);
    show("siblings keep the old storage", "copy1", &copy1);

    if let Err(e) = original.update(4, b'z') {
        println!("  update(4,'z') rejected: {}", e);
    }

    let mut copy1 = copy1;
    copy1.close();
    show("close(copy1): private copy, same bytes", "copy1", &copy1);
    show("copy2 is now exclusive", "copy2", &copy2);

    let mut copy2 = copy2;
    let before = copy2.storage_id();
    copy2.update(0, b'f').expect("in-bounds update");
    show("update(0,'f') in place (exclusive)", "copy2", &copy2);
    println!("  storage unchanged: {}", before == copy2.storage_id());
}
