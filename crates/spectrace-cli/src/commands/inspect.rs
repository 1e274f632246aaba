use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use spectrace_core::serde::to_canonical_json_bytes;
use spectrace_io::{load_trace, TraceSummary};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Trace directory containing `trace.yaml`.
    #[arg(long)]
    pub trace: PathBuf,
    /// Emit the summary as canonical JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &InspectArgs) -> Result<(), Box<dyn Error>> {
    let document = load_trace(&args.trace)?;
    let summary = document.summary();
    if args.json {
        let json = to_canonical_json_bytes(&summary)?;
        println!("{}", String::from_utf8(json)?);
        return Ok(());
    }
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &TraceSummary) {
    println!("fork:      {}", summary.fork.as_deref().unwrap_or("-"));
    println!("preset:    {}", summary.preset.as_deref().unwrap_or("-"));
    println!("artifacts: {}", summary.artifacts);
    for (op, count) in &summary.steps {
        println!("steps.{op}: {count}");
    }
    match summary.final_state_root {
        Some(root) => println!("final state root: {root}"),
        None => println!("final state root: none"),
    }
    for (method, error) in &summary.errors {
        println!("error in {method}: {}: {}", error.kind, error.message);
    }
}
