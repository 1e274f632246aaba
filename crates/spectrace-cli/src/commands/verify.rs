use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use spectrace_io::verify_trace;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Trace directory to verify.
    #[arg(long)]
    pub trace: PathBuf,
}

pub fn run(args: &VerifyArgs) -> Result<(), Box<dyn Error>> {
    let report = verify_trace(&args.trace)?;
    println!(
        "trace verified: {} steps, {} artifacts, {} references",
        report.steps, report.artifacts, report.references
    );
    Ok(())
}
