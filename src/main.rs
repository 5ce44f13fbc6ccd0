use matrix_orchestrator::cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Dispatch the selected command; this is the single termination point.
    match cli::run().await {
        Ok(code) => ExitCode::from(code.clamp(0, u8::MAX as i32) as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
