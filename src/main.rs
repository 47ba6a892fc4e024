use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match pawroute::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "pawroute failed");
            eprintln!("pawroute: {e}");
            ExitCode::FAILURE
        }
    }
}
