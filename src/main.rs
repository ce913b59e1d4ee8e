use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match clinic_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Fatal: {e}");
            eprintln!("clinic-records: {e}");
            ExitCode::FAILURE
        }
    }
}
