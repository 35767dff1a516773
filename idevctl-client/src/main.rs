use idevctl_client::error::{codes, exit_code_for};
use idevctl_client::run_cli;
use idevctl_client::util::shutdown;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    shutdown::listen_for_ctrl_c();

    match run_cli().await {
        Ok(()) => ExitCode::from(codes::SUCCESS),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}
