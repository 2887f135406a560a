use hnforge_cli::{app, cli, commands};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli::command().get_matches();
    let json_logs = matches
        .subcommand()
        .is_some_and(|(_, args)| args.get_flag("log-json"));
    app::init_tracing(json_logs);

    match commands::run(&matches).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error:#}");
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
