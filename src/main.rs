use gitlab_webhook::error::HookError;
use gitlab_webhook::handlers::app;
use gitlab_webhook::reload::spawn_reload_listener;
use gitlab_webhook::runner::ProcessRunner;
use gitlab_webhook::{AppState, cli, load_config, logging};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let args = cli::parse();

    // Dropped on return, after the last line has been written, so the file
    // writer flushes before the process exits.
    let _log_guard = match logging::setup_logging(args.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::CliArgs) -> Result<(), HookError> {
    let config = load_config(&args.config).await?;
    info!("Using config at {:?}", args.config);

    let bind_address = config.bind_address();
    let state = Arc::new(AppState::new(config, args.config, Arc::new(ProcessRunner)));
    spawn_reload_listener(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|source| HookError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    info!("Listening on {}", bind_address);
    axum::serve(listener, app(state))
        .await
        .map_err(HookError::Serve)
}
