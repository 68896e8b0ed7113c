use axum::{
    Router,
    body::{self, Body},
    extract::State as AxumState,
    http::{Method, StatusCode, Uri},
    routing,
};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::SharedState;
use crate::dispatch::dispatch;
use crate::error::HookError;
use crate::job::DispatchReport;
use crate::webhook::Webhook;

/// Router sending every request, whatever the method or path, to the
/// webhook handler.
pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::any(handle_webhook))
        .fallback(handle_webhook)
        .with_state(state)
}

/// Handles a GitLab push hook: decode, match by repository name, run the
/// configured commands before responding.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    method: Method,
    uri: Uri,
    body: Body,
) -> StatusCode {
    let request_id = Uuid::now_v7();
    let span = info_span!("webhook", %request_id, %method, path = %uri.path());

    async move {
        let bytes = match body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("{}", HookError::RequestRead(e));
                return StatusCode::BAD_REQUEST;
            }
        };

        let hook = match Webhook::from_slice(&bytes) {
            Ok(hook) => hook,
            Err(e) => {
                error!("{}", e);
                return StatusCode::BAD_REQUEST;
            }
        };
        debug!("{:#?}", &hook);

        info!(
            "Push to repository '{}' ref '{}'",
            hook.repository_name(),
            hook.branch()
        );

        // In-flight requests keep the snapshot they started with.
        let config = state.current_config();
        let runner = Arc::clone(&state.runner);

        // Dispatch on its own task: a client that hangs up drops this handler
        // future, and the remaining commands must still run.
        let dispatch_task = tokio::spawn(
            async move { dispatch(&config, &hook, runner.as_ref(), request_id).await }
                .in_current_span(),
        );
        let report = match dispatch_task.await {
            Ok(report) => report,
            Err(e) => {
                error!("Dispatch task for request {} failed: {}", request_id, e);
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        };

        log_report(&report);
        StatusCode::OK
    }
    .instrument(span)
    .await
}

fn log_report(report: &DispatchReport) {
    if report.runs.is_empty() {
        info!(
            "No commands configured for repository '{}', skipping.",
            report.repository
        );
        return;
    }

    for run in &report.runs {
        match &run.error {
            None => info!(
                "[{}] {} succeeded in {}ms{}",
                report.request_id,
                run.command,
                run.duration_ms(),
                if run.output_truncated { " (output truncated)" } else { "" }
            ),
            Some(e) => warn!(
                "[{}] {} failed after {}ms: {}",
                report.request_id,
                run.command,
                run.duration_ms(),
                e
            ),
        }
    }
    info!(
        "Finished {} command(s) for repository '{}', {} failed",
        report.runs.len(),
        report.repository,
        report.failed_count()
    );
}
