use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::HookError;
use crate::job::{CommandRun, DispatchReport};
use crate::runner::CommandRunner;
use crate::webhook::Webhook;
use crate::{HookConfig, RepositoryConfig};

/// All config entries named `repo_name`, in config order.
///
/// Names are compared exactly and are not required to be unique; every
/// matching entry is returned, not just the first.
pub fn find_matching_repositories<'a>(
    config: &'a HookConfig,
    repo_name: &'a str,
) -> impl Iterator<Item = &'a RepositoryConfig> + 'a {
    config
        .repositories
        .iter()
        .filter(move |repo| repo.name == repo_name)
}

/// The commands a push to `repo_name` runs, concatenated across entries.
pub fn planned_commands<'a>(config: &'a HookConfig, repo_name: &'a str) -> Vec<&'a str> {
    find_matching_repositories(config, repo_name)
        .flat_map(|repo| repo.commands.iter().map(String::as_str))
        .collect()
}

/// Run every command configured for the payload's repository, one after the
/// other. A command that fails is logged and the next one still runs.
pub async fn dispatch(
    config: &HookConfig,
    hook: &Webhook,
    runner: &dyn CommandRunner,
    request_id: Uuid,
) -> DispatchReport {
    let repo_name = hook.repository_name();
    let mut report = DispatchReport::new(request_id, repo_name.to_string());

    for command in planned_commands(config, repo_name) {
        let run = run_command(runner, command).await;
        report.runs.push(run);
    }

    report
}

async fn run_command(runner: &dyn CommandRunner, command: &str) -> CommandRun {
    let started_at = Utc::now();
    info!("Running: {}", command);

    match runner.run(command).await {
        Ok(output) if output.success => {
            let run = CommandRun::succeeded(command, started_at, output.stdout);
            info!("Executed: {}", command);
            info!("Output: {}", run.output);
            run
        }
        Ok(output) => {
            let err = HookError::CommandFailed {
                command: command.to_string(),
                code: output.code,
            };
            error!("{}", err);
            let mut captured = output.stdout;
            captured.push_str(&output.stderr);
            let run = CommandRun::failed(command, started_at, captured, err.to_string());
            error!("Output: {}", run.output);
            run
        }
        Err(err) => {
            error!("{}", err);
            CommandRun::failed(command, started_at, String::new(), err.to_string())
        }
    }
}
