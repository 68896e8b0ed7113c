//! CLI argument parsing using `clap`.
//!
//! Long flags are also accepted with a single dash (`-config path`), the
//! spelling existing deployment scripts use.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::DEFAULT_CONFIG_PATH;

const LONG_FLAGS: &[&str] = &["config", "log-dir"];

/// Command-line arguments for `gitlab_webhook`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gitlab_webhook",
    version,
    about = "Run configured commands when GitLab reports a push.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the JSON config file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Also write logs to daily rotated files in this directory.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Rewrite `-config` / `-config=x` style flags to their `--` form.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split('=').next().unwrap_or(rest);
            if LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}

/// Parse arguments, accepting single-dash long flags.
pub fn try_parse_from<I>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    CliArgs::try_parse_from(normalize_args(args))
}

/// Parse the process arguments, exiting with a usage error on failure.
pub fn parse() -> CliArgs {
    match try_parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => e.exit(),
    }
}
