//! CLI for retrier.

mod duration;
mod program;
mod report;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use retrier_core::retry::condition;
use retrier_core::{BackoffKind, Dispatch, Retry, RetrySettings};
use std::time::Duration;

use duration::parse_duration;
use program::program_action;
use report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackoffArg {
    /// Same delay between every attempt.
    Uniform,
    /// Delay multiplied by --factor after every attempt.
    Exponential,
}

impl From<BackoffArg> for BackoffKind {
    fn from(arg: BackoffArg) -> Self {
        match arg {
            BackoffArg::Uniform => BackoffKind::Uniform,
            BackoffArg::Exponential => BackoffKind::Exponential,
        }
    }
}

/// Rerun a program on an interval until it exits successfully.
#[derive(Debug, Parser)]
#[command(name = "retrier")]
#[command(about = "Rerun a program on an interval until it succeeds", long_about = None)]
pub struct Cli {
    /// Base interval between attempts (e.g. 500ms, 2s, 1m).
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub every: Duration,

    /// Overall time budget; unbounded if omitted.
    #[arg(long, value_parser = parse_duration)]
    pub within: Option<Duration>,

    /// Stop after N attempts; unbounded if omitted.
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u64>,

    /// Backoff strategy between attempts.
    #[arg(long, value_enum, default_value_t = BackoffArg::Uniform)]
    pub backoff: BackoffArg,

    /// Growth factor for exponential backoff.
    #[arg(long, default_value_t = 2.0)]
    pub factor: f64,

    /// Wait for each attempt to finish before sleeping (no overlapping runs).
    #[arg(long)]
    pub serial: bool,

    /// Print the final report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Program and arguments to run.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse arguments, run, and return the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        Cli::parse().run().await
    }

    pub fn settings(&self) -> RetrySettings {
        RetrySettings {
            interval_ms: duration_ms(self.every),
            within_ms: self.within.map(duration_ms),
            max_attempts: self.max_attempts,
            backoff: self.backoff.into(),
            factor: self.factor,
            dispatch: if self.serial {
                Dispatch::Serial
            } else {
                Dispatch::Concurrent
            },
        }
    }

    pub async fn run(self) -> Result<i32> {
        let settings = self.settings();
        settings.validate()?;
        tracing::debug!(?settings, command = ?self.command, "starting retry loop");

        let retry = settings
            .apply(Retry::with(program_action(self.command.clone())))
            .until_condition(condition::succeeded());
        let outcome = retry.go().await;

        let report = Report::new(&self.command, &settings, &outcome);
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report.summary());
        }
        tracing::info!(
            attempts = outcome.attempts,
            succeeded = outcome.satisfied,
            timed_out = outcome.timed_out,
            "retry finished"
        );

        Ok(if outcome.satisfied { 0 } else { 1 })
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
