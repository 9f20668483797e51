#![cfg(feature = "cli")]

use crate::config::*;
use crate::connect::*;
use crate::job::*;
use crate::load::BATCH_SIZE;
use crate::notify::*;
use crate::observe::*;
use crate::pipeline::*;
use crate::window::*;
use anyhow::Context as _;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Copies yesterday's rows between databases, table by table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (default: settings.yaml next to the executable)
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Log file (default depends on the platform)
    #[arg(long)]
    pub log: Option<PathBuf>,
    /// First day of the window, inclusive (default: yesterday)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Day the window ends, exclusive (default: today)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Run only the named job; repeatable
    #[arg(long = "only", value_name = "JOB")]
    pub only: Vec<String>,
    /// Print the plan and exit without connecting anywhere
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    fn settings_path(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
                .unwrap_or_default()
                .join("settings.yaml")
        })
    }

    fn window(&self, today: NaiveDate) -> anyhow::Result<TimeWindow> {
        let default = TimeWindow::yesterday(today)?;
        let from = self.from.unwrap_or(default.from().date());
        let to = self.to.unwrap_or(default.to().date());
        Ok(TimeWindow::days(from, to)?)
    }

    /// Runs the plan and fails when any job failed.
    pub async fn run(self) -> anyhow::Result<()> {
        if !self.list {
            crate::logging::init(&self.log.clone().unwrap_or_else(crate::logging::default_path))?;
        }
        let path = self.settings_path();
        let settings = Settings::load(&path)
            .inspect_err(|e| log::error!("{}", e))
            .with_context(|| format!("loading settings from {}", path.display()))?;
        let plan = Plan::from_settings(&settings)
            .and_then(|plan| plan.only(&self.only))
            .context("building job plan")?;
        if self.list {
            for job in plan.jobs() {
                println!(
                    "{:<16} {:<14} {} -> {} ({}){}",
                    job.name,
                    job.schema.table(),
                    job.source,
                    job.destination,
                    job.schema.window(),
                    job.retention
                        .as_ref()
                        .map(|r| format!(", keep {} days of {}", r.days, r.table))
                        .unwrap_or_default()
                );
            }
            return Ok(());
        }
        let today = chrono::Local::now().date_naive();
        let window = self.window(today)?;
        log::info!(
            "replication started: {} jobs over {} using {}",
            plan.jobs().len(),
            window,
            path.display()
        );
        match settings.telegram.is_empty() {
            true => {
                log::warn!("no telegram channels configured, notifications disabled");
                execute(&settings, &plan, window, today, &Mute).await
            }
            false => {
                let telegram = Telegram::new(settings.telegram.clone(), &settings.notify)
                    .context("building telegram client")?;
                execute(&settings, &plan, window, today, &telegram).await
            }
        }
    }
}

async fn execute<N>(
    settings: &Settings,
    plan: &Plan,
    window: TimeWindow,
    today: NaiveDate,
    notifier: &N,
) -> anyhow::Result<()>
where
    N: Notify,
{
    let herald = Herald::new(notifier, settings.notify.progress);
    let resolver = Resolver::new(&settings.sql_db, Postgres);
    let cx = Context {
        resolver: &resolver,
        observer: &herald,
        window,
        today,
        batch: BATCH_SIZE,
    };
    let reports = plan.run(&cx, notifier, settings.notify.summary).await;
    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    anyhow::ensure!(failed == 0, "{} of {} jobs failed", failed, reports.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_to_yesterday() {
        let cli = Cli::parse_from(["replicate"]);
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let window = cli.window(today).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(window, TimeWindow::days(yesterday, today).unwrap());
    }

    #[test]
    fn explicit_bounds_and_filters_parse() {
        let cli = Cli::parse_from([
            "replicate",
            "--from",
            "2024-02-01",
            "--to",
            "2024-02-08",
            "--only",
            "pbr_br",
            "--only",
            "openmeteo",
        ]);
        assert_eq!(cli.only, vec!["pbr_br", "openmeteo"]);
        let window = cli.window(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).unwrap();
        assert_eq!(window.from().date(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(window.to().date(), NaiveDate::from_ymd_opt(2024, 2, 8).unwrap());
    }

    #[tokio::test]
    async fn missing_settings_name_the_file() {
        let cli = Cli::parse_from(["replicate", "--list", "--settings", "/nonexistent/settings.yaml"]);
        let err = cli.run().await.unwrap_err();
        let text = format!("{:#}", err);
        assert!(text.starts_with("loading settings from /nonexistent/settings.yaml: "), "{}", text);
    }

    #[tokio::test]
    async fn unknown_job_names_the_plan() {
        let path = std::env::temp_dir().join(format!("replicator-cli-{}.yaml", std::process::id()));
        std::fs::write(&path, "sql_db: []\n").unwrap();
        let cli = Cli::parse_from([
            "replicate",
            "--list",
            "--settings",
            path.to_str().unwrap(),
            "--only",
            "nope",
        ]);
        let err = cli.run().await.unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(format!("{:#}", err).starts_with("building job plan: "));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let cli = Cli::parse_from(["replicate", "--from", "2024-02-08", "--to", "2024-02-01"]);
        assert!(cli.window(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).is_err());
    }
}
