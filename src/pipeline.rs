use crate::config::*;
use crate::connect::*;
use crate::datasets;
use crate::error::*;
use crate::job::*;
use crate::notify::*;
use crate::observe::*;
use crate::prune::*;
use crate::schema::*;
use std::time::Instant;

/// Ordered set of jobs for one run.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    jobs: Vec<ReplicationJob>,
}

impl Plan {
    /// Builds jobs from the settings, falling back to the standard plan.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        match &settings.jobs {
            Some(entries) => Self::from_entries(entries),
            None => Self::from_entries(&datasets::standard()),
        }
    }

    pub fn from_entries(entries: &[JobEntry]) -> Result<Self> {
        let jobs = entries
            .iter()
            .map(job)
            .collect::<Result<Vec<_>>>()?;
        if let Some(dup) = jobs
            .iter()
            .enumerate()
            .find(|(i, j)| jobs[..*i].iter().any(|k| k.name == j.name))
            .map(|(_, j)| &j.name)
        {
            return Err(ReplicationError::configuration(format!(
                "job {} defined twice",
                dup
            )));
        }
        Ok(Self { jobs })
    }

    /// Keeps only the named jobs, in plan order. An empty filter keeps all.
    pub fn only(self, names: &[String]) -> Result<Self> {
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.jobs.iter().any(|j| &j.name == *n))
        {
            return Err(ReplicationError::configuration(format!(
                "no job named {}",
                unknown
            )));
        }
        if names.is_empty() {
            return Ok(self);
        }
        Ok(Self {
            jobs: self
                .jobs
                .into_iter()
                .filter(|j| names.contains(&j.name))
                .collect(),
        })
    }

    pub fn jobs(&self) -> &[ReplicationJob] {
        &self.jobs
    }

    /// Runs every job in order. A failed job never stops its siblings.
    /// Ends with one summary message on `summary`.
    pub async fn run<C, O, N>(
        &self,
        cx: &Context<'_, C, O>,
        notifier: &N,
        summary: usize,
    ) -> Vec<Report>
    where
        C: Connector,
        O: Observer,
        N: Notify + ?Sized,
    {
        let start = Instant::now();
        let mut reports = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            reports.push(job.run(cx).await);
        }
        let text = self::summary(&reports);
        log::info!("{} (took {:.1?})", text, start.elapsed());
        notifier.notify(summary, &text).await;
        reports
    }
}

/// End-of-run message.
pub fn summary(reports: &[Report]) -> String {
    let ok = reports.iter().filter(|r| r.succeeded()).count();
    let failed = reports
        .iter()
        .filter(|r| !r.succeeded())
        .map(|r| r.dataset.as_str())
        .collect::<Vec<_>>();
    match failed.is_empty() {
        true => format!(
            "{}: replication finished, {}/{} jobs succeeded.",
            ORIGIN,
            ok,
            reports.len()
        ),
        false => format!(
            "{}: replication finished, {}/{} jobs succeeded; failed: {}.",
            ORIGIN,
            ok,
            reports.len(),
            failed.join(", ")
        ),
    }
}

fn job(entry: &JobEntry) -> Result<ReplicationJob> {
    let columns = match (&entry.dataset, &entry.columns) {
        (Some(dataset), None) => datasets::columns(dataset)?
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>(),
        (None, Some(columns)) => columns.clone(),
        _ => {
            return Err(ReplicationError::configuration(format!(
                "job {} needs exactly one of `dataset` and `columns`",
                entry.name
            )));
        }
    };
    let schema = TableSchema::new(&entry.table, columns, &entry.window_column)?;
    let target = entry.target.clone().unwrap_or_else(|| entry.table.clone());
    let retention = entry.retention.as_ref().map(|r| {
        Retention::new(
            r.table.clone().unwrap_or_else(|| target.clone()),
            &r.column,
            r.days,
        )
    });
    Ok(ReplicationJob {
        name: entry.name.clone(),
        schema,
        target,
        source: entry.source,
        destination: entry.destination,
        retention,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::BATCH_SIZE;
    use crate::memory::Memory;
    use crate::observe::tests::Outbox;
    use crate::window::TimeWindow;
    use chrono::NaiveDate;

    const JOBS: &str = r#"
jobs:
  - name: weather
    table: forecast
    columns: [gtp, loadtime]
    window_column: loadtime
    source: 0
    destination: 1
  - name: plans
    table: pbr_br
    columns: [GTP_ID, dt]
    window_column: dt
    source: 0
    destination: 1
    retention: { column: dt, days: 7 }
"#;

    fn profiles() -> Vec<ProfileEntry> {
        Settings::parse(
            "sql_db:\n  - {host: a, user: u, password: p, port: 1, database: d}\n  - {host: b, user: u, password: p, port: 2, database: d}\n",
        )
        .unwrap()
        .sql_db
    }

    #[test]
    fn standard_plan_has_five_jobs() {
        let plan = Plan::from_settings(&Settings::default()).unwrap();
        let names = plan.jobs().iter().map(|j| j.name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["forecast", "openmeteo", "tomorrow_io", "pbr_br", "pbr_br_grafana"]
        );
        let grafana = &plan.jobs()[4];
        assert_eq!(grafana.retention, Some(Retention::new("pbr_br", "dt", 7)));
        assert_eq!((grafana.source, grafana.destination), (4, 5));
    }

    #[test]
    fn jobs_need_exactly_one_projection() {
        let mut entry = datasets::standard().remove(0);
        entry.columns = Some(vec!["gtp".into()]);
        assert!(Plan::from_entries(&[entry.clone()]).is_err());
        entry.dataset = None;
        entry.columns = None;
        assert!(Plan::from_entries(&[entry]).is_err());
    }

    #[test]
    fn filter_rejects_unknown_names() {
        let plan = Plan::from_settings(&Settings::default()).unwrap();
        assert!(plan.clone().only(&["nope".into()]).is_err());
        let only = plan.only(&["pbr_br".into()]).unwrap();
        assert_eq!(only.jobs().len(), 1);
    }

    #[tokio::test]
    async fn failed_job_does_not_block_siblings() {
        let settings = Settings::parse(JOBS).unwrap();
        let plan = Plan::from_settings(&settings).unwrap();
        let memory = Memory::default();
        // `forecast` is missing on the source, so the first job fails.
        memory.create("pbr_br", &["GTP_ID", "dt"]);
        memory.insert("pbr_br", &[&["a", "2024-03-09 08:00:00"]]);
        let profiles = profiles();
        let resolver = Resolver::new(&profiles, memory.clone());
        let outbox = Outbox::default();
        let herald = Herald::new(Outbox::default(), 1);
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let cx = Context {
            resolver: &resolver,
            observer: &herald,
            window: TimeWindow::yesterday(today).unwrap(),
            today,
            batch: BATCH_SIZE,
        };
        let reports = plan.run(&cx, &outbox, 0).await;
        assert_eq!(reports[0].phase, Phase::Errored);
        assert_eq!(reports[1].phase, Phase::Done);
        assert_eq!(reports[1].loaded.rows, 1);
        assert_eq!(
            outbox.sent(),
            vec![(
                0,
                "database_replication: replication finished, 1/2 jobs succeeded; failed: weather."
                    .to_string()
            )]
        );
        assert_eq!(memory.opened(), memory.closed());
    }
}
