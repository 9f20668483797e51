use crate::connect::*;
use crate::error::*;
use crate::extract::*;
use crate::load::*;
use crate::observe::*;
use crate::prune::*;
use crate::schema::*;
use crate::window::*;
use chrono::NaiveDate;
use std::fmt::Display;
use std::fmt::Formatter;

/// Where a job run currently stands.
///
/// `Idle → Extracting → Loading → [Pruning] → Done`, with `Errored`
/// reachable from every non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Extracting,
    Loading,
    Pruning,
    Done,
    Errored,
}

impl Phase {
    pub fn permits(&self, next: Phase) -> bool {
        match (self, next) {
            (Self::Done | Self::Errored, _) => false,
            (_, Self::Errored) => true,
            (Self::Idle, Self::Extracting) => true,
            (Self::Extracting, Self::Loading) => true,
            (Self::Loading, Self::Pruning | Self::Done) => true,
            (Self::Pruning, Self::Done) => true,
            _ => false,
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

/// Inputs shared by every job of one run.
pub struct Context<'a, C, O> {
    pub resolver: &'a Resolver<'a, C>,
    pub observer: &'a O,
    pub window: TimeWindow,
    pub today: NaiveDate,
    pub batch: usize,
}

/// One dataset's pipeline: extract from `source`, append to `destination`,
/// then optionally prune the destination.
#[derive(Debug, Clone)]
pub struct ReplicationJob {
    pub name: String,
    pub schema: TableSchema,
    pub target: String,
    pub source: usize,
    pub destination: usize,
    pub retention: Option<Retention>,
}

/// What one run of a job did.
#[derive(Debug)]
pub struct Report {
    pub dataset: String,
    pub phase: Phase,
    pub extracted: usize,
    pub loaded: Loaded,
    pub pruned: Option<u64>,
    pub error: Option<ReplicationError>,
}

impl Report {
    fn new(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            phase: Phase::Idle,
            extracted: 0,
            loaded: Loaded::default(),
            pruned: None,
            error: None,
        }
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.permits(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        self.phase = next;
    }

    pub fn succeeded(&self) -> bool {
        self.phase == Phase::Done
    }
}

impl ReplicationJob {
    /// Runs the job to a terminal phase. Never retries a stage; a failed
    /// extract or load halts the job with the error recorded in the report.
    /// Whatever earlier stages wrote stays written.
    pub async fn run<C, O>(&self, cx: &Context<'_, C, O>) -> Report
    where
        C: Connector,
        O: Observer,
    {
        let mut report = Report::new(&self.name);
        log::info!("{}: replicating {} over {}", self.name, self.schema.table(), cx.window);

        report.advance(Phase::Extracting);
        let rows = match self.extract(cx).await {
            Ok(rows) => rows,
            Err(e) => return self.fail(cx, report, Stage::Extract, e).await,
        };
        report.extracted = rows.len();

        report.advance(Phase::Loading);
        let loaded = match self.load(cx, rows).await {
            Ok(loaded) => loaded,
            Err(e) => return self.fail(cx, report, Stage::Load, e).await,
        };
        report.loaded = loaded;

        if let Some(retention) = &self.retention {
            report.advance(Phase::Pruning);
            report.pruned = self.prune(cx, retention).await;
        }

        report.advance(Phase::Done);
        log::info!(
            "{}: done ({} extracted, {} written in {} batches)",
            self.name,
            report.extracted,
            report.loaded.rows,
            report.loaded.batches
        );
        cx.observer
            .observe(Event::Done {
                dataset: &self.name,
                rows: report.loaded.rows,
            })
            .await;
        report
    }

    async fn extract<C, O>(&self, cx: &Context<'_, C, O>) -> Result<ResultSet>
    where
        C: Connector,
        O: Observer,
    {
        self.started(cx, Stage::Extract).await;
        let conn = cx.resolver.resolve(self.source).await?;
        let result = extract(&conn, &self.schema, &cx.window).await;
        conn.close().await;
        let rows = result?;
        self.finished(cx, Stage::Extract, rows.len() as u64).await;
        Ok(rows)
    }

    /// Consumes the extracted rows; on failure they are dropped, not retried.
    async fn load<C, O>(&self, cx: &Context<'_, C, O>, rows: ResultSet) -> Result<Loaded>
    where
        C: Connector,
        O: Observer,
    {
        self.started(cx, Stage::Load).await;
        let conn = cx.resolver.resolve(self.destination).await?;
        let result = load(&conn, &self.target, &rows, cx.batch).await;
        conn.close().await;
        let loaded = result?;
        self.finished(cx, Stage::Load, loaded.rows).await;
        Ok(loaded)
    }

    /// Cleanup is fire-and-forget: failures are reported but do not fail
    /// the job.
    async fn prune<C, O>(&self, cx: &Context<'_, C, O>, retention: &Retention) -> Option<u64>
    where
        C: Connector,
        O: Observer,
    {
        self.started(cx, Stage::Prune).await;
        let result = match cx.resolver.resolve(self.destination).await {
            Ok(conn) => {
                let result = prune(&conn, retention, cx.today).await;
                conn.close().await;
                result
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(deleted) => {
                self.finished(cx, Stage::Prune, deleted).await;
                Some(deleted)
            }
            Err(e) => {
                log::error!("{}: prune of {} failed: {}", self.name, retention.table, e);
                cx.observer
                    .observe(Event::Failed {
                        dataset: &self.name,
                        stage: Stage::Prune,
                        error: &e,
                    })
                    .await;
                None
            }
        }
    }

    async fn fail<C, O>(
        &self,
        cx: &Context<'_, C, O>,
        mut report: Report,
        stage: Stage,
        error: ReplicationError,
    ) -> Report
    where
        O: Observer,
    {
        log::error!("{}: {} failed: {}", self.name, stage, error);
        cx.observer
            .observe(Event::Failed {
                dataset: &self.name,
                stage,
                error: &error,
            })
            .await;
        report.advance(Phase::Errored);
        report.error = Some(error);
        report
    }

    async fn started<C, O>(&self, cx: &Context<'_, C, O>, stage: Stage)
    where
        O: Observer,
    {
        log::info!("{}: {} started", self.name, stage);
        cx.observer
            .observe(Event::Started {
                dataset: &self.name,
                stage,
            })
            .await;
    }

    async fn finished<C, O>(&self, cx: &Context<'_, C, O>, stage: Stage, rows: u64)
    where
        O: Observer,
    {
        log::info!("{}: {} finished ({} rows)", self.name, stage, rows);
        cx.observer
            .observe(Event::Finished {
                dataset: &self.name,
                stage,
                rows,
            })
            .await;
    }
}
