//! Lifecycle events emitted by replication jobs.
//!
//! Jobs report progress to an injected [`Observer`] instead of calling the
//! notifier directly. [`Herald`] turns events into notifications.
use crate::error::*;
use crate::notify::*;
use std::fmt::Display;
use std::fmt::Formatter;

/// Prefix on every message, so mixed channels stay readable.
pub const ORIGIN: &str = "database_replication";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Load,
    Prune,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extract => write!(f, "extract"),
            Self::Load => write!(f, "load"),
            Self::Prune => write!(f, "prune"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    Started {
        dataset: &'a str,
        stage: Stage,
    },
    Finished {
        dataset: &'a str,
        stage: Stage,
        rows: u64,
    },
    Failed {
        dataset: &'a str,
        stage: Stage,
        error: &'a ReplicationError,
    },
    /// The whole job reached `Done`, whatever happened to cleanup.
    Done {
        dataset: &'a str,
        rows: u64,
    },
}

impl Display for Event<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started { dataset, stage } => {
                write!(f, "{}: {} {} started.", ORIGIN, dataset, stage)
            }
            Self::Finished {
                dataset,
                stage,
                rows,
            } => write!(
                f,
                "{}: {} {} finished ({} rows).",
                ORIGIN, dataset, stage, rows
            ),
            Self::Failed {
                dataset,
                stage,
                error,
            } => write!(f, "{}: {} {} failed: {}", ORIGIN, dataset, stage, error),
            Self::Done { dataset, rows } => {
                write!(f, "{}: {} replicated ({} rows).", ORIGIN, dataset, rows)
            }
        }
    }
}

#[async_trait::async_trait]
pub trait Observer: Send + Sync {
    async fn observe(&self, event: Event<'_>);
}

/// Forwards every event as text to one notification channel.
pub struct Herald<N> {
    notifier: N,
    channel: usize,
}

impl<N> Herald<N>
where
    N: Notify,
{
    pub fn new(notifier: N, channel: usize) -> Self {
        Self { notifier, channel }
    }
    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

#[async_trait::async_trait]
impl<N> Observer for Herald<N>
where
    N: Notify,
{
    async fn observe(&self, event: Event<'_>) {
        self.notifier
            .notify(self.channel, &event.to_string())
            .await
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every notification it is handed.
    #[derive(Default)]
    pub struct Outbox(pub Mutex<Vec<(usize, String)>>);

    impl Outbox {
        pub fn sent(&self) -> Vec<(usize, String)> {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Notify for Outbox {
        async fn notify(&self, channel: usize, text: &str) {
            self.0.lock().unwrap().push((channel, text.to_string()));
        }
    }

    #[tokio::test]
    async fn herald_routes_to_its_channel() {
        let herald = Herald::new(Outbox::default(), 1);
        herald
            .observe(Event::Started {
                dataset: "openmeteo",
                stage: Stage::Extract,
            })
            .await;
        let error = ReplicationError::query("timeout");
        herald
            .observe(Event::Failed {
                dataset: "openmeteo",
                stage: Stage::Load,
                error: &error,
            })
            .await;
        herald
            .observe(Event::Done {
                dataset: "pbr_br",
                rows: 12,
            })
            .await;
        let sent = herald.notifier().sent();
        assert_eq!(sent[0], (1, "database_replication: openmeteo extract started.".into()));
        assert_eq!(
            sent[1].1,
            "database_replication: openmeteo load failed: query error: timeout"
        );
        assert_eq!(sent[2], (1, "database_replication: pbr_br replicated (12 rows).".into()));
    }
}
