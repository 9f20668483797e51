//! Windowed table replication between relational databases.
//!
//! Each [`ReplicationJob`] copies one dataset: it selects the rows of a
//! source table whose window column falls in a half-open [`TimeWindow`],
//! appends them to a destination table in bounded batches, and optionally
//! prunes destination rows past a retention horizon. Jobs report their
//! lifecycle to an [`Observer`]; the [`Herald`] observer relays it to a
//! best-effort [`Notify`] channel.
//!
//! ## Pipeline
//!
//! - [`Resolver`]: connection index → validated profile → live [`Connection`]
//! - [`extract()`]: column-projected, windowed read through a [`Source`]
//! - [`load()`]: append-only batched write through a [`Sink`]
//! - [`prune()`]: retention cleanup through [`Prune`]
//! - [`Plan`]: sequential multi-job run with an end-of-run summary
//!
//! ## Backends
//!
//! - `postgres` feature: [`Postgres`] connector over `tokio-postgres`
//! - `telegram` feature: [`Telegram`] notifier over `reqwest`
pub mod cli;
pub mod config;
pub mod connect;
pub mod datasets;
pub mod error;
pub mod extract;
pub mod job;
pub mod load;
pub mod logging;
pub mod notify;
pub mod observe;
pub mod pipeline;
pub mod prune;
pub mod schema;
pub mod window;

#[cfg(test)]
mod memory;

#[cfg(feature = "cli")]
pub use cli::Cli;
pub use config::*;
pub use connect::*;
pub use error::*;
pub use extract::*;
pub use job::*;
pub use load::*;
pub use notify::*;
pub use observe::*;
pub use pipeline::*;
pub use prune::*;
pub use schema::*;
pub use window::*;
