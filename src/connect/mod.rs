//! Connection resolution and scoped connection lifetime.
//!
//! A [`Resolver`] maps a logical index from the settings file to a
//! validated [`ConnectionProfile`] and asks its [`Connector`] for a live
//! [`Connection`]. Callers own the connection and must [`Connection::close`]
//! it on every exit path; nothing is pooled or shared between jobs.
#[cfg(feature = "postgres")]
mod postgres;
mod resolver;

#[cfg(feature = "postgres")]
pub use postgres::*;
pub use resolver::*;

use crate::config::*;
use crate::error::*;
use crate::extract::Source;
use crate::load::Sink;
use crate::prune::Prune;

/// Opens connections for validated profiles.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;
    async fn connect(&self, profile: &ConnectionProfile) -> Result<Self::Connection>;
}

/// A live database session able to read, append and prune.
#[async_trait::async_trait]
pub trait Connection: Source + Sink + Prune + Sized {
    /// Releases the session. Must be called once the stage is over,
    /// whether it succeeded or not.
    async fn close(self);
}
