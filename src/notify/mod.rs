//! Best-effort notification delivery.
//!
//! Notifications are advisory: [`Notify::notify`] never fails, it logs.
//! Pipeline correctness must not depend on any message arriving.
mod retry;
#[cfg(feature = "telegram")]
mod telegram;

pub use retry::*;
#[cfg(feature = "telegram")]
pub use telegram::*;

use std::sync::Arc;

#[async_trait::async_trait]
pub trait Notify: Send + Sync {
    /// Sends `text` to the channel at `channel`. Failures are absorbed.
    async fn notify(&self, channel: usize, text: &str);
}

/// Drops every message. Used when no channels are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mute;

#[async_trait::async_trait]
impl Notify for Mute {
    async fn notify(&self, _: usize, _: &str) {}
}

#[async_trait::async_trait]
impl<N> Notify for Arc<N>
where
    N: Notify + ?Sized,
{
    async fn notify(&self, channel: usize, text: &str) {
        self.as_ref().notify(channel, text).await
    }
}

#[async_trait::async_trait]
impl<N> Notify for &N
where
    N: Notify + ?Sized,
{
    async fn notify(&self, channel: usize, text: &str) {
        (**self).notify(channel, text).await
    }
}
