use super::*;
use crate::config::*;
use crate::error::*;
use std::time::Duration;

/// Telegram Bot API notifier.
///
/// Each message is one `POST {api}/bot{token}/sendMessage` with `chat_id`
/// and `text` as percent-encoded query parameters.
pub struct Telegram {
    client: reqwest::Client,
    channels: Vec<ChannelProfile>,
    api: String,
    retry: Retry,
}

impl Telegram {
    pub fn new(channels: Vec<ChannelProfile>, settings: &NotifySettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|e| ReplicationError::configuration(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            channels,
            api: settings.api.trim_end_matches('/').to_string(),
            retry: Retry::from(settings),
        })
    }

    /// One delivery with retries. Transient statuses and transport errors
    /// are retried with backoff; anything else fails immediately.
    pub async fn deliver(&self, channel: usize, text: &str) -> Result<(), DeliveryError> {
        let profile = self
            .channels
            .get(channel)
            .ok_or(DeliveryError::Channel(channel))?;
        let url = format!("{}/bot{}/sendMessage", self.api, profile.bot_token);
        let mut retry = 0;
        loop {
            let error = match self
                .client
                .post(&url)
                .query(&[("chat_id", profile.channel_id.as_str()), ("text", text)])
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => match response.status().as_u16() {
                    status if Retry::retryable(status) => DeliveryError::Status(status),
                    status => return Err(DeliveryError::Status(status)),
                },
                Err(e) => DeliveryError::Transport(e.without_url().to_string()),
            };
            if retry >= self.retry.retries {
                return Err(error);
            }
            tokio::time::sleep(self.retry.delay(retry)).await;
            retry += 1;
        }
    }
}

#[async_trait::async_trait]
impl Notify for Telegram {
    async fn notify(&self, channel: usize, text: &str) {
        if let Err(e) = self.deliver(channel, text).await {
            log::error!("notification to channel {} not delivered: {}", channel, e);
        }
    }
}
