//! Discord channel — direct-message delivery via the Bot REST API.
//!
//! Reminders arrive as DMs: open (or reuse) the DM channel for the user,
//! then post the message into it. DM channel ids are cached per user to
//! spare one round trip on every reminder.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use coursebell_core::config::DiscordConfig;
use coursebell_core::error::{CourseBellError, Result};
use coursebell_core::traits::Notifier;
use coursebell_core::types::{ChannelId, UserId};
use serde::Deserialize;

const API_BASE: &str = "https://discord.com/api/v10";

/// Discord notifier with a cached DM-channel map.
pub struct DiscordNotifier {
    config: DiscordConfig,
    client: reqwest::Client,
    dm_channels: Mutex<HashMap<UserId, ChannelId>>,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            dm_channels: Mutex::new(HashMap::new()),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{API_BASE}/{path}")
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.config.bot_token)
    }

    /// Open (or reuse) the DM channel for a user.
    async fn dm_channel(&self, user_id: UserId) -> Result<ChannelId> {
        if let Some(channel) = self.dm_channels.lock().unwrap().get(&user_id) {
            return Ok(*channel);
        }

        let response = self
            .client
            .post(self.api_url("users/@me/channels"))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "recipient_id": user_id.to_string() }))
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| CourseBellError::Channel(format!("Discord create DM failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: DiscordApiError = response.json().await.unwrap_or_default();
            return Err(CourseBellError::Channel(format!(
                "Discord create DM error {status}: {}",
                body.message
            )));
        }

        let channel: DiscordChannel = response
            .json()
            .await
            .map_err(|e| CourseBellError::Channel(format!("Invalid DM channel response: {e}")))?;
        let channel_id: ChannelId = channel
            .id
            .parse()
            .map_err(|_| CourseBellError::Channel(format!("Bad channel id '{}'", channel.id)))?;

        self.dm_channels.lock().unwrap().insert(user_id, channel_id);
        Ok(channel_id)
    }

    /// Post a plain message into a channel.
    pub async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<()> {
        let response = self
            .client
            .post(self.api_url(&format!("channels/{channel_id}/messages")))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "content": content }))
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| CourseBellError::Channel(format!("Discord send failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: DiscordApiError = response.json().await.unwrap_or_default();
            return Err(CourseBellError::Channel(format!(
                "Discord send error {status}: {}",
                body.message
            )));
        }
        Ok(())
    }

    /// Verify credentials by fetching the bot's own user.
    pub async fn get_me(&self) -> Result<DiscordUser> {
        let response = self
            .client
            .get(self.api_url("users/@me"))
            .header("Authorization", self.auth_header())
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| CourseBellError::Channel(format!("Discord getMe failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CourseBellError::Channel(format!(
                "Discord getMe error {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| CourseBellError::Channel(format!("Invalid getMe response: {e}")))
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn notify(&self, user_id: UserId, message: &str) -> Result<()> {
        let channel = self.dm_channel(user_id).await?;
        self.send_message(channel, message).await?;
        tracing::info!(user = user_id, "✅ Discord DM sent");
        Ok(())
    }
}

// --- Discord API Types ---

#[derive(Debug, Deserialize)]
pub struct DiscordChannel {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscordApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: i64,
}
