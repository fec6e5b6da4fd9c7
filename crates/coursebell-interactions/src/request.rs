//! Inbound interaction requests and the reply-dispatch contract.
//!
//! The chat platform demands exactly one initial acknowledgment per callback.
//! `InteractionRequest` enforces that with a small state machine:
//!
//! ```text
//! Unacknowledged ──defer_reply──▶ Deferred ──send_response──▶ follow-ups
//!        └────────send_response──▶ Replied ──send_response──▶ follow-ups
//! ```
//!
//! Network delivery is delegated to a `ReplyRenderer` supplied by the hosting
//! layer; this module only decides *which* renderer call is legal right now.

use std::sync::Arc;

use async_trait::async_trait;
use coursebell_core::error::{CourseBellError, Result};
use coursebell_core::types::{ChannelId, UserId};

use crate::actions::ActionSpec;
use crate::codec::ArgMap;

/// Closed set of reply payloads. Exhaustively matched in `send_response`;
/// renderers that cannot produce a given kind report
/// `UnsupportedResponseType` themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// Plain text message.
    Text(String),
    /// A single embed-style card.
    Rich(RichContent),
    /// A form to pop up. Only valid before any acknowledgment.
    Form(FormRequest),
    /// Text plus embeds in one message.
    Composite(CompositeMessage),
}

impl ResponsePayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Rich(_) => "rich",
            Self::Form(_) => "form",
            Self::Composite(_) => "composite",
        }
    }
}

/// Embed-style rich content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichContent {
    pub title: String,
    pub body: String,
    /// (name, value) pairs rendered as embed fields.
    pub fields: Vec<(String, String)>,
}

/// A modal form request. The `id` is an encoded component identifier so the
/// submission routes back through the same decode path.
#[derive(Debug, Clone, PartialEq)]
pub struct FormRequest {
    pub id: String,
    pub title: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub id: String,
    pub label: String,
    pub required: bool,
    pub prefill: Option<String>,
}

/// Text plus any number of rich cards, delivered as one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeMessage {
    pub text: Option<String>,
    pub embeds: Vec<RichContent>,
}

/// Where a response goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Ephemeral to the requester (initial reply or follow-up).
    User,
    /// Posted into the attached redirect channel as a regular message,
    /// with a short ephemeral note to the requester.
    RedirectChannel,
}

/// Acknowledgment state of one callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyState {
    Unacknowledged,
    Deferred,
    Replied,
}

/// Network seam for replies. Implemented by the hosting layer against the
/// real chat API; tests use a recording fake.
#[async_trait]
pub trait ReplyRenderer: Send + Sync {
    /// Acknowledge without content ("thinking...").
    async fn defer(&self, ephemeral: bool) -> Result<()>;
    /// Initial reply to the requester.
    async fn reply(&self, payload: &ResponsePayload, ephemeral: bool) -> Result<()>;
    /// Follow-up message after an acknowledgment.
    async fn follow_up(&self, payload: &ResponsePayload) -> Result<()>;
    /// Pop up a modal form. Only possible as the initial acknowledgment.
    async fn show_form(&self, form: &FormRequest) -> Result<()>;
    /// Post a regular message into a channel.
    async fn post_to_channel(&self, channel: ChannelId, payload: &ResponsePayload) -> Result<()>;
}

/// One inbound callback with its resolved action, parsed arguments,
/// requester identity, and reply state. Created per callback, discarded when
/// the callback completes.
pub struct InteractionRequest {
    pub action: &'static ActionSpec,
    pub args: ArgMap,
    /// Chat-platform user who triggered the callback.
    pub requester: UserId,
    /// Origin server (guild) id, if any.
    pub origin_server: Option<i64>,
    redirect_channel: Option<ChannelId>,
    state: ReplyState,
    renderer: Arc<dyn ReplyRenderer>,
}

impl InteractionRequest {
    pub fn new(
        action: &'static ActionSpec,
        args: ArgMap,
        requester: UserId,
        origin_server: Option<i64>,
        renderer: Arc<dyn ReplyRenderer>,
    ) -> Self {
        Self {
            action,
            args,
            requester,
            origin_server,
            redirect_channel: None,
            state: ReplyState::Unacknowledged,
            renderer,
        }
    }

    /// Attach the channel that REDIRECT_CHANNEL responses post into.
    pub fn with_redirect_channel(mut self, channel: ChannelId) -> Self {
        self.redirect_channel = Some(channel);
        self
    }

    pub fn state(&self) -> ReplyState {
        self.state
    }

    /// Acknowledge the callback without content. Duplicate calls are
    /// tolerated no-ops — the first one wins and nothing goes out twice.
    pub async fn defer_reply(&mut self, ephemeral: bool) -> Result<()> {
        if self.state != ReplyState::Unacknowledged {
            tracing::debug!(
                action = self.action.name,
                "defer_reply after acknowledgment, ignoring"
            );
            return Ok(());
        }
        self.renderer.defer(ephemeral).await?;
        self.state = ReplyState::Deferred;
        Ok(())
    }

    /// Send a response according to the current state and `mode`.
    pub async fn send_response(&mut self, payload: ResponsePayload, mode: ReplyMode) -> Result<()> {
        // Forms are the initial acknowledgment or nothing.
        if let ResponsePayload::Form(form) = &payload {
            if mode == ReplyMode::RedirectChannel {
                return Err(CourseBellError::IllegalReplyState(
                    "forms cannot be redirected into a channel".into(),
                ));
            }
            if self.state != ReplyState::Unacknowledged {
                return Err(CourseBellError::IllegalReplyState(format!(
                    "form '{}' requested after acknowledgment",
                    form.title
                )));
            }
            self.renderer.show_form(form).await?;
            self.state = ReplyState::Replied;
            return Ok(());
        }

        match mode {
            ReplyMode::User => self.send_to_user(&payload).await,
            ReplyMode::RedirectChannel => {
                let channel = self
                    .redirect_channel
                    .ok_or(CourseBellError::MissingRedirectTarget)?;
                self.renderer.post_to_channel(channel, &payload).await?;
                // Short note so the requester knows where the result went.
                self.send_to_user(&ResponsePayload::Text(
                    "📨 Result posted in the channel.".into(),
                ))
                .await
            }
        }
    }

    async fn send_to_user(&mut self, payload: &ResponsePayload) -> Result<()> {
        if self.state == ReplyState::Unacknowledged {
            self.renderer.reply(payload, true).await?;
            self.state = ReplyState::Replied;
        } else {
            self.renderer.follow_up(payload).await?;
        }
        Ok(())
    }
}
