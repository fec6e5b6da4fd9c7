//! Top-level callback dispatcher.
//!
//! Decodes the component identifier, wraps the callback in an
//! `InteractionRequest`, and routes to the handler registered for the action
//! name. All errors stop here: the requester gets a short message, the log
//! gets the context, the process keeps running.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use coursebell_core::error::Result;
use coursebell_core::types::{ChannelId, UserId};

use crate::actions::{ActionRegistry, CallbackClass};
use crate::codec::decode;
use crate::request::{InteractionRequest, ReplyMode, ReplyRenderer, ResponsePayload};

/// A domain handler for one or more named actions.
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn handle(&self, request: &mut InteractionRequest) -> Result<()>;
}

/// Context of one inbound component callback, as delivered by the gateway.
pub struct CallbackContext {
    pub class: CallbackClass,
    /// Raw component identifier, untrusted.
    pub identifier: String,
    pub requester: UserId,
    pub origin_server: Option<i64>,
    /// Channel for REDIRECT_CHANNEL responses, when the gateway provides one.
    pub redirect_channel: Option<ChannelId>,
}

/// Routes decoded callbacks to named handlers.
pub struct Dispatcher {
    registry: ActionRegistry,
    handlers: HashMap<&'static str, Arc<dyn InteractionHandler>>,
}

impl Dispatcher {
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            registry,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an action name. Last registration wins.
    pub fn register(&mut self, action_name: &'static str, handler: Arc<dyn InteractionHandler>) {
        self.handlers.insert(action_name, handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch one callback. Never returns an error — every failure is
    /// already converted into a user-visible reply and a log line.
    pub async fn dispatch(&self, ctx: CallbackContext, renderer: Arc<dyn ReplyRenderer>) {
        let decoded = match decode(&self.registry, ctx.class, &ctx.identifier) {
            Ok(decoded) => decoded,
            Err(err) => {
                // Malformed or stale identifier: recoverable, answer short.
                tracing::warn!(
                    class = ctx.class.label(),
                    identifier = %ctx.identifier,
                    %err,
                    "rejected component callback"
                );
                if let Err(send_err) = renderer
                    .reply(&ResponsePayload::Text(err.user_message()), true)
                    .await
                {
                    tracing::warn!(%send_err, "failed to deliver protocol error reply");
                }
                return;
            }
        };

        let mut request = InteractionRequest::new(
            decoded.spec,
            decoded.args,
            ctx.requester,
            ctx.origin_server,
            renderer,
        );
        if let Some(channel) = ctx.redirect_channel {
            request = request.with_redirect_channel(channel);
        }

        let Some(handler) = self.handlers.get(decoded.spec.name) else {
            tracing::error!(
                action = decoded.spec.name,
                "action is registered but has no handler"
            );
            self.send_fallback(&mut request).await;
            return;
        };

        if let Err(err) = handler.handle(&mut request).await {
            let raw_args: Vec<i64> = request.args.values();
            tracing::error!(
                action = request.action.name,
                requester = request.requester,
                args = ?raw_args,
                %err,
                "interaction handler failed"
            );
            self.send_fallback(&mut request).await;
        }
    }

    /// Generic failure message via the user path, which is valid both before
    /// and after an acknowledgment.
    async fn send_fallback(&self, request: &mut InteractionRequest) {
        let payload =
            ResponsePayload::Text("⚠️ Something went wrong while handling your request.".into());
        if let Err(err) = request.send_response(payload, ReplyMode::User).await {
            tracing::warn!(%err, "failed to deliver fallback reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{FormRequest, ReplyState};
    use coursebell_core::error::CourseBellError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingRenderer {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ReplyRenderer for RecordingRenderer {
        async fn defer(&self, _ephemeral: bool) -> Result<()> {
            self.push("defer".into());
            Ok(())
        }
        async fn reply(&self, payload: &ResponsePayload, _ephemeral: bool) -> Result<()> {
            match payload {
                ResponsePayload::Text(text) => self.push(format!("reply:{text}")),
                other => self.push(format!("reply:{}", other.kind())),
            }
            Ok(())
        }
        async fn follow_up(&self, payload: &ResponsePayload) -> Result<()> {
            self.push(format!("follow_up:{}", payload.kind()));
            Ok(())
        }
        async fn show_form(&self, _form: &FormRequest) -> Result<()> {
            self.push("show_form".into());
            Ok(())
        }
        async fn post_to_channel(&self, _c: ChannelId, payload: &ResponsePayload) -> Result<()> {
            self.push(format!("post:{}", payload.kind()));
            Ok(())
        }
    }

    struct OkHandler;

    #[async_trait]
    impl InteractionHandler for OkHandler {
        async fn handle(&self, request: &mut InteractionRequest) -> Result<()> {
            let event_id = request.args.require("event_id")?;
            request
                .send_response(ResponsePayload::Text(format!("event {event_id}")), ReplyMode::User)
                .await
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl InteractionHandler for FailingHandler {
        async fn handle(&self, request: &mut InteractionRequest) -> Result<()> {
            request.defer_reply(true).await?;
            Err(CourseBellError::NotFound("event 7".into()))
        }
    }

    fn ctx(identifier: &str) -> CallbackContext {
        CallbackContext {
            class: CallbackClass::Button,
            identifier: identifier.into(),
            requester: 1001,
            origin_server: Some(42),
            redirect_channel: None,
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_handler() {
        let mut dispatcher = Dispatcher::new(ActionRegistry::default());
        dispatcher.register("event_edit", Arc::new(OkHandler));
        let renderer = Arc::new(RecordingRenderer::default());

        dispatcher.dispatch(ctx("event_edit-7"), renderer.clone()).await;
        assert_eq!(renderer.calls(), vec!["reply:event 7"]);
    }

    #[tokio::test]
    async fn test_protocol_error_gets_short_reply() {
        let dispatcher = Dispatcher::new(ActionRegistry::default());
        let renderer = Arc::new(RecordingRenderer::default());

        dispatcher.dispatch(ctx("bogus_action-1"), renderer.clone()).await;

        let calls = renderer.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("reply:"));
        // Non-sensitive message, no internal details
        assert!(!calls[0].contains("bogus_action"));
    }

    #[tokio::test]
    async fn test_handler_error_sends_fallback_after_ack() {
        let mut dispatcher = Dispatcher::new(ActionRegistry::default());
        dispatcher.register("event_delete", Arc::new(FailingHandler));
        let renderer = Arc::new(RecordingRenderer::default());

        dispatcher.dispatch(ctx("event_delete-9"), renderer.clone()).await;

        // Handler deferred, so the fallback arrives as a follow-up.
        assert_eq!(renderer.calls(), vec!["defer", "follow_up:text"]);
    }

    #[tokio::test]
    async fn test_missing_handler_sends_fallback() {
        let dispatcher = Dispatcher::new(ActionRegistry::default());
        let renderer = Arc::new(RecordingRenderer::default());

        dispatcher.dispatch(ctx("event_complete-3"), renderer.clone()).await;
        assert_eq!(renderer.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_request_state_visible_to_handler() {
        struct StateProbe;

        #[async_trait]
        impl InteractionHandler for StateProbe {
            async fn handle(&self, request: &mut InteractionRequest) -> Result<()> {
                assert_eq!(request.state(), ReplyState::Unacknowledged);
                request.defer_reply(true).await?;
                assert_eq!(request.state(), ReplyState::Deferred);
                Ok(())
            }
        }

        let mut dispatcher = Dispatcher::new(ActionRegistry::default());
        dispatcher.register("course_join", Arc::new(StateProbe));
        let renderer = Arc::new(RecordingRenderer::default());
        dispatcher.dispatch(ctx("course_join-5"), renderer.clone()).await;
        assert_eq!(renderer.calls(), vec!["defer"]);
    }
}
