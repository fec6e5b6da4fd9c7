//! Console channel — logs deliveries instead of sending them.
//! Used in development and when no chat credentials are configured.

use async_trait::async_trait;
use coursebell_core::error::Result;
use coursebell_core::traits::Notifier;
use coursebell_core::types::UserId;

/// Notifier that writes to the log.
#[derive(Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn notify(&self, user_id: UserId, message: &str) -> Result<()> {
        tracing::info!("📢 [user {user_id}] {message}");
        Ok(())
    }
}
