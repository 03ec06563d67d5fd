//! Outgoing e-mail.

use async_trait::async_trait;
use entities::User;

use crate::error::ServerResult;

/// Sends account e-mails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends `reset_link` to `user`.
    async fn send_password_reset(&self, user: &User, reset_link: &str) -> ServerResult<()>;
}

/// Mailer that writes messages to the log instead of sending them.
///
/// Suitable for development; production deployments plug in a real provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, user: &User, reset_link: &str) -> ServerResult<()> {
        tracing::info!(
            user_id = %user.id,
            email = %user.email,
            name = user.display_name(),
            reset_link,
            "Password reset e-mail"
        );
        Ok(())
    }
}
