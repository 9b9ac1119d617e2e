use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        info!(to = %message.to, subject = %message.subject, body = %message.body, "email queued");
        Ok(())
    }
}

pub fn verification_email(to: &str, name: &str, verification_url: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Verify Your Account".to_string(),
        body: format!(
            "Hello {name},\n\n\
             Please confirm your email address by opening the link below:\n\n\
             {verification_url}\n\n\
             If you did not create an account you can ignore this message.\n"
        ),
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every message so tests can assert on it.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }
}
