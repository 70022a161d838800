use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use storefront_core::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Message the UI shows to the user (toast, alert, status line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl From<&StoreError> for Notice {
    fn from(err: &StoreError) -> Self {
        let message = match err {
            StoreError::ProductNotFound(_) => "Product not found.".to_string(),
            StoreError::AccountDisabled => "Your account is disabled. Contact admin.".to_string(),
            StoreError::NotSignedIn => "Sign in or create an account first.".to_string(),
            other => other.to_string(),
        };
        Self::error(message)
    }
}

/// Sending half of the notice channel. Sends after the UI went away are dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            tracing::debug!("notice dropped; no receiver");
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(Notice::info(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Notice::error(message));
    }

    /// Surface `err` to the user. The error goes no further.
    pub fn report(&self, err: &StoreError) {
        tracing::warn!(error = %err, "reporting error to user");
        self.send(Notice::from(err));
    }
}
