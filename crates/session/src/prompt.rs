//! Asking the user for input without blocking the core.
//!
//! The core sends an [`InputRequest`] and awaits the reply; the UI answers through the
//! one-shot sender inside the request. A request dropped without an answer counts as
//! cancelled.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub key: String,
    pub label: String,
    /// Mask the value while typing (passwords).
    pub secret: bool,
}

impl InputField {
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            secret: false,
        }
    }

    pub fn secret(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            secret: true,
            ..Self::text(key, label)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResponse {
    Submitted(HashMap<String, String>),
    Cancelled,
}

impl InputResponse {
    /// Trimmed, non-empty value of `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        match self {
            InputResponse::Submitted(values) => values
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty()),
            InputResponse::Cancelled => None,
        }
    }

    /// Value of `key` exactly as entered, for secrets where surrounding spaces count.
    /// An empty entry is absent.
    pub fn raw(&self, key: &str) -> Option<&str> {
        match self {
            InputResponse::Submitted(values) => {
                values.get(key).map(String::as_str).filter(|v| !v.is_empty())
            }
            InputResponse::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, InputResponse::Cancelled)
    }
}

#[derive(Debug)]
pub struct InputRequest {
    pub title: String,
    pub fields: Vec<InputField>,
    reply: oneshot::Sender<InputResponse>,
}

impl InputRequest {
    pub fn respond(self, response: InputResponse) {
        // The asking flow may have been abandoned; nothing to do then.
        let _ = self.reply.send(response);
    }

    /// Answer with `(key, value)` pairs.
    pub fn submit<'a>(self, values: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.respond(InputResponse::Submitted(values));
    }

    pub fn cancel(self) {
        self.respond(InputResponse::Cancelled);
    }
}

/// Sending half of the input-request channel.
#[derive(Debug, Clone)]
pub struct Prompter {
    tx: mpsc::UnboundedSender<InputRequest>,
}

impl Prompter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InputRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub async fn ask(&self, title: impl Into<String>, fields: Vec<InputField>) -> InputResponse {
        let (reply, answer) = oneshot::channel();
        let request = InputRequest {
            title: title.into(),
            fields,
            reply,
        };
        if self.tx.send(request).is_err() {
            tracing::debug!("input request dropped; no UI attached");
            return InputResponse::Cancelled;
        }
        answer.await.unwrap_or(InputResponse::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submitted_values_are_trimmed_and_blank_is_absent() {
        let (prompter, mut rx) = Prompter::channel();
        let ui = tokio::spawn(async move {
            let req = rx.recv().await.unwrap();
            assert_eq!(req.fields.len(), 2);
            assert!(req.fields[1].secret);
            req.submit([("email", " a@b.c "), ("password", "   ")]);
        });

        let answer = prompter
            .ask(
                "Login",
                vec![
                    InputField::text("email", "Email"),
                    InputField::secret("password", "Password"),
                ],
            )
            .await;
        ui.await.unwrap();

        assert_eq!(answer.value("email"), Some("a@b.c"));
        assert_eq!(answer.value("password"), None);
    }

    #[test]
    fn raw_keeps_surrounding_spaces() {
        let answer = InputResponse::Submitted(
            [("password".to_string(), " secret1 ".to_string()), ("empty".to_string(), String::new())]
                .into_iter()
                .collect(),
        );
        assert_eq!(answer.raw("password"), Some(" secret1 "));
        assert_eq!(answer.value("password"), Some("secret1"));
        assert_eq!(answer.raw("empty"), None);
        assert_eq!(InputResponse::Cancelled.raw("password"), None);
    }

    #[tokio::test]
    async fn dropped_request_counts_as_cancelled() {
        let (prompter, mut rx) = Prompter::channel();
        let ui = tokio::spawn(async move {
            drop(rx.recv().await);
        });
        let answer = prompter.ask("Login", vec![]).await;
        ui.await.unwrap();
        assert!(answer.is_cancelled());
    }

    #[tokio::test]
    async fn no_ui_attached_counts_as_cancelled() {
        let (prompter, rx) = Prompter::channel();
        drop(rx);
        assert!(prompter.ask("Login", vec![]).await.is_cancelled());
    }
}
