use crate::domain::model::ReminderRequest;
use crate::domain::ports::{Notifier, Transport};
use crate::utils::error::{CartError, Result};
use crate::utils::validation::validate_non_empty_string;
use serde_json::{Map, Value};

pub const DEFAULT_CONFIRMATION_LABEL: &str = "Мы отправим вам уведомление :)";

/// A product button: where it posts and the data attached to it.
#[derive(Debug, Clone)]
pub struct ActionButton {
    pub href: String,
    pub data: Map<String, Value>,
}

impl ActionButton {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            data: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// "Notify me" link shown for products that are out of stock.
#[derive(Debug, Clone)]
pub struct NotifyButton {
    pub product: u64,
    pub href: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Open,
    Hidden,
}

/// Email capture opened for a single notify-me interaction.
#[derive(Debug, Clone)]
pub struct NotifyForm {
    pub product: u64,
    pub email: String,
    pub state: FormState,
}

pub struct ProductActions<T: Transport, N: Notifier> {
    transport: T,
    notifier: N,
    confirmation_label: String,
}

impl<T: Transport, N: Notifier> ProductActions<T, N> {
    pub fn new(transport: T, notifier: N, confirmation_label: impl Into<String>) -> Self {
        Self {
            transport,
            notifier,
            confirmation_label: confirmation_label.into(),
        }
    }

    /// Posts the button's data to its `href` and shows whatever the server says.
    pub async fn perform(&self, button: &ActionButton) -> Result<String> {
        tracing::debug!("🛍️ POST {} with {:?}", button.href, button.data);

        match self.transport.post(&button.href, Value::Object(button.data.clone())).await {
            Ok(reply) => {
                let message = reply.message.unwrap_or_default();
                tracing::info!("✅ {}: {}", button.href, message);
                if !message.is_empty() {
                    self.notifier.alert(&message);
                }
                Ok(message)
            }
            Err(e) => {
                tracing::warn!("❌ {} failed: {}", button.href, e);
                self.notifier.alert(&e.user_friendly_message());
                Err(e)
            }
        }
    }

    pub fn open_notify_form(&self, button: &NotifyButton) -> NotifyForm {
        NotifyForm {
            product: button.product,
            email: String::new(),
            state: FormState::Open,
        }
    }

    /// Sends `{product, email}` for the form. On success the form hides and the
    /// button is relabelled; on failure the form stays open for another try.
    pub async fn submit_notify(&self, button: &mut NotifyButton, form: &mut NotifyForm) -> Result<String> {
        if form.state != FormState::Open {
            return Err(CartError::ValidationError {
                message: "Notification form is already closed".to_string(),
            });
        }
        let email = form.email.trim();
        validate_non_empty_string("email", email).map_err(|_| CartError::ValidationError {
            message: "Email is required".to_string(),
        })?;

        let body = serde_json::to_value(ReminderRequest {
            product: form.product,
            email,
        })?;

        match self.transport.post(&button.href, body).await {
            Ok(reply) => {
                let message = reply.message.unwrap_or_default();
                tracing::info!("✅ Reminder for product {} registered", form.product);
                if !message.is_empty() {
                    self.notifier.alert(&message);
                }
                form.state = FormState::Hidden;
                button.label = self.confirmation_label.clone();
                Ok(message)
            }
            Err(e) => {
                tracing::warn!("❌ Reminder for product {} failed: {}", form.product, e);
                self.notifier.alert(&e.user_friendly_message());
                Err(e)
            }
        }
    }
}
