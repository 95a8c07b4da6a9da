use crate::domain::model::{LineKey, Money, NoticeState, PriceConfirmation, QuantityUpdate};
use crate::domain::page::CartPage;
use crate::domain::ports::{Notifier, Transport};
use crate::utils::error::{CartError, Result};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// What to do with a failed quantity update or price confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    Notify,
    Silent,
}

impl FromStr for FailureAction {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "notify" => Ok(FailureAction::Notify),
            "silent" => Ok(FailureAction::Silent),
            other => Err(CartError::InvalidConfigValueError {
                field: "error_handling".to_string(),
                value: other.to_string(),
                reason: "Expected one of: notify, silent".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub on_quantity_failure: FailureAction,
    pub on_confirm_failure: FailureAction,
    pub line_hide: Duration,
    pub notice_close: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            on_quantity_failure: FailureAction::Notify,
            on_confirm_failure: FailureAction::Notify,
            line_hide: Duration::from_millis(600),
            notice_close: Duration::from_millis(200),
        }
    }
}

/// Keeps the cart page and the server's cart in step.
///
/// Every operation takes `&self`. The page lock is never held across a request,
/// so operations on different lines may overlap; a second request for a line
/// (or for the notice) while one is outstanding is rejected with
/// [`CartError::RequestInFlight`] before anything is sent.
pub struct CartSynchronizer<T: Transport, N: Notifier> {
    page: Arc<Mutex<CartPage>>,
    transport: T,
    notifier: N,
    settings: SyncSettings,
}

impl<T: Transport, N: Notifier> CartSynchronizer<T, N> {
    pub fn new(page: CartPage, transport: T, notifier: N, settings: SyncSettings) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
            transport,
            notifier,
            settings,
        }
    }

    pub fn page(&self) -> Arc<Mutex<CartPage>> {
        Arc::clone(&self.page)
    }

    pub async fn total_text(&self) -> String {
        self.page.lock().await.total_text().to_string()
    }

    pub async fn recompute_totals(&self) -> Vec<Money> {
        self.page.lock().await.recompute_totals()
    }

    /// Sends the edited quantity of `key` to the update endpoint and, once the
    /// server accepts it, refreshes every line total and the grand total.
    pub async fn on_quantity_change(&self, key: &LineKey, raw_value: &str) -> Result<Money> {
        let quantity = parse_quantity(raw_value)?;
        let body = serde_json::to_value(QuantityUpdate { key, quantity })?;

        let (endpoint, previous) = {
            let mut page = self.page.lock().await;
            let endpoint = page.endpoints().update.clone();
            let line = page.attached_line_mut(key)?;
            if line.in_flight {
                return Err(CartError::RequestInFlight {
                    target: format!("line {}", key),
                });
            }
            line.in_flight = true;
            (endpoint, line.quantity)
        };

        tracing::debug!("🛒 Updating {} quantity {} -> {}", key, previous, quantity);
        let outcome = self.transport.post(&endpoint, body).await;

        let mut page = self.page.lock().await;
        if let Some(line) = page.line_mut(key) {
            line.in_flight = false;
            // 伺服器接受後才寫入新數量
            if outcome.is_ok() {
                line.quantity = quantity;
            }
        }

        match outcome {
            Ok(_) => {
                let totals = page.recompute_totals();
                let grand: Money = totals.iter().sum();
                page.write_grand_total(grand);
                tracing::info!("✅ {} quantity set to {}, cart total {}", key, quantity, grand);
                Ok(grand)
            }
            Err(e) => {
                drop(page);
                self.report_failure(self.settings.on_quantity_failure, "quantity update", &e);
                Err(e)
            }
        }
    }

    /// Asks the server to drop `key` from the cart. The line is hidden and
    /// detached only after the server confirms; on failure it stays as it was.
    pub async fn on_remove_click(&self, key: &LineKey) -> Result<Money> {
        let body = serde_json::to_value(key)?;

        let endpoint = {
            let mut page = self.page.lock().await;
            let endpoint = page.endpoints().remove.clone();
            let line = page.attached_line_mut(key)?;
            if line.in_flight {
                return Err(CartError::RequestInFlight {
                    target: format!("line {}", key),
                });
            }
            line.in_flight = true;
            endpoint
        };

        tracing::debug!("🗑️ Removing {}", key);
        match self.transport.post(&endpoint, body).await {
            Ok(_) => {
                self.page.lock().await.hide(key);
                if !self.settings.line_hide.is_zero() {
                    tokio::time::sleep(self.settings.line_hide).await;
                }

                let mut page = self.page.lock().await;
                page.detach(key);
                let totals = page.recompute_totals();
                let grand: Money = totals.iter().sum();
                page.write_grand_total(grand);
                tracing::info!("✅ Removed {}, cart total {}", key, grand);
                Ok(grand)
            }
            Err(e) => {
                if let Some(line) = self.page.lock().await.line_mut(key) {
                    line.in_flight = false;
                }
                tracing::warn!("❌ Removal of {} failed: {}", key, e);
                self.notifier.alert(&e.user_friendly_message());
                Err(e)
            }
        }
    }

    /// Acknowledges the price change notice and closes it once the server agrees.
    pub async fn on_confirm_click(&self) -> Result<()> {
        let body = serde_json::to_value(PriceConfirmation { confirm: true })?;

        let endpoint = {
            let mut page = self.page.lock().await;
            let notice = page
                .notice_mut()
                .filter(|n| n.state == NoticeState::Shown)
                .ok_or(CartError::NoticeMissing)?;
            if notice.in_flight {
                return Err(CartError::RequestInFlight {
                    target: "price change notice".to_string(),
                });
            }
            notice.in_flight = true;
            notice.url.clone()
        };

        match self.transport.post(&endpoint, body).await {
            Ok(_) => {
                if let Some(notice) = self.page.lock().await.notice_mut() {
                    notice.state = NoticeState::Closing;
                }
                if !self.settings.notice_close.is_zero() {
                    tokio::time::sleep(self.settings.notice_close).await;
                }
                self.page.lock().await.remove_notice();
                tracing::info!("✅ Price change acknowledged");
                Ok(())
            }
            Err(e) => {
                if let Some(notice) = self.page.lock().await.notice_mut() {
                    notice.in_flight = false;
                }
                self.report_failure(self.settings.on_confirm_failure, "price confirmation", &e);
                Err(e)
            }
        }
    }

    fn report_failure(&self, action: FailureAction, what: &str, error: &CartError) {
        tracing::warn!("❌ {} failed: {}", what, error);
        if action == FailureAction::Notify {
            self.notifier.alert(&error.user_friendly_message());
        }
    }
}

/// Quantities come straight from a text field.
pub fn parse_quantity(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CartError::InvalidQuantity {
            value: raw.to_string(),
            reason: "quantity is empty".to_string(),
        });
    }
    trimmed.parse::<u32>().map_err(|_| CartError::InvalidQuantity {
        value: raw.to_string(),
        reason: "expected a whole non-negative number".to_string(),
    })
}
