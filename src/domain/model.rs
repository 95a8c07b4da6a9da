use crate::utils::error::{CartError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// Upper bound for a unit price, in minor units (100 000 000 000.00).
pub const MAX_PRICE_MINOR: i64 = 10_000_000_000_000;

/// Exact amount in minor currency units (kopecks).
///
/// Unit prices are bounded by [`MAX_PRICE_MINOR`] and quantities by `u32`, so
/// line totals and their sums always fit in the `i128` accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPrice", into = "String")]
pub struct Money(i128);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Money(i128::from(minor))
    }

    pub fn minor(self) -> i128 {
        self.0
    }

    /// Parses the `price-for-one` attribute text. Accepts `.` or `,` as the decimal
    /// separator and at most two fraction digits.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: &str| CartError::InvalidPrice {
            value: text.to_string(),
            reason: reason.to_string(),
        };

        let normalized: String = text
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (normalized.as_str(), ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("empty price"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a non-negative decimal number"));
        }
        if fraction.len() > 2 {
            return Err(invalid("more than two fraction digits"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("bad fraction"))?,
        };

        whole
            .checked_mul(100)
            .and_then(|minor| minor.checked_add(fraction))
            .filter(|&minor| minor <= MAX_PRICE_MINOR)
            .map(Money::from_minor)
            .ok_or_else(|| invalid("amount too large"))
    }

    pub fn times(self, quantity: u32) -> Money {
        Money(self.0 * i128::from(quantity))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.map(|m| m.0).sum())
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

/// Markup may carry the price as text or, after attribute coercion, as a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Text(String),
    Number(f64),
}

impl TryFrom<RawPrice> for Money {
    type Error = CartError;

    fn try_from(raw: RawPrice) -> Result<Self> {
        match raw {
            RawPrice::Text(text) => Money::parse(&text),
            RawPrice::Number(n) if !n.is_finite() || n < 0.0 => Err(CartError::InvalidPrice {
                value: n.to_string(),
                reason: "expected a non-negative finite number".to_string(),
            }),
            RawPrice::Number(n) => {
                let minor = (n * 100.0).round();
                if minor > MAX_PRICE_MINOR as f64 {
                    return Err(CartError::InvalidPrice {
                        value: n.to_string(),
                        reason: "amount too large".to_string(),
                    });
                }
                Ok(Money::from_minor(minor as i64))
            }
        }
    }
}

/// Product identity as the cart forms expect it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub id_: u64,
    pub slug: String,
}

impl LineKey {
    pub fn new(id_: u64, slug: impl Into<String>) -> Self {
        Self {
            id_,
            slug: slug.into(),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id_, self.slug)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    Visible,
    /// Removal confirmed by the server; the line is hiding and about to be detached.
    PendingRemoval,
    Removed,
}

#[derive(Debug, Clone)]
pub struct LineItem {
    pub key: LineKey,
    pub name: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub total_text: String,
    pub state: LineState,
    pub in_flight: bool,
}

impl LineItem {
    pub fn is_attached(&self) -> bool {
        self.state != LineState::Removed
    }

    pub fn total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEndpoints {
    pub update: String,
    pub remove: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeState {
    Shown,
    Closing,
}

/// The "prices in your cart have changed" message with its confirmation URL.
#[derive(Debug, Clone)]
pub struct PriceNotice {
    pub url: String,
    pub state: NoticeState,
    pub in_flight: bool,
}

// 伺服器渲染頁面的快照

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub endpoints: CartEndpoints,
    #[serde(default)]
    pub lines: Vec<LineSnapshot>,
    pub price_changed: Option<NoticeSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub id_: u64,
    pub slug: String,
    pub name: Option<String>,
    pub price_for_one: Money,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeSnapshot {
    pub url: String,
}

// 請求與回應格式

#[derive(Debug, Clone, Serialize)]
pub struct QuantityUpdate<'a> {
    #[serde(flatten)]
    pub key: &'a LineKey,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceConfirmation {
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderRequest<'a> {
    pub product: u64,
    pub email: &'a str,
}

pub const FALLBACK_FAILURE_MESSAGE: &str = "Error occured";

/// JSON body returned by the cart and product endpoints. Successful replies carry
/// `message`; rejected form submissions carry `errors` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerReply {
    pub message: Option<String>,
    pub errors: Option<serde_json::Value>,
}

impl ServerReply {
    pub fn failure_message(&self) -> String {
        if let Some(message) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            return message.to_string();
        }
        match &self.errors {
            Some(errors) => {
                let mut parts = Vec::new();
                flatten_errors(errors, &mut parts);
                if parts.is_empty() {
                    FALLBACK_FAILURE_MESSAGE.to_string()
                } else {
                    parts.join("; ")
                }
            }
            None => FALLBACK_FAILURE_MESSAGE.to_string(),
        }
    }
}

fn flatten_errors(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => items.iter().for_each(|item| flatten_errors(item, out)),
        serde_json::Value::Object(fields) => fields.values().for_each(|item| flatten_errors(item, out)),
        serde_json::Value::Null => {}
        other => out.push(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money() {
        assert_eq!(Money::parse("100.00").unwrap(), Money::from_minor(10_000));
        assert_eq!(Money::parse("100").unwrap(), Money::from_minor(10_000));
        assert_eq!(Money::parse("75.5").unwrap(), Money::from_minor(7_550));
        assert_eq!(Money::parse("1 234,25").unwrap(), Money::from_minor(123_425));
        assert_eq!(Money::parse(".5").unwrap(), Money::from_minor(50));
    }

    #[test]
    fn test_parse_money_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("-5.00").is_err());
        assert!(Money::parse("1.005").is_err());
        assert!(Money::parse("1.2.3").is_err());
    }

    #[test]
    fn test_money_display_and_times() {
        let price = Money::parse("100.00").unwrap();
        assert_eq!(price.times(3).to_string(), "300.00");
        assert_eq!(Money::parse("0.07").unwrap().to_string(), "0.07");
        assert_eq!(price.times(0), Money::ZERO);
    }

    #[test]
    fn test_money_bounds() {
        assert!(Money::parse("100000000000.00").is_ok());
        assert!(Money::parse("100000000000.01").is_err());
        assert!(Money::parse("99999999999999999999").is_err());

        let line: std::result::Result<LineSnapshot, _> =
            serde_json::from_value(serde_json::json!({"id_": 1, "slug": "tea", "price_for_one": 1e300}));
        assert!(line.is_err());

        // 最大單價乘以最大數量不會溢位
        let max = Money::parse("100000000000.00").unwrap();
        let total = max.times(u32::MAX);
        assert_eq!(total.minor(), i128::from(MAX_PRICE_MINOR) * i128::from(u32::MAX));
        let sum: Money = vec![total, total, total].into_iter().sum();
        assert_eq!(sum.minor(), total.minor() * 3);
    }

    #[test]
    fn test_negative_display() {
        assert_eq!(Money::from_minor(-50).to_string(), "-0.50");
        assert_eq!(Money::from_minor(-12_345).to_string(), "-123.45");
    }

    #[test]
    fn test_money_sum() {
        let totals = vec![Money::parse("50.00").unwrap(), Money::parse("75.25").unwrap()];
        let sum: Money = totals.iter().sum();
        assert_eq!(sum.to_string(), "125.25");
    }

    #[test]
    fn test_money_deserializes_from_text_or_number() {
        let line: LineSnapshot =
            serde_json::from_value(serde_json::json!({"id_": 1, "slug": "tea", "price_for_one": "19.90"})).unwrap();
        assert_eq!(line.price_for_one, Money::from_minor(1_990));
        assert_eq!(line.quantity, 1);

        let line: LineSnapshot =
            serde_json::from_value(serde_json::json!({"id_": 1, "slug": "tea", "price_for_one": 19.9, "quantity": 2}))
                .unwrap();
        assert_eq!(line.price_for_one, Money::from_minor(1_990));
    }

    #[test]
    fn test_quantity_update_payload() {
        let key = LineKey::new(12, "some-slug");
        let body = serde_json::to_value(QuantityUpdate { key: &key, quantity: 2 }).unwrap();
        assert_eq!(body, serde_json::json!({"id_": 12, "slug": "some-slug", "quantity": 2}));
    }

    #[test]
    fn test_failure_message_fallbacks() {
        let reply = ServerReply {
            message: Some("out of stock".to_string()),
            errors: None,
        };
        assert_eq!(reply.failure_message(), "out of stock");

        let reply: ServerReply =
            serde_json::from_value(serde_json::json!({"errors": {"__all__": ["Product not in cart"]}})).unwrap();
        assert_eq!(reply.failure_message(), "Product not in cart");

        assert_eq!(ServerReply::default().failure_message(), FALLBACK_FAILURE_MESSAGE);
    }
}
