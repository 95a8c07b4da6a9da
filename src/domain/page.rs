use crate::domain::model::{
    CartEndpoints, CartSnapshot, LineItem, LineKey, LineSnapshot, LineState, Money, NoticeSnapshot, NoticeState,
    PriceNotice,
};
use crate::utils::error::{CartError, Result};
use std::collections::HashMap;
use std::fmt::Write;

pub const DEFAULT_CURRENCY_PREFIX: &str = "₽ ";

/// Typed stand-in for the rendered cart page: line-item view-models in display
/// order, indexed by product identity, plus the grand total and the price notice.
#[derive(Debug, Clone)]
pub struct CartPage {
    endpoints: CartEndpoints,
    lines: Vec<LineItem>,
    index: HashMap<LineKey, usize>,
    total_text: String,
    notice: Option<PriceNotice>,
    currency_prefix: String,
}

impl CartPage {
    pub fn from_snapshot(snapshot: CartSnapshot, currency_prefix: impl Into<String>) -> Result<Self> {
        let mut lines = Vec::with_capacity(snapshot.lines.len());
        let mut index = HashMap::with_capacity(snapshot.lines.len());

        for line in snapshot.lines {
            let key = LineKey::new(line.id_, line.slug);
            if index.insert(key.clone(), lines.len()).is_some() {
                return Err(CartError::ValidationError {
                    message: format!("Duplicate cart line {}", key),
                });
            }
            lines.push(LineItem {
                key,
                name: line.name,
                unit_price: line.price_for_one,
                quantity: line.quantity,
                total_text: String::new(),
                state: LineState::Visible,
                in_flight: false,
            });
        }

        let mut page = Self {
            endpoints: snapshot.endpoints,
            lines,
            index,
            total_text: String::new(),
            notice: snapshot.price_changed.map(|n| PriceNotice {
                url: n.url,
                state: NoticeState::Shown,
                in_flight: false,
            }),
            currency_prefix: currency_prefix.into(),
        };

        // 載入時與伺服器渲染的結果一致
        let totals = page.recompute_totals();
        page.write_grand_total(totals.iter().sum());

        Ok(page)
    }

    pub fn endpoints(&self) -> &CartEndpoints {
        &self.endpoints
    }

    pub fn line(&self, key: &LineKey) -> Option<&LineItem> {
        self.index.get(key).map(|&slot| &self.lines[slot])
    }

    pub fn line_mut(&mut self, key: &LineKey) -> Option<&mut LineItem> {
        match self.index.get(key) {
            Some(&slot) => self.lines.get_mut(slot),
            None => None,
        }
    }

    /// Looks up a line that can still be acted on.
    pub fn attached_line_mut(&mut self, key: &LineKey) -> Result<&mut LineItem> {
        let line = self.line_mut(key).ok_or_else(|| CartError::LineNotFound { key: key.to_string() })?;
        match line.state {
            LineState::Visible => Ok(line),
            LineState::PendingRemoval | LineState::Removed => Err(CartError::LineRemoved { key: key.to_string() }),
        }
    }

    /// Lines still in the page, in display order. Hiding lines are included until detached.
    pub fn visible_lines(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.iter().filter(|line| line.is_attached())
    }

    /// Writes `price × quantity` into every visible line and returns the totals in display order.
    pub fn recompute_totals(&mut self) -> Vec<Money> {
        let prefix = &self.currency_prefix;
        self.lines
            .iter_mut()
            .filter(|line| line.is_attached())
            .map(|line| {
                let total = line.total();
                line.total_text = format!("{}{}", prefix, total);
                total
            })
            .collect()
    }

    pub fn write_grand_total(&mut self, total: Money) {
        self.total_text = total.to_string();
    }

    pub fn total_text(&self) -> &str {
        &self.total_text
    }

    pub fn currency_prefix(&self) -> &str {
        &self.currency_prefix
    }

    /// Marks a confirmed removal. The line keeps its place until `detach`.
    pub fn hide(&mut self, key: &LineKey) {
        if let Some(line) = self.line_mut(key) {
            if line.state == LineState::Visible {
                line.state = LineState::PendingRemoval;
            }
        }
    }

    pub fn detach(&mut self, key: &LineKey) {
        if let Some(line) = self.line_mut(key) {
            line.state = LineState::Removed;
            line.in_flight = false;
        }
    }

    pub fn notice(&self) -> Option<&PriceNotice> {
        self.notice.as_ref()
    }

    pub fn notice_mut(&mut self) -> Option<&mut PriceNotice> {
        self.notice.as_mut()
    }

    pub fn remove_notice(&mut self) {
        self.notice = None;
    }

    /// Serializes what is currently on the page back into snapshot form.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            endpoints: self.endpoints.clone(),
            lines: self
                .visible_lines()
                .filter(|line| line.state == LineState::Visible)
                .map(|line| LineSnapshot {
                    id_: line.key.id_,
                    slug: line.key.slug.clone(),
                    name: line.name.clone(),
                    price_for_one: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
            price_changed: self.notice.as_ref().map(|n| NoticeSnapshot { url: n.url.clone() }),
        }
    }

    /// Plain text rendering for terminals.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.notice.is_some() {
            let _ = writeln!(out, "! Prices of some products in your cart have changed");
        }
        for line in self.visible_lines() {
            let label = line.name.as_deref().unwrap_or(&line.key.slug);
            let _ = writeln!(
                out,
                "{:>6}  {:<32} {}{} x {:<4} {}",
                line.key.id_, label, self.currency_prefix, line.unit_price, line.quantity, line.total_text
            );
        }
        let _ = write!(out, "Total: {}", self.total_text);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(lines: &[(u64, &str, &str, u32)]) -> CartSnapshot {
        CartSnapshot {
            endpoints: CartEndpoints {
                update: "/cart/update_quantity/".to_string(),
                remove: "/cart/remove_product/".to_string(),
            },
            lines: lines
                .iter()
                .map(|(id_, slug, price, quantity)| LineSnapshot {
                    id_: *id_,
                    slug: slug.to_string(),
                    name: None,
                    price_for_one: Money::parse(price).unwrap(),
                    quantity: *quantity,
                })
                .collect(),
            price_changed: None,
        }
    }

    #[test]
    fn test_line_totals_follow_price_times_quantity() {
        let mut page =
            CartPage::from_snapshot(snapshot(&[(1, "tea", "100.00", 1), (2, "cup", "19.99", 3)]), "₽ ").unwrap();

        page.line_mut(&LineKey::new(1, "tea")).unwrap().quantity = 3;
        let totals = page.recompute_totals();

        assert_eq!(totals, vec![Money::from_minor(30_000), Money::from_minor(5_997)]);
        assert_eq!(page.line(&LineKey::new(1, "tea")).unwrap().total_text, "₽ 300.00");
        assert_eq!(page.line(&LineKey::new(2, "cup")).unwrap().total_text, "₽ 59.97");
    }

    #[test]
    fn test_grand_total_on_load() {
        let page =
            CartPage::from_snapshot(snapshot(&[(1, "tea", "50.00", 1), (2, "cup", "75.25", 1)]), "₽ ").unwrap();
        assert_eq!(page.total_text(), "125.25");
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut page =
            CartPage::from_snapshot(snapshot(&[(1, "tea", "10.10", 2), (2, "cup", "0.33", 7)]), "₽ ").unwrap();

        let first = page.recompute_totals();
        let texts: Vec<String> = page.visible_lines().map(|l| l.total_text.clone()).collect();
        let second = page.recompute_totals();
        let texts_again: Vec<String> = page.visible_lines().map(|l| l.total_text.clone()).collect();

        assert_eq!(first, second);
        assert_eq!(texts, texts_again);
    }

    #[test]
    fn test_detached_lines_leave_the_aggregate() {
        let mut page = CartPage::from_snapshot(
            snapshot(&[(1, "tea", "50.00", 1), (2, "cup", "75.25", 1), (3, "pot", "10.00", 2)]),
            "₽ ",
        )
        .unwrap();
        let cup = LineKey::new(2, "cup");

        page.hide(&cup);
        assert_eq!(page.visible_lines().count(), 3);

        page.detach(&cup);
        let totals = page.recompute_totals();
        assert_eq!(totals, vec![Money::from_minor(5_000), Money::from_minor(2_000)]);
        assert!(matches!(page.attached_line_mut(&cup), Err(CartError::LineRemoved { .. })));
        assert_eq!(page.snapshot().lines.len(), 2);
    }

    #[test]
    fn test_duplicate_lines_are_rejected() {
        let result = CartPage::from_snapshot(snapshot(&[(1, "tea", "1.00", 1), (1, "tea", "1.00", 2)]), "₽ ");
        assert!(matches!(result, Err(CartError::ValidationError { .. })));
    }

    #[test]
    fn test_unknown_line() {
        let mut page = CartPage::from_snapshot(snapshot(&[(1, "tea", "1.00", 1)]), "₽ ").unwrap();
        assert!(matches!(
            page.attached_line_mut(&LineKey::new(9, "nope")),
            Err(CartError::LineNotFound { .. })
        ));
    }

    #[test]
    fn test_empty_cart_total() {
        let page = CartPage::from_snapshot(snapshot(&[]), DEFAULT_CURRENCY_PREFIX).unwrap();
        assert_eq!(page.total_text(), "0.00");
        assert!(page.render().ends_with("Total: 0.00"));
    }
}
