use crate::model::{Invoice, LineItem};

pub const CURRENCY_SYMBOL: &str = "₦";

pub fn line_amount(item: &LineItem) -> f64 {
    item.quantity * item.rate
}

/// Subtotal, tax and grand total. Recomputed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

impl Totals {
    pub fn compute(items: &[LineItem], tax_rate: f64) -> Self {
        let subtotal: f64 = items.iter().map(line_amount).sum();
        let tax_amount = subtotal * tax_rate / 100.0;
        Totals {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }

    pub fn for_invoice(invoice: &Invoice) -> Self {
        Self::compute(&invoice.items, invoice.tax_rate)
    }
}

pub fn format_money(amount: f64) -> String {
    format!("{}{:.2}", CURRENCY_SYMBOL, amount)
}

/// `5` for 5.0, `7.5` for 7.5.
pub fn format_rate(rate: f64) -> String {
    format_plain(rate)
}

pub fn format_quantity(quantity: f64) -> String {
    format_plain(quantity)
}

fn format_plain(value: f64) -> String {
    // f64's Display already drops a trailing ".0" and never uses exponents.
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: f64, rate: f64) -> LineItem {
        LineItem::new("x", quantity, rate)
    }

    #[test]
    fn empty_items_total_to_zero() {
        let totals = Totals::compute(&[], 5.0);
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn zero_tax_rate_total_equals_subtotal() {
        let totals = Totals::compute(&[item(2.0, 10.0), item(1.0, 5.5)], 0.0);
        assert_eq!(totals.subtotal, 25.5);
        assert_eq!(totals.tax_amount, 0.0);
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn full_tax_rate_doubles_subtotal() {
        let totals = Totals::compute(&[item(3.0, 50.0)], 100.0);
        assert_eq!(totals.total, 2.0 * totals.subtotal);
    }

    #[test]
    fn default_invoice_totals() {
        let invoice = Invoice::new_default();
        let totals = Totals::for_invoice(&invoice);
        assert_eq!(totals.subtotal, 1500.0);
        assert_eq!(totals.tax_amount, 75.0);
        assert_eq!(totals.total, 1575.0);
    }

    #[test]
    fn money_is_rounded_for_display_only() {
        assert_eq!(format_money(1732.5), "₦1732.50");
        assert_eq!(format_money(0.0), "₦0.00");
        assert_eq!(format_money(2.0 / 3.0), "₦0.67");
    }

    #[test]
    fn rates_drop_trailing_zeros() {
        assert_eq!(format_rate(5.0), "5");
        assert_eq!(format_rate(7.5), "7.5");
        assert_eq!(format_quantity(3.0), "3");
    }
}
