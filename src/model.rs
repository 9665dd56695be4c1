use std::fmt;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_INVOICE_NUMBER: &str = "INV-001";
pub const DEFAULT_NOTES: &str = "Thank you for your business. Please pay within 30 days.";
pub const DEFAULT_TAX_RATE: f64 = 5.0;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Company {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    /// `data:<mime>;base64,<payload>`
    pub logo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Client {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Identifier of a line item, unique for the whole session.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineItemId(Uuid);

impl LineItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
}

impl LineItem {
    /// A fresh row as appended by "Add Item".
    pub fn blank() -> Self {
        Self::new("", 1.0, 0.0)
    }

    pub fn new(description: impl Into<String>, quantity: f64, rate: f64) -> Self {
        LineItem {
            id: LineItemId::new(),
            description: description.into(),
            quantity,
            rate,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Invoice {
    pub from: Company,
    pub to: Client,
    pub invoice_number: String,
    /// ISO `YYYY-MM-DD`; free text while being edited.
    pub date: String,
    pub items: Vec<LineItem>,
    pub notes: String,
    /// Percentage, e.g. `5.0` for 5%.
    pub tax_rate: f64,
}

impl Invoice {
    pub fn new_default() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Invoice {
            from: Company::default(),
            to: Client::default(),
            invoice_number: DEFAULT_INVOICE_NUMBER.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            items: vec![LineItem::new("Website Design", 1.0, 1500.0)],
            notes: DEFAULT_NOTES.to_string(),
            tax_rate: DEFAULT_TAX_RATE,
        }
    }

    pub fn item(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Parse user-entered numeric text. Empty, unparsable or non-finite input is zero.
pub fn parse_number(input: &str) -> f64 {
    input.trim().parse::<f64>().map(coerce_number).unwrap_or(0.0)
}

pub fn coerce_number(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_invoice_shape() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let invoice = Invoice::for_date(date);

        assert_eq!(invoice.invoice_number, "INV-001");
        assert_eq!(invoice.date, "2026-10-14");
        assert_eq!(invoice.tax_rate, 5.0);
        assert_eq!(invoice.from, Company::default());
        assert_eq!(invoice.to, Client::default());
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].description, "Website Design");
        assert_eq!(invoice.items[0].quantity, 1.0);
        assert_eq!(invoice.items[0].rate, 1500.0);
    }

    #[test]
    fn fresh_items_get_distinct_ids() {
        let a = LineItem::blank();
        let b = LineItem::blank();
        assert_ne!(a.id, b.id);
        assert_eq!(a.quantity, 1.0);
        assert_eq!(a.rate, 0.0);
        assert!(a.description.is_empty());
    }

    #[test]
    fn parse_number_coerces_garbage_to_zero() {
        assert_eq!(parse_number("12.5"), 12.5);
        assert_eq!(parse_number("  3 "), 3.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
        assert_eq!(parse_number("-2"), -2.0);
    }

    #[test]
    fn coerce_number_keeps_finite_values() {
        assert_eq!(coerce_number(4.25), 4.25);
        assert_eq!(coerce_number(f64::NAN), 0.0);
        assert_eq!(coerce_number(f64::NEG_INFINITY), 0.0);
    }
}
