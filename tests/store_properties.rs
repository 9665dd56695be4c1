use std::collections::HashSet;

use proptest::prelude::*;

use invoice_gen::model::{DEFAULT_NOTES, LineItemId};
use invoice_gen::store::{InvoiceStore, LineItemField};
use invoice_gen::totals::Totals;

#[derive(Debug, Clone)]
enum Op {
    Add,
    /// Remove the row at this index (modulo the current length).
    RemoveAt(usize),
    /// Remove an id that was never in the list.
    RemoveUnknown,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Add),
        2 => any::<usize>().prop_map(Op::RemoveAt),
        1 => Just(Op::RemoveUnknown),
    ]
}

fn amount() -> impl Strategy<Value = f64> {
    (0u32..100_000).prop_map(|cents| cents as f64 / 100.0)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn add_remove_sequences_keep_counts_and_unique_ids(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut store = InvoiceStore::new();
        let mut expected = store.invoice().items.len();

        for op in ops {
            match op {
                Op::Add => {
                    store.add_line_item();
                    expected += 1;
                }
                Op::RemoveAt(index) => {
                    let items = &store.invoice().items;
                    if !items.is_empty() {
                        let id = items[index % items.len()].id;
                        prop_assert!(store.remove_line_item(id));
                        expected -= 1;
                    }
                }
                Op::RemoveUnknown => {
                    prop_assert!(!store.remove_line_item(LineItemId::new()));
                }
            }
        }

        let items = &store.invoice().items;
        prop_assert_eq!(items.len(), expected);
        let ids: HashSet<_> = items.iter().map(|i| i.id).collect();
        prop_assert_eq!(ids.len(), items.len());
    }

    #[test]
    fn quantity_and_rate_updates_commute(quantity in amount(), rate in amount()) {
        let mut a = InvoiceStore::new();
        let id = a.invoice().items[0].id;
        let mut b = InvoiceStore::with_invoice(a.invoice().clone());

        a.update_line_item(id, LineItemField::Quantity(quantity));
        a.update_line_item(id, LineItemField::Rate(rate));
        b.update_line_item(id, LineItemField::Rate(rate));
        b.update_line_item(id, LineItemField::Quantity(quantity));

        prop_assert_eq!(a.invoice(), b.invoice());
    }

    #[test]
    fn subtotal_is_the_sum_of_line_amounts(rows in prop::collection::vec((amount(), amount()), 0..12)) {
        let mut store = InvoiceStore::new();
        let default_id = store.invoice().items[0].id;
        store.remove_line_item(default_id);

        for (quantity, rate) in &rows {
            let id = store.add_line_item();
            store.update_line_item(id, LineItemField::Quantity(*quantity));
            store.update_line_item(id, LineItemField::Rate(*rate));
        }

        let expected: f64 = rows.iter().map(|(q, r)| q * r).sum();
        let totals = Totals::for_invoice(store.invoice());
        prop_assert!((totals.subtotal - expected).abs() < 1e-6);
        prop_assert!((totals.total - totals.subtotal - totals.tax_amount).abs() < 1e-6);
    }
}

#[test]
fn empty_list_totals_to_zero() {
    let mut store = InvoiceStore::new();
    let id = store.invoice().items[0].id;
    store.remove_line_item(id);

    let totals = Totals::for_invoice(store.invoice());
    assert_eq!(totals, Totals { subtotal: 0.0, tax_amount: 0.0, total: 0.0 });
}

#[test]
fn zero_and_full_tax_rates() {
    let mut store = InvoiceStore::new();
    store.dispatch(invoice_gen::InvoiceAction::SetTaxRate(0.0));
    assert_eq!(Totals::for_invoice(store.invoice()).total, 1500.0);

    store.dispatch(invoice_gen::InvoiceAction::SetTaxRate(100.0));
    assert_eq!(Totals::for_invoice(store.invoice()).total, 3000.0);
}

#[test]
fn worked_example() {
    let mut store = InvoiceStore::new();
    store.add_line_item();
    let second = store.add_line_item();
    store.update_line_item(second, LineItemField::Quantity(3.0));
    store.update_line_item(second, LineItemField::Rate(50.0));

    assert_eq!(store.invoice().items.len(), 3);
    let totals = Totals::for_invoice(store.invoice());
    assert_eq!(totals.subtotal, 1650.0);
    assert_eq!(totals.tax_amount, 82.5);
    assert_eq!(totals.total, 1732.5);
}

#[test]
fn reset_restores_the_default_shape() {
    let mut store = InvoiceStore::new();
    store.add_line_item();
    store.set_logo("data:image/png;base64,AAAA");
    store.dispatch(invoice_gen::InvoiceAction::SetNotes(String::new()));
    store.reset();

    let invoice = store.invoice();
    assert_eq!(invoice.invoice_number, "INV-001");
    assert_eq!(invoice.notes, DEFAULT_NOTES);
    assert_eq!(invoice.tax_rate, 5.0);
    assert_eq!(invoice.from.logo, None);
    assert_eq!(invoice.items.len(), 1);
    assert_eq!(invoice.items[0].description, "Website Design");
    assert_eq!((invoice.items[0].quantity, invoice.items[0].rate), (1.0, 1500.0));
    assert_eq!(Totals::for_invoice(invoice).total, 1575.0);
}

#[test]
fn removing_a_missing_id_changes_nothing() {
    let mut store = InvoiceStore::new();
    store.add_line_item();
    let before = store.snapshot();
    let revision = store.revision();

    assert!(!store.remove_line_item(LineItemId::new()));
    assert_eq!(store.invoice(), &*before);
    assert_eq!(store.revision(), revision);
}
