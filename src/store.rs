//! The single owned invoice and the commands that change it.
//!
//! Views never mutate the invoice directly. They produce [`InvoiceAction`]s,
//! the app hands them to [`InvoiceStore::dispatch`], and the next frame renders
//! from the new value.

use std::sync::Arc;

use crate::model::{Client, Company, Invoice, LineItem, LineItemId, coerce_number};

/// Partial update of the sender. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `Some(None)` clears the logo.
    pub logo: Option<Option<String>>,
}

/// Partial update of the recipient. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineItemField {
    Description(String),
    Quantity(f64),
    Rate(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceAction {
    SetInvoiceNumber(String),
    SetDate(String),
    SetNotes(String),
    SetTaxRate(f64),
    UpdateFrom(CompanyPatch),
    UpdateTo(ClientPatch),
    /// Append a row. The row, and so its id, is minted when the action is built.
    AddLineItem(LineItem),
    RemoveLineItem(LineItemId),
    UpdateLineItem { id: LineItemId, field: LineItemField },
    SetLogo(String),
    Reset,
}

impl InvoiceAction {
    pub fn kind(&self) -> &'static str {
        match self {
            InvoiceAction::SetInvoiceNumber(_) => "set_invoice_number",
            InvoiceAction::SetDate(_) => "set_date",
            InvoiceAction::SetNotes(_) => "set_notes",
            InvoiceAction::SetTaxRate(_) => "set_tax_rate",
            InvoiceAction::UpdateFrom(_) => "update_from",
            InvoiceAction::UpdateTo(_) => "update_to",
            InvoiceAction::AddLineItem(_) => "add_line_item",
            InvoiceAction::RemoveLineItem(_) => "remove_line_item",
            InvoiceAction::UpdateLineItem { .. } => "update_line_item",
            InvoiceAction::SetLogo(_) => "set_logo",
            InvoiceAction::Reset => "reset",
        }
    }
}

type Observer = Box<dyn FnMut(&Invoice)>;

pub struct InvoiceStore {
    invoice: Arc<Invoice>,
    revision: u64,
    observers: Vec<Observer>,
}

impl Default for InvoiceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceStore {
    pub fn new() -> Self {
        Self::with_invoice(Invoice::new_default())
    }

    pub fn with_invoice(invoice: Invoice) -> Self {
        InvoiceStore {
            invoice: Arc::new(invoice),
            revision: 0,
            observers: Vec::new(),
        }
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    /// A cheap handle to the current value. Later dispatches never alter it.
    pub fn snapshot(&self) -> Arc<Invoice> {
        Arc::clone(&self.invoice)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register a callback that runs after every change, with the new value.
    pub fn subscribe(&mut self, observer: impl FnMut(&Invoice) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Apply one action. Returns `false` when it had nothing to change.
    pub fn dispatch(&mut self, action: InvoiceAction) -> bool {
        tracing::debug!(action = action.kind(), revision = self.revision, "dispatch");

        if !self.applies(&action) {
            return false;
        }

        apply(&mut self.invoice, action);

        self.revision += 1;
        for observer in &mut self.observers {
            observer(&self.invoice);
        }
        true
    }

    // Row-targeted actions on a missing id are no-ops and must not copy or notify.
    // Adding a row whose id is already present is refused the same way.
    fn applies(&self, action: &InvoiceAction) -> bool {
        match action {
            InvoiceAction::AddLineItem(item) => self.invoice.item(item.id).is_none(),
            InvoiceAction::RemoveLineItem(id) | InvoiceAction::UpdateLineItem { id, .. } => {
                self.invoice.item(*id).is_some()
            }
            _ => true,
        }
    }

    pub fn update_from(&mut self, patch: CompanyPatch) -> bool {
        self.dispatch(InvoiceAction::UpdateFrom(patch))
    }

    pub fn update_to(&mut self, patch: ClientPatch) -> bool {
        self.dispatch(InvoiceAction::UpdateTo(patch))
    }

    /// Appends a blank row and returns its id.
    pub fn add_line_item(&mut self) -> LineItemId {
        let item = LineItem::blank();
        let id = item.id;
        self.dispatch(InvoiceAction::AddLineItem(item));
        id
    }

    pub fn remove_line_item(&mut self, id: LineItemId) -> bool {
        self.dispatch(InvoiceAction::RemoveLineItem(id))
    }

    pub fn update_line_item(&mut self, id: LineItemId, field: LineItemField) -> bool {
        self.dispatch(InvoiceAction::UpdateLineItem { id, field })
    }

    pub fn set_logo(&mut self, data_uri: impl Into<String>) -> bool {
        self.dispatch(InvoiceAction::SetLogo(data_uri.into()))
    }

    pub fn reset(&mut self) {
        self.dispatch(InvoiceAction::Reset);
    }
}

// `Arc::make_mut` copies only while a snapshot of the old value is still held.
fn apply(slot: &mut Arc<Invoice>, action: InvoiceAction) {
    match action {
        InvoiceAction::Reset => *slot = Arc::new(Invoice::new_default()),
        InvoiceAction::SetInvoiceNumber(value) => Arc::make_mut(slot).invoice_number = value,
        InvoiceAction::SetDate(value) => Arc::make_mut(slot).date = value,
        InvoiceAction::SetNotes(value) => Arc::make_mut(slot).notes = value,
        InvoiceAction::SetTaxRate(value) => Arc::make_mut(slot).tax_rate = coerce_number(value),
        InvoiceAction::UpdateFrom(patch) => merge_company(&mut Arc::make_mut(slot).from, patch),
        InvoiceAction::UpdateTo(patch) => merge_client(&mut Arc::make_mut(slot).to, patch),
        InvoiceAction::AddLineItem(item) => Arc::make_mut(slot).items.push(item),
        InvoiceAction::RemoveLineItem(id) => {
            Arc::make_mut(slot).items.retain(|item| item.id != id)
        }
        InvoiceAction::UpdateLineItem { id, field } => {
            let items = &mut Arc::make_mut(slot).items;
            if let Some(item) = items.iter_mut().find(|item| item.id == id) {
                match field {
                    LineItemField::Description(value) => item.description = value,
                    LineItemField::Quantity(value) => item.quantity = coerce_number(value),
                    LineItemField::Rate(value) => item.rate = coerce_number(value),
                }
            }
        }
        InvoiceAction::SetLogo(uri) => Arc::make_mut(slot).from.logo = Some(uri),
    }
}

fn merge_company(company: &mut Company, patch: CompanyPatch) {
    if let Some(name) = patch.name {
        company.name = name;
    }
    if let Some(address) = patch.address {
        company.address = address;
    }
    if let Some(email) = patch.email {
        company.email = email;
    }
    if let Some(phone) = patch.phone {
        company.phone = phone;
    }
    if let Some(logo) = patch.logo {
        company.logo = logo;
    }
}

fn merge_client(client: &mut Client, patch: ClientPatch) {
    if let Some(name) = patch.name {
        client.name = name;
    }
    if let Some(address) = patch.address {
        client.address = address;
    }
    if let Some(phone) = patch.phone {
        client.phone = phone;
    }
}
