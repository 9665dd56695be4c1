//! The editable side of the app.
//!
//! The form keeps no state of its own: every widget is bound to a clone of the
//! current field, and a change turns into exactly one [`InvoiceAction`].

use eframe::egui::{self, RichText, Ui};

use crate::model::{Invoice, LineItem, parse_number};
use crate::store::{ClientPatch, CompanyPatch, InvoiceAction, LineItemField};
use crate::totals::{format_money, line_amount};

pub struct FormContext<'a> {
    pub logo: Option<&'a egui::TextureHandle>,
    /// A logo read is in flight; the upload button is disabled meanwhile.
    pub logo_pending: bool,
}

#[derive(Debug, Default)]
pub struct FormOutput {
    pub actions: Vec<InvoiceAction>,
    pub pick_logo: bool,
}

pub struct InvoiceForm;

impl InvoiceForm {
    pub fn show(ui: &mut Ui, invoice: &Invoice, ctx: &FormContext<'_>) -> FormOutput {
        let mut out = FormOutput::default();

        section(ui, "From", |ui| from_section(ui, invoice, ctx, &mut out));
        section(ui, "To", |ui| to_section(ui, invoice, &mut out));
        section(ui, "Details", |ui| details_section(ui, invoice, &mut out));
        section(ui, "Line Items", |ui| items_section(ui, invoice, &mut out));

        field_label(ui, "Notes / Terms");
        let mut notes = invoice.notes.clone();
        let response = ui.add(
            egui::TextEdit::multiline(&mut notes)
                .desired_rows(3)
                .desired_width(f32::INFINITY)
                .hint_text("Payment terms, thank you note, etc."),
        );
        if response.changed() {
            out.actions.push(InvoiceAction::SetNotes(notes));
        }

        out
    }
}

fn section(ui: &mut Ui, title: &str, add_contents: impl FnOnce(&mut Ui)) {
    ui.label(RichText::new(title).size(18.0).strong());
    ui.separator();
    ui.add_space(4.0);
    add_contents(ui);
    ui.add_space(20.0);
}

fn field_label(ui: &mut Ui, label: &str) {
    ui.label(RichText::new(label).small().strong());
}

/// Single-line text input; returns the new text if it was edited.
fn text_field(ui: &mut Ui, label: &str, value: &str, hint: &str) -> Option<String> {
    field_label(ui, label);
    let mut text = value.to_string();
    let response = ui.add(
        egui::TextEdit::singleline(&mut text)
            .desired_width(f32::INFINITY)
            .hint_text(hint),
    );
    ui.add_space(6.0);
    response.changed().then_some(text)
}

/// Numeric input. Typed text goes through [`parse_number`], so garbage is zero.
fn number_field(ui: &mut Ui, value: f64, min: Option<f64>, speed: f64) -> Option<f64> {
    let mut number = value;
    let mut drag = egui::DragValue::new(&mut number)
        .speed(speed)
        .max_decimals(2)
        .custom_parser(|text| Some(parse_number(text)));
    if let Some(min) = min {
        drag = drag.range(min..=f64::MAX);
    }
    ui.add(drag).changed().then_some(number)
}

fn from_section(ui: &mut Ui, invoice: &Invoice, ctx: &FormContext<'_>, out: &mut FormOutput) {
    let from = &invoice.from;

    field_label(ui, "Company Logo");
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.vertical_centered(|ui| {
            if let Some(texture) = ctx.logo {
                ui.add(
                    egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                        .max_height(96.0),
                );
            }
            ui.horizontal(|ui| {
                let label = if ctx.logo_pending { "Reading…" } else { "Upload a file" };
                if ui.add_enabled(!ctx.logo_pending, egui::Button::new(label)).clicked() {
                    out.pick_logo = true;
                }
                if from.logo.is_some() && ui.button("Remove logo").clicked() {
                    out.actions.push(InvoiceAction::UpdateFrom(CompanyPatch {
                        logo: Some(None),
                        ..Default::default()
                    }));
                }
            });
            ui.label(RichText::new("PNG, JPG, GIF, WebP or BMP").small().weak());
        });
    });
    ui.add_space(8.0);

    if let Some(name) = text_field(ui, "Company Name", &from.name, "Your Company LLC") {
        out.actions.push(InvoiceAction::UpdateFrom(CompanyPatch {
            name: Some(name),
            ..Default::default()
        }));
    }
    if let Some(email) = text_field(ui, "Email", &from.email, "contact@yourcompany.com") {
        out.actions.push(InvoiceAction::UpdateFrom(CompanyPatch {
            email: Some(email),
            ..Default::default()
        }));
    }
    if let Some(phone) = text_field(ui, "Phone", &from.phone, "(123) 456-7890") {
        out.actions.push(InvoiceAction::UpdateFrom(CompanyPatch {
            phone: Some(phone),
            ..Default::default()
        }));
    }
    if let Some(address) = text_field(ui, "Address", &from.address, "123 Main St, Anytown, USA") {
        out.actions.push(InvoiceAction::UpdateFrom(CompanyPatch {
            address: Some(address),
            ..Default::default()
        }));
    }
}

fn to_section(ui: &mut Ui, invoice: &Invoice, out: &mut FormOutput) {
    let to = &invoice.to;

    if let Some(name) = text_field(ui, "Client Name", &to.name, "Client Inc.") {
        out.actions.push(InvoiceAction::UpdateTo(ClientPatch {
            name: Some(name),
            ..Default::default()
        }));
    }
    if let Some(phone) = text_field(ui, "Client Phone", &to.phone, "(987) 654-3210") {
        out.actions.push(InvoiceAction::UpdateTo(ClientPatch {
            phone: Some(phone),
            ..Default::default()
        }));
    }
    if let Some(address) =
        text_field(ui, "Client Address", &to.address, "456 Client Ave, Otherville, USA")
    {
        out.actions.push(InvoiceAction::UpdateTo(ClientPatch {
            address: Some(address),
            ..Default::default()
        }));
    }
}

fn details_section(ui: &mut Ui, invoice: &Invoice, out: &mut FormOutput) {
    if let Some(number) = text_field(ui, "Invoice Number", &invoice.invoice_number, "INV-001") {
        out.actions.push(InvoiceAction::SetInvoiceNumber(number));
    }

    field_label(ui, "Tax Rate (%)");
    if let Some(rate) = number_field(ui, invoice.tax_rate, None, 0.1) {
        out.actions.push(InvoiceAction::SetTaxRate(rate));
    }
    ui.add_space(6.0);

    if let Some(date) = text_field(ui, "Invoice Date", &invoice.date, "YYYY-MM-DD") {
        out.actions.push(InvoiceAction::SetDate(date));
    }
}

fn items_section(ui: &mut Ui, invoice: &Invoice, out: &mut FormOutput) {
    for (index, item) in invoice.items.iter().enumerate() {
        // Rows are keyed by id so widget state follows the item, not its position.
        ui.push_id(item.id, |ui| {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_width(ui.available_width());
                item_row(ui, index, item, out);
            });
        });
        ui.add_space(6.0);
    }

    if ui.button("➕ Add Item").clicked() {
        out.actions.push(InvoiceAction::AddLineItem(LineItem::blank()));
    }
}

fn item_row(ui: &mut Ui, index: usize, item: &LineItem, out: &mut FormOutput) {
    let id = item.id;

    if let Some(description) = text_field(
        ui,
        &format!("Item {}", index + 1),
        &item.description,
        "Item description",
    ) {
        out.actions.push(InvoiceAction::UpdateLineItem {
            id,
            field: LineItemField::Description(description),
        });
    }

    ui.horizontal(|ui| {
        ui.label(RichText::new("Qty").small().strong());
        if let Some(quantity) = number_field(ui, item.quantity, Some(0.0), 0.1) {
            out.actions.push(InvoiceAction::UpdateLineItem {
                id,
                field: LineItemField::Quantity(quantity),
            });
        }

        ui.label(RichText::new("Rate").small().strong());
        if let Some(rate) = number_field(ui, item.rate, None, 1.0) {
            out.actions.push(InvoiceAction::UpdateLineItem {
                id,
                field: LineItemField::Rate(rate),
            });
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("🗑").on_hover_text("Remove item").clicked() {
                out.actions.push(InvoiceAction::RemoveLineItem(id));
            }
            ui.label(format!("Total: {}", format_money(line_amount(item))));
        });
    });
}
