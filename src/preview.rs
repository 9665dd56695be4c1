//! Read-only, print-style rendering of the invoice.
//!
//! [`PreviewDocument`] holds every string the page shows (placeholders
//! substituted, numbers formatted). [`InvoicePreview`] only lays it out, so the
//! same page is what ends up in the exported PDF.

use chrono::NaiveDate;
use eframe::egui::{self, Align, Layout, RichText, Ui};

use crate::model::Invoice;
use crate::totals::{Totals, format_money, format_quantity, format_rate, line_amount};

mod placeholder {
    pub const COMPANY_NAME: &str = "Your Company";
    pub const COMPANY_ADDRESS: &str = "123 Main St, City, State, ZIP";
    pub const COMPANY_EMAIL: &str = "company@example.com";
    pub const COMPANY_PHONE: &str = "(123) 456-7890";
    pub const INVOICE_NUMBER: &str = "INV-001";
    pub const CLIENT_NAME: &str = "Client Name";
    pub const CLIENT_ADDRESS: &str = "456 Client Ave, City, State, ZIP";
    pub const CLIENT_PHONE: &str = "(987) 654-3210";
    pub const DESCRIPTION: &str = "Service Description";
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow {
    pub description: String,
    pub quantity: String,
    pub rate: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewDocument {
    pub company_name: String,
    pub has_logo: bool,
    pub company_address: String,
    pub company_email: String,
    pub company_phone: String,
    pub date: String,
    pub invoice_number: String,
    pub client_name: String,
    pub client_address: String,
    pub client_phone: String,
    pub rows: Vec<PreviewRow>,
    pub subtotal: String,
    pub tax_label: String,
    pub tax_amount: String,
    pub total: String,
    /// `None` hides the notes section.
    pub notes: Option<Vec<String>>,
}

impl PreviewDocument {
    pub fn build(invoice: &Invoice) -> Self {
        let totals = Totals::for_invoice(invoice);
        let rows = invoice
            .items
            .iter()
            .map(|item| PreviewRow {
                description: or_placeholder(&item.description, placeholder::DESCRIPTION),
                quantity: format_quantity(item.quantity),
                rate: format_money(item.rate),
                amount: format_money(line_amount(item)),
            })
            .collect();

        let notes: Option<Vec<String>> = (!invoice.notes.is_empty()).then(|| {
            invoice
                .notes
                .split('\n')
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect()
        });

        PreviewDocument {
            company_name: or_placeholder(&invoice.from.name, placeholder::COMPANY_NAME),
            has_logo: invoice.from.logo.is_some(),
            company_address: or_placeholder(&invoice.from.address, placeholder::COMPANY_ADDRESS),
            company_email: or_placeholder(&invoice.from.email, placeholder::COMPANY_EMAIL),
            company_phone: or_placeholder(&invoice.from.phone, placeholder::COMPANY_PHONE),
            date: format_long_date(&invoice.date),
            invoice_number: or_placeholder(&invoice.invoice_number, placeholder::INVOICE_NUMBER),
            client_name: or_placeholder(&invoice.to.name, placeholder::CLIENT_NAME),
            client_address: or_placeholder(&invoice.to.address, placeholder::CLIENT_ADDRESS),
            client_phone: or_placeholder(&invoice.to.phone, placeholder::CLIENT_PHONE),
            rows,
            subtotal: format_money(totals.subtotal),
            tax_label: format!("Tax ({}%)", format_rate(invoice.tax_rate)),
            tax_amount: format_money(totals.tax_amount),
            total: format_money(totals.total),
            notes,
        }
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// `2026-10-14` becomes `October 14, 2026`. Anything that is not an ISO date
/// is shown as typed.
pub fn format_long_date(date: &str) -> String {
    if date.is_empty() {
        return String::new();
    }
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%B %-d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

mod palette {
    use eframe::egui::Color32;

    pub const PAPER: Color32 = Color32::WHITE;
    pub const BORDER: Color32 = Color32::from_rgb(226, 232, 240);
    pub const HEADING: Color32 = Color32::from_rgb(30, 41, 59);
    pub const TITLE: Color32 = Color32::from_rgb(148, 163, 184);
    pub const BODY: Color32 = Color32::from_rgb(71, 85, 105);
    pub const MUTED: Color32 = Color32::from_rgb(100, 116, 139);
    pub const TOTAL: Color32 = Color32::from_rgb(15, 23, 42);
    pub const TABLE_HEAD: Color32 = Color32::from_rgb(248, 250, 252);
}

pub struct InvoicePreview;

impl InvoicePreview {
    /// Draw the page and return the screen rect it occupies.
    pub fn show(ui: &mut Ui, doc: &PreviewDocument, logo: Option<&egui::TextureHandle>) -> egui::Rect {
        egui::Frame::new()
            .fill(palette::PAPER)
            .stroke(egui::Stroke::new(1.0, palette::BORDER))
            .inner_margin(egui::Margin::same(32))
            .corner_radius(8.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width().min(720.0));
                ui.visuals_mut().override_text_color = Some(palette::BODY);

                header(ui, doc, logo);
                ui.add_space(24.0);
                bill_to(ui, doc);
                ui.add_space(28.0);
                items(ui, doc);
                ui.add_space(20.0);
                totals(ui, doc);
                if let Some(lines) = &doc.notes {
                    ui.add_space(28.0);
                    notes(ui, lines);
                }
            })
            .response
            .rect
    }
}

fn header(ui: &mut Ui, doc: &PreviewDocument, logo: Option<&egui::TextureHandle>) {
    ui.horizontal_top(|ui| {
        ui.vertical(|ui| {
            match logo {
                Some(texture) => {
                    ui.add(
                        egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                            .max_height(80.0),
                    );
                    ui.add_space(8.0);
                }
                None => {
                    ui.label(
                        RichText::new(&doc.company_name)
                            .size(26.0)
                            .strong()
                            .color(palette::HEADING),
                    );
                }
            }
            for line in [&doc.company_address, &doc.company_email, &doc.company_phone] {
                ui.label(RichText::new(line).small().color(palette::MUTED));
            }
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new("Date:").small().strong().color(palette::MUTED));
                ui.label(RichText::new(&doc.date).small().color(palette::MUTED));
            });
        });

        ui.with_layout(Layout::top_down(Align::Max), |ui| {
            ui.label(
                RichText::new("INVOICE")
                    .size(32.0)
                    .strong()
                    .color(palette::TITLE),
            );
            ui.label(format!("# {}", doc.invoice_number));
        });
    });
    ui.add_space(12.0);
    ui.separator();
}

fn bill_to(ui: &mut Ui, doc: &PreviewDocument) {
    ui.label(RichText::new("BILL TO").small().strong().color(palette::MUTED));
    ui.label(RichText::new(&doc.client_name).strong().color(palette::HEADING));
    ui.label(RichText::new(&doc.client_address).small().color(palette::MUTED));
    ui.label(RichText::new(&doc.client_phone).small().color(palette::MUTED));
}

fn items(ui: &mut Ui, doc: &PreviewDocument) {
    let width = ui.available_width();
    egui::Frame::new().fill(palette::TABLE_HEAD).show(ui, |ui| {
        ui.set_width(width);
        item_row(ui, width, ["DESCRIPTION", "QTY", "RATE", "AMOUNT"], true);
    });
    for row in &doc.rows {
        item_row(
            ui,
            width,
            [
                row.description.as_str(),
                row.quantity.as_str(),
                row.rate.as_str(),
                row.amount.as_str(),
            ],
            false,
        );
        ui.separator();
    }
}

// Description takes half the width; the numeric columns share the rest.
fn item_row(ui: &mut Ui, width: f32, cells: [&str; 4], head: bool) {
    let fractions = [0.5, 0.14, 0.18, 0.18];
    let aligns = [Align::Min, Align::Center, Align::Max, Align::Max];
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for ((cell, fraction), align) in cells.iter().zip(fractions).zip(aligns) {
            let size = egui::vec2(width * fraction, 28.0);
            ui.allocate_ui_with_layout(size, Layout::left_to_right(Align::Center).with_main_align(align), |ui| {
                ui.set_min_size(size);
                let text = RichText::new(*cell);
                let text = if head {
                    text.small().strong().color(palette::BODY)
                } else if align == Align::Min {
                    text.color(palette::HEADING)
                } else {
                    text
                };
                ui.add(egui::Label::new(text).wrap());
            });
        }
    });
}

fn totals(ui: &mut Ui, doc: &PreviewDocument) {
    ui.with_layout(Layout::top_down(Align::Max), |ui| {
        let width = 260.0_f32.min(ui.available_width());
        total_line(ui, width, RichText::new("Subtotal"), RichText::new(&doc.subtotal));
        total_line(ui, width, RichText::new(&doc.tax_label), RichText::new(&doc.tax_amount));
        ui.add_space(4.0);
        total_line(
            ui,
            width,
            RichText::new("Total Due").size(17.0).strong().color(palette::TOTAL),
            RichText::new(&doc.total).size(17.0).strong().color(palette::TOTAL),
        );
    });
}

fn total_line(ui: &mut Ui, width: f32, label: RichText, value: RichText) {
    ui.allocate_ui_with_layout(egui::vec2(width, 22.0), Layout::left_to_right(Align::Center), |ui| {
        ui.set_min_width(width);
        ui.label(label);
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            ui.label(value);
        });
    });
}

fn notes(ui: &mut Ui, lines: &[String]) {
    ui.separator();
    ui.add_space(8.0);
    ui.label(RichText::new("NOTES").small().strong().color(palette::MUTED));
    ui.label(RichText::new(lines.join("\n")).small().color(palette::BODY));
}
