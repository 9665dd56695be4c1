//! InvoiceGen: fill in an invoice on the left, watch it render on the right,
//! export the rendered page as a PDF.

pub mod app;
pub mod error;
pub mod export;
pub mod form;
pub mod logo;
pub mod model;
pub mod preview;
pub mod settings;
pub mod store;
pub mod task;
pub mod totals;

pub use app::InvoiceApp;
pub use model::{Client, Company, Invoice, LineItem, LineItemId};
pub use store::{InvoiceAction, InvoiceStore};
pub use totals::Totals;
