//! Main application struct and eframe::App implementation

use chrono::Datelike;
use eframe::egui::{self, RichText};

use crate::export::{ExportPipeline, ExportStatus, PreviewFrame};
use crate::form::{FormContext, InvoiceForm};
use crate::logo::{LogoCache, LogoLoader, LogoResult};
use crate::preview::{InvoicePreview, PreviewDocument};
use crate::settings::AppSettings;
use crate::store::{InvoiceAction, InvoiceStore};
use crate::task::{Task, TaskPoll};

const EXPORT_SHORTCUT: egui::KeyboardShortcut =
    egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S);
const RESET_SHORTCUT: egui::KeyboardShortcut = egui::KeyboardShortcut::new(
    egui::Modifiers::COMMAND.plus(egui::Modifiers::SHIFT),
    egui::Key::N,
);

/// Seconds a finished export stays on screen.
const STATUS_LINGER: f64 = 5.0;

pub struct InvoiceApp {
    store: InvoiceStore,
    settings: AppSettings,
    logo: LogoCache,
    logo_task: Option<Task<LogoResult>>,
    export: ExportPipeline,
    /// How the preview was laid out last frame; `None` until it has been drawn.
    preview: Option<PreviewFrame>,
    /// Set by the button or shortcut; the export starts once the preview of
    /// this frame has been laid out.
    export_queued: bool,
    status_since: Option<f64>,
}

impl InvoiceApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let mut store = InvoiceStore::new();
        store.subscribe(|invoice| {
            tracing::trace!(
                items = invoice.items.len(),
                number = %invoice.invoice_number,
                "Invoice changed"
            );
        });

        Self::with_store(store, settings)
    }

    pub fn with_store(store: InvoiceStore, settings: AppSettings) -> Self {
        InvoiceApp {
            store,
            settings,
            logo: LogoCache::default(),
            logo_task: None,
            export: ExportPipeline::default(),
            preview: None,
            export_queued: false,
            status_since: None,
        }
    }
}

impl eframe::App for InvoiceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);
        self.poll_logo(ctx);

        Self::brand_bar(ctx);
        Self::footer(ctx);

        let invoice = self.store.snapshot();
        let logo = self.logo.sync(ctx, invoice.from.logo.as_deref()).cloned();

        let form = egui::SidePanel::left("invoice_form")
            .resizable(true)
            .default_width(440.0)
            .min_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.add_space(12.0);
                        let form_ctx = FormContext {
                            logo: logo.as_ref(),
                            logo_pending: self.logo_task.is_some(),
                        };
                        InvoiceForm::show(ui, &invoice, &form_ctx)
                    })
                    .inner
            })
            .inner;

        // While exporting, the pipeline decides where the preview is scrolled to.
        let scroll_override = self.export.scroll_override();
        let capturing = self.export.is_capturing();
        let preview = egui::CentralPanel::default()
            .show(ctx, |ui| {
                let mut area = egui::ScrollArea::both().auto_shrink([false, false]);
                if let Some(offset) = scroll_override {
                    area = area.scroll_offset(offset);
                }
                if capturing {
                    area = area.scroll_bar_visibility(
                        egui::scroll_area::ScrollBarVisibility::AlwaysHidden,
                    );
                }
                let output = area.show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(8.0);
                        ui.heading(RichText::new("Instant Invoice Generator").size(30.0).strong());
                        ui.label(
                            RichText::new("Create professional invoices in seconds. No sign-up required.")
                                .size(15.0)
                                .weak(),
                        );
                        ui.add_space(16.0);
                    });
                    let doc = PreviewDocument::build(&invoice);
                    let page = InvoicePreview::show(ui, &doc, logo.as_ref());
                    ui.add_space(80.0);
                    page
                });
                PreviewFrame {
                    page: output.inner,
                    viewport: output.inner_rect,
                    scroll_offset: output.state.offset,
                }
            })
            .inner;
        self.preview = Some(preview);

        if form.pick_logo && self.logo_task.is_none() {
            self.logo_task = Some(LogoLoader::spawn(ctx));
        }
        for action in form.actions {
            self.dispatch(ctx, action);
        }

        if self.export_queued {
            self.export_queued = false;
            self.export
                .request(ctx, self.preview, &invoice.invoice_number);
        }
        // Hidden for the whole capture so the buttons never land in the PDF.
        if !self.export.is_capturing() {
            self.floating_actions(ctx);
        }
        self.export.poll(ctx, self.preview, &self.settings.export);
    }
}

impl InvoiceApp {
    /// Apply an action; a change is drawn on the next frame, which is asked
    /// for right away since this frame's preview is already laid out.
    fn dispatch(&mut self, ctx: &egui::Context, action: InvoiceAction) -> bool {
        let changed = self.store.dispatch(action);
        if changed {
            ctx.request_repaint();
        }
        changed
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (reset, export) = ctx.input_mut(|i| {
            (
                i.consume_shortcut(&RESET_SHORTCUT),
                i.consume_shortcut(&EXPORT_SHORTCUT),
            )
        });
        if reset {
            self.reset(ctx);
        }
        if export {
            self.queue_export(ctx);
        }
    }

    fn poll_logo(&mut self, ctx: &egui::Context) {
        let Some(task) = &self.logo_task else {
            return;
        };
        let loaded = match task.poll() {
            TaskPoll::Pending => return,
            TaskPoll::Ready(result) => result,
            TaskPoll::Lost => {
                tracing::warn!(task = task.name(), "Logo reader stopped unexpectedly");
                Ok(None)
            }
        };
        self.logo_task = None;

        match loaded {
            Ok(Some(uri)) => {
                tracing::info!(bytes = uri.len(), "Logo loaded");
                self.dispatch(ctx, InvoiceAction::SetLogo(uri));
            }
            Ok(None) => tracing::debug!("No logo selected"),
            Err(e) => tracing::warn!("Could not load logo: {}", e),
        }
    }

    fn queue_export(&mut self, ctx: &egui::Context) {
        self.export_queued = true;
        self.status_since = None;
        self.export.acknowledge();
        ctx.request_repaint();
    }

    fn reset(&mut self, ctx: &egui::Context) {
        tracing::debug!("Resetting form");
        self.dispatch(ctx, InvoiceAction::Reset);
    }

    fn brand_bar(ctx: &egui::Context) {
        egui::TopBottomPanel::top("brand_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new("📄").size(22.0));
                ui.label(RichText::new("InvoiceGen").size(20.0).strong());
            });
            ui.add_space(6.0);
        });
    }

    fn footer(ctx: &egui::Context) {
        let year = chrono::Local::now().year();
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(6.0);
                ui.label(
                    RichText::new(format!(
                        "© {} Instant Invoice Generator. All Rights Reserved.",
                        year
                    ))
                    .weak(),
                );
                ui.label(RichText::new("Built for speed and simplicity.").small().weak());
                ui.add_space(6.0);
            });
        });
    }

    /// "Download PDF" / "Reset Form", pinned to the bottom-right corner.
    fn floating_actions(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        let finished = matches!(
            self.export.status(),
            ExportStatus::Finished(_) | ExportStatus::Cancelled | ExportStatus::Failed(_)
        );
        if finished {
            let since = *self.status_since.get_or_insert(now);
            if now - since > STATUS_LINGER {
                self.export.acknowledge();
                self.status_since = None;
            } else {
                ctx.request_repaint_after(std::time::Duration::from_secs_f64(STATUS_LINGER));
            }
        }

        let mut download = false;
        let mut reset = false;
        egui::Area::new(egui::Id::new("floating_actions"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-24.0, -56.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::top_down(egui::Align::Max), |ui| {
                    if let Some(text) = status_text(self.export.status()) {
                        ui.label(RichText::new(text).small());
                        ui.add_space(4.0);
                    }

                    let busy = self.export.is_busy();
                    let label = if busy { "Exporting…" } else { "⬇ Download PDF" };
                    let button = egui::Button::new(RichText::new(label).size(16.0))
                        .min_size(egui::vec2(160.0, 36.0));
                    download = ui
                        .add_enabled(!busy, button)
                        .on_hover_text("Ctrl/Cmd+S")
                        .clicked();
                    ui.add_space(6.0);

                    let button = egui::Button::new(RichText::new("↺ Reset Form").size(16.0))
                        .min_size(egui::vec2(160.0, 36.0));
                    reset = ui.add(button).on_hover_text("Ctrl/Cmd+Shift+N").clicked();
                });
            });

        if download {
            self.queue_export(ctx);
        }
        if reset {
            self.reset(ctx);
        }
    }
}

fn status_text(status: &ExportStatus) -> Option<String> {
    match status {
        ExportStatus::Idle => None,
        ExportStatus::Capturing | ExportStatus::Rendering => Some("Generating PDF…".to_string()),
        ExportStatus::Finished(path) => Some(format!("Saved {}", path.display())),
        ExportStatus::Cancelled => Some("Export cancelled".to_string()),
        ExportStatus::Failed(message) => Some(format!("Export failed: {}", message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogoError;
    use crate::model::LineItem;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    #[test]
    fn idle_status_shows_nothing() {
        assert_eq!(status_text(&ExportStatus::Idle), None);
    }

    #[test]
    fn finished_status_names_the_file() {
        let text = status_text(&ExportStatus::Finished(PathBuf::from("Invoice-INV-001.pdf")));
        assert_eq!(text.as_deref(), Some("Saved Invoice-INV-001.pdf"));
    }

    #[test]
    fn shortcuts_do_not_overlap() {
        assert_ne!(EXPORT_SHORTCUT.logical_key, RESET_SHORTCUT.logical_key);
        assert!(RESET_SHORTCUT.modifiers.shift);
    }

    const LOGO: &str = "data:image/png;base64,AAAA";

    fn app_with_logo() -> InvoiceApp {
        let mut store = InvoiceStore::new();
        assert!(store.set_logo(LOGO));
        InvoiceApp::with_store(store, AppSettings::default())
    }

    fn settle_logo(app: &mut InvoiceApp, ctx: &egui::Context) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.logo_task.is_some() && Instant::now() < deadline {
            app.poll_logo(ctx);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(app.logo_task.is_none(), "logo task never finished");
    }

    #[test]
    fn failed_logo_read_keeps_the_current_logo() {
        let ctx = egui::Context::default();
        let mut app = app_with_logo();
        app.logo_task = Some(Task::spawn(&ctx, "logo-read", || -> LogoResult {
            Err(LogoError::Read(std::io::Error::other("permission denied")))
        }));

        settle_logo(&mut app, &ctx);
        assert_eq!(app.store.snapshot().from.logo.as_deref(), Some(LOGO));
    }

    #[test]
    fn lost_logo_reader_keeps_the_current_logo() {
        let ctx = egui::Context::default();
        let mut app = app_with_logo();
        let revision = app.store.revision();
        app.logo_task = Some(Task::spawn(&ctx, "logo-read", || -> LogoResult {
            panic!("reader crashed")
        }));

        settle_logo(&mut app, &ctx);
        assert_eq!(app.store.snapshot().from.logo.as_deref(), Some(LOGO));
        assert_eq!(app.store.revision(), revision);
    }

    #[test]
    fn loaded_logo_replaces_the_old_one() {
        let ctx = egui::Context::default();
        let mut app = app_with_logo();
        app.logo_task = Some(Task::spawn(&ctx, "logo-read", || -> LogoResult {
            Ok(Some("data:image/png;base64,BBBB".to_string()))
        }));

        settle_logo(&mut app, &ctx);
        assert_eq!(
            app.store.snapshot().from.logo.as_deref(),
            Some("data:image/png;base64,BBBB")
        );
    }

    #[test]
    fn only_real_changes_ask_for_a_repaint() {
        let ctx = egui::Context::default();
        for _ in 0..4 {
            let _ = ctx.run(egui::RawInput::default(), |_| {});
        }
        let repaints = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&repaints);
        ctx.set_request_repaint_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut app = InvoiceApp::with_store(InvoiceStore::new(), AppSettings::default());
        let missing = LineItem::blank().id;
        assert!(!app.dispatch(&ctx, InvoiceAction::RemoveLineItem(missing)));
        assert_eq!(repaints.load(Ordering::SeqCst), 0);

        assert!(app.dispatch(&ctx, InvoiceAction::SetNotes("Net 30".to_string())));
        assert!(repaints.load(Ordering::SeqCst) > 0);
    }
}
