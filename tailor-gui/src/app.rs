use eframe::egui;
use std::sync::mpsc::{self, Receiver};

use tailor_core::{Card, FileStorage, FormMode, SaveError, SaveOutcome, Session, Settings};
use tailor_offline::{CacheStorage, HttpNetwork, OfflineCache};

/// Action requested from a card's buttons, applied after the list is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardAction {
    Edit(usize),
    Delete(usize),
}

pub struct TailorApp {
    session: Session<FileStorage>,
    search_text: String,
    form_visible: bool,
    scroll_to_form: bool,
    /// Blocking notice; the rest of the window is disabled while it is shown
    alert: Option<String>,
    message: Option<(String, bool)>, // (message, is_error)
    asset_status: Option<String>,
    asset_rx: Option<Receiver<String>>,
}

impl TailorApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, session: Session<FileStorage>, settings: &Settings) -> Self {
        let asset_rx = settings
            .asset_origin
            .clone()
            .map(|origin| spawn_asset_install(origin, settings));

        Self {
            session,
            search_text: String::new(),
            form_visible: false,
            scroll_to_form: false,
            alert: None,
            message: None,
            asset_status: asset_rx.as_ref().map(|_| "Caching app assets...".to_string()),
            asset_rx,
        }
    }

    fn save(&mut self) {
        match self.session.save() {
            Ok(SaveOutcome::Created(record)) => {
                self.message = Some((format!("Saved measurements for {}", record.name), false));
            }
            Ok(SaveOutcome::Updated(record)) => {
                self.message = Some((format!("Updated measurements for {}", record.name), false));
            }
            Err(SaveError::Validation(e)) => {
                self.alert = Some(e.to_string());
            }
            Err(SaveError::Storage(e)) => {
                log::error!("Save failed: {e:#}");
                self.message = Some((format!("Save failed: {e}"), true));
            }
        }
    }

    fn apply_card_action(&mut self, action: CardAction) {
        match action {
            CardAction::Edit(display_index) => match self.session.start_edit(display_index) {
                Ok(()) => {
                    self.form_visible = true;
                    self.scroll_to_form = true;
                }
                Err(e) => self.message = Some((format!("Cannot edit: {e}"), true)),
            },
            CardAction::Delete(display_index) => match self.session.delete(display_index) {
                Ok(removed) => {
                    self.message = Some((format!("Deleted {}", removed.name), false));
                }
                Err(e) => {
                    log::error!("Delete failed: {e:#}");
                    self.message = Some((format!("Delete failed: {e}"), true));
                }
            },
        }
    }

    fn poll_asset_install(&mut self) {
        if let Some(rx) = &self.asset_rx {
            if let Ok(status) = rx.try_recv() {
                self.asset_status = Some(status);
                self.asset_rx = None;
            }
        }
    }

    fn show_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Client Measurements");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.search_text)
                            .hint_text("Search by client name...")
                            .desired_width(220.0),
                    );
                    if response.changed() {
                        self.session.set_query(&self.search_text);
                    }
                    ui.label("🔍");
                });
            });
        });
    }

    fn show_status_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some((message, is_error)) = &self.message {
                    let color = if *is_error {
                        egui::Color32::LIGHT_RED
                    } else {
                        egui::Color32::LIGHT_GREEN
                    };
                    ui.colored_label(color, message);
                }
                if let Some(status) = &self.asset_status {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.weak(status);
                    });
                }
            });
        });
    }

    fn show_form(&mut self, ui: &mut egui::Ui) {
        let editing = matches!(self.session.form.mode(), FormMode::Editing(_));
        let toggle_text = if self.form_visible {
            "▼ Hide Form"
        } else if editing {
            "▶ Edit Measurements"
        } else {
            "▶ Add Measurements"
        };

        let toggle = ui.button(toggle_text);
        if toggle.clicked() {
            self.form_visible = !self.form_visible;
        }
        if self.scroll_to_form {
            toggle.scroll_to_me(Some(egui::Align::TOP));
            self.scroll_to_form = false;
        }

        if !self.form_visible {
            return;
        }

        ui.group(|ui| {
            ui.label(if editing {
                "Editing client record"
            } else {
                "New client record"
            });
            ui.add_space(4.0);

            egui::Grid::new("measurement_form")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    for input in self.session.form.inputs_mut() {
                        ui.label(format!("{}:", input.label));
                        if input.name == "comments" {
                            ui.add(
                                egui::TextEdit::multiline(&mut input.value)
                                    .desired_rows(3)
                                    .desired_width(280.0),
                            );
                        } else {
                            ui.add(
                                egui::TextEdit::singleline(&mut input.value).desired_width(280.0),
                            );
                        }
                        ui.end_row();
                    }
                });

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui.button("💾 Save Measurements").clicked() {
                    self.save();
                }
                if editing && ui.button("Cancel Edit").clicked() {
                    self.session.form.cancel_edit();
                }
            });
        });
    }

    fn show_cards(&mut self, ui: &mut egui::Ui) -> Option<CardAction> {
        let scroll_to = self.session.take_scroll_target();
        let cards = self.session.cards();
        let mut action = None;

        if cards.is_empty() {
            ui.weak("No measurements recorded yet.");
            return None;
        }

        for card in cards.visible() {
            let response = show_card(ui, card, &mut action);
            if scroll_to == Some(card.display_index) {
                response.scroll_to_me(Some(egui::Align::TOP));
            }
            ui.add_space(6.0);
        }

        if cards.visible().next().is_none() {
            ui.weak(format!("No client name matches '{}'.", self.session.query()));
        }
        action
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(alert) = self.alert.clone() else {
            return;
        };
        egui::Window::new("⚠ Cannot Save")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(alert);
                ui.add_space(10.0);
                let enter = ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("OK").clicked() || enter {
                    self.alert = None;
                }
            });
    }
}

/// Draws one card: summary, collapsible detail table, action buttons
fn show_card(ui: &mut egui::Ui, card: &Card, action: &mut Option<CardAction>) -> egui::Response {
    ui.group(|ui| {
        ui.set_min_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.label("Client:");
            ui.strong(&card.name);
        });
        ui.horizontal(|ui| {
            ui.label("Phone:");
            ui.label(&card.phone);
        });
        ui.horizontal(|ui| {
            ui.label("Recorded:");
            ui.label(&card.timestamp);
        });

        egui::CollapsingHeader::new("View Detailed Measurements")
            .id_salt(card.id)
            .show(ui, |ui| {
                egui::Grid::new(("details", card.id))
                    .striped(true)
                    .num_columns(2)
                    .show(ui, |ui| {
                        for row in &card.details {
                            ui.label(format!("{}:", row.label));
                            ui.label(&row.value);
                            ui.end_row();
                        }
                    });
                if let Some(comments) = &card.comments {
                    ui.add_space(4.0);
                    ui.horizontal_wrapped(|ui| {
                        ui.strong("Comments:");
                        ui.label(comments);
                    });
                }
            });

        ui.horizontal(|ui| {
            if ui.button("Edit").clicked() {
                *action = Some(CardAction::Edit(card.display_index));
            }
            if ui.button("Delete").clicked() {
                *action = Some(CardAction::Delete(card.display_index));
            }
        });
    })
    .response
}

/// Installs the application shell into the offline cache on a worker thread
fn spawn_asset_install(origin: String, settings: &Settings) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let cache_dir = settings.cache_dir.clone();
    let bucket = settings.cache_bucket.clone();

    std::thread::spawn(move || {
        let status = match install_assets(&origin, cache_dir, &bucket) {
            Ok(count) => format!("{} app asset(s) cached ({})", count, bucket),
            Err(e) => {
                log::warn!("Asset cache install failed: {e:#}");
                format!("Asset caching failed: {e}")
            }
        };
        let _ = tx.send(status);
    });

    rx
}

fn install_assets(origin: &str, cache_dir: std::path::PathBuf, bucket: &str) -> anyhow::Result<usize> {
    let runtime = tokio::runtime::Runtime::new()?;
    let network = HttpNetwork::new(origin)?;
    let cache = OfflineCache::new(CacheStorage::new(cache_dir), bucket, network);
    Ok(runtime.block_on(cache.install_shell())?)
}

impl eframe::App for TailorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_asset_install();
        if self.asset_rx.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }

        self.show_top_panel(ctx);
        self.show_status_panel(ctx);

        let enabled = self.alert.is_none();
        let mut pending = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.show_form(ui);
                        ui.separator();
                        pending = self.show_cards(ui);
                    });
            });
        });

        if let Some(action) = pending {
            self.apply_card_action(action);
        }

        self.show_alert(ctx);
    }
}
