//! Recovery window listing snapshots left behind by an earlier session

use std::path::PathBuf;

use eframe::egui;

use crate::core::manager::DocumentManager;

/// What the user picked in the recovery window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    Open(PathBuf),
    Discard(PathBuf),
}

#[derive(Debug, Default)]
pub struct RecoveryWindow {
    pub open: bool,
    entries: Vec<PathBuf>,
}

impl RecoveryWindow {
    /// Re-scan the recovery directory
    pub fn refresh(&mut self, manager: &DocumentManager) {
        self.entries = manager.pending_recovery_snapshots();
    }

    pub fn has_entries(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<RecoveryAction> {
        let mut open = self.open;
        let mut action = None;

        egui::Window::new("Recover Documents")
            .open(&mut open)
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| {
                if self.entries.is_empty() {
                    ui.label("No unsaved documents to recover.");
                    return;
                }

                ui.label("These documents have unsaved changes from a previous session:");
                ui.add_space(6.0);

                egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                    for path in &self.entries {
                        ui.horizontal(|ui| {
                            ui.label(path.display().to_string());
                            if ui.small_button("Open").clicked() {
                                action = Some(RecoveryAction::Open(path.clone()));
                            }
                            if ui.small_button("Discard").clicked() {
                                action = Some(RecoveryAction::Discard(path.clone()));
                            }
                        });
                    }
                });
            });

        self.open = open;
        if let Some(RecoveryAction::Open(_)) = action {
            self.open = false;
        }
        action
    }
}
