//! Main application state and UI coordination

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use eframe::egui;

use crate::core::config::AppConfig;
use crate::core::document::{DocumentFormat, EditorBuffer};
use crate::core::manager::DocumentManager;
use crate::ui::editor::EditorPanel;
use crate::ui::properties::PropertiesWindow;
use crate::ui::recovery::{RecoveryAction, RecoveryWindow};

/// Action held back until the user decides what to do with unsaved edits
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingAction {
    New,
    Open(PathBuf),
    PickAndOpen,
    OpenRecovered(PathBuf),
    Close,
}

/// Answer to the unsaved-changes prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnsavedChoice {
    Save,
    Discard,
    Cancel,
}

/// Main application state
pub struct RichpadApp {
    /// The open document, shared with the recovery store
    pub buffer: Rc<RefCell<EditorBuffer>>,
    /// Auto-save, recovery and properties
    pub manager: DocumentManager,
    /// Application configuration
    pub config: AppConfig,
    /// Where the configuration is saved, `None` to keep it in memory
    config_path: Option<PathBuf>,
    /// Document properties window
    properties_window: PropertiesWindow,
    /// Pending snapshots from earlier sessions
    recovery_window: RecoveryWindow,
    /// Opened document that has a snapshot waiting for a decision
    recovery_prompt: Option<PathBuf>,
    /// Action waiting on the unsaved-changes prompt
    unsaved_prompt: Option<PendingAction>,
    /// Last status bar message
    status: String,
    /// Title last sent to the viewport
    title: String,
}

impl RichpadApp {
    /// Create a new application instance
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app = Self::with_config(config, AppConfig::default_path());

        if let Some(path) = app.config.reopen_path().map(Path::to_path_buf) {
            tracing::info!("Reopening last document: {}", path.display());
            app.open_document(path);
        }
        app
    }

    fn with_config(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        let manager =
            DocumentManager::with_interval(config.recovery.recovery_dir(), config.recovery.interval());

        let mut recovery_window = RecoveryWindow::default();
        recovery_window.refresh(&manager);
        recovery_window.open = recovery_window.has_entries();
        if recovery_window.open {
            tracing::info!("Found unsaved documents from a previous session");
        }

        Self {
            buffer: Rc::new(RefCell::new(EditorBuffer::untitled())),
            manager,
            config,
            config_path,
            properties_window: PropertiesWindow::default(),
            recovery_window,
            recovery_prompt: None,
            unsaved_prompt: None,
            status: String::from("Ready"),
            title: String::new(),
        }
    }

    fn save_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            tracing::warn!("Failed to save config: {:#}", e);
        }
    }

    fn file_dialog() -> rfd::FileDialog {
        rfd::FileDialog::new()
            .add_filter("HTML Documents", &["html", "htm"])
            .add_filter("Text Documents", &["txt"])
            .add_filter("Rich Text Documents", &["rtf"])
    }

    /// Run `action`, asking first when it would drop unsaved edits
    fn request(&mut self, ctx: &egui::Context, action: PendingAction) {
        if self.buffer.borrow().modified {
            self.unsaved_prompt = Some(action);
        } else {
            self.perform(ctx, action);
        }
    }

    fn perform(&mut self, ctx: &egui::Context, action: PendingAction) {
        match action {
            PendingAction::New => self.new_document(),
            PendingAction::Open(path) => self.open_document(path),
            PendingAction::PickAndOpen => self.pick_and_open(),
            PendingAction::OpenRecovered(path) => self.open_recovered(path),
            PendingAction::Close => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
        }
    }

    fn resolve_unsaved_prompt(&mut self, ctx: &egui::Context, choice: UnsavedChoice) {
        let Some(action) = self.unsaved_prompt.take() else {
            return;
        };

        match choice {
            UnsavedChoice::Save => {
                // A failed or cancelled save keeps the document open
                if self.save_document() {
                    self.perform(ctx, action);
                }
            }
            UnsavedChoice::Discard => {
                self.discard_changes();
                self.perform(ctx, action);
            }
            UnsavedChoice::Cancel => {}
        }
    }

    /// Forget the edits and the snapshot that holds them
    fn discard_changes(&mut self) {
        if let Some(path) = self.manager.active_path() {
            self.manager.clear_recovery_snapshot(path);
        }
        self.buffer.borrow_mut().modified = false;
    }

    /// Start a fresh untitled document
    fn new_document(&mut self) {
        self.manager.end();
        *self.buffer.borrow_mut() = EditorBuffer::untitled();
        self.manager.clear_properties();
        self.recovery_prompt = None;
        self.status = String::from("New document");
    }

    /// Open a document, asking first if a recovery snapshot exists for it
    fn open_document(&mut self, path: PathBuf) {
        let doc = match EditorBuffer::open(&path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!("Failed to open document: {:#}", e);
                self.status = format!("Could not open {}", path.display());
                return;
            }
        };

        self.manager.end();
        self.manager.clear_properties();
        *self.buffer.borrow_mut() = doc;
        self.config.add_recent_file(path.clone());
        self.save_config();

        if self.manager.has_recovery_snapshot(&path) {
            // Auto-save waits for the answer so the snapshot is not overwritten
            self.recovery_prompt = Some(path);
        } else {
            self.recovery_prompt = None;
            self.start_auto_save(&path);
            self.status = String::from("File loaded");
        }
    }

    /// Restore a snapshot whose original file may no longer exist
    fn open_recovered(&mut self, path: PathBuf) {
        if path.exists() {
            self.open_document(path);
            return;
        }

        let mut doc = EditorBuffer::untitled();
        doc.path = Some(path.clone());
        doc.format = DocumentFormat::from_path(&path);
        if !self.manager.recover(&mut doc, &path) {
            self.status = format!("Could not recover {}", path.display());
            self.recovery_window.refresh(&self.manager);
            return;
        }

        self.manager.end();
        *self.buffer.borrow_mut() = doc;
        self.recovery_prompt = None;
        self.start_auto_save(&path);
        self.status = format!("Recovered {}", path.display());
    }

    fn resolve_recovery_prompt(&mut self, recover: bool) {
        let Some(path) = self.recovery_prompt.take() else {
            return;
        };

        if recover {
            let recovered = self.manager.recover(&mut *self.buffer.borrow_mut(), &path);
            self.status = if recovered {
                String::from("Unsaved changes recovered")
            } else {
                String::from("Recovery failed")
            };
        } else {
            self.manager.clear_recovery_snapshot(&path);
            self.status = String::from("File loaded");
        }
        self.start_auto_save(&path);
    }

    fn start_auto_save(&mut self, path: &Path) {
        self.manager.begin(self.buffer.clone(), path);
    }

    /// Save the document, asking for a path if it has none
    fn save_document(&mut self) -> bool {
        let Some(path) = self.buffer.borrow().path.clone() else {
            return self.save_document_as();
        };

        let result = self.buffer.borrow_mut().save();
        match result {
            Ok(()) => {
                self.manager.clear_recovery_snapshot(&path);
                self.status = String::from("File saved");
                true
            }
            Err(e) => {
                tracing::error!("Failed to save document: {:#}", e);
                self.status = String::from("Save failed");
                false
            }
        }
    }

    /// Save under a new path chosen by the user
    fn save_document_as(&mut self) -> bool {
        match Self::file_dialog().save_file() {
            Some(path) => self.save_document_to(path),
            None => false,
        }
    }

    fn save_document_to(&mut self, path: PathBuf) -> bool {
        let previous = self.buffer.borrow().path.clone();
        let result = self.buffer.borrow_mut().save_as(path.clone());
        if let Err(e) = result {
            tracing::error!("Failed to save document: {:#}", e);
            self.status = String::from("Save failed");
            return false;
        }

        if let Some(previous) = previous {
            self.manager.clear_recovery_snapshot(&previous);
        }

        // Properties follow the document unless the target already has its own
        let carried = self.manager.all_properties().clone();
        self.start_auto_save(&path);
        if self.manager.all_properties().is_empty() {
            for (key, value) in carried {
                self.manager.set_property(key, value);
            }
        }

        self.config.add_recent_file(path);
        self.save_config();
        self.status = String::from("File saved");
        true
    }

    fn pick_and_open(&mut self) {
        if let Some(path) = Self::file_dialog()
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.open_document(path);
        }
    }

    /// Hold the window open while there are unsaved edits, otherwise shut down
    fn handle_close_request(&mut self, ctx: &egui::Context) {
        if self.buffer.borrow().modified {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.unsaved_prompt = Some(PendingAction::Close);
            return;
        }
        self.shutdown(ctx);
    }

    /// Persist settings and leave the recovery state consistent before exit
    fn shutdown(&mut self, ctx: &egui::Context) {
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window.width = rect.width();
            self.config.window.height = rect.height();
        }
        self.save_config();

        // Only the tracked document is touched; a snapshot still waiting on
        // the recovery prompt stays for the next session
        if let Some(path) = self.manager.active_path().map(Path::to_path_buf) {
            if self.buffer.borrow().modified {
                self.manager.snapshot_now();
            } else {
                self.manager.clear_recovery_snapshot(&path);
            }
        }
        self.manager.end();
        tracing::info!("Shutting down");
    }

    fn update_title(&mut self, ctx: &egui::Context) {
        let title = {
            let buffer = self.buffer.borrow();
            let marker = if buffer.modified { "*" } else { "" };
            format!("{}{} - Richpad", buffer.title(), marker)
        };
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.request(ctx, PendingAction::New);
                        ui.close();
                    }
                    if ui.button("Open...").clicked() {
                        ui.close();
                        self.request(ctx, PendingAction::PickAndOpen);
                    }
                    ui.menu_button("Open Recent", |ui| {
                        if self.config.recent_files.is_empty() {
                            ui.weak("No recent files");
                        }
                        for path in self.config.recent_files.clone() {
                            if ui.button(path.display().to_string()).clicked() {
                                ui.close();
                                self.request(ctx, PendingAction::Open(path));
                            }
                        }
                    });
                    ui.separator();
                    if ui.button("Save").clicked() {
                        ui.close();
                        self.save_document();
                    }
                    if ui.button("Save As...").clicked() {
                        ui.close();
                        self.save_document_as();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Document", |ui| {
                    if ui.button("Properties...").clicked() {
                        self.properties_window.open = true;
                        ui.close();
                    }
                    if ui.button("Recover Documents...").clicked() {
                        self.recovery_window.refresh(&self.manager);
                        self.recovery_window.open = true;
                        ui.close();
                    }
                });
            });
        });
    }

    fn render_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let auto_save = if self.manager.is_active() {
                        format!("Auto-save every {}s", self.manager.interval().as_secs())
                    } else {
                        String::from("Auto-save off")
                    };
                    ui.weak(auto_save);
                    ui.separator();
                    ui.weak(format!("{} properties", self.manager.all_properties().len()));
                });
            });
        });
    }

    fn render_recovery_prompt(&mut self, ctx: &egui::Context) {
        let Some(path) = self.recovery_prompt.clone() else {
            return;
        };

        let mut choice = None;
        egui::Window::new("Recover Document")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Unsaved changes to {} were found from a previous session.",
                    path.display()
                ));
                ui.label("Do you want to recover them?");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Recover").clicked() {
                        choice = Some(true);
                    }
                    if ui.button("Discard").clicked() {
                        choice = Some(false);
                    }
                });
            });

        if let Some(recover) = choice {
            self.resolve_recovery_prompt(recover);
        }
    }

    fn render_unsaved_prompt(&mut self, ctx: &egui::Context) {
        if self.unsaved_prompt.is_none() {
            return;
        }

        let title = self.buffer.borrow().title();
        let mut choice = None;
        egui::Window::new("Unsaved Changes")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!("{title} has been modified."));
                ui.label("Do you want to save your changes?");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        choice = Some(UnsavedChoice::Save);
                    }
                    if ui.button("Discard").clicked() {
                        choice = Some(UnsavedChoice::Discard);
                    }
                    if ui.button("Cancel").clicked() {
                        choice = Some(UnsavedChoice::Cancel);
                    }
                });
            });

        if let Some(choice) = choice {
            self.resolve_unsaved_prompt(ctx, choice);
        }
    }
}

impl eframe::App for RichpadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle keyboard shortcuts
        let (save, open, new) = ctx.input(|i| {
            (
                i.modifiers.ctrl && i.key_pressed(egui::Key::S),
                i.modifiers.ctrl && i.key_pressed(egui::Key::O),
                i.modifiers.ctrl && i.key_pressed(egui::Key::N),
            )
        });
        if save {
            self.save_document();
        }
        if open {
            self.request(ctx, PendingAction::PickAndOpen);
        }
        if new {
            self.request(ctx, PendingAction::New);
        }

        let now = Instant::now();
        if let Some(written) = self.manager.poll(now) {
            tracing::debug!("Auto-saved recovery snapshot: {}", written.display());
        }
        if let Some(wait) = self.manager.time_until_next_snapshot(now) {
            ctx.request_repaint_after(wait);
        }

        self.render_menu_bar(ctx);
        self.render_status_bar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            EditorPanel::show(ui, self);
        });

        self.properties_window.show(ctx, &mut self.manager);
        match self.recovery_window.show(ctx) {
            Some(RecoveryAction::Open(path)) => self.request(ctx, PendingAction::OpenRecovered(path)),
            Some(RecoveryAction::Discard(path)) => {
                self.manager.clear_recovery_snapshot(&path);
                self.recovery_window.refresh(&self.manager);
            }
            None => {}
        }
        self.render_recovery_prompt(ctx);
        self.render_unsaved_prompt(ctx);

        self.update_title(ctx);

        if ctx.input(|i| i.viewport().close_requested()) {
            self.handle_close_request(ctx);
        }
    }
}
