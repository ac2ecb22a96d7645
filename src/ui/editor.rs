//! Document editor panel

use eframe::egui;

use crate::app::RichpadApp;

/// Text editor panel
pub struct EditorPanel;

impl EditorPanel {
    /// Show the editor panel
    pub fn show(ui: &mut egui::Ui, app: &mut RichpadApp) {
        let font = egui::FontId::proportional(app.config.editor.font_size);

        egui::ScrollArea::vertical()
            .id_salt("editor_scroll")
            .show(ui, |ui| {
                let mut buffer = app.buffer.borrow_mut();
                let response = egui::TextEdit::multiline(&mut buffer.content)
                    .font(font)
                    .desired_width(f32::INFINITY)
                    .desired_rows(30)
                    .frame(false)
                    .show(ui);

                if response.response.changed() {
                    buffer.mark_changed();
                }
            });
    }
}
