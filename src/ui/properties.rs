//! Document properties window

use eframe::egui;

use crate::core::manager::DocumentManager;
use crate::core::properties::PropertyValue;

/// Editable list of the active document's properties
#[derive(Debug, Default)]
pub struct PropertiesWindow {
    pub open: bool,
    new_key: String,
    new_value: String,
}

enum Edit {
    Set(String, PropertyValue),
    Remove(String),
    Clear,
}

impl PropertiesWindow {
    pub fn show(&mut self, ctx: &egui::Context, manager: &mut DocumentManager) {
        let mut open = self.open;
        let mut edit = None;

        egui::Window::new("Document Properties")
            .open(&mut open)
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| {
                if !manager.is_active() {
                    ui.label("Save the document to keep its properties.");
                    ui.separator();
                }

                egui::Grid::new("properties_grid")
                    .num_columns(3)
                    .striped(true)
                    .show(ui, |ui| {
                        for (key, value) in manager.all_properties() {
                            ui.label(key);
                            ui.label(value.to_string());
                            if ui.small_button("Remove").clicked() {
                                edit = Some(Edit::Remove(key.clone()));
                            }
                            ui.end_row();
                        }
                    });

                if manager.all_properties().is_empty() {
                    ui.weak("No properties");
                }

                ui.separator();
                ui.horizontal(|ui| {
                    ui.add(egui::TextEdit::singleline(&mut self.new_key).hint_text("Name").desired_width(120.0));
                    ui.add(egui::TextEdit::singleline(&mut self.new_value).hint_text("Value").desired_width(160.0));
                    let key = self.new_key.trim();
                    if ui.add_enabled(!key.is_empty(), egui::Button::new("Set")).clicked() {
                        edit = Some(Edit::Set(key.to_string(), PropertyValue::parse(&self.new_value)));
                    }
                });

                ui.add_space(4.0);
                if ui
                    .add_enabled(!manager.all_properties().is_empty(), egui::Button::new("Clear All"))
                    .clicked()
                {
                    edit = Some(Edit::Clear);
                }
            });

        self.open = open;

        let persisted = match edit {
            Some(Edit::Set(key, value)) => {
                self.new_key.clear();
                self.new_value.clear();
                manager.set_property(key, value)
            }
            Some(Edit::Remove(key)) => manager.remove_property(&key),
            Some(Edit::Clear) => manager.clear_properties(),
            None => true,
        };
        if !persisted {
            tracing::error!("Document properties could not be written");
        }
    }
}
