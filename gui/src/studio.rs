use std::path::{Path, PathBuf};

use eframe::egui::{self, Color32, RichText, TextEdit, Ui};
use eyre::WrapErr;
use ::studio::{Feedback, Field, StudioForm, settings};

use crate::ui::status_bar::{StatusBar, StatusState};

/// The instructor-facing settings editor.
pub(crate) struct StudioApp {
    form: StudioForm,
    path: PathBuf,
    status: StatusState,
    show_api_key: bool,
}

impl StudioApp {
    pub fn new(settings_path: &Path) -> eyre::Result<Self> {
        let form = if settings_path.exists() {
            let settings =
                settings::load_from_path(settings_path).wrap_err("loading studio settings")?;
            StudioForm::from_settings(&settings)
        } else {
            tracing::debug!(path = %settings_path.display(), "no settings file, starting fresh");
            StudioForm::new()
        };

        Ok(Self {
            form,
            path: settings_path.to_path_buf(),
            status: Default::default(),
            show_api_key: false,
        })
    }

    fn save(&mut self) {
        match self.form.collect() {
            Ok(settings) => match settings::save_to_path(&settings, &self.path) {
                Ok(()) => self.status.push_info("Settings saved"),
                Err(e) => self.status.push_error(format!("Could not save: {e}")),
            },
            Err(errors) => {
                for error in errors {
                    self.status.push_error(error);
                }
            }
        }
    }

    fn render_scalar_fields(&mut self, ui: &mut Ui) {
        ui.heading("Exercise");
        text_field(ui, "Display name", &mut self.form.display_name, false);

        ui.heading("Execution service");
        text_field(ui, "API URL", &mut self.form.judge0_api_url, false);
        ui.horizontal(|ui| {
            text_field(
                ui,
                "API key",
                &mut self.form.judge0_api_key,
                !self.show_api_key,
            );
            ui.checkbox(&mut self.show_api_key, "Show");
        });
        text_field(ui, "API host", &mut self.form.judge0_api_host, false);

        ui.heading("Limits");
        text_field(ui, "Maximum score", &mut self.form.max_score, false);
        text_field(
            ui,
            "Time limit (seconds)",
            &mut self.form.execution_time_limit,
            false,
        );
        text_field(ui, "Memory limit (KB)", &mut self.form.memory_limit, false);
        text_field(ui, "Maximum files", &mut self.form.max_files, false);
    }

    fn render_test_cases(&mut self, ui: &mut Ui) {
        ui.heading("Test cases");
        let mut remove = None;
        for (index, block) in self.form.test_cases.iter_mut().enumerate() {
            let title = if block.name.value.trim().is_empty() {
                format!("Test case {}", index + 1)
            } else {
                block.name.value.clone()
            };
            egui::CollapsingHeader::new(title)
                .id_salt(&block.id)
                .show(ui, |ui| {
                    text_field(ui, "Name", &mut block.name, false);
                    text_field(ui, "Points", &mut block.points, false);
                    text_field(ui, "Timeout (seconds)", &mut block.timeout, false);
                    text_field(ui, "Input", &mut block.input, false);
                    text_field(ui, "Expected output", &mut block.expected_output, false);
                    ui.checkbox(&mut block.is_public, "Visible to students");
                    if ui.button("Remove").clicked() {
                        remove = Some(index);
                    }
                });
        }
        if let Some(index) = remove
            && let Err(e) = self.form.remove_test_case(index)
        {
            self.status.push_error(e);
        }
        if ui.button("Add test case").clicked() {
            self.form.add_test_case();
        }
    }

    fn render_languages(&mut self, ui: &mut Ui) {
        ui.heading("Languages");
        let mut remove = None;
        for (index, block) in self.form.languages.iter_mut().enumerate() {
            let title = if block.name.value.trim().is_empty() {
                format!("Language {}", index + 1)
            } else {
                block.name.value.clone()
            };
            egui::CollapsingHeader::new(title)
                .id_salt(&block.id)
                .show(ui, |ui| {
                    text_field(ui, "Key", &mut block.key, false);
                    text_field(ui, "Name", &mut block.name, false);
                    text_field(ui, "Engine id", &mut block.engine_id, false);
                    text_field(ui, "File extension", &mut block.extension, false);
                    text_field(ui, "Template", &mut block.template, false);
                    if ui.button("Remove").clicked() {
                        remove = Some(index);
                    }
                });
        }
        if let Some(index) = remove
            && let Err(e) = self.form.remove_language(index)
        {
            self.status.push_error(e);
        }
        if ui.button("Add language").clicked() {
            self.form.add_language();
        }
    }
}

/// A labelled single-line input with inline validation feedback.
fn text_field(ui: &mut Ui, label: &str, field: &mut Field, masked: bool) {
    ui.horizontal(|ui| {
        ui.label(label);
        let edit = TextEdit::singleline(&mut field.value).password(masked);
        if ui.add(edit).changed() {
            field.validate();
        }
        match &field.feedback {
            Feedback::None => {}
            Feedback::Valid => {
                ui.label(RichText::new("✔").color(Color32::from_rgb(80, 200, 80)));
            }
            Feedback::Invalid(message) => {
                ui.label(RichText::new(message).color(Color32::from_rgb(255, 80, 80)));
            }
        }
    });
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("studio-header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Exercise Studio");
                ui.separator();
                let can_save = self.form.is_valid();
                if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                    self.save();
                }
                if !can_save {
                    ui.label(RichText::new("Fix the highlighted fields to save").weak());
                }
            });
        });
        egui::TopBottomPanel::bottom("studio-status")
            .exact_height(24.0)
            .show(ctx, |ui| {
                ui.add(StatusBar::new("Studio", &mut self.status));
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_scalar_fields(ui);
                ui.separator();
                self.render_test_cases(ui);
                ui.separator();
                self.render_languages(ui);
            });
        });
    }
}
