use eframe::egui::{self, Align2, Context, Key};
use protocol::types::LanguageConfig;

/// Modal state for the file operations that need user input or
/// confirmation before a command goes to the bridge.
#[derive(Clone)]
pub(crate) enum Dialog {
    NewFile { name: String, language: String },
    Rename { name: String },
    ConfirmDelete { name: String },
    ConfirmSubmit,
}

#[derive(Clone, Copy, PartialEq)]
pub(crate) enum DialogOutcome {
    Open,
    Confirmed,
    Cancelled,
}

/// Render the dialog. The caller reads the dialog's fields on
/// `Confirmed` and drops it on anything but `Open`.
pub(crate) fn show(ctx: &Context, dialog: &mut Dialog, languages: &[LanguageConfig]) -> DialogOutcome {
    let mut outcome = DialogOutcome::Open;

    let title = match dialog {
        Dialog::NewFile { .. } => "New file",
        Dialog::Rename { .. } => "Rename file",
        Dialog::ConfirmDelete { .. } => "Delete file",
        Dialog::ConfirmSubmit => "Submit solution",
    };

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, (0.0, 0.0))
        .show(ctx, |ui| {
            match dialog {
                Dialog::NewFile { name, language } => {
                    ui.horizontal(|ui| {
                        ui.label("Name");
                        ui.text_edit_singleline(name).request_focus();
                    });
                    egui::ComboBox::from_label("Language")
                        .selected_text(language_name(languages, language))
                        .show_ui(ui, |ui| {
                            for l in languages {
                                ui.selectable_value(language, l.key.clone(), &l.name);
                            }
                        });
                }
                Dialog::Rename { name } => {
                    ui.horizontal(|ui| {
                        ui.label("New name");
                        ui.text_edit_singleline(name).request_focus();
                    });
                }
                Dialog::ConfirmDelete { name } => {
                    ui.label(format!("Delete {name}? This cannot be undone."));
                }
                Dialog::ConfirmSubmit => {
                    ui.label("Submit your solution for grading?");
                }
            }

            ui.separator();
            ui.horizontal(|ui| {
                let confirm_label = match dialog {
                    Dialog::NewFile { .. } => "Create",
                    Dialog::Rename { .. } => "Rename",
                    Dialog::ConfirmDelete { .. } => "Delete",
                    Dialog::ConfirmSubmit => "Submit",
                };
                if ui.button(confirm_label).clicked() {
                    outcome = DialogOutcome::Confirmed;
                }
                if ui.button("Cancel").clicked() {
                    outcome = DialogOutcome::Cancelled;
                }
            });
        });

    if ctx.input(|i| i.key_pressed(Key::Enter)) {
        outcome = DialogOutcome::Confirmed;
    }
    if ctx.input(|i| i.key_pressed(Key::Escape)) {
        outcome = DialogOutcome::Cancelled;
    }

    outcome
}

fn language_name<'a>(languages: &'a [LanguageConfig], key: &'a str) -> &'a str {
    languages
        .iter()
        .find(|l| l.key == key)
        .map(|l| l.name.as_str())
        .unwrap_or(key)
}
