use std::{path::Path, sync::Arc, time::Duration};

use eframe::egui::{self, Color32, Context, Key, Modifiers, RichText, Ui};
use eyre::{WrapErr, eyre};
use protocol::client::HttpClient;
use workspace::{AutosavePolicy, Event, ExecutionKind, Workspace, snapshot};

use crate::{
    bridge::{Bridge, UiCommand},
    editor::CodeEditor,
    ui::{
        dialogs::{self, Dialog, DialogOutcome},
        status_bar::{StatusBar, StatusState},
    },
    view_model::{LineStyle, OutputTab, StudentViewModel},
};

pub(crate) struct StudentApp {
    bridge: Bridge,
    event_rx: crossbeam_channel::Receiver<Event>,
    model: StudentViewModel,
    status: StatusState,
    dialog: Option<Dialog>,
    stdin: String,
}

impl StudentApp {
    pub fn new(
        snapshot_path: &Path,
        config: &config::Config,
        cc: &eframe::CreationContext<'_>,
    ) -> eyre::Result<Self> {
        let snapshot = snapshot::load_from_path(snapshot_path).wrap_err("loading snapshot")?;
        tracing::debug!(
            files = snapshot.student_files.len(),
            handler_base = %snapshot.handler_base,
            "loaded workspace snapshot"
        );

        let model = StudentViewModel::from_snapshot(&snapshot);

        let client = Arc::new(HttpClient::with_timeout(
            snapshot.handler_base.clone(),
            Duration::from_secs(config.request_timeout_secs),
        ));
        let policy = AutosavePolicy {
            debounce: Duration::from_secs(config.autosave.debounce_secs),
            interval: Duration::from_secs(config.autosave.interval_secs),
        };

        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(2)
            .build()
            .map_err(|e| eyre!("failed to create tokio runtime: {e}"))?;

        // The workspace spawns its autosave task on creation, so it has
        // to be built inside the runtime context.
        let mut workspace = {
            let _guard = rt.enter();
            Workspace::new(snapshot, client, policy).wrap_err("creating workspace")?
        };
        let event_receiver = workspace
            .take_events()
            .ok_or_else(|| eyre!("workspace event stream already taken"))?;

        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let bridge = Bridge::spawn(
            workspace,
            event_receiver,
            event_tx,
            cc.egui_ctx.clone(),
            rt,
        );

        Ok(Self {
            bridge,
            event_rx,
            model,
            status: Default::default(),
            dialog: None,
            stdin: String::new(),
        })
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        if self.dialog.is_some() {
            return;
        }
        if ctx.input(|i| i.key_pressed(Key::S) && i.modifiers.matches_exact(Modifiers::CTRL)) {
            self.bridge.send(UiCommand::SaveNow);
        }
        if ctx.input(|i| {
            i.key_pressed(Key::Enter)
                && i.modifiers.matches_exact(Modifiers::CTRL | Modifiers::SHIFT)
        }) {
            self.dialog = Some(Dialog::ConfirmSubmit);
        } else if ctx
            .input(|i| i.key_pressed(Key::Enter) && i.modifiers.matches_exact(Modifiers::CTRL))
        {
            self.send_run();
        }
    }

    fn send_run(&self) {
        self.bridge.send(UiCommand::Run {
            stdin: self.stdin.clone(),
        });
    }

    fn handle_dialog(&mut self, ctx: &Context) {
        let Some(mut dialog) = self.dialog.take() else {
            return;
        };
        match dialogs::show(ctx, &mut dialog, &self.model.languages) {
            DialogOutcome::Open => self.dialog = Some(dialog),
            DialogOutcome::Cancelled => {}
            DialogOutcome::Confirmed => match dialog {
                Dialog::NewFile { name, language } => {
                    self.bridge.send(UiCommand::CreateFile { name, language });
                }
                Dialog::Rename { name } => {
                    self.bridge.send(UiCommand::RenameFile { new_name: name });
                }
                Dialog::ConfirmDelete { name } => {
                    self.bridge.send(UiCommand::DeleteFile { name });
                }
                Dialog::ConfirmSubmit => {
                    self.bridge.send(UiCommand::Submit);
                }
            },
        }
    }

    fn render_header(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Coding Exercise");
                ui.separator();
                let scores = self.model.scores;
                ui.label(format!(
                    "Score: {}/{} | Best: {} | Submissions: {}",
                    crate::view_model::fmt_number(scores.current),
                    crate::view_model::fmt_number(scores.max),
                    crate::view_model::fmt_number(scores.best),
                    scores.submissions,
                ));
            });

            ui.horizontal(|ui| {
                let idle = self.model.executing.is_none();
                if ui.add_enabled(idle, egui::Button::new("▶ Run")).clicked() {
                    self.send_run();
                }
                if ui.add_enabled(idle, egui::Button::new("Submit")).clicked() {
                    self.dialog = Some(Dialog::ConfirmSubmit);
                }
                if let Some(kind) = self.model.executing {
                    ui.spinner();
                    ui.label(match kind {
                        ExecutionKind::Run => "Running...",
                        ExecutionKind::Submit => "Submitting...",
                    });
                }

                ui.separator();
                let mut selected = self.model.language.clone();
                egui::ComboBox::from_label("Language")
                    .selected_text(language_name(&self.model, &selected))
                    .show_ui(ui, |ui| {
                        for l in &self.model.languages {
                            ui.selectable_value(&mut selected, l.key.clone(), &l.name);
                        }
                    });
                if selected != self.model.language {
                    self.bridge.send(UiCommand::ChangeLanguage { key: selected });
                }

                ui.separator();
                ui.label("Program input");
                ui.text_edit_singleline(&mut self.stdin);
            });
        });
    }

    fn render_tab_strip(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                for tab in &self.model.files {
                    let label = if tab.dirty {
                        format!("{} *", tab.name)
                    } else {
                        tab.name.clone()
                    };
                    if ui
                        .selectable_label(tab.name == self.model.active, label)
                        .clicked()
                    {
                        self.bridge.send(UiCommand::SwitchFile {
                            name: tab.name.clone(),
                        });
                    }
                }

                ui.separator();
                if ui.button("New").clicked() {
                    self.dialog = Some(Dialog::NewFile {
                        name: String::new(),
                        language: self.model.language.clone(),
                    });
                }
                if ui.button("Rename").clicked() {
                    self.dialog = Some(Dialog::Rename {
                        name: self.model.active.clone(),
                    });
                }
                if ui.button("Delete").clicked() {
                    self.dialog = Some(Dialog::ConfirmDelete {
                        name: self.model.active.clone(),
                    });
                }
            });
        });
    }

    fn render_output_panel(&mut self, ctx: &Context) {
        egui::TopBottomPanel::bottom("output")
            .min_height(160.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.model.output_tab, OutputTab::Console, "Console");
                    ui.selectable_value(
                        &mut self.model.output_tab,
                        OutputTab::TestResults,
                        "Test Results",
                    );
                });
                ui.separator();
                match self.model.output_tab {
                    OutputTab::Console => self.render_console(ui),
                    OutputTab::TestResults => self.render_test_results(ui),
                }
            });
    }

    fn render_console(&self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .id_salt("console")
            .show(ui, |ui| {
                for line in &self.model.console {
                    let text = RichText::new(&line.text).monospace();
                    let text = match line.style {
                        LineStyle::Normal => text,
                        LineStyle::Error => text.color(Color32::from_rgb(255, 80, 80)),
                        LineStyle::Muted => text.weak(),
                    };
                    ui.label(text);
                }
            });
    }

    fn render_test_results(&self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .id_salt("test-results")
            .show(ui, |ui| {
                if let Some(summary) = &self.model.summary {
                    ui.label(RichText::new(summary).strong());
                    ui.separator();
                }
                for test in &self.model.tests {
                    let (icon, color) = if test.passed {
                        ("✔", Color32::from_rgb(80, 200, 80))
                    } else {
                        ("✘", Color32::from_rgb(255, 80, 80))
                    };
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(icon).color(color));
                        ui.label(&test.name);
                        ui.label(
                            RichText::new(format!(
                                "{}/{}",
                                crate::view_model::fmt_number(test.earned_points),
                                crate::view_model::fmt_number(test.points)
                            ))
                            .weak(),
                        );
                        if !test.is_public {
                            ui.label(RichText::new("(hidden)").weak());
                        }
                    });
                    // Only public tests reveal their outputs
                    if test.is_public && !test.passed {
                        if let Some(expected) = &test.expected_output {
                            ui.label(RichText::new(format!("expected: {expected}")).weak());
                        }
                        if let Some(actual) = &test.actual_output {
                            ui.label(RichText::new(format!("actual: {actual}")).weak());
                        }
                    }
                }
            });
    }

    fn state_label(&self) -> &'static str {
        match self.model.executing {
            Some(ExecutionKind::Run) => "Running",
            Some(ExecutionKind::Submit) => "Submitting",
            None if self.model.any_dirty() => "Unsaved changes",
            None => "Saved",
        }
    }
}

fn language_name(model: &StudentViewModel, key: &str) -> String {
    model
        .languages
        .iter()
        .find(|l| l.key == key)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| key.to_owned())
}

impl eframe::App for StudentApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let events: Vec<Event> = self.event_rx.try_iter().collect();
        for event in events {
            self.model.apply_event(event, &mut self.status);
        }

        self.handle_shortcuts(ctx);
        self.handle_dialog(ctx);

        self.render_header(ctx);
        self.render_tab_strip(ctx);
        egui::TopBottomPanel::bottom("status-bar")
            .exact_height(24.0)
            .show(ctx, |ui| {
                let state_label = self.state_label();
                ui.add(StatusBar::new(state_label, &mut self.status));
            });
        self.render_output_panel(ctx);

        if let Some(statement) = self.model.problem_statement.clone() {
            egui::SidePanel::right("problem-statement")
                .default_width(260.0)
                .show(ctx, |ui| {
                    ui.heading("Problem");
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.label(statement);
                    });
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let is_dark = ui.visuals().dark_mode;
            let extension = self.model.extension().to_owned();
            let response = ui.add(CodeEditor::new(&mut self.model.editor, &extension, is_dark));
            if response.changed() {
                self.bridge.send(UiCommand::Edit {
                    content: self.model.editor.clone(),
                });
            }
        });
    }
}
