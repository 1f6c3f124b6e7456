use eframe::egui;
use tokio::sync::mpsc;
use workspace::{Event, Workspace};

/// Commands the GUI can send to the async workspace runtime
pub(crate) enum UiCommand {
    Edit { content: String },
    SaveNow,
    SwitchFile { name: String },
    CreateFile { name: String, language: String },
    RenameFile { new_name: String },
    DeleteFile { name: String },
    ChangeLanguage { key: String },
    Run { stdin: String },
    Submit,
}

/// The bridge connects the synchronous egui render loop to the async
/// workspace.
///
/// It runs a tokio runtime in a background thread and communicates via
/// channels. All feedback (including failures) comes back through the
/// workspace event stream, so commands are fire-and-forget.
pub(crate) struct Bridge {
    command_tx: mpsc::UnboundedSender<UiCommand>,
}

impl Bridge {
    /// Spawn the bridge, taking ownership of the workspace and the
    /// runtime it was created under.
    ///
    /// Events are forwarded onto `event_tx` for the GUI thread, with a
    /// repaint requested per event.
    pub fn spawn(
        workspace: Workspace,
        mut event_receiver: mpsc::UnboundedReceiver<Event>,
        event_tx: crossbeam_channel::Sender<Event>,
        egui_ctx: egui::Context,
        runtime: tokio::runtime::Runtime,
    ) -> Self {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<UiCommand>();

        std::thread::spawn(move || {
            runtime.block_on(async move {
                let event_egui_ctx = egui_ctx.clone();
                let event_forward_handle = tokio::spawn(async move {
                    while let Some(event) = event_receiver.recv().await {
                        if event_tx.send(event).is_err() {
                            tracing::debug!("event channel closed");
                            break;
                        }
                        event_egui_ctx.request_repaint();
                    }
                    tracing::debug!("event forwarding task ended");
                });

                while let Some(cmd) = command_rx.recv().await {
                    match cmd {
                        UiCommand::Edit { content } => {
                            workspace.record_edit(content).await;
                        }
                        UiCommand::SaveNow => {
                            workspace.save_active().await;
                        }
                        UiCommand::SwitchFile { name } => {
                            workspace.switch_to_file(&name).await;
                        }
                        UiCommand::CreateFile { name, language } => {
                            workspace.create_file(&name, &language).await;
                        }
                        UiCommand::RenameFile { new_name } => {
                            workspace.rename_active_file(&new_name).await;
                        }
                        UiCommand::DeleteFile { name } => {
                            workspace.delete_file(&name).await;
                        }
                        UiCommand::ChangeLanguage { key } => {
                            workspace.change_language(&key).await;
                        }
                        UiCommand::Run { stdin } => {
                            workspace.run(&stdin).await;
                        }
                        UiCommand::Submit => {
                            workspace.submit().await;
                        }
                    }
                }

                tracing::debug!("command loop ended, stopping workspace");
                workspace.shutdown();
                event_forward_handle.abort();
            });
            tracing::debug!("bridge runtime ended");
        });

        Self { command_tx }
    }

    pub fn send(&self, cmd: UiCommand) {
        let _ = self.command_tx.send(cmd);
    }
}
