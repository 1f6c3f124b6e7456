//! Mutable state behind the workspace lock.

use protocol::types::LanguageConfig;
use tokio::sync::mpsc;

use crate::event::{Event, ExecutionKind, Notice, NoticeLevel, ScoreBoard};

/// One student file. Files keep insertion order; "first file" rules refer
/// to that order.
#[derive(Debug, Clone)]
pub(crate) struct FileEntry {
    pub name: String,
    pub content: String,
    pub language: String,
    pub modified: String,
    pub dirty: bool,
}

pub(crate) struct WorkspaceInternals {
    pub files: Vec<FileEntry>,
    pub active: String,
    pub current_language: String,
    pub languages: Vec<LanguageConfig>,
    pub scores: ScoreBoard,
    pub executing: Option<ExecutionKind>,
    publisher: mpsc::UnboundedSender<Event>,
}

impl WorkspaceInternals {
    pub fn new(
        files: Vec<FileEntry>,
        active: String,
        current_language: String,
        languages: Vec<LanguageConfig>,
        scores: ScoreBoard,
        publisher: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            files,
            active,
            current_language,
            languages,
            scores,
            executing: None,
            publisher,
        }
    }

    pub fn publish(&self, event: Event) {
        // the receiver side going away is not our problem
        let _ = self.publisher.send(event);
    }

    pub fn notice_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "rejecting operation");
        self.publish(Event::Notice(Notice {
            level: NoticeLevel::Error,
            message,
        }));
    }

    pub fn file(&self, name: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn file_mut(&mut self, name: &str) -> Option<&mut FileEntry> {
        self.files.iter_mut().find(|f| f.name == name)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.file(name).is_some()
    }

    pub fn language(&self, key: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|l| l.key == key)
    }

    /// Make `name` the active file and tell the UI what to display:
    /// stored content, or the language template when nothing has been
    /// saved yet.
    pub fn activate(&mut self, name: &str) {
        let Some(entry) = self.file(name) else {
            tracing::warn!(file = %name, "activating unknown file");
            return;
        };
        let language = entry.language.clone();
        let content = if entry.content.is_empty() {
            self.language(&language)
                .map(|l| l.template.clone())
                .unwrap_or_default()
        } else {
            entry.content.clone()
        };
        self.active = name.to_owned();
        self.current_language = language.clone();
        self.publish(Event::ActiveFileChanged {
            name: name.to_owned(),
            language,
            content,
        });
    }

    pub fn record_edit(&mut self, content: String) {
        let active = self.active.clone();
        let Some(entry) = self.file_mut(&active) else {
            return;
        };
        entry.content = content;
        if !entry.dirty {
            entry.dirty = true;
            self.publish(Event::FileDirtied { name: active });
        }
    }

    /// A save round-trip confirmed: clear the dirty flag. Last response
    /// wins; an edit racing this save re-dirties via its own event.
    pub fn apply_save_success(&mut self, name: &str) {
        let modified = chrono::Utc::now().to_rfc3339();
        let Some(entry) = self.file_mut(name) else {
            // renamed or deleted while the save was in flight
            tracing::trace!(file = %name, "dropping save result for unknown file");
            return;
        };
        entry.dirty = false;
        entry.modified = modified.clone();
        self.publish(Event::FileSaved {
            name: name.to_owned(),
            modified,
        });
    }

    pub fn apply_save_failure(&mut self, name: &str, message: String) {
        if !self.has_file(name) {
            tracing::trace!(file = %name, "dropping save failure for unknown file");
            return;
        }
        self.publish(Event::SaveFailed {
            name: name.to_owned(),
            message,
        });
    }
}
