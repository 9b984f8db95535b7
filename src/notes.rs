use serde::Serialize;
use tracing::{info, warn};

/// Operator-facing note sink. Fire-and-forget.
pub trait NoteWriter {
    fn append_warning(&mut self, text: &str);
    fn append_success(&mut self, text: &str);
    fn append_info(&mut self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteKind {
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub kind: NoteKind,
    pub text: String,
}

impl Note {
    fn render(&self) -> String {
        match self.kind {
            NoteKind::Info => self.text.clone(),
            NoteKind::Warning => format!("⚠️ {}", self.text),
            NoteKind::Success => format!("✅ {}", self.text),
        }
    }
}

/// In-memory notes for one investigation, kept in insertion order.
#[derive(Debug, Clone)]
pub struct Notes {
    investigation: String,
    entries: Vec<Note>,
}

impl Notes {
    pub fn new<S: Into<String>>(investigation: S) -> Self {
        Self {
            investigation: investigation.into(),
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[Note] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.entries.iter().filter(|n| n.kind == NoteKind::Warning).count()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(Note::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, kind: NoteKind, text: &str) {
        self.entries.push(Note {
            kind,
            text: text.trim_end().to_string(),
        });
    }
}

impl NoteWriter for Notes {
    fn append_warning(&mut self, text: &str) {
        warn!("[{}] {}", self.investigation, text.trim_end());
        self.push(NoteKind::Warning, text);
    }

    fn append_success(&mut self, text: &str) {
        info!("[{}] {}", self.investigation, text.trim_end());
        self.push(NoteKind::Success, text);
    }

    fn append_info(&mut self, text: &str) {
        info!("[{}] {}", self.investigation, text.trim_end());
        self.push(NoteKind::Info, text);
    }
}
