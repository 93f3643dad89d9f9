use serde::{Deserialize, Serialize};

/// Text of the single entry emitted when no rule fires.
pub const ALL_SYSTEMS_NORMAL: &str = "All systems normal.";

/// Severity attached to each verdict message.
///
/// Rule outcomes only carry `Warning` or `Critical`; `Info` is reserved for
/// the all-clear entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// Overall vehicle health for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    Normal,
    Warning,
    SeriousProblem,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Normal => write!(f, "Normal"),
            Status::Warning => write!(f, "Warning"),
            Status::SeriousProblem => write!(f, "Serious Problem"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

impl Message {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }
}

/// Per-tick engine output: overall status plus ordered explanations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: Status,
    pub messages: Vec<Message>,
}

impl Verdict {
    pub fn all_clear() -> Self {
        Self {
            status: Status::Normal,
            messages: vec![Message::new(Severity::Info, ALL_SYSTEMS_NORMAL)],
        }
    }

    pub fn is_normal(&self) -> bool {
        self.status == Status::Normal
    }

    /// Single-line explanation, e.g. `"Critical: Potential fluid leakage detected!"`.
    pub fn details(&self) -> String {
        let parts: Vec<String> = self
            .messages
            .iter()
            .filter(|m| m.severity != Severity::Info)
            .map(|m| format!("{}: {}", m.severity, m.text))
            .collect();

        if parts.is_empty() {
            ALL_SYSTEMS_NORMAL.to_string()
        } else {
            parts.join(" ")
        }
    }
}
