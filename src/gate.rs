use std::collections::VecDeque;
use std::io::{BufRead as _, Write as _};
use std::sync::Mutex;

/// Gate in front of destructive or high-impact actions.
///
/// Consulted after the transition guard and before the mutation coordinator.
/// Declining leaves the store and the per-entity mutation slot untouched —
/// nothing speculative happens before confirmation.
pub trait ConfirmationGate: Send + Sync {
    /// Return `true` to let the described action proceed.
    fn request_confirmation(&self, description: &str) -> bool;
}

/// Approves everything. For non-interactive use where confirmation is
/// handled upstream (e.g. a UI that already showed its own dialog).
#[derive(Debug, Default)]
pub struct AutoApprove;

impl ConfirmationGate for AutoApprove {
    fn request_confirmation(&self, _description: &str) -> bool {
        true
    }
}

/// Prompts on stdin — the CLI stand-in for a modal confirmation dialog.
#[derive(Debug, Default)]
pub struct StdinGate;

impl ConfirmationGate for StdinGate {
    fn request_confirmation(&self, description: &str) -> bool {
        let mut stderr = std::io::stderr();
        if write!(stderr, "{description} — proceed? [y/N] ").is_err() || stderr.flush().is_err() {
            return false;
        }
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        let answer = line.trim();
        answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
    }
}

/// Pre-scripted answers, consumed in order. Out of answers means "declined".
#[derive(Debug, Default)]
pub struct ScriptedGate {
    answers: Mutex<VecDeque<bool>>,
}

impl ScriptedGate {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
        }
    }
}

impl ConfirmationGate for ScriptedGate {
    fn request_confirmation(&self, _description: &str) -> bool {
        self.answers
            .lock()
            .expect("gate answers lock")
            .pop_front()
            .unwrap_or(false)
    }
}
