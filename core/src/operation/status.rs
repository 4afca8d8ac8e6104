use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal response produced by whatever drove a long-running operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl OperationResult {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }

    pub fn no_content() -> Self {
        Self::new(204, None)
    }

    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, Some(serde_json::json!({ "error": message.into() })))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_no_content(&self) -> bool {
        self.status == 204 || self.body.is_none()
    }
}

/// State of one long-running operation.
///
/// Ordered: `Pending` < `Accepted` < any terminal state. Once terminal, the
/// status never changes again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "result")]
pub enum OperationStatus {
    Pending,
    Accepted,
    Succeeded(OperationResult),
    Failed(OperationResult),
    Removed,
}

/// Whether a requested transition changes anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    Unchanged,
}

impl OperationStatus {
    pub fn name(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "Pending",
            OperationStatus::Accepted => "Accepted",
            OperationStatus::Succeeded(_) => "Succeeded",
            OperationStatus::Failed(_) => "Failed",
            OperationStatus::Removed => "Removed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }

    pub fn result(&self) -> Option<&OperationResult> {
        match self {
            OperationStatus::Succeeded(r) | OperationStatus::Failed(r) => Some(r),
            _ => None,
        }
    }

    /// Terminal status matching the success class of `result`.
    pub fn finished(result: OperationResult) -> Self {
        if result.is_success() {
            OperationStatus::Succeeded(result)
        } else {
            OperationStatus::Failed(result)
        }
    }

    fn rank(&self) -> u8 {
        match self {
            OperationStatus::Pending => 0,
            OperationStatus::Accepted => 1,
            OperationStatus::Succeeded(_) | OperationStatus::Failed(_) | OperationStatus::Removed => 2,
        }
    }

    /// Check `self -> next` against the monotonic lifecycle.
    ///
    /// On rejection returns `(from, to)` state names.
    pub fn check_transition(
        &self,
        next: &OperationStatus,
    ) -> Result<Transition, (&'static str, &'static str)> {
        if self.is_terminal() || next.rank() < self.rank() {
            return Err((self.name(), next.name()));
        }
        if next == self {
            return Ok(Transition::Unchanged);
        }
        Ok(Transition::Changed)
    }
}
