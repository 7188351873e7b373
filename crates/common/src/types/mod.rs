use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Uniform outcome returned to form/dashboard callers.
/// Failures are folded into `success = false` with a user-facing message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}
