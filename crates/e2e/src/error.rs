//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Frontend failed to start: {0}")]
    ServerStartup(String),

    #[error("Frontend health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Scenario spec parse error: {0}")]
    SpecParse(String),

    #[error("Invalid scenario '{name}': {reason}")]
    SpecInvalid { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Why a scenario failed.
///
/// Scenario failures are recorded in the run report rather than raised as
/// [`E2eError`]: the run itself completed, one scenario did not. `Harness`
/// covers failures in the browser-script plumbing, not the page under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Expected value, state, or message did not match.
    Assertion,
    /// An element, dialog, or value did not appear within its bounded wait.
    Timeout,
    /// A dialog fired while no expectation was armed.
    UnexpectedDialog,
    /// An armed dialog expectation was never satisfied.
    DialogNotFired,
    /// The browser script failed outside any assertion.
    Harness,
}

impl FailureKind {
    /// Classify a step error message coming back from the browser script.
    ///
    /// The generated script prefixes its own failure modes; anything it
    /// does not claim is a harness-level error.
    pub fn classify(message: &str) -> Self {
        if message.starts_with("unexpected dialog") {
            FailureKind::UnexpectedDialog
        } else if message.starts_with("expected dialog did not fire") {
            FailureKind::DialogNotFired
        } else if message.contains("Timeout") || message.contains("timed out") {
            FailureKind::Timeout
        } else if message.contains(": expected ") {
            FailureKind::Assertion
        } else {
            FailureKind::Harness
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("page title: expected \"frontend\", got \"backend\"", FailureKind::Assertion)]
    #[test_case("unexpected dialog(s): alert: boo", FailureKind::UnexpectedDialog)]
    #[test_case(
        "expected dialog did not fire: Login attempted with email: a@b.c",
        FailureKind::DialogNotFired
    )]
    #[test_case("locator.click: Timeout 5000ms exceeded.", FailureKind::Timeout)]
    #[test_case("ReferenceError: foo is not defined", FailureKind::Harness)]
    fn classifies_step_errors(message: &str, expected: FailureKind) {
        assert_eq!(FailureKind::classify(message), expected);
    }
}
