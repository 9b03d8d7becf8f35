//! Declarative YAML scenario specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML: one independent test case, a
/// linear sequence of UI actions and assertions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// How to locate an interactive element.
///
/// Role + accessible name is the preferred form; label text works for form
/// fields; a raw CSS selector is the escape hatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// Semantic role (`button`, `textbox`, `checkbox`, `link`, ...) plus
    /// its accessible name.
    Role {
        role: String,
        name: String,
        #[serde(default)]
        exact: bool,
    },

    /// The text of the `<label>` associated with a form control.
    Label { label: String },

    /// Raw CSS selector.
    Css { selector: String },
}

impl Target {
    /// Short human-readable form used in step names and error messages.
    pub fn describe(&self) -> String {
        match self {
            Target::Role { role, name, .. } => format!("{}[{}]", role, name),
            Target::Label { label } => format!("label[{}]", label),
            Target::Css { selector } => selector.clone(),
        }
    }
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Assert the page title equals a fixed string
    AssertTitle { equals: String },

    /// Fill an input field, then assert the field holds the typed value
    Fill { target: Target, value: String },

    /// Clear a field and assert its value becomes empty
    Clear { target: Target },

    /// Click an element
    Click {
        target: Target,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Press a key, optionally against a specific element
    Press {
        #[serde(default)]
        target: Option<Target>,
        key: String,
    },

    /// Check a checkbox and assert it ends up checked
    Check { target: Target },

    /// Uncheck a checkbox and assert it ends up unchecked
    Uncheck { target: Target },

    /// Assert a checkbox's current state
    AssertChecked { target: Target, checked: bool },

    /// Assert something about an element
    Assert {
        target: Target,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        attribute: Option<AttributeAssertion>,
        #[serde(default)]
        count: Option<usize>,
    },

    /// Assert a field's native constraint-validation state.
    ///
    /// `valid: false` requires a non-empty `validationMessage`;
    /// `valid: true` requires it to be empty.
    AssertValidation {
        target: Target,
        valid: bool,
        #[serde(default)]
        message_contains: Option<String>,
    },

    /// Arm a one-shot dialog expectation.
    ///
    /// Must immediately precede the `click` or `press` expected to trigger
    /// the dialog. The dialog's type and exact message are asserted, then
    /// the dialog is accepted or dismissed.
    ExpectDialog {
        #[serde(default)]
        kind: DialogKind,
        message: String,
        #[serde(default, rename = "dialog_action")]
        action: DialogAction,
    },

    /// Wait a grace period, then assert no unarmed dialog has fired
    AssertNoDialog {
        #[serde(default = "default_dialog_grace")]
        within_ms: u64,
    },

    /// Take a screenshot (diagnostics only)
    Screenshot {
        name: String,
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        full_page: bool,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Log a message (for debugging)
    Log { message: String },
}

fn default_dialog_grace() -> u64 {
    500
}

/// Native dialog type tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    #[default]
    Alert,
    Confirm,
    Prompt,
    Beforeunload,
}

impl DialogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogKind::Alert => "alert",
            DialogKind::Confirm => "confirm",
            DialogKind::Prompt => "prompt",
            DialogKind::Beforeunload => "beforeunload",
        }
    }
}

/// What to do with an expected dialog once asserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogAction {
    #[default]
    Dismiss,
    Accept,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeAssertion {
    pub name: String,
    pub value: Option<String>,
    #[serde(default)]
    pub contains: Option<String>,
}

impl ScenarioSpec {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all scenarios from a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let spec = Self::from_file(entry.path())?;
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Keep only scenarios carrying a tag
    pub fn filter_by_tag(specs: Vec<Self>, tag: &str) -> Vec<Self> {
        specs
            .into_iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Structural checks that do not need a browser.
    ///
    /// A dialog expectation is one-shot and consumed by the action right
    /// after it; anything else would leave the expectation dangling and the
    /// scenario hanging on an event that never fires.
    pub fn validate(&self) -> E2eResult<()> {
        if self.steps.is_empty() {
            return Err(E2eError::SpecInvalid {
                name: self.name.clone(),
                reason: "scenario has no steps".to_string(),
            });
        }

        for (i, step) in self.steps.iter().enumerate() {
            if let TestStep::ExpectDialog { .. } = step {
                match self.steps.get(i + 1) {
                    Some(TestStep::Click { .. }) | Some(TestStep::Press { .. }) => {}
                    _ => {
                        return Err(E2eError::SpecInvalid {
                            name: self.name.clone(),
                            reason: format!(
                                "expect_dialog at step {} must be immediately followed by the click or press that triggers it",
                                i + 1
                            ),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn parse_login_scenario() {
        let yaml = r#"
name: login-valid-credentials
description: Any credentials raise the stub login alert
tags:
  - login
  - smoke
steps:
  - action: navigate
    url: /
    wait_for_selector: 'form'
  - action: fill
    target: { label: Email }
    value: test@example.com
  - action: fill
    target: { label: Password }
    value: correctpassword123
  - action: expect_dialog
    message: 'Login attempted with email: test@example.com'
  - action: click
    target: { role: button, name: Sign in }
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "login-valid-credentials");
        assert_eq!(spec.steps.len(), 5);
        assert_eq!(spec.viewport.width, 1280);

        match &spec.steps[3] {
            TestStep::ExpectDialog { kind, message, action } => {
                assert_eq!(*kind, DialogKind::Alert);
                assert_eq!(message, "Login attempted with email: test@example.com");
                assert_eq!(*action, DialogAction::Dismiss);
            }
            other => panic!("expected expect_dialog, got {:?}", other),
        }
    }

    #[test]
    fn parse_validation_scenario() {
        let yaml = r#"
name: login-malformed-email
steps:
  - action: navigate
    url: /
  - action: fill
    target: { label: Email }
    value: invalid-email
  - action: click
    target: { role: button, name: Sign in }
  - action: assert_validation
    target: { label: Email }
    valid: false
  - action: assert_no_dialog
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        match &spec.steps[3] {
            TestStep::AssertValidation { valid, message_contains, .. } => {
                assert!(!valid);
                assert!(message_contains.is_none());
            }
            other => panic!("expected assert_validation, got {:?}", other),
        }
        match &spec.steps[4] {
            TestStep::AssertNoDialog { within_ms } => assert_eq!(*within_ms, 500),
            other => panic!("expected assert_no_dialog, got {:?}", other),
        }
    }

    #[test_case("target: { label: Email }", "label[Email]")]
    #[test_case("target: { role: button, name: Sign in }", "button[Sign in]")]
    #[test_case("target: { selector: '#remember' }", "#remember")]
    fn target_forms_parse(target_yaml: &str, described: &str) {
        let yaml = format!("name: t\nsteps:\n  - action: click\n    {}\n", target_yaml);
        let spec = ScenarioSpec::from_yaml(&yaml).unwrap();
        match &spec.steps[0] {
            TestStep::Click { target, .. } => assert_eq!(target.describe(), described),
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[test]
    fn dangling_dialog_expectation_is_rejected() {
        let yaml = r#"
name: dangling
steps:
  - action: navigate
    url: /
  - action: expect_dialog
    message: 'never consumed'
"#;
        let err = ScenarioSpec::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, E2eError::SpecInvalid { .. }));
    }

    #[test]
    fn empty_scenario_is_rejected() {
        let yaml = "name: empty\nsteps: []\n";
        let err = ScenarioSpec::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, E2eError::SpecInvalid { .. }));
    }

    #[test]
    fn tag_filter_keeps_matching_scenarios() {
        let a = ScenarioSpec::from_yaml(
            "name: a\ntags: [smoke]\nsteps:\n  - action: navigate\n    url: /\n",
        )
        .unwrap();
        let b = ScenarioSpec::from_yaml(
            "name: b\ntags: [login]\nsteps:\n  - action: navigate\n    url: /\n",
        )
        .unwrap();

        let filtered = ScenarioSpec::filter_by_tag(vec![a, b], "smoke");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "a");
    }
}
