//! Playwright browser automation
//!
//! Compiles a [`ScenarioSpec`] into a self-contained Playwright script and
//! runs it under `node`. One script per scenario: page state, armed dialog
//! expectations, and the unexpected-dialog ledger must persist across steps,
//! so the whole linear sequence executes in a single browser session. The
//! script reports one `@@STEP@@{json}` line per completed step and a final
//! `@@DONE@@{json}` line, which the Rust side parses back into results.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{E2eError, E2eResult, FailureKind};
use crate::spec::{DialogAction, DialogKind, ScenarioSpec, Target, TestStep};

/// Default bound for element and dialog waits, in milliseconds.
const DEFAULT_WAIT_MS: u64 = 5000;

/// Playwright browser handle
pub struct PlaywrightHandle {
    /// Base URL of the frontend under test
    base_url: String,

    /// Directory for screenshots
    screenshot_dir: PathBuf,

    /// Viewport dimensions
    viewport_width: u32,
    viewport_height: u32,

    /// Browser engine
    browser: Browser,

    /// Headless mode
    headless: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Outcome of one scenario's script run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub success: bool,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
    pub failure_screenshot: Option<PathBuf>,
}

/// Per-step line emitted by the generated script.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStepReport {
    #[allow(dead_code)]
    index: usize,
    name: String,
    ok: bool,
    duration_ms: u64,
    #[serde(default)]
    error: Option<String>,
}

/// Final line emitted by the generated script.
#[derive(Debug, Deserialize)]
struct RawDoneReport {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        // Verify playwright is installed
        Self::check_playwright_installed()?;

        // Create screenshot directory
        std::fs::create_dir_all(&config.screenshot_dir)?;

        Ok(Self {
            base_url: config.base_url,
            screenshot_dir: config.screenshot_dir,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            browser: config.browser,
            headless: config.headless,
        })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Generate a short name for a step
    pub fn step_name(step: &TestStep) -> String {
        match step {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::AssertTitle { equals } => format!("assert_title:{}", equals),
            TestStep::Fill { target, .. } => format!("fill:{}", target.describe()),
            TestStep::Clear { target } => format!("clear:{}", target.describe()),
            TestStep::Click { target, .. } => format!("click:{}", target.describe()),
            TestStep::Press { target, key } => match target {
                Some(t) => format!("press:{}:{}", t.describe(), key),
                None => format!("press:{}", key),
            },
            TestStep::Check { target } => format!("check:{}", target.describe()),
            TestStep::Uncheck { target } => format!("uncheck:{}", target.describe()),
            TestStep::AssertChecked { target, checked } => {
                format!("assert_checked:{}:{}", target.describe(), checked)
            }
            TestStep::Assert { target, .. } => format!("assert:{}", target.describe()),
            TestStep::AssertValidation { target, valid, .. } => {
                format!("assert_validation:{}:{}", target.describe(), valid)
            }
            TestStep::ExpectDialog { kind, .. } => format!("expect_dialog:{}", kind.as_str()),
            TestStep::AssertNoDialog { .. } => "assert_no_dialog".to_string(),
            TestStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }

    /// Build the Playwright script for a whole scenario
    pub fn build_script(&self, spec: &ScenarioSpec) -> String {
        let mut script = String::new();

        let step_names: Vec<String> = spec.steps.iter().map(Self::step_name).collect();
        let step_names_js = js_str_array(&step_names);
        let failure_shot = self
            .screenshot_dir
            .join(format!("failure-{}.png", spec.name));

        // Header: browser session, dialog guard, assertion helpers
        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};

  // Any dialog arriving while no expectation is armed fails the scenario.
  const unexpectedDialogs = [];
  let expectingDialog = false;
  page.on('dialog', (dialog) => {{
    if (!expectingDialog) {{
      unexpectedDialogs.push(dialog.type() + ': ' + dialog.message());
      dialog.dismiss().catch(() => {{}});
    }}
  }});

  const assertEq = (what, actual, expected) => {{
    if (actual !== expected) {{
      throw new Error(what + ': expected ' + JSON.stringify(expected) + ', got ' + JSON.stringify(actual));
    }}
  }};
  const retryOk = async (what, get, check, expected, timeoutMs = {wait}) => {{
    const deadline = Date.now() + timeoutMs;
    let last;
    for (;;) {{
      last = await get();
      if (check(last)) {{
        return;
      }}
      if (Date.now() > deadline) {{
        throw new Error(what + ': expected ' + expected + ', got ' + JSON.stringify(last) + ' (timed out after ' + timeoutMs + 'ms)');
      }}
      await new Promise((resolve) => setTimeout(resolve, 100));
    }}
  }};
  const retryEq = (what, get, expected, timeoutMs = {wait}) =>
    retryOk(what, get, (v) => v === expected, JSON.stringify(expected), timeoutMs);
  const assertNoDialogs = () => {{
    if (unexpectedDialogs.length > 0) {{
      throw new Error('unexpected dialog(s): ' + unexpectedDialogs.join('; '));
    }}
  }};

  const stepNames = {step_names};
  let step = 0;
  let stepStart = Date.now();
  const done = () => {{
    console.log('@@STEP@@' + JSON.stringify({{ index: step, name: stepNames[step], ok: true, durationMs: Date.now() - stepStart }}));
    step += 1;
    stepStart = Date.now();
  }};

  try {{
"#,
            browser = self.browser.as_str(),
            headless = self.headless,
            width = self.viewport_width,
            height = self.viewport_height,
            base_url = js_str(&self.base_url),
            wait = DEFAULT_WAIT_MS,
            step_names = step_names_js,
        ));

        // Step bodies. An expect_dialog arms a one-shot waiter that the
        // following click/press consumes.
        let mut armed: Option<ArmedDialog> = None;
        for (i, step) in spec.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step_names[i]));
            script.push_str(&self.step_to_js(step, i, &mut armed));
            script.push_str("    done();\n");
        }

        // Footer: final unexpected-dialog sweep, result lines, teardown
        script.push_str(&format!(
            r#"
    assertNoDialogs();
    console.log('@@DONE@@' + JSON.stringify({{ success: true }}));
  }} catch (error) {{
    const message = String(error && error.message ? error.message : error);
    console.log('@@STEP@@' + JSON.stringify({{ index: step, name: stepNames[step] || 'teardown', ok: false, durationMs: Date.now() - stepStart, error: message }}));
    await page.screenshot({{ path: {failure_shot}, fullPage: true }}).catch(() => {{}});
    console.log('@@DONE@@' + JSON.stringify({{ success: false, error: message }}));
    process.exitCode = 1;
  }} finally {{
    await browser.close();
  }}
}})();
"#,
            failure_shot = js_str(&failure_shot.to_string_lossy()),
        ));

        script
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &TestStep, index: usize, armed: &mut Option<ArmedDialog>) -> String {
        match step {
            TestStep::Navigate { url, wait_for_selector } => {
                let mut code = format!("    await page.goto(baseUrl + {});\n", js_str(url));
                if let Some(selector) = wait_for_selector {
                    code.push_str(&format!(
                        "    await page.waitForSelector({}, {{ timeout: {} }});\n",
                        js_str(selector),
                        DEFAULT_WAIT_MS
                    ));
                }
                code
            }

            TestStep::AssertTitle { equals } => format!(
                "    await retryEq('page title', () => page.title(), {});\n",
                js_str(equals)
            ),

            TestStep::Fill { target, value } => {
                let t = target_js(target);
                format!(
                    "    await {t}.fill({value});\n    await retryEq({what}, () => {t}.inputValue(), {value});\n",
                    t = t,
                    value = js_str(value),
                    what = js_str(&format!("value of {}", target.describe())),
                )
            }

            TestStep::Clear { target } => {
                let t = target_js(target);
                format!(
                    "    await {t}.clear();\n    await retryEq({what}, () => {t}.inputValue(), \"\");\n",
                    t = t,
                    what = js_str(&format!("value of {}", target.describe())),
                )
            }

            TestStep::Click { target, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(DEFAULT_WAIT_MS);
                let action = format!("{}.click({{ timeout: {} }})", target_js(target), timeout);
                match armed.take() {
                    Some(expectation) => consume_dialog_js(index, &action, &expectation),
                    None => format!("    await {};\n", action),
                }
            }

            TestStep::Press { target, key } => {
                let action = match target {
                    Some(t) => format!("{}.press({})", target_js(t), js_str(key)),
                    None => format!("page.keyboard.press({})", js_str(key)),
                };
                match armed.take() {
                    Some(expectation) => consume_dialog_js(index, &action, &expectation),
                    None => format!("    await {};\n", action),
                }
            }

            TestStep::Check { target } => {
                let t = target_js(target);
                format!(
                    "    await {t}.check();\n    await retryEq({what}, () => {t}.isChecked(), true);\n",
                    t = t,
                    what = js_str(&format!("checked state of {}", target.describe())),
                )
            }

            TestStep::Uncheck { target } => {
                let t = target_js(target);
                format!(
                    "    await {t}.uncheck();\n    await retryEq({what}, () => {t}.isChecked(), false);\n",
                    t = t,
                    what = js_str(&format!("checked state of {}", target.describe())),
                )
            }

            TestStep::AssertChecked { target, checked } => format!(
                "    await retryEq({what}, () => {t}.isChecked(), {checked});\n",
                t = target_js(target),
                what = js_str(&format!("checked state of {}", target.describe())),
                checked = checked,
            ),

            TestStep::Assert { target, visible, text, text_contains, value, attribute, count } => {
                let t = target_js(target);
                let described = target.describe();
                let mut assertions = Vec::new();

                if let Some(visible) = visible {
                    let state = if *visible { "visible" } else { "hidden" };
                    assertions.push(format!(
                        "    await {}.waitFor({{ state: '{}', timeout: {} }});\n",
                        t, state, DEFAULT_WAIT_MS
                    ));
                }

                if let Some(expected) = text {
                    assertions.push(format!(
                        "    await retryEq({what}, async () => (await {t}.textContent()) ?? '', {expected});\n",
                        t = t,
                        what = js_str(&format!("text of {}", described)),
                        expected = js_str(expected),
                    ));
                }

                if let Some(needle) = text_contains {
                    assertions.push(format!(
                        "    await retryOk({what}, async () => (await {t}.textContent()) ?? '', (v) => v.includes({needle}), 'text containing ' + {needle_quoted});\n",
                        t = t,
                        what = js_str(&format!("text of {}", described)),
                        needle = js_str(needle),
                        needle_quoted = js_str(&format!("{:?}", needle)),
                    ));
                }

                if let Some(expected) = value {
                    assertions.push(format!(
                        "    await retryEq({what}, () => {t}.inputValue(), {expected});\n",
                        t = t,
                        what = js_str(&format!("value of {}", described)),
                        expected = js_str(expected),
                    ));
                }

                if let Some(attr) = attribute {
                    if let Some(expected) = &attr.value {
                        assertions.push(format!(
                            "    await retryEq({what}, () => {t}.getAttribute({name}), {expected});\n",
                            t = t,
                            what = js_str(&format!("attribute {} of {}", attr.name, described)),
                            name = js_str(&attr.name),
                            expected = js_str(expected),
                        ));
                    }
                    if let Some(needle) = &attr.contains {
                        assertions.push(format!(
                            "    await retryOk({what}, () => {t}.getAttribute({name}), (v) => v !== null && v.includes({needle}), 'attribute containing ' + {needle_quoted});\n",
                            t = t,
                            what = js_str(&format!("attribute {} of {}", attr.name, described)),
                            name = js_str(&attr.name),
                            needle = js_str(needle),
                            needle_quoted = js_str(&format!("{:?}", needle)),
                        ));
                    }
                }

                if let Some(expected) = count {
                    assertions.push(format!(
                        "    await retryEq({what}, () => {t}.count(), {expected});\n",
                        t = t,
                        what = js_str(&format!("count of {}", described)),
                        expected = expected,
                    ));
                }

                assertions.join("")
            }

            TestStep::AssertValidation { target, valid, message_contains } => {
                let t = target_js(target);
                let described = target.describe();
                let mut code = format!(
                    "    const validity{i} = await {t}.evaluate((el) => ({{ valid: el.checkValidity(), message: el.validationMessage }}));\n",
                    i = index,
                    t = t,
                );
                if *valid {
                    code.push_str(&format!(
                        "    assertEq({what}, validity{i}.message, \"\");\n",
                        i = index,
                        what = js_str(&format!("validation message of {}", described)),
                    ));
                } else {
                    code.push_str(&format!(
                        "    if (validity{i}.valid || validity{i}.message.length === 0) {{\n      throw new Error({what} + ': expected an invalid field with a validation message, got valid=' + validity{i}.valid + ' message=' + JSON.stringify(validity{i}.message));\n    }}\n",
                        i = index,
                        what = js_str(&format!("validity of {}", described)),
                    ));
                }
                if let Some(needle) = message_contains {
                    code.push_str(&format!(
                        "    if (!validity{i}.message.includes({needle})) {{\n      throw new Error({what} + ': expected a message containing ' + {needle_quoted} + ', got ' + JSON.stringify(validity{i}.message));\n    }}\n",
                        i = index,
                        needle = js_str(needle),
                        needle_quoted = js_str(&format!("{:?}", needle)),
                        what = js_str(&format!("validation message of {}", described)),
                    ));
                }
                code
            }

            TestStep::ExpectDialog { kind, message, action } => {
                *armed = Some(ArmedDialog {
                    wait_var: format!("dialogWait{}", index),
                    kind: *kind,
                    message: message.clone(),
                    action: *action,
                });
                format!(
                    "    expectingDialog = true;\n    const dialogWait{i} = page.waitForEvent('dialog', {{ timeout: {timeout} }});\n    dialogWait{i}.catch(() => {{}});\n",
                    i = index,
                    timeout = DEFAULT_WAIT_MS,
                )
            }

            TestStep::AssertNoDialog { within_ms } => format!(
                "    await page.waitForTimeout({});\n    assertNoDialogs();\n",
                within_ms
            ),

            TestStep::Screenshot { name, selector, full_page } => {
                let path = self.screenshot_dir.join(format!("{}.png", name));
                match selector {
                    Some(selector) => format!(
                        "    await page.locator({}).screenshot({{ path: {} }});\n",
                        js_str(selector),
                        js_str(&path.to_string_lossy())
                    ),
                    None => format!(
                        "    await page.screenshot({{ path: {}, fullPage: {} }});\n",
                        js_str(&path.to_string_lossy()),
                        full_page
                    ),
                }
            }

            TestStep::Sleep { ms } => format!("    await page.waitForTimeout({});\n", ms),

            TestStep::Log { message } => {
                format!("    console.log('[scenario] ' + {});\n", js_str(message))
            }
        }
    }

    /// Run a scenario script and collect per-step results.
    pub async fn run_scenario(&self, spec: &ScenarioSpec) -> E2eResult<ScenarioRun> {
        let script = self.build_script(spec);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, &script)?;

        debug!("Running Playwright scenario script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (steps, done) = parse_script_output(&stdout)?;

        let done = match done {
            Some(done) => done,
            None => {
                // The script never reached its result line: node itself
                // failed (playwright missing from node_modules, syntax
                // error, crash).
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(E2eError::Playwright(format!(
                    "scenario '{}' produced no result:\nstdout: {}\nstderr: {}",
                    spec.name, stdout, stderr
                )));
            }
        };

        let error = done.error.or_else(|| {
            steps
                .iter()
                .find(|s| !s.success)
                .and_then(|s| s.error.clone())
        });
        let failure = error.as_deref().map(FailureKind::classify);
        let failure_screenshot = if done.success {
            None
        } else {
            Some(self.screenshot_dir.join(format!("failure-{}.png", spec.name)))
        };

        Ok(ScenarioRun {
            success: done.success,
            steps,
            error,
            failure,
            failure_screenshot,
        })
    }
}

/// Whether the Playwright CLI is reachable on this machine.
pub fn playwright_available() -> bool {
    PlaywrightHandle::check_playwright_installed().is_ok()
}

/// One-shot dialog expectation carried from `expect_dialog` to the
/// following trigger step during script generation.
struct ArmedDialog {
    wait_var: String,
    kind: DialogKind,
    message: String,
    action: DialogAction,
}

/// Emit the trigger action together with the armed dialog consumption.
///
/// The action's promise is held unawaited while the dialog is handled: a
/// blocking alert keeps the click pending until the dialog is dismissed, so
/// awaiting the click first would deadlock.
fn consume_dialog_js(index: usize, action: &str, expectation: &ArmedDialog) -> String {
    let accept = match expectation.action {
        DialogAction::Accept => format!("    await dialog{}.accept();\n", index),
        DialogAction::Dismiss => format!("    await dialog{}.dismiss();\n", index),
    };
    format!(
        "    const action{i} = {action};\n    action{i}.catch(() => {{}});\n    const dialog{i} = await {wait}.catch(() => {{\n      throw new Error('expected dialog did not fire: ' + {message});\n    }});\n    assertEq('dialog type', dialog{i}.type(), {kind});\n    assertEq('dialog message', dialog{i}.message(), {message});\n{accept}    expectingDialog = false;\n    await action{i};\n",
        i = index,
        action = action,
        wait = expectation.wait_var,
        kind = js_str(expectation.kind.as_str()),
        message = js_str(&expectation.message),
        accept = accept,
    )
}

/// Locator expression for a target.
fn target_js(target: &Target) -> String {
    match target {
        Target::Role { role, name, exact } => {
            if *exact {
                format!(
                    "page.getByRole({}, {{ name: {}, exact: true }})",
                    js_str(role),
                    js_str(name)
                )
            } else {
                format!("page.getByRole({}, {{ name: {} }})", js_str(role), js_str(name))
            }
        }
        Target::Label { label } => format!("page.getByLabel({})", js_str(label)),
        Target::Css { selector } => format!("page.locator({})", js_str(selector)),
    }
}

/// Quote a Rust string as a JavaScript string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn js_str_array(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| js_str(s)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Parse `@@STEP@@` / `@@DONE@@` marker lines out of the script's stdout.
fn parse_script_output(stdout: &str) -> E2eResult<(Vec<StepResult>, Option<RawDoneReport>)> {
    let step_re = Regex::new(r"^@@STEP@@(.*)$").expect("static regex");
    let done_re = Regex::new(r"^@@DONE@@(.*)$").expect("static regex");

    let mut steps = Vec::new();
    let mut done = None;

    for line in stdout.lines() {
        if let Some(captures) = step_re.captures(line) {
            let raw: RawStepReport = serde_json::from_str(&captures[1])?;
            steps.push(StepResult {
                success: raw.ok,
                step_name: raw.name,
                duration_ms: raw.duration_ms,
                error: raw.error,
            });
        } else if let Some(captures) = done_re.captures(line) {
            done = Some(serde_json::from_str(&captures[1])?);
        }
    }

    Ok((steps, done))
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
        }
    }
}
