//! Main test runner that orchestrates the frontend and Playwright

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{E2eError, E2eResult, FailureKind};
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::server::{ServerConfig, ServerHandle};
use crate::spec::ScenarioSpec;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
    pub failure_screenshot: Option<PathBuf>,
}

/// Result of running the whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

/// Main E2E test runner
pub struct TestRunner {
    /// Frontend server configuration
    server_config: ServerConfig,

    /// Playwright configuration
    playwright_config: PlaywrightConfig,

    /// Running frontend handle (if any)
    server: Option<ServerHandle>,

    /// Scenario specs directory
    specs_dir: PathBuf,

    /// Output directory for results
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            server_config: config.server,
            playwright_config: config.playwright,
            server: None,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
        }
    }

    /// Start the frontend under test
    pub async fn start_server(&mut self) -> E2eResult<()> {
        if self.server.is_some() {
            return Ok(()); // Already running
        }

        let server = ServerHandle::spawn(self.server_config.clone()).await?;

        // Point Playwright at the actual frontend URL
        self.playwright_config.base_url = server.base_url().to_string();

        self.server = Some(server);
        Ok(())
    }

    /// Stop the frontend
    pub fn stop_server(&mut self) -> E2eResult<()> {
        if let Some(mut server) = self.server.take() {
            server.stop()?;
        }
        Ok(())
    }

    /// Run all scenarios in the specs directory
    pub async fn run_all(&mut self) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.specs_dir)?;
        self.run_specs(&specs).await
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.specs_dir)?;
        let filtered = ScenarioSpec::filter_by_tag(specs, tag);
        self.run_specs(&filtered).await
    }

    /// Run a specific scenario by name
    pub async fn run_test(&mut self, name: &str) -> E2eResult<ScenarioResult> {
        let specs = ScenarioSpec::load_all(&self.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Scenario not found: {}", name)))?;

        self.start_server().await?;
        self.run_spec(&spec).await
    }

    /// Run a list of scenarios
    pub async fn run_specs(&mut self, specs: &[ScenarioSpec]) -> E2eResult<SuiteResult> {
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        // Ensure the frontend is running
        self.start_server().await?;

        info!("Running {} scenario(s)...", specs.len());

        for spec in specs {
            match self.run_spec(spec).await {
                Ok(result) => {
                    if result.success {
                        passed += 1;
                        info!("✓ {} ({} ms)", result.name, result.duration_ms);
                    } else {
                        failed += 1;
                        error!(
                            "✗ {} - {}",
                            result.name,
                            result.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    results.push(result);
                }
                Err(e) => {
                    failed += 1;
                    error!("✗ {} - {}", spec.name, e);
                    results.push(ScenarioResult {
                        name: spec.name.clone(),
                        success: false,
                        duration_ms: 0,
                        steps: vec![],
                        error: Some(e.to_string()),
                        failure: Some(FailureKind::Harness),
                        failure_screenshot: None,
                    });
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteResult {
            started_at,
            total: specs.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run a single scenario: fresh browser session, strict linear steps,
    /// stop on the first failing step.
    pub async fn run_spec(&mut self, spec: &ScenarioSpec) -> E2eResult<ScenarioResult> {
        let start = Instant::now();
        debug!("Running scenario: {}", spec.name);

        spec.validate()?;

        // Viewport comes from the spec
        let mut pw_config = self.playwright_config.clone();
        pw_config.viewport_width = spec.viewport.width;
        pw_config.viewport_height = spec.viewport.height;

        let playwright = PlaywrightHandle::new(pw_config)?;
        let run = playwright.run_scenario(spec).await?;

        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(ScenarioResult {
            name: spec.name.clone(),
            success: run.success,
            duration_ms,
            steps: run.steps,
            error: run.error,
            failure: run.failure,
            failure_screenshot: run.failure_screenshot,
        })
    }

    /// Write suite results to a JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }

    /// Directory scenario specs are loaded from
    pub fn specs_dir(&self) -> &Path {
        &self.specs_dir
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        let _ = self.stop_server();
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub server: ServerConfig,
    pub playwright: PlaywrightConfig,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            playwright: PlaywrightConfig::default(),
            specs_dir: PathBuf::from("tests/specs"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}
