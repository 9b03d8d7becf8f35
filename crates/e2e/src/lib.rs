//! Login page E2E suite
//!
//! A Rust-controlled E2E harness for the demo login frontend that:
//! - Spawns the frontend as a subprocess and polls its health endpoint
//! - Parses declarative YAML scenario specs
//! - Compiles each scenario into one Playwright script run under `node`
//! - Collects per-step results and writes a JSON run report
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 E2E Test Runner (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server()  -> ServerHandle (loginlab-frontend)  │
//! │    ├── run_spec(spec)  -> ScenarioResult                    │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioSpec (YAML)                                        │
//! │    ├── name, description, tags, viewport                    │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── fill / clear { target, value }                 │
//! │          ├── click / press { target }                       │
//! │          ├── check / uncheck { target }                     │
//! │          ├── expect_dialog { kind, message }                │
//! │          ├── assert { target, visible?, text?, value? }     │
//! │          ├── assert_validation { target, valid }            │
//! │          └── assert_no_dialog / assert_title / screenshot   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Targets locate elements by accessible role + name, by label text, or by
//! CSS selector. Dialog expectations are one-shot: armed immediately before
//! the click or press that triggers them, asserted (type and exact message),
//! then accepted or dismissed; a dialog with no armed expectation fails the
//! scenario.

pub mod error;
pub mod playwright;
pub mod runner;
pub mod server;
pub mod spec;

pub use error::{E2eError, E2eResult, FailureKind};
pub use runner::TestRunner;
pub use spec::{ScenarioSpec, Target, TestStep};
