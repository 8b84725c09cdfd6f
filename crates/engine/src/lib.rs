//! # Restprobe Engine
//!
//! Deterministic execution of declarative API tests: resolve variables,
//! issue HTTP requests, evaluate typed assertions against the live
//! responses, and aggregate outcomes across suites and iterations.
//!
//! ## Key Modules
//!
//! - **`resolve`**: `{{name}}` placeholder substitution over strings and
//!   nested JSON values
//! - **`path`**: structured-path extraction from JSON bodies, with a
//!   dotted-key fallback capability
//! - **`assertion`**: per-kind assertion evaluation that never propagates
//!   an error to the caller
//! - **`dispatch`**: the HTTP seam — a trait with a production `reqwest`
//!   implementation and a canned test double
//! - **`executor`**: one test case end to end, hooks included
//! - **`suite`**: sequential/concurrent coordination of ordered cases
//! - **`orchestrator`**: iterations, data-driven parameter sets, bail,
//!   inter-iteration delay, and final aggregation
//!
//! ## Usage
//!
//! ```rust
//! use restprobe_engine::resolve::resolve_template;
//! use restprobe_types::Environment;
//!
//! let environment = Environment::from_iter([("host".to_string(), "api.example.com".to_string())]);
//! assert_eq!(resolve_template("https://{{host}}/v1", &environment), "https://api.example.com/v1");
//! ```

pub mod assertion;
pub mod dispatch;
pub mod executor;
pub mod orchestrator;
pub mod path;
pub mod resolve;
pub mod suite;

pub use assertion::{HttpResponseData, evaluate_assertions};
pub use dispatch::{ClientDispatcher, DispatchError, HttpDispatcher, PreparedRequest, StaticDispatcher};
pub use executor::{MAX_SNAPSHOT_BODY_BYTES, SetupHook, TeardownHook, TestCase, execute_case, prepare_request};
pub use orchestrator::{RunOptions, execute_run, merge_environment};
pub use path::{DottedPathQuery, PathError, PathQuery, StructuredPathQuery, default_path_query};
pub use resolve::{resolve_template, resolve_value};
pub use suite::{TestSuite, run_suite};
