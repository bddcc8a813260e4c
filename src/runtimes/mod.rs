//! Workflow runtime infrastructure: the executor loop, run options, and
//! state persistence.
//!
//! The runtime layer has two entry points:
//!
//! - [`App::invoke`](crate::app::App::invoke) for one-shot runs with no
//!   durability
//! - [`WorkflowRunner`] for checkpointed instances that resume across
//!   process restarts
//!
//! # Persistence Backends
//!
//! - [`InMemoryCheckpointer`] - volatile storage for testing and development
//! - [`SqliteCheckpointer`](checkpointer_sqlite::SqliteCheckpointer) - durable
//!   SQLite-backed persistence (feature `sqlite`, on by default)
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stateloom::node::NodePartial;
//! use stateloom::runtimes::{InMemoryCheckpointer, RunOptions, WorkflowRunner};
//! # use stateloom::app::App;
//! # async fn example(app: App) -> Result<(), Box<dyn std::error::Error>> {
//! let runner = WorkflowRunner::new(app, Arc::new(InMemoryCheckpointer::new()));
//!
//! let report = runner
//!     .run_instance(
//!         "conversation-1",
//!         NodePartial::new().with_query("Hello"),
//!         &RunOptions::default(),
//!     )
//!     .await?;
//! println!("{:?}", report.state.latest_response());
//! # Ok(())
//! # }
//! ```

pub mod checkpointer;
#[cfg(feature = "sqlite")]
pub mod checkpointer_sqlite;
pub mod persistence;
pub mod runner;
pub mod runtime_config;

pub use checkpointer::{
    Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer, WorkflowInstance,
};
#[cfg(feature = "sqlite")]
pub use checkpointer_sqlite::SqliteCheckpointer;
pub use persistence::{PersistedInstance, PersistedState, PersistenceError};
pub use runner::{InstanceInit, InstanceReport, RunnerError, WorkflowRunner};
pub use runtime_config::{RunOptions, RuntimeConfig};
