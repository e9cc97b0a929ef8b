//! Terrace Backend - operation execution
//!
//! Separates *what* operation to run from *how* it is carried out:
//! - [`Backend`] / [`Enhanced`]: capability traits every backend implements
//! - [`Operation`] / [`RunningOperation`]: the request and its async handle
//! - [`Local`]: runs refresh, plan and apply in-process, one at a time
//! - [`Meta`]: assembles a backend from command-line session settings
//!
//! # Example
//!
//! ```rust,ignore
//! use terrace_backend::{CancelToken, Enhanced, Local, Operation, OperationType};
//!
//! # async fn example(engine: std::sync::Arc<dyn terrace_engine::EngineFactory>) {
//! let backend = Local::builder(engine).build();
//! let running = backend
//!     .operation(CancelToken::none(), Operation::new(OperationType::Refresh))
//!     .await?;
//! running.wait().await;
//! if let Some(err) = running.err() {
//!     eprintln!("{err}");
//! }
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod backend;
pub mod cancel;
pub mod config;
pub mod error;
pub mod local;
pub mod logging;
pub mod meta;
pub mod operation;
pub mod running;
pub mod ui;

pub use backend::{Backend, Enhanced, InMemoryBackend, ResourceConfig};
pub use cancel::{CancelSource, CancelToken};
pub use config::{LocalConfig, StatePaths, BACKUP_DISABLED, DEFAULT_BACKUP_EXTENSION, DEFAULT_STATE_FILENAME};
pub use error::{BackendError, ConfigError, ErrorKind, OperationError, ValidationErrors};
pub use local::{CountHook, Counts, Local, LocalBuilder, StateStorage};
pub use meta::{Meta, MetaError};
pub use operation::{Operation, OperationType};
pub use running::{OperationId, RunningOperation};
pub use ui::{BufferCli, Cli, Colorize, StdCli};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
