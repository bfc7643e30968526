//! Config parsing and the variable/command model for Weir pipelines.
//!
//! A config is a line-oriented text file describing variable groups,
//! array variables with their global shapes and decompositions, and the
//! ordered sleep/write/read commands one process replays every step.
//! [`build_config`] turns that text into a [`Config`] for one rank:
//! arrays are decomposed against the process grid and each variable
//! gets a buffer sized to its local box.
//!
//! ```
//! use weir_config::{build_config, BuildOptions};
//! use weir_core::StaticTopology;
//!
//! let text = "\
//! steps 10
//! group fields
//!   array double t 2 10 4 X 1
//! write heat.bp fields
//! ";
//! let cfg = build_config(text, &StaticTopology::linear(1, 2), BuildOptions::default()).unwrap();
//! let t = cfg.group("fields").unwrap().get("t").unwrap();
//! assert_eq!(t.start(), &[5, 0]);
//! assert_eq!(t.count(), &[5, 4]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod command;
pub mod config;
pub mod error;
pub mod group;
pub mod lexer;
pub mod variable;

pub use builder::{build_config, load_config, read_config_text, BuildOptions, ConfigBuilder};
pub use command::{Command, CommandKind, StreamIo, DEFAULT_READ_TIMEOUT_SECS};
pub use config::{Config, ConfigParts, ConfigSummary, StreamBinding};
pub use error::{ConfigError, ConfigErrorKind};
pub use group::VariableGroup;
pub use variable::VariableSpec;
