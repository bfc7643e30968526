//! Weir: a config-driven producer/consumer staging pipeline.
//!
//! This facade re-exports the member crates and hosts the pieces of the
//! `weir` binary: command-line [`settings`], [`logging`] setup, and the
//! multi-rank [`driver`].
//!
//! ```
//! use weir::driver::{run_text, Outcome};
//! use weir::settings::Settings;
//!
//! let mut settings = Settings::for_config("inline.cfg");
//! settings.grid = vec![2];
//! let text = "steps 2\ngroup g\narray float t 1 8 X\nwrite out g\n";
//! match run_text(&settings, text).unwrap() {
//!     Outcome::Completed(roles) => assert_eq!(roles[0].ranks.len(), 2),
//!     Outcome::Summary(_) => unreachable!(),
//! }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub use weir_config as config;
pub use weir_core as types;
pub use weir_decomp as decomp;
pub use weir_engine as engine;
pub use weir_transport as transport;

pub mod driver;
pub mod logging;
pub mod settings;

pub use driver::{run, run_text, DriverError, Outcome, RankReport, RoleReport};
pub use settings::{RolePlan, RoleSpec, Settings, SettingsError};
