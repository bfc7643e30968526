//! Runs every rank of every requested role inside one process.
//!
//! Each role gets its own rank set and grid. Every rank gets its own
//! thread, its own [`Config`] built from the same text, and a
//! [`MemoryTransport`] on one shared [`MemoryHub`], so a producer role
//! and a consumer role started together exchange data. Configs are
//! built before any thread starts, so a config error never leaves the
//! other ranks waiting on a step that will not come.

use std::error::Error;
use std::fmt;
use std::thread;

use crossbeam_channel::unbounded;
use tracing::{debug, info};
use weir_config::{build_config, read_config_text, Config, ConfigError};
use weir_engine::{PipelineExecutor, RunError, RunMetrics};
use weir_transport::{MemoryHub, MemoryTransport};

use crate::settings::{RolePlan, Settings, SettingsError};

/// One rank's results: its metrics and its config as the run left it.
#[derive(Debug)]
pub struct RankReport {
    /// Run metrics.
    pub metrics: RunMetrics,
    /// Config including the variable buffers after the last step.
    pub config: Config,
}

/// Every rank of one role, indexed by rank.
#[derive(Debug)]
pub struct RoleReport {
    /// Role id.
    pub role: u64,
    /// Per-rank results.
    pub ranks: Vec<RankReport>,
}

/// What a successful [`run`] produced.
#[derive(Debug)]
pub enum Outcome {
    /// `--print-config`: rank 0's config rendering per role. Nothing was run.
    Summary(String),
    /// Results of every role, in command-line order.
    Completed(Vec<RoleReport>),
}

/// A failure that stopped the run.
#[derive(Debug)]
pub enum DriverError {
    /// The command line was inconsistent.
    Settings(SettingsError),
    /// The config file was unreadable or invalid.
    Config(ConfigError),
    /// A rank's executor stopped with an error.
    Run {
        /// Role of the failing rank.
        role: u64,
        /// Failing rank.
        rank: usize,
        /// The executor's error.
        source: RunError,
    },
    /// A rank's thread panicked.
    Panicked {
        /// Role of the failing rank.
        role: u64,
        /// Failing rank.
        rank: usize,
    },
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Run { role, rank, source } => write!(f, "role {role} rank {rank}: {source}"),
            Self::Panicked { role, rank } => write!(f, "role {role} rank {rank} panicked"),
        }
    }
}

impl Error for DriverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Settings(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Run { source, .. } => Some(source),
            Self::Panicked { .. } => None,
        }
    }
}

impl From<SettingsError> for DriverError {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

impl From<ConfigError> for DriverError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Read the config file and run every requested role.
pub fn run(settings: &Settings) -> Result<Outcome, DriverError> {
    let text = read_config_text(&settings.config)?;
    run_text(settings, &text)
}

/// Like [`run`] with the config text already in hand.
pub fn run_text(settings: &Settings, text: &str) -> Result<Outcome, DriverError> {
    settings.validate()?;
    let roles = settings.roles();

    // (role plan, rank, config), roles in order, ranks ascending.
    let mut slots = Vec::new();
    for plan in &roles {
        let options = settings.build_options(plan.role);
        for rank in 0..plan.ranks {
            let config = build_config(text, &plan.topology(rank), options)?;
            slots.push((*plan, rank, config));
        }
    }

    if settings.print_config {
        let summaries: Vec<String> = slots
            .iter()
            .filter(|(_, rank, _)| *rank == 0)
            .map(|(plan, _, config)| match roles.len() {
                1 => config.summary().to_string(),
                _ => format!("Role {}:\n{}", plan.role, config.summary()),
            })
            .collect();
        return Ok(Outcome::Summary(summaries.concat()));
    }

    for plan in &roles {
        info!(
            role = plan.role,
            ranks = plan.ranks,
            grid = ?plan.grid,
            "starting role"
        );
    }
    if let Some((_, _, first)) = slots.first() {
        debug!("{}", first.summary());
    }

    let hub = MemoryHub::new();
    let (tx, rx) = unbounded::<(usize, Result<RankReport, RunError>)>();
    let plans: Vec<(RolePlan, usize)> = slots.iter().map(|(p, r, _)| (*p, *r)).collect();

    let panicked: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = slots
            .into_iter()
            .enumerate()
            .map(|(slot, (plan, rank, config))| {
                let tx = tx.clone();
                let transport = MemoryTransport::new(hub.clone(), rank, plan.ranks);
                let handle = thread::Builder::new()
                    .name(format!("weir-app{}-rank{rank}", plan.role))
                    .spawn_scoped(scope, move || {
                        let mut exec = PipelineExecutor::new(config, transport, rank);
                        let result = exec.run();
                        let result = result.map(|metrics| RankReport {
                            metrics,
                            config: exec.into_parts().0,
                        });
                        // The receiver outlives the scope.
                        let _ = tx.send((slot, result));
                    });
                (slot, handle)
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|(slot, handle)| match handle {
                Ok(h) => h.join().is_err().then_some(slot),
                Err(_) => Some(slot),
            })
            .collect()
    });
    drop(tx);

    if let Some(&slot) = panicked.iter().min() {
        let (plan, rank) = plans[slot];
        return Err(DriverError::Panicked {
            role: plan.role,
            rank,
        });
    }

    let mut results: Vec<Option<Result<RankReport, RunError>>> =
        plans.iter().map(|_| None).collect();
    for (slot, result) in rx.iter() {
        results[slot] = Some(result);
    }

    let mut reports: Vec<RoleReport> = roles
        .iter()
        .map(|plan| RoleReport {
            role: plan.role,
            ranks: Vec::with_capacity(plan.ranks),
        })
        .collect();
    for (&(plan, rank), result) in plans.iter().zip(results) {
        let role = plan.role;
        let report = match result {
            Some(Ok(report)) => report,
            Some(Err(source)) => return Err(DriverError::Run { role, rank, source }),
            None => return Err(DriverError::Panicked { role, rank }),
        };
        debug!(role, rank, steps = report.metrics.steps, "rank finished");
        if let Some(set) = reports.iter_mut().find(|r| r.role == role) {
            set.ranks.push(report);
        }
    }
    Ok(Outcome::Completed(reports))
}
