//! Command-line settings for the `weir` binary.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use weir_config::{BuildOptions, DEFAULT_READ_TIMEOUT_SECS};
use weir_core::{StaticTopology, GRID_AXES};
use weir_decomp::AXIS_NAMES;

/// Run a config-driven staging pipeline with simulated ranks.
#[derive(Clone, Debug, Parser)]
#[command(name = "weir", version, about, long_about = None)]
pub struct Settings {
    /// Pipeline config file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Process grid extents along X Y Z V W (missing axes are 1)
    #[arg(value_name = "X Y Z V W", num_args = 0..=GRID_AXES)]
    pub grid: Vec<u64>,

    /// Role to run, optionally with its own grid (`1:2x2`). Repeat to run
    /// several roles against each other; default is role 0
    #[arg(long = "app", value_name = "ID[:GRID]")]
    pub apps: Vec<RoleSpec>,

    /// Number of ranks on the positional grid (default: its product)
    #[arg(long, value_name = "N")]
    pub ranks: Option<usize>,

    /// Timeout for read steps, in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_READ_TIMEOUT_SECS)]
    pub read_timeout: f64,

    /// Raise log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print the parsed config of each role's rank 0 and exit
    #[arg(long)]
    pub print_config: bool,
}

/// One `--app` argument: a role id and an optional grid of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleSpec {
    /// Role id matched against `app` lines.
    pub role: u64,
    /// Grid for this role's ranks; `None` means the positional grid.
    pub grid: Option<[u64; GRID_AXES]>,
}

impl RoleSpec {
    /// Role `role` on the positional grid.
    pub fn new(role: u64) -> Self {
        Self { role, grid: None }
    }

    /// Role `role` on its own grid; missing axes are 1.
    pub fn with_grid(role: u64, extents: &[u64]) -> Self {
        Self {
            role,
            grid: Some(grid_from_prefix(extents)),
        }
    }
}

impl FromStr for RoleSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (role, grid) = match s.split_once(':') {
            Some((role, grid)) => (role, Some(grid)),
            None => (s, None),
        };
        let role = role
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("invalid role id '{role}'"))?;
        let Some(grid) = grid else {
            return Ok(Self::new(role));
        };
        let extents = grid
            .split('x')
            .map(|a| {
                a.trim()
                    .parse::<u64>()
                    .map_err(|_| format!("invalid grid extent '{a}' in '{s}'"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if extents.len() > GRID_AXES {
            return Err(format!("grid '{grid}' has more than {GRID_AXES} axes"));
        }
        Ok(Self::with_grid(role, &extents))
    }
}

impl fmt::Display for RoleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.role)?;
        if let Some(grid) = &self.grid {
            let axes: Vec<String> = grid.iter().map(u64::to_string).collect();
            write!(f, ":{}", axes.join("x"))?;
        }
        Ok(())
    }
}

/// A role resolved to the grid and rank count it runs with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RolePlan {
    /// Role id.
    pub role: u64,
    /// Process grid of the role's ranks.
    pub grid: [u64; GRID_AXES],
    /// Number of ranks running the role.
    pub ranks: usize,
}

impl RolePlan {
    /// Topology of `rank` within this role.
    pub fn topology(&self, rank: usize) -> StaticTopology {
        StaticTopology::new(rank, self.ranks, self.grid)
    }
}

/// Settings rejected by [`Settings::validate`].
#[derive(Clone, Debug, PartialEq)]
pub enum SettingsError {
    /// A grid axis is zero.
    ZeroAxis {
        /// Axis letter.
        axis: char,
    },
    /// The grid does not cover the rank count.
    GridMismatch {
        /// Product of the grid axes.
        product: u64,
        /// Number of ranks.
        ranks: usize,
    },
    /// `--ranks 0`.
    NoRanks,
    /// The read timeout is negative or not finite.
    InvalidTimeout {
        /// The value given.
        seconds: f64,
    },
    /// The same role was given twice.
    RepeatedRole {
        /// Role id.
        role: u64,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroAxis { axis } => write!(f, "process grid axis {axis} must be at least 1"),
            Self::GridMismatch { product, ranks } => write!(
                f,
                "X*Y*Z*V*W = {product} must equal the number of processes = {ranks}"
            ),
            Self::NoRanks => write!(f, "at least one rank is required"),
            Self::InvalidTimeout { seconds } => {
                write!(f, "read timeout must be a non-negative number of seconds, got {seconds}")
            }
            Self::RepeatedRole { role } => write!(f, "role {role} is given more than once"),
        }
    }
}

impl std::error::Error for SettingsError {}

fn grid_from_prefix(extents: &[u64]) -> [u64; GRID_AXES] {
    let mut axes = [1; GRID_AXES];
    for (a, &g) in axes.iter_mut().zip(extents) {
        *a = g;
    }
    axes
}

fn check_axes(grid: &[u64; GRID_AXES]) -> Result<(), SettingsError> {
    match grid.iter().position(|&a| a == 0) {
        Some(i) => Err(SettingsError::ZeroAxis {
            axis: AXIS_NAMES[i],
        }),
        None => Ok(()),
    }
}

impl Settings {
    /// Settings for `config` with every other option at its default.
    pub fn for_config(config: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            grid: Vec::new(),
            apps: Vec::new(),
            ranks: None,
            read_timeout: DEFAULT_READ_TIMEOUT_SECS,
            verbose: 0,
            print_config: false,
        }
    }

    /// Positional grid extents with missing axes filled in as 1.
    pub fn process_grid(&self) -> [u64; GRID_AXES] {
        grid_from_prefix(&self.grid)
    }

    /// Number of ranks on the positional grid.
    pub fn rank_count(&self) -> usize {
        self.ranks
            .unwrap_or_else(|| self.process_grid().iter().product::<u64>() as usize)
    }

    /// Every role to run, in command-line order, with its grid resolved.
    pub fn roles(&self) -> Vec<RolePlan> {
        let positional = RolePlan {
            role: 0,
            grid: self.process_grid(),
            ranks: self.rank_count(),
        };
        if self.apps.is_empty() {
            return vec![positional];
        }
        self.apps
            .iter()
            .map(|spec| match spec.grid {
                Some(grid) => RolePlan {
                    role: spec.role,
                    grid,
                    ranks: grid.iter().product::<u64>() as usize,
                },
                None => RolePlan {
                    role: spec.role,
                    grid: positional.grid,
                    ranks: positional.ranks,
                },
            })
            .collect()
    }

    /// Check the settings are consistent before any rank starts.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let grid = self.process_grid();
        check_axes(&grid)?;
        let ranks = self.rank_count();
        if ranks == 0 {
            return Err(SettingsError::NoRanks);
        }
        let product: u64 = grid.iter().product();
        if product != ranks as u64 {
            return Err(SettingsError::GridMismatch { product, ranks });
        }
        for (i, spec) in self.apps.iter().enumerate() {
            if let Some(own) = &spec.grid {
                check_axes(own)?;
            }
            if self.apps[..i].iter().any(|s| s.role == spec.role) {
                return Err(SettingsError::RepeatedRole { role: spec.role });
            }
        }
        if !self.read_timeout.is_finite() || self.read_timeout < 0.0 {
            return Err(SettingsError::InvalidTimeout {
                seconds: self.read_timeout,
            });
        }
        Ok(())
    }

    /// Config build options for `role`.
    pub fn build_options(&self, role: u64) -> BuildOptions {
        BuildOptions {
            role,
            read_timeout: Duration::from_secs_f64(self.read_timeout.max(0.0)),
        }
    }
}
