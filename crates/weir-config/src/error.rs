//! Configuration errors.
//!
//! Every failure while building a [`Config`](crate::Config) is a
//! [`ConfigError`]: a [`ConfigErrorKind`] plus the 1-based number of the
//! offending line, when there is one.

use std::error::Error;
use std::fmt;

use weir_core::StreamMode;
use weir_decomp::DecompError;

/// A failure while reading or building a config, tagged with its line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    /// 1-based line number, or `None` for whole-file failures.
    pub line: Option<usize>,
    /// What went wrong.
    pub kind: ConfigErrorKind,
}

impl ConfigError {
    /// An error attributed to one line.
    pub fn at_line(line: usize, kind: ConfigErrorKind) -> Self {
        Self {
            line: Some(line),
            kind,
        }
    }

    /// An error not attributable to any line.
    pub fn whole_file(kind: ConfigErrorKind) -> Self {
        Self { line: None, kind }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(n) => write!(f, "line {n}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind.source()
    }
}

/// The specific reason a config was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// The config file could not be read.
    Unreadable {
        /// Path as given.
        path: String,
        /// I/O error text.
        reason: String,
    },
    /// The first word of a line is not a known keyword.
    UnknownKeyword {
        /// The keyword, lowercased.
        keyword: String,
    },
    /// A required word is missing.
    MissingArgument {
        /// What the line defines.
        what: String,
        /// 1-based word position that is missing.
        position: usize,
    },
    /// A word that must be a non-negative integer is not.
    InvalidInteger {
        /// What the value is for.
        what: String,
        /// The word as written.
        value: String,
    },
    /// A word that must be a number of seconds is not a finite,
    /// non-negative float.
    InvalidSeconds {
        /// What the value is for.
        what: String,
        /// The word as written.
        value: String,
    },
    /// The array element type is not `double`, `float` or `int`.
    UnsupportedType {
        /// The type as written.
        name: String,
    },
    /// An array declares a rank outside `1..=5`.
    InvalidRank {
        /// Array name.
        array: String,
        /// The declared rank.
        ndim: u64,
    },
    /// An array line is shorter than its declared rank requires.
    TooFewArrayWords {
        /// Minimum number of words.
        needed: usize,
        /// Number of words present.
        found: usize,
    },
    /// An `array` line appeared before any `group` line.
    NoCurrentGroup {
        /// Array name.
        array: String,
    },
    /// A group already holds a variable of this name.
    DuplicateVariable {
        /// Group name.
        group: String,
        /// Variable name.
        variable: String,
    },
    /// The array's global byte size does not fit in memory.
    ArrayTooLarge {
        /// Array name.
        array: String,
    },
    /// The array's decomposition is invalid for this process set.
    Decomposition {
        /// Array name.
        array: String,
        /// Underlying decomposition error.
        source: DecompError,
    },
    /// A command refers to a group that was never declared.
    UndefinedGroup {
        /// The command keyword.
        command: &'static str,
        /// Group name.
        group: String,
    },
    /// A command selects a variable its group does not hold.
    UndefinedVariable {
        /// The command keyword.
        command: &'static str,
        /// Group name.
        group: String,
        /// Variable name.
        variable: String,
    },
    /// A `read` mode other than `next` or `latest`.
    InvalidReadMode {
        /// The mode as written.
        mode: String,
    },
    /// `cond` followed directly by another `cond`.
    NestedCond,
    /// A stream is used for both writing and reading.
    StreamModeConflict {
        /// Stream name.
        stream: String,
        /// Mode the stream was first bound with.
        existing: StreamMode,
    },
    /// A stream is bound to two different groups.
    StreamGroupConflict {
        /// Stream name.
        stream: String,
        /// Group the stream was first bound to.
        existing: String,
        /// Group the new command names.
        group: String,
    },
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { path, reason } => write!(f, "{path} cannot be opened: {reason}"),
            Self::UnknownKeyword { keyword } => write!(f, "Unrecognized keyword '{keyword}'."),
            Self::MissingArgument { what, position } => write!(
                f,
                "Line for {what} is invalid. Missing value at word position {position}"
            ),
            Self::InvalidInteger { what, value } => {
                write!(f, "Invalid value given for {what}: {value}")
            }
            Self::InvalidSeconds { what, value } => write!(
                f,
                "Invalid floating point value given for {what}: {value}"
            ),
            Self::UnsupportedType { name } => write!(
                f,
                "Type '{name}' is invalid. Supported types are double, float and int"
            ),
            Self::InvalidRank { array, ndim } => write!(
                f,
                "Array '{array}' has {ndim} dimensions; between 1 and {} are supported",
                weir_core::MAX_DIMS
            ),
            Self::TooFewArrayWords { needed, found } => write!(
                f,
                "Line for array definition is invalid. There must be at least {needed} words \
                 in the line (array type name ndim dim1 ... dimN decomp1 ... decompN), \
                 found {found}"
            ),
            Self::NoCurrentGroup { array } => write!(
                f,
                "Array '{array}' is defined before any group; add a 'group' line first"
            ),
            Self::DuplicateVariable { group, variable } => {
                write!(f, "Group '{group}' already has a variable '{variable}'")
            }
            Self::ArrayTooLarge { array } => {
                write!(f, "Array '{array}' is too large: its size in bytes overflows")
            }
            Self::Decomposition { array, source } => {
                write!(f, "Invalid decomposition for array '{array}'. {source}")
            }
            Self::UndefinedGroup { command, group } => {
                write!(f, "Group '{group}' used in '{command}' command is undefined.")
            }
            Self::UndefinedVariable {
                command,
                group,
                variable,
            } => write!(
                f,
                "Group '{group}' used in '{command}' command has no variable '{variable}' defined."
            ),
            Self::InvalidReadMode { mode } => write!(
                f,
                "Mode '{mode}' for 'read' is invalid. It must be either 'next' or 'latest'"
            ),
            Self::NestedCond => write!(f, "'cond' cannot be followed by another 'cond'"),
            Self::StreamModeConflict { stream, existing } => write!(
                f,
                "Stream '{stream}' is already used for {existing} in this process"
            ),
            Self::StreamGroupConflict {
                stream,
                existing,
                group,
            } => write!(
                f,
                "Stream '{stream}' is bound to group '{existing}' and cannot be used with \
                 group '{group}'"
            ),
        }
    }
}

impl Error for ConfigErrorKind {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decomposition { source, .. } => Some(source),
            _ => None,
        }
    }
}
