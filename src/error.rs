//! Error taxonomy for the learning loop.
//!
//! Per-iteration failures (allocation, execution, timeout) are never fatal: they
//! are logged and the worker continues. CLI flag errors are fatal to the whole
//! process, but are represented as plain `String`s at that boundary rather than
//! a dedicated type here.

use std::fmt;

/// Allocation failure while growing the association map, a vocabulary, or an output
/// buffer. Recoverable: the caller drops the one update or the one command's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocation failed")
    }
}

impl std::error::Error for AllocError {}

/// Pipe/fork failure in the child-process executor. Recoverable: the worker
/// treats the iteration as having produced no output. Exec failure itself is
/// handled entirely inside the forked child via exit status 127 and never
/// surfaces to the parent as a `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    Pipe,
    Fork,
    Alloc,
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Pipe => write!(f, "failed to create pipe"),
            ExecError::Fork => write!(f, "fork failed"),
            ExecError::Alloc => write!(f, "allocation failed while growing output buffer"),
        }
    }
}

impl std::error::Error for ExecError {}
