//! Reporting of non-fatal problems.
//!
//! Operations that skip work instead of failing (scale baking over a subtree
//! with unsupported shapes, for instance) report through a [`WarningSink`]
//! passed in by the caller.

use std::fmt;

use log::warn;

use crate::{NodeId, TransformError};

/// A problem that was recovered from.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub node: NodeId,
    pub error: TransformError,
}

impl Warning {
    pub fn new(node: NodeId, error: TransformError) -> Self {
        Self { node, error }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.node, self.error)
    }
}

/// Receives warnings from long-running operations.
pub trait WarningSink {
    fn warn(&mut self, warning: Warning);
}

/// Forwards warnings to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl WarningSink for LogSink {
    fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
    }
}

/// Collects warnings for later inspection.
impl WarningSink for Vec<Warning> {
    fn warn(&mut self, warning: Warning) {
        self.push(warning);
    }
}
