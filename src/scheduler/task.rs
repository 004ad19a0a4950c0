//! Task types: one elementary binary operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Globally unique task identifier (flat ID space across expressions).
pub type TaskId = u64;

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    /// Binding strength used by the tree decomposer.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Add),
            "-" => Ok(Self::Sub),
            "*" => Ok(Self::Mul),
            "/" => Ok(Self::Div),
            other => Err(SchedulerError::invalid(format!("unknown operator '{other}'"))),
        }
    }
}

/// A unit of work handed to exactly one worker per pull.
///
/// Field names on the wire follow the worker protocol
/// (`arg1`, `arg2`, `operation`, `operation_time`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "arg1")]
    pub operand_a: f64,
    #[serde(rename = "arg2")]
    pub operand_b: f64,
    #[serde(rename = "operation")]
    pub operator: Operator,
    /// Simulated compute cost in milliseconds, fixed at decomposition time.
    #[serde(rename = "operation_time")]
    pub simulated_cost_ms: u64,
    /// Set once by the result collector. Internal, never sent to workers.
    #[serde(skip)]
    pub done: bool,
}
