//! Expression decomposer: turns an expression string into a plan of tasks.
//!
//! Two modes:
//! - `pairwise`: every operator becomes an independent task over the raw
//!   tokens on either side of it. No precedence, no data flow between tasks;
//!   the expression's value is whichever task reports last.
//! - `tree`: precedence-aware shunting-yard. Steps reference earlier steps,
//!   the last step is the root, and results flow from children to parents.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::task::Operator;
use crate::error::SchedulerError;

/// Minimum token count for a single binary operation.
const MIN_TOKENS: usize = 3;

/// How an expression is broken into tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionMode {
    #[default]
    Pairwise,
    Tree,
}

impl fmt::Display for DecompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pairwise => f.write_str("pairwise"),
            Self::Tree => f.write_str("tree"),
        }
    }
}

impl FromStr for DecompositionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pairwise" => Ok(Self::Pairwise),
            "tree" => Ok(Self::Tree),
            other => Err(format!("unknown decomposition mode '{other}'")),
        }
    }
}

/// One operand of a planned step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Literal(f64),
    /// Output of an earlier step (index into `Plan::steps`).
    Step(usize),
}

/// A planned binary operation, not yet assigned a task ID.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub operator: Operator,
    pub lhs: Operand,
    pub rhs: Operand,
    pub simulated_cost_ms: u64,
}

/// Ordered steps for one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub mode: DecompositionMode,
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// Decompose `expression` with a thread-local RNG for simulated costs.
pub fn decompose(
    expression: &str,
    mode: DecompositionMode,
    cost_range_ms: &Range<u64>,
) -> Result<Plan, SchedulerError> {
    decompose_with_rng(expression, mode, cost_range_ms, &mut rand::thread_rng())
}

/// Decompose `expression`, drawing simulated costs from `rng`.
pub fn decompose_with_rng<R: Rng>(
    expression: &str,
    mode: DecompositionMode,
    cost_range_ms: &Range<u64>,
    rng: &mut R,
) -> Result<Plan, SchedulerError> {
    let tokens: Vec<&str> = expression.split_whitespace().collect();
    if tokens.len() < MIN_TOKENS {
        return Err(SchedulerError::invalid(format!(
            "expected at least {MIN_TOKENS} tokens, got {}",
            tokens.len()
        )));
    }

    let mut draw_cost = || {
        if cost_range_ms.is_empty() {
            cost_range_ms.start
        } else {
            rng.gen_range(cost_range_ms.clone())
        }
    };

    let steps = match mode {
        DecompositionMode::Pairwise => pairwise_steps(&tokens, &mut draw_cost)?,
        DecompositionMode::Tree => tree_steps(&tokens, &mut draw_cost)?,
    };

    Ok(Plan { mode, steps })
}

/// One step per operator at an odd index, over its immediate neighbours.
/// Unparseable operands become `0.0`; a dangling trailing operator is dropped.
/// Operators outside `+ - * /` are rejected here, where the legacy server
/// queued them and its workers answered `0`.
fn pairwise_steps(
    tokens: &[&str],
    draw_cost: &mut impl FnMut() -> u64,
) -> Result<Vec<Step>, SchedulerError> {
    (1..tokens.len() - 1)
        .step_by(2)
        .map(|i| -> Result<Step, SchedulerError> {
            Ok(Step {
                operator: tokens[i].parse()?,
                lhs: Operand::Literal(lenient_number(tokens[i - 1])),
                rhs: Operand::Literal(lenient_number(tokens[i + 1])),
                simulated_cost_ms: draw_cost(),
            })
        })
        .collect()
}

fn lenient_number(token: &str) -> f64 {
    token.parse().unwrap_or(0.0)
}

enum Pending {
    Op(Operator),
    OpenParen,
}

/// Shunting-yard over whitespace-separated tokens, emitting steps in
/// dependency order. The final step is the root.
fn tree_steps(
    tokens: &[&str],
    draw_cost: &mut impl FnMut() -> u64,
) -> Result<Vec<Step>, SchedulerError> {
    let mut steps: Vec<Step> = Vec::new();
    let mut operands: Vec<Operand> = Vec::new();
    let mut pending: Vec<Pending> = Vec::new();
    let mut expect_operand = true;

    let mut reduce = |op: Operator, operands: &mut Vec<Operand>, steps: &mut Vec<Step>| {
        let rhs = operands.pop();
        let lhs = operands.pop();
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => {
                steps.push(Step {
                    operator: op,
                    lhs,
                    rhs,
                    simulated_cost_ms: draw_cost(),
                });
                operands.push(Operand::Step(steps.len() - 1));
                Ok(())
            }
            _ => Err(SchedulerError::invalid(format!(
                "operator '{op}' is missing an operand"
            ))),
        }
    };

    for &token in tokens {
        match token {
            "(" => {
                if !expect_operand {
                    return Err(SchedulerError::invalid("unexpected '('"));
                }
                pending.push(Pending::OpenParen);
            }
            ")" => {
                if expect_operand {
                    return Err(SchedulerError::invalid("unexpected ')'"));
                }
                loop {
                    match pending.pop() {
                        Some(Pending::Op(op)) => reduce(op, &mut operands, &mut steps)?,
                        Some(Pending::OpenParen) => break,
                        None => return Err(SchedulerError::invalid("unbalanced ')'")),
                    }
                }
            }
            _ if expect_operand => {
                let n: f64 = token
                    .parse()
                    .ok()
                    .filter(|n: &f64| n.is_finite())
                    .ok_or_else(|| SchedulerError::invalid(format!("'{token}' is not a number")))?;
                operands.push(Operand::Literal(n));
                expect_operand = false;
            }
            _ => {
                let op: Operator = token.parse()?;
                while let Some(Pending::Op(top)) = pending.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    let top = *top;
                    pending.pop();
                    reduce(top, &mut operands, &mut steps)?;
                }
                pending.push(Pending::Op(op));
                expect_operand = true;
            }
        }
    }

    if expect_operand {
        return Err(SchedulerError::invalid("expression ends without an operand"));
    }

    while let Some(item) = pending.pop() {
        match item {
            Pending::Op(op) => reduce(op, &mut operands, &mut steps)?,
            Pending::OpenParen => return Err(SchedulerError::invalid("unbalanced '('")),
        }
    }

    if steps.is_empty() {
        return Err(SchedulerError::invalid("expression has no operation"));
    }

    Ok(steps)
}
