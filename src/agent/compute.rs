//! Single-operation evaluation performed by a worker.

use std::time::Duration;

use crate::scheduler::{Operator, Task, Value};

/// Apply the task's operator. Division by zero yields `Value::Undefined`.
pub fn evaluate(task: &Task) -> Value {
    let (a, b) = (task.operand_a, task.operand_b);
    match task.operator {
        Operator::Add => Value::from_f64(a + b),
        Operator::Sub => Value::from_f64(a - b),
        Operator::Mul => Value::from_f64(a * b),
        Operator::Div if b == 0.0 => Value::Undefined,
        Operator::Div => Value::from_f64(a / b),
    }
}

/// Wait out the task's simulated cost, then evaluate it.
pub async fn compute(task: &Task) -> Value {
    if task.simulated_cost_ms > 0 {
        tokio::time::sleep(Duration::from_millis(task.simulated_cost_ms)).await;
    }
    evaluate(task)
}
