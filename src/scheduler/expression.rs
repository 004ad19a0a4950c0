//! Expression records and their owned tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decompose::{DecompositionMode, Operand, Plan};
use super::task::{Task, TaskId};
use super::value::Value;

/// Globally unique expression identifier.
pub type ExpressionId = u64;

/// Lifecycle of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionStatus {
    /// At least one owned task has not reported.
    Pending,
    /// Every owned task has reported.
    Done,
}

impl std::fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Done => f.write_str("done"),
        }
    }
}

/// Client-visible snapshot of an expression. Tasks are never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionView {
    pub id: ExpressionId,
    pub status: ExpressionStatus,
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Lhs,
    Rhs,
}

/// Where a tree-mode task's output is consumed.
#[derive(Debug, Clone, Copy)]
struct Feed {
    parent: usize,
    side: Side,
}

#[derive(Debug, Clone)]
struct TaskSlot {
    task: Task,
    feeds: Option<Feed>,
    /// Operands still waiting on a child step.
    awaiting: u8,
    value: Option<Value>,
}

/// What recording a result changed.
#[derive(Debug, Default)]
pub(crate) struct RecordOutcome {
    /// The task had already reported; nothing was mutated.
    pub duplicate: bool,
    /// Parent tasks whose operands are now all known.
    pub ready: Vec<Task>,
    /// This report flipped the expression to `Done`.
    pub completed: bool,
}

/// An expression and the tasks decomposed from it.
#[derive(Debug, Clone)]
pub struct Expression {
    pub id: ExpressionId,
    pub source: String,
    pub mode: DecompositionMode,
    pub status: ExpressionStatus,
    /// Most recently reported value; in tree mode pinned to the root once it resolves.
    pub result: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    first_task_id: TaskId,
    slots: Vec<TaskSlot>,
}

impl Expression {
    /// Materialize a plan, assigning task IDs `first_task_id..first_task_id + plan.step_count()`.
    pub(crate) fn from_plan(
        id: ExpressionId,
        source: impl Into<String>,
        plan: Plan,
        first_task_id: TaskId,
    ) -> Self {
        let mut slots: Vec<TaskSlot> = Vec::with_capacity(plan.step_count());

        for (index, step) in plan.steps.into_iter().enumerate() {
            let mut awaiting = 0;
            let mut resolve = |operand: Operand, side: Side, slots: &mut Vec<TaskSlot>| match operand {
                Operand::Literal(n) => n,
                Operand::Step(child) => {
                    slots[child].feeds = Some(Feed {
                        parent: index,
                        side,
                    });
                    awaiting += 1;
                    0.0
                }
            };
            let operand_a = resolve(step.lhs, Side::Lhs, &mut slots);
            let operand_b = resolve(step.rhs, Side::Rhs, &mut slots);

            slots.push(TaskSlot {
                task: Task {
                    id: first_task_id + index as TaskId,
                    operand_a,
                    operand_b,
                    operator: step.operator,
                    simulated_cost_ms: step.simulated_cost_ms,
                    done: false,
                },
                feeds: None,
                awaiting,
                value: None,
            });
        }

        Self {
            id,
            source: source.into(),
            mode: plan.mode,
            status: ExpressionStatus::Pending,
            result: None,
            created_at: Utc::now(),
            completed_at: None,
            first_task_id,
            slots,
        }
    }

    /// Owned tasks in decomposition order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.slots.iter().map(|slot| &slot.task)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks().map(|task| task.id)
    }

    pub fn task_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_done(&self) -> bool {
        self.status == ExpressionStatus::Done
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.slot_index(task_id).map(|i| &self.slots[i].task)
    }

    /// Tasks whose operands are all known at creation time.
    pub(crate) fn initially_ready(&self) -> Vec<Task> {
        self.slots
            .iter()
            .filter(|slot| slot.awaiting == 0)
            .map(|slot| slot.task.clone())
            .collect()
    }

    pub fn view(&self) -> ExpressionView {
        ExpressionView {
            id: self.id,
            status: self.status,
            result: self.result,
        }
    }

    /// Apply a worker's result for one of this expression's tasks.
    ///
    /// Caller guarantees `task_id` is owned by this expression.
    pub(crate) fn record_result(&mut self, task_id: TaskId, value: Value) -> RecordOutcome {
        let mut outcome = RecordOutcome::default();
        let Some(index) = self.slot_index(task_id) else {
            return outcome;
        };

        let slot = &mut self.slots[index];
        if slot.task.done {
            outcome.duplicate = true;
            return outcome;
        }
        slot.task.done = true;
        slot.value = Some(value);
        self.result = Some(value);

        if self.mode == DecompositionMode::Tree {
            self.propagate(index, value, &mut outcome.ready);
            if let Some(root) = self.slots.last().and_then(|slot| slot.value) {
                self.result = Some(root);
            }
        }

        if self.status == ExpressionStatus::Pending && self.slots.iter().all(|s| s.task.done) {
            self.status = ExpressionStatus::Done;
            self.completed_at = Some(Utc::now());
            outcome.completed = true;
        }

        outcome
    }

    /// Push a finished step's value into its parent. An undefined value
    /// resolves every ancestor as undefined without dispatching it.
    fn propagate(&mut self, mut index: usize, value: Value, ready: &mut Vec<Task>) {
        while let Some(feed) = self.slots[index].feeds {
            let parent = &mut self.slots[feed.parent];
            if parent.task.done {
                return;
            }
            match value {
                Value::Number(n) => {
                    match feed.side {
                        Side::Lhs => parent.task.operand_a = n,
                        Side::Rhs => parent.task.operand_b = n,
                    }
                    parent.awaiting = parent.awaiting.saturating_sub(1);
                    if parent.awaiting == 0 {
                        ready.push(parent.task.clone());
                    }
                    return;
                }
                Value::Undefined => {
                    parent.task.done = true;
                    parent.value = Some(Value::Undefined);
                    index = feed.parent;
                }
            }
        }
    }

    fn slot_index(&self, task_id: TaskId) -> Option<usize> {
        let offset = task_id.checked_sub(self.first_task_id)?;
        let index = usize::try_from(offset).ok()?;
        (index < self.slots.len()).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::decompose::decompose;

    fn build(expr: &str, mode: DecompositionMode) -> Expression {
        let plan = decompose(expr, mode, &(0..1)).unwrap();
        Expression::from_plan(1, expr, plan, 10)
    }

    #[test]
    fn assigns_contiguous_task_ids() {
        let expr = build("1 + 2 - 3 * 4", DecompositionMode::Pairwise);
        assert_eq!(expr.task_ids().collect::<Vec<_>>(), vec![10, 11, 12]);
        assert!(expr.task(12).is_some());
        assert!(expr.task(9).is_none());
        assert!(expr.task(13).is_none());
    }

    #[test]
    fn pairwise_done_only_after_every_task() {
        let mut expr = build("1 + 2 * 3", DecompositionMode::Pairwise);
        assert_eq!(expr.initially_ready().len(), 2);

        let first = expr.record_result(11, Value::Number(6.0));
        assert!(!first.completed);
        assert_eq!(expr.status, ExpressionStatus::Pending);
        assert_eq!(expr.result, Some(Value::Number(6.0)));

        let second = expr.record_result(10, Value::Number(3.0));
        assert!(second.completed);
        assert!(expr.is_done());
        // Last writer wins.
        assert_eq!(expr.result, Some(Value::Number(3.0)));
        assert!(expr.completed_at.is_some());
    }

    #[test]
    fn duplicate_report_changes_nothing() {
        let mut expr = build("1 + 2 * 3", DecompositionMode::Pairwise);
        expr.record_result(10, Value::Number(3.0));
        let dup = expr.record_result(10, Value::Number(99.0));
        assert!(dup.duplicate);
        assert_eq!(expr.result, Some(Value::Number(3.0)));
    }

    #[test]
    fn tree_feeds_parent_when_children_finish() {
        let mut expr = build("( 1 + 2 ) * ( 3 + 4 )", DecompositionMode::Tree);
        let ready: Vec<_> = expr.initially_ready().iter().map(|t| t.id).collect();
        assert_eq!(ready, vec![10, 11]);

        assert!(expr.record_result(10, Value::Number(3.0)).ready.is_empty());
        let outcome = expr.record_result(11, Value::Number(7.0));
        assert_eq!(outcome.ready.len(), 1);
        let root = &outcome.ready[0];
        assert_eq!((root.id, root.operand_a, root.operand_b), (12, 3.0, 7.0));

        let outcome = expr.record_result(12, Value::Number(21.0));
        assert!(outcome.completed);
        assert_eq!(expr.result, Some(Value::Number(21.0)));
    }

    #[test]
    fn tree_undefined_short_circuits_ancestors() {
        let mut expr = build("( 1 / 0 ) + ( 2 * 3 )", DecompositionMode::Tree);
        let outcome = expr.record_result(10, Value::Undefined);
        assert!(outcome.ready.is_empty());
        assert!(expr.task(12).unwrap().done);
        assert_eq!(expr.status, ExpressionStatus::Pending);

        // The sibling still has to report; the root keeps its value.
        let outcome = expr.record_result(11, Value::Number(6.0));
        assert!(outcome.completed);
        assert!(outcome.ready.is_empty());
        assert_eq!(expr.result, Some(Value::Undefined));
    }
}
