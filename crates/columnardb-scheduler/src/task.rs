//! Task factory producing one schedulable unit per physical operator.
//!
//! An `OperatorTask` is a schedulable unit wrapping one operator; its
//! dependencies are the tasks wrapping that operator's inputs. Tasks are
//! produced in dependency order — a task's `depends_on` entries always
//! appear earlier in the returned list — so the final element is always the
//! sink task whose operator's output is the statement's result.
//!
//! The task list is a description of the DAG, not a separate execution
//! handle: `columnardb-operators::PhysicalOperator` already owns its input
//! tree exclusively and recurses correctly on `execute`, so
//! `Scheduler::schedule_and_wait` (`scheduler.rs`) drives the tree directly.
//! `make_tasks_from_operator` exists so callers (DDL precheck ordering,
//! tests asserting topological order, future cost accounting) can inspect
//! the shape of what will run without re-walking the operator tree
//! themselves.

use columnardb_operators::{OperatorType, PhysicalOperator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

#[derive(Debug, Clone)]
pub struct OperatorTask {
    pub id: TaskId,
    pub operator_type: OperatorType,
    pub depends_on: Vec<TaskId>,
}

impl OperatorTask {
    /// `true` for the unique task with no other task depending on it within
    /// a single `make_tasks_from_operator` call, i.e. the last element.
    pub fn is_sink(&self, tasks: &[OperatorTask]) -> bool {
        tasks.last().map(|t| t.id) == Some(self.id)
    }
}

/// Builds one task per operator in the DAG rooted at `root`, post-order, so
/// every dependency precedes its dependent and the sink is last.
pub fn make_tasks_from_operator(root: &PhysicalOperator) -> Vec<OperatorTask> {
    let mut tasks = Vec::new();
    build(root, &mut tasks);
    tasks
}

fn build(op: &PhysicalOperator, tasks: &mut Vec<OperatorTask>) -> TaskId {
    let mut depends_on = Vec::new();
    if let Some(left) = op.left_input() {
        depends_on.push(build(left, tasks));
    }
    if let Some(right) = op.right_input() {
        depends_on.push(build(right, tasks));
    }
    let id = TaskId(tasks.len());
    tasks.push(OperatorTask {
        id,
        operator_type: op.operator_type(),
        depends_on,
    });
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnardb_common::DataType;
    use columnardb_ir::{BinaryOperator, Expr, PlanSchema};
    use columnardb_operators::{OperatorKind, OperatorType};

    fn scan() -> PhysicalOperator {
        PhysicalOperator::new(OperatorKind::TableScan {
            table_name: "t".into(),
            schema: PlanSchema::new(vec![("a".into(), DataType::Int64)]),
        })
    }

    #[test]
    fn sink_task_is_the_last_element() {
        let op = PhysicalOperator::new(OperatorKind::Filter {
            input: Box::new(scan()),
            predicate: Expr::binary(
                BinaryOperator::Eq,
                Expr::column("a"),
                Expr::literal(columnardb_common::Value::Int64(1)),
            ),
        });
        let tasks = make_tasks_from_operator(&op);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].operator_type, OperatorType::Filter);
        assert!(tasks[1].is_sink(&tasks));
        assert_eq!(tasks[1].depends_on, vec![tasks[0].id]);
    }

    #[test]
    fn leaf_operator_has_no_dependencies() {
        let tasks = make_tasks_from_operator(&scan());
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].depends_on.is_empty());
        assert!(tasks[0].is_sink(&tasks));
    }

    #[test]
    fn join_task_depends_on_both_sides() {
        let op = PhysicalOperator::new(OperatorKind::Join {
            left: Box::new(scan()),
            right: Box::new(scan()),
            join_type: columnardb_ir::JoinType::Inner,
            condition: None,
        });
        let tasks = make_tasks_from_operator(&op);
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[2].depends_on.len(), 2);
    }
}
