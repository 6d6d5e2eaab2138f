//! Kanban view: the steps and tasks of exactly one workflow.
//!
//! # 不変条件
//! - every task and step in a view belongs to `workflow_id`
//! - steps stay sorted by `position`; ties keep their previous relative order
//! - a moved task is appended at the end of its target step

use serde::{Deserialize, Serialize};

use crate::domain::{StepId, Task, TaskId, WorkflowId, WorkflowStep};

/// Where a task sits on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPlacement {
    pub step_id: StepId,
    pub position: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KanbanView {
    pub workflow_id: Option<WorkflowId>,
    pub steps: Vec<WorkflowStep>,
    pub tasks: Vec<Task>,
}

impl KanbanView {
    pub fn scoped(workflow_id: WorkflowId) -> Self {
        Self {
            workflow_id: Some(workflow_id),
            steps: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn is_scoped_to(&self, workflow_id: &WorkflowId) -> bool {
        self.workflow_id.as_ref() == Some(workflow_id)
    }

    /// Replace the whole board (kanban snapshot).
    pub fn replace(&mut self, workflow_id: WorkflowId, steps: Vec<WorkflowStep>, tasks: Vec<Task>) {
        self.workflow_id = Some(workflow_id.clone());
        self.steps = steps
            .into_iter()
            .filter(|s| s.workflow_id == workflow_id)
            .collect();
        self.tasks = tasks
            .into_iter()
            .filter(|t| t.workflow_id == workflow_id && !t.is_archived())
            .collect();
        sort_steps(&mut self.steps);
    }

    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == task_id)
    }

    pub fn step(&self, step_id: &StepId) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| &s.id == step_id)
    }

    /// Upsert by id. Returns `false` (no-op) when the task belongs to another
    /// workflow. An archived task is removed instead.
    pub fn upsert_task(&mut self, task: Task) -> bool {
        if !self.is_scoped_to(&task.workflow_id) {
            return false;
        }
        if task.is_archived() {
            self.remove_task(&task.id);
            return true;
        }
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        true
    }

    pub fn remove_task(&mut self, task_id: &TaskId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| &t.id == task_id)?;
        Some(self.tasks.remove(idx))
    }

    /// Upsert by id, then re-sort by position (stable).
    pub fn upsert_step(&mut self, step: WorkflowStep) -> bool {
        if !self.is_scoped_to(&step.workflow_id) {
            return false;
        }
        match self.steps.iter_mut().find(|s| s.id == step.id) {
            Some(existing) => *existing = step,
            None => self.steps.push(step),
        }
        sort_steps(&mut self.steps);
        true
    }

    pub fn remove_step(&mut self, step_id: &StepId) -> Option<WorkflowStep> {
        let idx = self.steps.iter().position(|s| &s.id == step_id)?;
        Some(self.steps.remove(idx))
    }

    /// Position a task gets when appended to `step_id`, ignoring `moving` itself.
    pub fn append_position(&self, step_id: &StepId, moving: &TaskId) -> i64 {
        self.tasks
            .iter()
            .filter(|t| &t.workflow_step_id == step_id && &t.id != moving)
            .count() as i64
    }

    pub fn placement(&self, task_id: &TaskId) -> Option<TaskPlacement> {
        self.task(task_id).map(|t| TaskPlacement {
            step_id: t.workflow_step_id.clone(),
            position: t.position,
        })
    }

    /// Move a task to the end of `step_id`. Returns the placement it had before.
    pub fn move_to_end(&mut self, task_id: &TaskId, step_id: &StepId) -> Option<TaskPlacement> {
        let position = self.append_position(step_id, task_id);
        let task = self.task_mut(task_id)?;
        let previous = TaskPlacement {
            step_id: std::mem::replace(&mut task.workflow_step_id, step_id.clone()),
            position: std::mem::replace(&mut task.position, position),
        };
        Some(previous)
    }

    /// Put a task at an exact placement, leaving every other field as it is now.
    pub fn place(&mut self, task_id: &TaskId, placement: &TaskPlacement) -> bool {
        match self.task_mut(task_id) {
            Some(task) => {
                task.workflow_step_id = placement.step_id.clone();
                task.position = placement.position;
                true
            }
            None => false,
        }
    }

    /// Tasks of one step ordered by position.
    pub fn tasks_in_step(&self, step_id: &StepId) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| &t.workflow_step_id == step_id)
            .collect();
        tasks.sort_by_key(|t| t.position);
        tasks
    }
}

/// `sort_by_key` is a stable sort: equal positions keep their current order.
fn sort_steps(steps: &mut [WorkflowStep]) {
    steps.sort_by_key(|s| s.position);
}
