//! Reconcile - 楽観的更新とロールバック
//!
//! # 学習ポイント
//! - snapshot → apply → request → commit / revert を 1 つのトランザクションとして扱う
//! - await の後は必ず Store を読み直す（捕まえた値を信用しない）
//!
//! # 不変条件
//! - rollback restores only the moved task's placement; every other change
//!   that arrived while the request was in flight survives
//! - the step's on-enter automation fires at most once per successful move
//! - nothing is touched after the await when the workflow view or the task
//!   is gone by then

use tracing::{debug, info, warn};

use crate::client::ClientActions;
use crate::domain::actions::{LaunchIntent, LaunchSessionRequest, MoveTaskRequest};
use crate::domain::{SessionId, StepId, TaskId, TaskSession, WorkflowId};
use crate::error::{MutationError, SyncError};
use crate::handlers::tasks::upsert_task;
use crate::store::{StoreHandle, TaskPlacement};

/// Side effect a successful move asked for.
#[derive(Debug, Clone)]
pub enum AutomationEvent {
    /// The target step starts an agent and the task already had a primary
    /// session; it was relaunched for the step.
    PrimarySessionLaunched(TaskSession),
    /// The target step starts an agent but the task has no session yet.
    /// Creating one is left to the caller.
    StartAgentRequested {
        task_id: TaskId,
        workflow_step_id: StepId,
    },
    /// Relaunching the primary session failed; the move itself stands.
    LaunchFailed {
        session_id: SessionId,
        error: SyncError,
    },
}

#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub task_id: TaskId,
    pub placement: TaskPlacement,
    pub automation: Option<AutomationEvent>,
}

/// Move a task to the end of `step_id`, optimistically.
///
/// The local move is skipped when the workflow or task is not loaded; the
/// request is still sent.
pub async fn move_task(
    store: &StoreHandle,
    actions: &ClientActions,
    task_id: &TaskId,
    workflow_id: &WorkflowId,
    step_id: &StepId,
) -> Result<MoveOutcome, MutationError> {
    let (previous, position) = store.write(|state| match state.view_for_mut(workflow_id) {
        Some(view) => {
            let position = view.append_position(step_id, task_id);
            (view.move_to_end(task_id, step_id), position)
        }
        None => (None, 0),
    });

    let request = MoveTaskRequest {
        task_id: task_id.clone(),
        workflow_id: workflow_id.clone(),
        workflow_step_id: step_id.clone(),
        position,
    };
    match actions.move_task(&request).await {
        Ok(response) => {
            if let Some(task) = response.task {
                store.write(|state| upsert_task(state, task));
            }
            let automation = match response.workflow_step {
                Some(step) if step.auto_starts_agent() => {
                    run_automation(store, actions, task_id, &step.id).await
                }
                _ => None,
            };
            Ok(MoveOutcome {
                task_id: task_id.clone(),
                placement: TaskPlacement {
                    step_id: step_id.clone(),
                    position,
                },
                automation,
            })
        }
        Err(cause) => {
            let (rolled_back, related_session_id) = store.write(|state| {
                let related = state
                    .find_task(task_id)
                    .and_then(|t| t.primary_session_id.clone());
                let rolled_back = match (&previous, state.view_for_mut(workflow_id)) {
                    (Some(placement), Some(view)) => view.place(task_id, placement),
                    _ => false,
                };
                (rolled_back, related)
            });
            warn!(
                task_id = %task_id,
                rolled_back,
                error = %cause,
                "task move failed"
            );
            Err(MutationError {
                message: format!("failed to move task: {cause}"),
                entity_id: task_id.to_string(),
                related_session_id,
                rolled_back,
                cause,
            })
        }
    }
}

async fn run_automation(
    store: &StoreHandle,
    actions: &ClientActions,
    task_id: &TaskId,
    step_id: &StepId,
) -> Option<AutomationEvent> {
    let primary = store.read(|state| {
        state
            .find_task(task_id)
            .map(|t| t.primary_session_id.clone())
    });
    let Some(primary) = primary else {
        debug!(task_id = %task_id, "task gone before automation; skipped");
        return None;
    };
    let Some(session_id) = primary else {
        info!(task_id = %task_id, step_id = %step_id, "step requests an agent start");
        return Some(AutomationEvent::StartAgentRequested {
            task_id: task_id.clone(),
            workflow_step_id: step_id.clone(),
        });
    };

    let request = LaunchSessionRequest::new(task_id.clone(), LaunchIntent::WorkflowStep)
        .with_session(session_id.clone())
        .with_step(step_id.clone());
    match actions.launch_session(&request, None).await {
        Ok(session) => {
            store.write(|state| {
                state.sessions.insert(session.id.clone(), session.clone());
            });
            Some(AutomationEvent::PrimarySessionLaunched(session))
        }
        Err(error) => {
            warn!(session_id = %session_id, error = %error, "workflow step launch failed");
            Some(AutomationEvent::LaunchFailed { session_id, error })
        }
    }
}
