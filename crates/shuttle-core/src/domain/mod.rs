//! Domain model (ids, wire envelope, entities, notifications, client actions).

pub mod actions;
pub mod agents;
pub mod board;
pub mod envelope;
pub mod events;
pub mod github;
pub mod ids;
pub mod session;
pub mod settings;

pub use agents::{
    Agent, AgentProfile, Environment, Executor, PrepareProgress, PrepareStatus, TaskPlan,
};
pub use board::{StepAction, StepEvents, Task, TaskState, Workflow, WorkflowStep, Workspace};
pub use envelope::{Envelope, ErrorPayload, MessageType};
pub use github::{GitHubStatus, PullRequest, RepoWatch};
pub use ids::{
    AgentId, AgentProfileId, CorrelationId, EnvironmentId, ExecutorId, Id, IdMarker, MessageId,
    PermissionId, SessionId, StepId, TaskId, TerminalId, TurnId, UserId, WorkflowId, WorkspaceId,
};
pub use session::{
    AuthorType, Message, MessageKind, PendingPermission, PermissionOption, QueueStatus,
    QueuedMessage, SessionState, TaskSession, Terminal, TerminalStatus, ToolCallStatus, Turn,
};
pub use settings::{User, UserSettings, UserSettingsPatch};
