//! User and user settings.

use serde::{Deserialize, Serialize};

use super::ids::{UserId, WorkflowId, WorkspaceId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Server-persisted user settings.
///
/// `workspace_id` / `workflow_id` double as the client's navigation state:
/// hydration may seed them, a broadcast never touches them
/// (see [`UserSettings::merge_broadcast`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    #[serde(default)]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default)]
    pub repository_ids: Vec<String>,
    #[serde(default)]
    pub preferred_shell: Option<String>,
    #[serde(default)]
    pub default_editor_id: Option<String>,
    #[serde(default)]
    pub chat_submit_key: Option<String>,
    #[serde(default)]
    pub enable_preview_on_click: bool,
    #[serde(default)]
    pub show_release_notes: bool,
}

/// A partial settings document. Absent fields mean "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettingsPatch {
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    #[serde(default)]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default)]
    pub repository_ids: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_shell: Option<String>,
    #[serde(default)]
    pub default_editor_id: Option<String>,
    #[serde(default)]
    pub chat_submit_key: Option<String>,
    #[serde(default)]
    pub enable_preview_on_click: Option<bool>,
    #[serde(default)]
    pub show_release_notes: Option<bool>,
}

impl UserSettings {
    /// Merge a hydrated snapshot's settings.
    ///
    /// Navigation fields are only seeded when the client has none yet; an
    /// already selected workspace/workflow is never replaced.
    pub fn merge_snapshot(&mut self, mut patch: UserSettingsPatch) {
        if self.workspace_id.is_none() {
            self.workspace_id = patch.workspace_id.take();
        }
        if self.workflow_id.is_none() {
            self.workflow_id = patch.workflow_id.take();
        }
        self.merge_broadcast(patch);
    }

    /// Merge a `user.settings.updated` broadcast. Its navigation fields are
    /// ignored, including when the client has no selection.
    pub fn merge_broadcast(&mut self, patch: UserSettingsPatch) {
        let UserSettingsPatch {
            repository_ids,
            preferred_shell,
            default_editor_id,
            chat_submit_key,
            enable_preview_on_click,
            show_release_notes,
            ..
        } = patch;
        if let Some(ids) = repository_ids {
            self.repository_ids = ids;
        }
        if let Some(shell) = preferred_shell {
            self.preferred_shell = Some(shell);
        }
        if let Some(editor) = default_editor_id {
            self.default_editor_id = Some(editor);
        }
        if let Some(key) = chat_submit_key {
            self.chat_submit_key = Some(key);
        }
        if let Some(flag) = enable_preview_on_click {
            self.enable_preview_on_click = flag;
        }
        if let Some(flag) = show_release_notes {
            self.show_release_notes = flag;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_keeps_selected_navigation() {
        let mut settings = UserSettings {
            workspace_id: Some(WorkspaceId::new("ws-active")),
            workflow_id: Some(WorkflowId::new("wf-active")),
            ..UserSettings::default()
        };

        settings.merge_broadcast(UserSettingsPatch {
            workspace_id: Some(WorkspaceId::new("ws-stale")),
            workflow_id: Some(WorkflowId::new("wf-stale")),
            preferred_shell: Some("zsh".to_string()),
            ..UserSettingsPatch::default()
        });

        assert_eq!(settings.workspace_id, Some(WorkspaceId::new("ws-active")));
        assert_eq!(settings.workflow_id, Some(WorkflowId::new("wf-active")));
        assert_eq!(settings.preferred_shell.as_deref(), Some("zsh"));
    }

    #[test]
    fn broadcast_never_selects_navigation() {
        let mut settings = UserSettings::default();
        settings.merge_broadcast(UserSettingsPatch {
            workspace_id: Some(WorkspaceId::new("ws-stale")),
            workflow_id: Some(WorkflowId::new("wf-stale")),
            ..UserSettingsPatch::default()
        });
        assert_eq!(settings.workspace_id, None);
        assert_eq!(settings.workflow_id, None);
    }

    #[test]
    fn snapshot_seeds_empty_navigation_only() {
        let mut settings = UserSettings {
            workflow_id: Some(WorkflowId::new("wf-active")),
            ..UserSettings::default()
        };
        settings.merge_snapshot(UserSettingsPatch {
            workspace_id: Some(WorkspaceId::new("ws-1")),
            workflow_id: Some(WorkflowId::new("wf-stale")),
            chat_submit_key: Some("enter".to_string()),
            ..UserSettingsPatch::default()
        });
        assert_eq!(settings.workspace_id, Some(WorkspaceId::new("ws-1")));
        assert_eq!(settings.workflow_id, Some(WorkflowId::new("wf-active")));
        assert_eq!(settings.chat_submit_key.as_deref(), Some("enter"));
    }

    #[test]
    fn absent_fields_are_unchanged() {
        let mut settings = UserSettings {
            repository_ids: vec!["r1".to_string()],
            enable_preview_on_click: true,
            ..UserSettings::default()
        };
        settings.merge_broadcast(UserSettingsPatch::default());
        assert_eq!(settings.repository_ids, vec!["r1".to_string()]);
        assert!(settings.enable_preview_on_click);
    }
}
