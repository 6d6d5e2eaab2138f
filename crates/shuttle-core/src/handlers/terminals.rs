//! Terminal handlers.

use crate::domain::TerminalStatus;
use crate::domain::events::{TerminalCreated, TerminalExited};
use crate::store::AppState;
use crate::store::state::upsert_by;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<TerminalCreated, _>(|state: &mut AppState, e: TerminalCreated| {
        let terminals = state.terminals.entry(e.0.session_id.clone()).or_default();
        upsert_by(terminals, e.0, |a, b| a.id == b.id);
    })?;
    registry.register::<TerminalExited, _>(on_terminal_exited)?;
    Ok(())
}

/// Exited terminals stay listed (their output is still readable).
pub fn on_terminal_exited(state: &mut AppState, event: TerminalExited) {
    let terminal = state
        .terminals
        .get_mut(&event.session_id)
        .and_then(|ts| ts.iter_mut().find(|t| t.id == event.terminal_id));
    if let Some(terminal) = terminal {
        terminal.status = TerminalStatus::Exited;
        terminal.exit_code = event.exit_code;
    }
}
