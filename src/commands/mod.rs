pub mod auth;
pub mod config;
pub mod edit;
pub mod list;
pub mod show;
pub mod submit;
pub mod update;

use anyhow::{anyhow, bail, Result};

use crate::api::Backend;
use crate::board::{Reconciliation, TicketBoard};
use crate::db::Database;
use crate::error::ClientError;
use crate::models::{Role, Session};
use crate::session::SessionStore;

pub fn require_session<'s>(store: &'s SessionStore<'_>) -> Result<&'s Session> {
    store
        .current()
        .ok_or_else(|| anyhow!("Not logged in. Run 'ticketdesk login' first."))
}

pub fn require_role<'s>(store: &'s SessionStore<'_>, role: Role) -> Result<&'s Session> {
    let session = require_session(store)?;
    if session.user.role != role {
        bail!(
            "This command is only available to {} accounts (logged in as {})",
            role,
            session.user.role
        );
    }
    Ok(session)
}

/// Turn a backend failure into a CLI error, with a hint for expired sessions.
pub fn backend_error(err: ClientError) -> anyhow::Error {
    if let ClientError::Server { status: 401, .. } = err {
        return anyhow!(
            "{}. Your session may have expired; run 'ticketdesk login'.",
            err.message()
        );
    }
    anyhow!(err)
}

/// Fetch the board for the logged-in role and, for users, lay their own
/// pending edits over it.
pub fn load_board<B: Backend>(
    db: &Database,
    backend: &B,
    session: &Session,
) -> Result<TicketBoard> {
    let mut board = TicketBoard::new(session.view());
    board
        .refresh(backend, Some(&session.token))
        .map_err(backend_error)?;

    if !session.is_admin() {
        let owner = session.user.id.as_str();
        let edits = db.list_pending_edits(owner)?;
        let outcome = board.apply_pending(&edits);
        persist_reconciliation(db, owner, &outcome)?;
    }
    Ok(board)
}

/// Forget pending records of `owner` that reconciliation found stale.
pub fn persist_reconciliation(db: &Database, owner: &str, outcome: &Reconciliation) -> Result<()> {
    for id in &outcome.dropped {
        db.remove_pending_edit(owner, id)?;
    }
    for id in &outcome.withdrawals_cleared {
        db.clear_withdrawn(owner, id)?;
    }
    if !outcome.dropped.is_empty() || !outcome.withdrawals_cleared.is_empty() {
        tracing::info!(
            owner,
            dropped = outcome.dropped.len(),
            cleared = outcome.withdrawals_cleared.len(),
            "pruned stale pending edits"
        );
    }
    Ok(())
}
