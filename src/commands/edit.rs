//! User-side changes the backend has no endpoint for.
//!
//! Each one updates the board optimistically and is stored as a pending-sync
//! record, owned by the logged-in user, until reconciliation finds it stale.

use anyhow::{anyhow, bail, Result};
use std::io::{self, Write};

use crate::api::Backend;
use crate::commands::{load_board, require_role, require_session};
use crate::db::Database;
use crate::error::ClientError;
use crate::models::{Role, Urgency};
use crate::session::SessionStore;

fn local_error(id: &str, err: ClientError) -> anyhow::Error {
    if err.is_not_found() {
        anyhow!("Ticket {} not found", id)
    } else {
        anyhow!(err)
    }
}

pub fn edit<B: Backend>(
    db: &Database,
    store: &SessionStore<'_>,
    backend: &B,
    id: &str,
    subject: Option<&str>,
    description: Option<&str>,
    urgency: Option<&str>,
) -> Result<()> {
    let session = require_role(store, Role::User)?;
    let urgency = urgency
        .map(|u| u.parse::<Urgency>().map_err(|e| anyhow!(e)))
        .transpose()?;

    let mut board = load_board(db, backend, session)?;
    let change = board
        .edit_local(id, subject, description, urgency)
        .map_err(|e| local_error(id, e))?;
    let merged = db.upsert_pending_edit(&session.user.id, change)?;

    println!("Updated ticket {} locally (pending sync: {})", id, merged.summary());
    Ok(())
}

pub fn withdraw<B: Backend>(
    db: &Database,
    store: &SessionStore<'_>,
    backend: &B,
    id: &str,
) -> Result<()> {
    let session = require_role(store, Role::User)?;
    let mut board = load_board(db, backend, session)?;
    let change = board.withdraw_local(id).map_err(|e| local_error(id, e))?;
    db.upsert_pending_edit(&session.user.id, change)?;

    println!("Withdrew ticket {} (pending sync)", id);
    Ok(())
}

pub fn delete<B: Backend>(
    db: &Database,
    store: &SessionStore<'_>,
    backend: &B,
    id: &str,
    force: bool,
) -> Result<()> {
    let session = require_role(store, Role::User)?;
    let mut board = load_board(db, backend, session)?;

    let subject = match board.get(id) {
        Some(t) => t.subject.clone(),
        None => bail!("Ticket {} not found", id),
    };

    if !force {
        print!("Delete ticket {} \"{}\"? [y/N] ", id, subject);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let change = board.remove_local(id).map_err(|e| local_error(id, e))?;
    db.upsert_pending_edit(&session.user.id, change)?;
    println!("Deleted ticket {} (hidden locally, pending sync)", id);
    Ok(())
}

/// Internal function for testing without stdin interaction
#[cfg(test)]
pub fn delete_force<B: Backend>(
    db: &Database,
    store: &SessionStore<'_>,
    backend: &B,
    id: &str,
) -> Result<()> {
    delete(db, store, backend, id, true)
}

pub fn pending(db: &Database, store: &SessionStore<'_>) -> Result<()> {
    let session = require_session(store)?;
    let edits = db.list_pending_edits(&session.user.id)?;
    if edits.is_empty() {
        println!("No pending edits.");
        return Ok(());
    }

    for edit in edits {
        println!(
            "{:<10} {:<40} {}",
            edit.ticket_id,
            edit.summary(),
            edit.recorded_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub fn discard(db: &Database, store: &SessionStore<'_>, id: &str) -> Result<()> {
    let session = require_session(store)?;
    if db.remove_pending_edit(&session.user.id, id)? {
        println!("Discarded pending edit for {}", id);
    } else {
        bail!("No pending edit for {}", id);
    }
    Ok(())
}
