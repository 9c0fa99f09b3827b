use anyhow::{bail, Result};

use crate::api::Backend;
use crate::board::TicketBoard;
use crate::commands::{backend_error, persist_reconciliation, require_session};
use crate::db::Database;
use crate::models::View;
use crate::session::SessionStore;

pub fn run<B: Backend>(db: &Database, store: &SessionStore<'_>, backend: &B, id: &str) -> Result<()> {
    let session = require_session(store)?;

    let raw = match backend.ticket(Some(&session.token), id) {
        Ok(raw) => raw,
        Err(e) if e.is_not_found() => bail!("Ticket {} not found", id),
        Err(e) => return Err(backend_error(e)),
    };

    let mut board = TicketBoard::new(session.view());
    board.load(vec![raw]);

    let owner = session.user.id.as_str();
    let pending = match board.view() {
        View::User => db.get_pending_edit(owner, id)?,
        View::Admin => None,
    };
    if let Some(edit) = &pending {
        let outcome = board.apply_pending(std::slice::from_ref(edit));
        persist_reconciliation(db, owner, &outcome)?;
    }

    let ticket = match board.get(id) {
        Some(t) => t,
        None => bail!("Ticket {} not found", id),
    };

    println!("Ticket {}: {}", ticket.id, ticket.subject);
    println!("Status: {}", ticket.status);
    println!("Urgency: {}", ticket.urgency);
    if let Some(category) = &ticket.category {
        println!("Category: {}", category);
    }
    println!("Created: {}", ticket.date_key());
    if board.view() == View::Admin {
        if let Some(owner) = &ticket.owner {
            println!("Owner: {}", owner);
        }
    }

    if !ticket.description.is_empty() {
        println!("\nDescription:");
        for line in ticket.description.lines() {
            println!("  {}", line);
        }
    }

    if let Some(suggestion) = &ticket.admin_suggestion {
        println!("\nAdmin suggestion:");
        for line in suggestion.lines() {
            println!("  {}", line);
        }
    }

    if board.view() == View::User {
        if let Some(edit) = db.get_pending_edit(owner, id)? {
            println!("\nPending sync: {}", edit.summary());
        }
    }

    Ok(())
}
