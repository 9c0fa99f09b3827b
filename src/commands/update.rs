use anyhow::{anyhow, bail, Result};

use crate::api::Backend;
use crate::board::TicketBoard;
use crate::commands::{backend_error, require_role};
use crate::models::{AdminUpdate, Role, TicketStatus, Urgency, View};
use crate::session::SessionStore;

const VALID_STATUSES: [&str; 4] = ["open", "pending", "in_progress", "resolved"];

pub fn validate_status(status: &str) -> bool {
    VALID_STATUSES.contains(&status.trim().to_lowercase().as_str())
}

/// Admin triage: change priority, urgency, status or the suggestion.
pub fn run<B: Backend>(
    store: &SessionStore<'_>,
    backend: &B,
    id: &str,
    priority: Option<&str>,
    urgency: Option<&str>,
    status: Option<&str>,
    suggestion: Option<&str>,
) -> Result<()> {
    if priority.is_none() && urgency.is_none() && status.is_none() && suggestion.is_none() {
        bail!("Nothing to update. Use --priority, --urgency, --status, or --suggestion");
    }
    let session = require_role(store, Role::Admin)?;

    let mut update = AdminUpdate::default();
    if let Some(p) = priority {
        let p: Urgency = p.parse().map_err(|e: String| anyhow!(e))?;
        update = update.with_priority(p);
    }
    if let Some(u) = urgency {
        let u: Urgency = u.parse().map_err(|e: String| anyhow!(e))?;
        update = update.with_urgency(u);
    }
    if let Some(s) = status {
        if !validate_status(s) {
            bail!(
                "Invalid status '{}'. Must be one of: {}",
                s,
                VALID_STATUSES.join(", ")
            );
        }
        update = update.with_status(&TicketStatus::parse(s));
    }
    if let Some(text) = suggestion {
        update = update.with_suggestion(text.trim());
    }

    let mut board = TicketBoard::new(View::Admin);
    let ticket = match board.admin_update(backend, Some(&session.token), id, &update) {
        Ok(t) => t,
        Err(e) if e.is_not_found() => bail!("Ticket {} not found", id),
        Err(e) => return Err(backend_error(e)),
    };

    println!(
        "Updated ticket {}: [{}] {} ({})",
        ticket.id, ticket.status, ticket.subject, ticket.urgency
    );
    Ok(())
}
