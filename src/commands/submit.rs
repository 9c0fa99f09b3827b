use anyhow::{anyhow, Result};

use crate::api::Backend;
use crate::board::TicketBoard;
use crate::commands::{backend_error, require_session};
use crate::error::ClientError;
use crate::models::{NewTicket, Urgency};
use crate::session::SessionStore;

pub fn run<B: Backend>(
    store: &SessionStore<'_>,
    backend: &B,
    subject: &str,
    description: Option<&str>,
    urgency: &str,
    category: Option<&str>,
) -> Result<()> {
    let session = require_session(store)?;
    let urgency: Urgency = urgency.parse().map_err(|e: String| anyhow!(e))?;

    let ticket = NewTicket {
        subject: subject.trim().to_string(),
        description: description.unwrap_or_default().trim().to_string(),
        urgency,
        category: category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
    };

    let mut board = TicketBoard::new(session.view());
    let created = board
        .submit(backend, Some(&session.token), &ticket)
        .map_err(|e| match e {
            ClientError::Validation(_) => anyhow!(e),
            other => backend_error(other),
        })?;

    println!("Created ticket {} [{}] ({})", created.id, created.status, created.urgency);
    Ok(())
}
