//! Mapping of backend ticket records onto the canonical client shape.
//!
//! The backend is inconsistent about naming: list items carry `priority`
//! (capitalized) while full records carry `urgency` (lowercase), and status
//! `in_progress` is what the admin dashboard calls `pending`. Everything
//! downstream of this module only ever sees [`Ticket`].

use chrono::NaiveDate;

use crate::models::{RawTicket, Ticket, TicketStatus, Urgency, View};

pub fn normalize(raw: RawTicket, view: View) -> Ticket {
    let urgency = resolve_urgency(raw.urgency.as_deref(), raw.priority.as_deref());
    let status = map_status(raw.status.as_deref().unwrap_or("open"), view);
    let created_on = raw.created_at.as_deref().and_then(truncate_date);

    Ticket {
        id: raw.ticket_id,
        subject: raw.subject.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        urgency,
        status,
        category: raw.category.filter(|c| !c.is_empty()),
        created_on,
        owner: raw.user_id,
        admin_suggestion: raw.admin_suggestion.filter(|s| !s.is_empty()),
    }
}

pub fn normalize_all(raw: Vec<RawTicket>, view: View) -> Vec<Ticket> {
    raw.into_iter().map(|r| normalize(r, view)).collect()
}

/// `urgency` first, then `priority`, then medium.
///
/// A value that is present but not one of the four levels falls through to
/// the next source.
pub fn resolve_urgency(urgency: Option<&str>, priority: Option<&str>) -> Urgency {
    urgency
        .and_then(|u| u.parse().ok())
        .or_else(|| priority.and_then(|p| p.parse().ok()))
        .unwrap_or(Urgency::Medium)
}

pub fn map_status(raw: &str, view: View) -> TicketStatus {
    match (TicketStatus::parse(raw), view) {
        (TicketStatus::InProgress, View::Admin) => TicketStatus::Pending,
        (status, _) => status,
    }
}

/// Truncate an ISO timestamp to its date. Unparseable input yields `None`.
pub fn truncate_date(timestamp: &str) -> Option<NaiveDate> {
    let trimmed = timestamp.trim();
    let date_part = trimmed.split(|c: char| c == 'T' || c == ' ').next().unwrap_or(trimmed);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(timestamp, error = %e, "unparseable ticket timestamp");
            None
        }
    }
}
