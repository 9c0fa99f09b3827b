#![no_main]

//! Fuzz target for ticket normalization and filtering.
//!
//! Feeds arbitrary backend payloads through deserialization, normalization
//! and the dashboard filters. Nothing on this path may panic, whatever the
//! backend sends.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ticketdesk::filter::{sort_by_status_rank, TicketFilter};
use ticketdesk::models::{RawTicket, Urgency, View};
use ticketdesk::normalize::normalize;

#[derive(Arbitrary, Debug)]
struct NormalizeInput {
    /// Raw JSON as the backend might send it
    payload: String,
    /// Field values for a structured ticket
    status: Option<String>,
    urgency: Option<String>,
    priority: Option<String>,
    created_at: Option<String>,
    /// Filter inputs, including junk
    filter_status: Option<String>,
    filter_urgency: Option<String>,
    search: Option<String>,
    year: Option<String>,
    month: Option<String>,
    admin: bool,
}

fuzz_target!(|input: NormalizeInput| {
    let view = if input.admin { View::Admin } else { View::User };

    let mut raw: Vec<RawTicket> = serde_json::from_str(&input.payload).unwrap_or_default();
    raw.push(RawTicket {
        ticket_id: "TKT-1".to_string(),
        status: input.status,
        urgency: input.urgency,
        priority: input.priority,
        created_at: input.created_at,
        ..Default::default()
    });

    let tickets: Vec<_> = raw.into_iter().map(|r| normalize(r, view)).collect();
    for ticket in &tickets {
        assert!(Urgency::ALL.contains(&ticket.urgency));
        let key = ticket.date_key();
        assert!(key == "unknown" || key.len() >= 10);
    }

    let filter = TicketFilter::new()
        .with_status(input.filter_status.as_deref())
        .with_urgency(input.filter_urgency.as_deref())
        .with_search(input.search.as_deref())
        .with_year(input.year.as_deref())
        .with_month(input.month.as_deref());

    let mut visible = filter.apply(&tickets);
    sort_by_status_rank(&mut visible);
    assert!(visible.len() <= tickets.len());
});
