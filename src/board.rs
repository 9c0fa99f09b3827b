//! Ticket view-model shared by the user and admin dashboards.
//!
//! The board holds the normalized tickets for one view. Server state always
//! wins, with two exceptions: user edits that have no backend endpoint are
//! kept as [`PendingEdit`] records and layered back on after each fetch, and
//! responses to superseded requests are discarded instead of overwriting
//! newer state.

use std::collections::HashMap;

use crate::api::Backend;
use crate::error::ClientError;
use crate::filter::{sort_by_status_rank, TicketFilter};
use crate::models::{AdminUpdate, NewTicket, PendingEdit, RawTicket, Ticket, TicketStatus, Urgency, View};
use crate::normalize::{normalize, normalize_all};
use crate::validate::validate_new_ticket;

/// Hands out per-ticket sequence numbers so only the newest response for a
/// ticket is applied.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    counter: u64,
    latest: HashMap<String, u64>,
}

impl RequestSequencer {
    pub fn begin(&mut self, ticket_id: &str) -> u64 {
        self.counter += 1;
        self.latest.insert(ticket_id.to_string(), self.counter);
        self.counter
    }

    pub fn is_current(&self, ticket_id: &str, seq: u64) -> bool {
        self.latest.get(ticket_id) == Some(&seq)
    }
}

/// What happened when pending edits were laid over fresh server state.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub applied: usize,
    /// Records that no longer do anything and should be removed from storage.
    pub dropped: Vec<String>,
    /// Records whose withdraw marker went stale but that still carry edits.
    pub withdrawals_cleared: Vec<String>,
}

pub struct TicketBoard {
    view: View,
    tickets: Vec<Ticket>,
    sequencer: RequestSequencer,
}

impl TicketBoard {
    pub fn new(view: View) -> Self {
        TicketBoard {
            view,
            tickets: Vec::new(),
            sequencer: RequestSequencer::default(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn get(&self, id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    pub fn load(&mut self, raw: Vec<RawTicket>) {
        self.tickets = normalize_all(raw, self.view);
    }

    /// Fetch the list for this view. On failure the previous tickets stay.
    pub fn refresh<B: Backend>(&mut self, backend: &B, token: Option<&str>) -> Result<usize, ClientError> {
        let fetched = match self.view {
            View::Admin => backend.all_tickets(token),
            View::User => backend.my_tickets(token),
        };

        match fetched {
            Ok(raw) => {
                self.load(raw);
                tracing::debug!(count = self.tickets.len(), "tickets loaded");
                Ok(self.tickets.len())
            }
            Err(e) => {
                tracing::warn!(error = %e, kept = self.tickets.len(), "refresh failed; keeping previous tickets");
                Err(e)
            }
        }
    }

    /// Create a ticket and put the backend's record at the top of the list.
    pub fn submit<B: Backend>(
        &mut self,
        backend: &B,
        token: Option<&str>,
        ticket: &NewTicket,
    ) -> Result<&Ticket, ClientError> {
        validate_new_ticket(ticket)?;
        let raw = backend.create_ticket(token, ticket)?;
        let created = normalize(raw, self.view);
        tracing::info!(id = %created.id, "ticket submitted");
        self.tickets.insert(0, created);
        Ok(&self.tickets[0])
    }

    pub fn begin_update(&mut self, ticket_id: &str) -> u64 {
        self.sequencer.begin(ticket_id)
    }

    /// Apply a backend-confirmed record if `seq` is still the newest request
    /// for that ticket. Returns whether the record was applied.
    pub fn apply_update(&mut self, seq: u64, raw: RawTicket) -> bool {
        let ticket = normalize(raw, self.view);
        if !self.sequencer.is_current(&ticket.id, seq) {
            tracing::debug!(id = %ticket.id, seq, "discarding superseded response");
            return false;
        }
        match self.tickets.iter_mut().find(|t| t.id == ticket.id) {
            Some(existing) => *existing = ticket,
            None => self.tickets.push(ticket),
        }
        true
    }

    pub fn admin_update<B: Backend>(
        &mut self,
        backend: &B,
        token: Option<&str>,
        id: &str,
        update: &AdminUpdate,
    ) -> Result<Ticket, ClientError> {
        if update.is_empty() {
            return Err(ClientError::Validation("Nothing to update".to_string()));
        }
        let seq = self.begin_update(id);
        let raw = backend.admin_update(token, id, update)?;
        let confirmed = normalize(raw.clone(), self.view);
        self.apply_update(seq, raw);
        Ok(confirmed)
    }

    /// Lay pending edits over the current server state.
    pub fn apply_pending(&mut self, edits: &[PendingEdit]) -> Reconciliation {
        let mut result = Reconciliation::default();

        for edit in edits {
            let Some(index) = self.tickets.iter().position(|t| t.id == edit.ticket_id) else {
                tracing::debug!(id = %edit.ticket_id, "pending edit has no ticket on the server; dropping");
                result.dropped.push(edit.ticket_id.clone());
                continue;
            };

            if edit.deleted {
                self.tickets.remove(index);
                result.applied += 1;
                continue;
            }

            let has_fields = edit.subject.is_some() || edit.description.is_some() || edit.urgency.is_some();
            let ticket = &mut self.tickets[index];

            if edit.withdrawn {
                if ticket.status == TicketStatus::Open {
                    ticket.status = TicketStatus::Withdrawn;
                } else {
                    tracing::debug!(id = %edit.ticket_id, status = %ticket.status, "withdraw marker is stale");
                    if has_fields {
                        result.withdrawals_cleared.push(edit.ticket_id.clone());
                    } else {
                        result.dropped.push(edit.ticket_id.clone());
                        continue;
                    }
                }
            }

            if let Some(subject) = &edit.subject {
                ticket.subject = subject.clone();
            }
            if let Some(description) = &edit.description {
                ticket.description = description.clone();
            }
            if let Some(urgency) = edit.urgency {
                ticket.urgency = urgency;
            }
            result.applied += 1;
        }

        result
    }

    /// Local-only edit of subject, description or urgency.
    pub fn edit_local(
        &mut self,
        id: &str,
        subject: Option<&str>,
        description: Option<&str>,
        urgency: Option<Urgency>,
    ) -> Result<PendingEdit, ClientError> {
        if subject.is_none() && description.is_none() && urgency.is_none() {
            return Err(ClientError::Validation(
                "Nothing to edit. Use --subject, --description, or --urgency".to_string(),
            ));
        }
        if subject.is_some_and(|s| s.trim().is_empty()) {
            return Err(ClientError::Validation("Subject is required.".to_string()));
        }

        let ticket = self.find_mut(id)?;
        let mut edit = PendingEdit::new(id);
        if let Some(s) = subject {
            ticket.subject = s.to_string();
            edit.subject = Some(s.to_string());
        }
        if let Some(d) = description {
            ticket.description = d.to_string();
            edit.description = Some(d.to_string());
        }
        if let Some(u) = urgency {
            ticket.urgency = u;
            edit.urgency = Some(u);
        }
        Ok(edit)
    }

    /// Optimistically withdraw an open ticket.
    pub fn withdraw_local(&mut self, id: &str) -> Result<PendingEdit, ClientError> {
        let ticket = self.find_mut(id)?;
        if ticket.status != TicketStatus::Open {
            return Err(ClientError::Validation(format!(
                "Ticket {} is {}; only open tickets can be withdrawn",
                id, ticket.status
            )));
        }
        ticket.status = TicketStatus::Withdrawn;

        let mut edit = PendingEdit::new(id);
        edit.withdrawn = true;
        Ok(edit)
    }

    /// Hide a ticket from this client.
    pub fn remove_local(&mut self, id: &str) -> Result<PendingEdit, ClientError> {
        self.find_mut(id)?;
        self.tickets.retain(|t| t.id != id);

        let mut edit = PendingEdit::new(id);
        edit.deleted = true;
        Ok(edit)
    }

    /// Filtered tickets in display order. The admin view sorts by status.
    pub fn visible(&self, filter: &TicketFilter) -> Vec<&Ticket> {
        let mut tickets = filter.apply(&self.tickets);
        if self.view == View::Admin {
            sort_by_status_rank(&mut tickets);
        }
        tickets
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Ticket, ClientError> {
        self.tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ClientError::Server {
                status: 404,
                message: format!("Ticket {} not found", id),
            })
    }
}
