use crate::models::Ticket;

/// Dashboard filter controls.
///
/// Every criterion is optional; `None` means the control is set to "all".
/// Use the `with_*` setters so that `""` and `"all"` are treated as inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    status: Option<String>,
    urgency: Option<String>,
    search: Option<String>,
    year: Option<String>,
    month: Option<String>,
}

fn active(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(value.to_string())
    }
}

impl TicketFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Option<&str>) -> Self {
        self.status = active(status).map(|s| s.to_lowercase());
        self
    }

    pub fn with_urgency(mut self, urgency: Option<&str>) -> Self {
        self.urgency = active(urgency).map(|u| u.to_lowercase());
        self
    }

    /// Free text, so only blank input turns it off; `all` is a real query.
    pub fn with_search(mut self, query: Option<&str>) -> Self {
        self.search = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        self
    }

    pub fn with_year(mut self, year: Option<&str>) -> Self {
        self.year = active(year);
        self
    }

    /// Month is zero-padded, so `3` and `03` select the same tickets.
    pub fn with_month(mut self, month: Option<&str>) -> Self {
        self.month = active(month).map(|m| {
            if m.len() == 1 {
                format!("0{}", m)
            } else {
                m
            }
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.urgency.is_none()
            && self.search.is_none()
            && self.year.is_none()
            && self.month.is_none()
    }

    /// Conjunction of all active criteria.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(status) = &self.status {
            if !ticket.status.as_str().eq_ignore_ascii_case(status) {
                return false;
            }
        }

        if let Some(urgency) = &self.urgency {
            if ticket.urgency.as_str() != urgency {
                return false;
            }
        }

        if let Some(query) = &self.search {
            let hit = ticket.subject.to_lowercase().contains(query)
                || ticket.description.to_lowercase().contains(query)
                || ticket.id.to_lowercase().contains(query);
            if !hit {
                return false;
            }
        }

        if self.year.is_some() || self.month.is_some() {
            let date = ticket.date_key();
            let mut segments = date.split('-');
            let year = segments.next();
            let month = segments.next();

            if let Some(wanted) = &self.year {
                if year != Some(wanted.as_str()) {
                    return false;
                }
            }
            if let Some(wanted) = &self.month {
                if month != Some(wanted.as_str()) {
                    return false;
                }
            }
        }

        true
    }

    pub fn apply<'a>(&self, tickets: &'a [Ticket]) -> Vec<&'a Ticket> {
        tickets.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Admin default order. Stable, so ties keep their fetch order.
pub fn sort_by_status_rank(tickets: &mut [&Ticket]) {
    tickets.sort_by_key(|t| t.status.rank());
}
