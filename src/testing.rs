//! In-memory backend seeded with mock dashboard data, for tests only.

use std::cell::{Cell, RefCell};

use crate::api::Backend;
use crate::error::ClientError;
use crate::models::{
    AdminUpdate, Credentials, LoginResponse, NewTicket, RawTicket, Registration, Role, User,
};

const PASSWORD: &str = "Secret1!";

pub struct FixtureBackend {
    tickets: RefCell<Vec<RawTicket>>,
    next_id: Cell<u32>,
    requests: Cell<usize>,
    offline: Cell<bool>,
    create_response: RefCell<Option<RawTicket>>,
}

impl FixtureBackend {
    pub const ADMIN_TOKEN: &'static str = "admin-token";
    pub const USER_TOKEN: &'static str = "user-token";
    pub const USER_ID: &'static str = "USR-1";
    pub const OTHER_TOKEN: &'static str = "other-token";
    pub const OTHER_ID: &'static str = "USR-2";

    pub fn new() -> Self {
        Self::with_tickets(seed_tickets())
    }

    pub fn with_tickets(tickets: Vec<RawTicket>) -> Self {
        FixtureBackend {
            tickets: RefCell::new(tickets),
            next_id: Cell::new(200),
            requests: Cell::new(0),
            offline: Cell::new(false),
            create_response: RefCell::new(None),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Reply to the next create with this record instead of the stored one.
    pub fn respond_to_create_with(&self, raw: RawTicket) {
        *self.create_response.borrow_mut() = Some(raw);
    }

    pub fn set_status(&self, id: &str, status: &str) {
        if let Some(t) = self.tickets.borrow_mut().iter_mut().find(|t| t.ticket_id == id) {
            t.status = Some(status.to_string());
        }
    }

    pub fn remove(&self, id: &str) {
        self.tickets.borrow_mut().retain(|t| t.ticket_id != id);
    }

    fn begin(&self) -> Result<(), ClientError> {
        self.requests.set(self.requests.get() + 1);
        if self.offline.get() {
            return Err(ClientError::Network("connection refused".to_string()));
        }
        Ok(())
    }

    fn caller(&self, token: Option<&str>) -> Result<Role, ClientError> {
        match token {
            Some(Self::ADMIN_TOKEN) => Ok(Role::Admin),
            Some(Self::USER_TOKEN) | Some(Self::OTHER_TOKEN) => Ok(Role::User),
            _ => Err(ClientError::Server {
                status: 401,
                message: "Invalid or expired token".to_string(),
            }),
        }
    }
}

impl Default for FixtureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for FixtureBackend {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        self.begin()?;
        let (token, role, id, name) = match credentials.email.as_str() {
            "admin@example.com" => (Self::ADMIN_TOKEN, Role::Admin, "USR-0", "Admin"),
            "user@example.com" => (Self::USER_TOKEN, Role::User, Self::USER_ID, "Ada"),
            "other@example.com" => (Self::OTHER_TOKEN, Role::User, Self::OTHER_ID, "Grace"),
            _ => ("", Role::User, "", ""),
        };
        if token.is_empty() || credentials.password != PASSWORD {
            return Err(ClientError::Server {
                status: 401,
                message: "Invalid email or password".to_string(),
            });
        }
        Ok(LoginResponse {
            token: token.to_string(),
            user: User {
                id: id.to_string(),
                name: name.to_string(),
                email: credentials.email.clone(),
                role,
            },
        })
    }

    fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        self.begin()?;
        if matches!(
            registration.email.as_str(),
            "admin@example.com" | "user@example.com" | "other@example.com"
        ) {
            return Err(ClientError::Server {
                status: 400,
                message: "Email already registered".to_string(),
            });
        }
        Ok(())
    }

    fn my_tickets(&self, token: Option<&str>) -> Result<Vec<RawTicket>, ClientError> {
        self.begin()?;
        self.caller(token)?;
        let owner = match token {
            Some(Self::USER_TOKEN) => Self::USER_ID,
            Some(Self::OTHER_TOKEN) => Self::OTHER_ID,
            _ => "USR-0",
        };
        Ok(self
            .tickets
            .borrow()
            .iter()
            .filter(|t| t.user_id.as_deref() == Some(owner))
            .cloned()
            .collect())
    }

    fn all_tickets(&self, token: Option<&str>) -> Result<Vec<RawTicket>, ClientError> {
        self.begin()?;
        if self.caller(token)? != Role::Admin {
            return Err(ClientError::Server {
                status: 403,
                message: "Admin access required".to_string(),
            });
        }
        Ok(self.tickets.borrow().clone())
    }

    fn ticket(&self, token: Option<&str>, id: &str) -> Result<RawTicket, ClientError> {
        self.begin()?;
        self.caller(token)?;
        self.tickets
            .borrow()
            .iter()
            .find(|t| t.ticket_id == id)
            .cloned()
            .ok_or_else(|| ClientError::Server {
                status: 404,
                message: "Ticket not found".to_string(),
            })
    }

    fn create_ticket(&self, token: Option<&str>, ticket: &NewTicket) -> Result<RawTicket, ClientError> {
        self.begin()?;
        self.caller(token)?;

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let stored = RawTicket {
            ticket_id: format!("TKT-{}", id),
            subject: Some(ticket.subject.clone()),
            description: Some(ticket.description.clone()),
            urgency: Some(ticket.urgency.as_str().to_string()),
            priority: Some("Medium".to_string()),
            status: Some("open".to_string()),
            category: Some(ticket.category.clone().unwrap_or_else(|| "General".to_string())),
            created_at: Some("2024-05-01T09:30:00".to_string()),
            user_id: Some(Self::USER_ID.to_string()),
            admin_suggestion: None,
        };
        self.tickets.borrow_mut().insert(0, stored.clone());

        Ok(self.create_response.borrow_mut().take().unwrap_or(stored))
    }

    fn admin_update(
        &self,
        token: Option<&str>,
        id: &str,
        update: &AdminUpdate,
    ) -> Result<RawTicket, ClientError> {
        self.begin()?;
        if self.caller(token)? != Role::Admin {
            return Err(ClientError::Server {
                status: 403,
                message: "Admin access required".to_string(),
            });
        }
        let not_found = || ClientError::Server {
            status: 404,
            message: "Ticket not found".to_string(),
        };
        if update.is_empty() {
            return Err(not_found());
        }

        let mut tickets = self.tickets.borrow_mut();
        let ticket = tickets
            .iter_mut()
            .find(|t| t.ticket_id == id)
            .ok_or_else(not_found)?;
        if let Some(priority) = &update.priority {
            ticket.priority = Some(priority.clone());
        }
        if let Some(urgency) = update.urgency {
            ticket.urgency = Some(urgency.as_str().to_string());
        }
        if let Some(status) = &update.status {
            let stored = if status == "pending" { "in_progress" } else { status };
            ticket.status = Some(stored.to_string());
        }
        if let Some(suggestion) = &update.admin_suggestion {
            ticket.admin_suggestion = Some(suggestion.clone());
        }
        Ok(ticket.clone())
    }
}

fn raw(id: &str, owner: &str, subject: &str, priority: &str, status: &str, created: &str) -> RawTicket {
    RawTicket {
        ticket_id: id.to_string(),
        subject: Some(subject.to_string()),
        description: Some(format!("{} (reported via portal)", subject)),
        urgency: None,
        priority: Some(priority.to_string()),
        status: Some(status.to_string()),
        category: Some("General".to_string()),
        created_at: Some(created.to_string()),
        user_id: Some(owner.to_string()),
        admin_suggestion: None,
    }
}

/// Newest first, as the backend returns them.
pub fn seed_tickets() -> Vec<RawTicket> {
    vec![
        raw("TKT-104", FixtureBackend::OTHER_ID, "Laptop battery swelling", "Critical", "open", "2024-04-02T08:15:00"),
        raw("TKT-103", FixtureBackend::USER_ID, "Password reset loop", "Low", "resolved", "2024-03-28T16:40:00"),
        raw("TKT-102", FixtureBackend::USER_ID, "Printer offline", "Medium", "in_progress", "2024-03-20T11:05:00"),
        raw("TKT-101", FixtureBackend::USER_ID, "VPN Connection Failed", "High", "open", "2024-03-15T09:00:00"),
    ]
}
