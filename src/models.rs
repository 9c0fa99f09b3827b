use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Date key shown for tickets whose creation timestamp is missing.
pub const UNKNOWN_DATE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Invalid role '{}'. Must be one of: user, admin", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(
        rename = "userId",
        alias = "id",
        deserialize_with = "id_from_string_or_number"
    )]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn view(&self) -> View {
        View::from(self.user.role)
    }
}

/// Which dashboard a ticket list is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    User,
    Admin,
}

impl From<Role> for View {
    fn from(role: Role) -> Self {
        match role {
            Role::User => View::User,
            Role::Admin => View::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [
        Urgency::Low,
        Urgency::Medium,
        Urgency::High,
        Urgency::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }

    /// The backend's capitalized spelling, used for the `priority` field.
    pub fn priority_label(&self) -> &'static str {
        match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
            Urgency::Critical => "Critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "critical" => Ok(Urgency::Critical),
            _ => Err(format!(
                "Invalid urgency '{}'. Must be one of: low, medium, high, critical",
                s
            )),
        }
    }
}

/// Ticket status as the client observes it.
///
/// Values the client does not recognize are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    Open,
    InProgress,
    Pending,
    Resolved,
    Withdrawn,
    Other(String),
}

impl TicketStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "open" => TicketStatus::Open,
            "in_progress" => TicketStatus::InProgress,
            "pending" => TicketStatus::Pending,
            "resolved" => TicketStatus::Resolved,
            "withdrawn" => TicketStatus::Withdrawn,
            _ => TicketStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Withdrawn => "withdrawn",
            TicketStatus::Other(raw) => raw,
        }
    }

    /// Sort rank for the admin list: open < pending < resolved < everything else.
    pub fn rank(&self) -> u8 {
        match self {
            TicketStatus::Open => 0,
            TicketStatus::Pending | TicketStatus::InProgress => 1,
            TicketStatus::Resolved => 2,
            TicketStatus::Withdrawn | TicketStatus::Other(_) => 3,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TicketStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A ticket exactly as the backend sent it.
///
/// Every field except the identifier is optional because the list
/// endpoints return a trimmed-down record and older payloads use
/// different field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTicket {
    #[serde(alias = "id", deserialize_with = "id_from_string_or_number")]
    pub ticket_id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(default, alias = "user_id", deserialize_with = "optional_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub admin_suggestion: Option<String>,
}

/// Canonical client-side ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub id: String,
    pub subject: String,
    pub description: String,
    pub urgency: Urgency,
    pub status: TicketStatus,
    pub category: Option<String>,
    pub created_on: Option<NaiveDate>,
    pub owner: Option<String>,
    pub admin_suggestion: Option<String>,
}

impl Ticket {
    /// `YYYY-MM-DD`, or `unknown` when the backend sent no timestamp.
    pub fn date_key(&self) -> String {
        match self.created_on {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => UNKNOWN_DATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Body of `PATCH /tickets/{id}/admin-update`. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_suggestion: Option<String>,
}

impl AdminUpdate {
    pub fn with_priority(mut self, priority: Urgency) -> Self {
        self.priority = Some(priority.priority_label().to_string());
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    pub fn with_status(mut self, status: &TicketStatus) -> Self {
        self.status = Some(status.as_str().to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.admin_suggestion = Some(suggestion.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.priority.is_none()
            && self.urgency.is_none()
            && self.status.is_none()
            && self.admin_suggestion.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// A user-side change that the backend has not confirmed.
///
/// Kept in local storage and re-applied on every fetch until it goes stale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingEdit {
    pub ticket_id: String,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub urgency: Option<Urgency>,
    pub withdrawn: bool,
    pub deleted: bool,
    pub recorded_at: DateTime<Utc>,
}

impl PendingEdit {
    pub fn new(ticket_id: &str) -> Self {
        PendingEdit {
            ticket_id: ticket_id.to_string(),
            recorded_at: Utc::now(),
            ..Default::default()
        }
    }

    /// Fold a newer edit for the same ticket into this one.
    pub fn merge(&mut self, newer: PendingEdit) {
        if newer.subject.is_some() {
            self.subject = newer.subject;
        }
        if newer.description.is_some() {
            self.description = newer.description;
        }
        if newer.urgency.is_some() {
            self.urgency = newer.urgency;
        }
        self.withdrawn |= newer.withdrawn;
        self.deleted |= newer.deleted;
        self.recorded_at = newer.recorded_at;
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.deleted {
            parts.push("deleted".to_string());
        }
        if self.withdrawn {
            parts.push("withdrawn".to_string());
        }
        if self.subject.is_some() {
            parts.push("subject".to_string());
        }
        if self.description.is_some() {
            parts.push("description".to_string());
        }
        if let Some(urgency) = self.urgency {
            parts.push(format!("urgency={}", urgency));
        }
        parts.join(", ")
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, got {}",
            other
        ))),
    }
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, got {}",
            other
        ))),
    }
}
