//! HTTP access to the ticketing backend.
//!
//! [`Backend`] is the seam the session store and the ticket board talk to.
//! [`HttpClient`] is the real implementation: one request per call, no
//! retries, no caching, and a bearer token attached whenever the caller has
//! one.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::models::{AdminUpdate, Credentials, LoginResponse, NewTicket, RawTicket, Registration};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub trait Backend {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError>;

    fn register(&self, registration: &Registration) -> Result<(), ClientError>;

    /// Tickets owned by the caller.
    fn my_tickets(&self, token: Option<&str>) -> Result<Vec<RawTicket>, ClientError>;

    /// Every ticket. Admin only on the backend side.
    fn all_tickets(&self, token: Option<&str>) -> Result<Vec<RawTicket>, ClientError>;

    fn ticket(&self, token: Option<&str>, id: &str) -> Result<RawTicket, ClientError>;

    fn create_ticket(&self, token: Option<&str>, ticket: &NewTicket) -> Result<RawTicket, ClientError>;

    fn admin_update(
        &self,
        token: Option<&str>,
        id: &str,
        update: &AdminUpdate,
    ) -> Result<RawTicket, ClientError>;
}

pub struct HttpClient {
    base_url: String,
    base: Url,
    http: Client,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(concat!("ticketdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| ClientError::Validation(format!("Invalid API URL '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Validation(format!(
                "Invalid API URL '{}': not a base URL",
                base_url
            )));
        }

        Ok(Self { base_url, base, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL under the base built from path segments. Each segment is
    /// percent-encoded, so `/`, `?` and `#` inside one stay inside it.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Validation(format!("Invalid API URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/tickets/{id}` or `/tickets/{id}/{action}`.
    fn ticket_endpoint(&self, id: &str, action: Option<&str>) -> Result<Url, ClientError> {
        // Dot segments are dropped by the URL builder and would retarget the request.
        if id.trim().is_empty() || id == "." || id == ".." {
            return Err(ClientError::Validation(format!("Invalid ticket id '{}'", id)));
        }
        let mut segments = vec!["tickets", id];
        segments.extend(action);
        self.endpoint(&segments)
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let authenticated = token.is_some_and(|t| !t.is_empty());
        tracing::debug!(%method, %url, authenticated, "sending request");

        let builder = self.http.request(method, url);
        match token {
            Some(t) if !t.is_empty() => builder.bearer_auth(t),
            _ => builder,
        }
    }

    fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let resp = check_response(builder.send()?)?;
        Ok(resp.json()?)
    }
}

impl Backend for HttpClient {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        let url = self.endpoint(&["auth", "login"])?;
        self.fetch(self.request(Method::POST, url, None).json(credentials))
    }

    fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        let url = self.endpoint(&["auth", "register"])?;
        let builder = self.request(Method::POST, url, None).json(registration);
        check_response(builder.send()?)?;
        Ok(())
    }

    fn my_tickets(&self, token: Option<&str>) -> Result<Vec<RawTicket>, ClientError> {
        let url = self.endpoint(&["tickets", "me"])?;
        self.fetch(self.request(Method::GET, url, token))
    }

    fn all_tickets(&self, token: Option<&str>) -> Result<Vec<RawTicket>, ClientError> {
        let url = self.endpoint(&["tickets", ""])?;
        self.fetch(self.request(Method::GET, url, token))
    }

    fn ticket(&self, token: Option<&str>, id: &str) -> Result<RawTicket, ClientError> {
        let url = self.ticket_endpoint(id, None)?;
        self.fetch(self.request(Method::GET, url, token))
    }

    fn create_ticket(&self, token: Option<&str>, ticket: &NewTicket) -> Result<RawTicket, ClientError> {
        let url = self.endpoint(&["tickets", ""])?;
        self.fetch(self.request(Method::POST, url, token).json(ticket))
    }

    fn admin_update(
        &self,
        token: Option<&str>,
        id: &str,
        update: &AdminUpdate,
    ) -> Result<RawTicket, ClientError> {
        let url = self.ticket_endpoint(id, Some("admin-update"))?;
        self.fetch(self.request(Method::PATCH, url, token).json(update))
    }
}

/// Turn any non-2xx response into [`ClientError::Server`].
pub fn check_response(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let reason = status.canonical_reason().unwrap_or("request failed").to_string();
    let body = resp.text().unwrap_or_default();
    let message = error_message(&body).unwrap_or(reason);
    tracing::debug!(status = status.as_u16(), %message, "request rejected");

    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Prefer a string `detail` field, then the raw body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(json) => match json.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            _ => Some(trimmed.to_string()),
        },
        Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, Urgency};
    use std::io::Read;
    use std::thread::{self, JoinHandle};

    struct Captured {
        method: String,
        url: String,
        authorization: Option<String>,
        body: String,
    }

    /// Serve exactly one request on a loopback port and report what arrived.
    fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<Captured>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        let handle = thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let authorization = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            let mut received = String::new();
            request.as_reader().read_to_string(&mut received).unwrap();

            let captured = Captured {
                method: request.method().to_string(),
                url: request.url().to_string(),
                authorization,
                body: received,
            };

            let response = tiny_http::Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    tiny_http::Header::from_bytes("Content-Type", "application/json").unwrap(),
                );
            request.respond(response).unwrap();
            captured
        });

        (format!("http://127.0.0.1:{}/", port), handle)
    }

    #[test]
    fn test_bearer_attached_when_token_present() {
        let (url, handle) = serve_once(200, "[]");
        let client = HttpClient::new(&url).unwrap();

        let tickets = client.my_tickets(Some("abc")).unwrap();
        assert!(tickets.is_empty());

        let captured = handle.join().unwrap();
        assert_eq!(captured.method, "GET");
        assert_eq!(captured.url, "/tickets/me");
        assert_eq!(captured.authorization.as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn test_no_header_without_token() {
        let (url, handle) = serve_once(200, "[]");
        let client = HttpClient::new(&url).unwrap();

        client.all_tickets(None).unwrap();

        let captured = handle.join().unwrap();
        assert_eq!(captured.url, "/tickets/");
        assert!(captured.authorization.is_none());
    }

    #[test]
    fn test_empty_token_sends_unauthenticated() {
        let (url, handle) = serve_once(200, "[]");
        let client = HttpClient::new(&url).unwrap();

        client.all_tickets(Some("")).unwrap();
        assert!(handle.join().unwrap().authorization.is_none());
    }

    #[test]
    fn test_create_ticket_posts_json() {
        let (url, handle) = serve_once(
            200,
            r#"{"ticketId":"TKT-200","status":"open","priority":"Low","urgency":"low","subject":"Printer offline","description":"...","category":"General"}"#,
        );
        let client = HttpClient::new(&url).unwrap();
        let ticket = NewTicket {
            subject: "Printer offline".to_string(),
            description: "...".to_string(),
            urgency: Urgency::Low,
            category: None,
        };

        let raw = client.create_ticket(Some("tok"), &ticket).unwrap();
        assert_eq!(raw.ticket_id, "TKT-200");

        let captured = handle.join().unwrap();
        assert_eq!(captured.method, "POST");
        let sent: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(sent["subject"], "Printer offline");
        assert_eq!(sent["urgency"], "low");
    }

    #[test]
    fn test_admin_update_uses_patch_path() {
        let (url, handle) = serve_once(200, r#"{"ticketId":"TKT-7","status":"in_progress"}"#);
        let client = HttpClient::new(&url).unwrap();
        let update = AdminUpdate::default().with_suggestion("Reboot");

        let raw = client.admin_update(Some("tok"), "TKT-7", &update).unwrap();
        assert_eq!(raw.status.as_deref(), Some("in_progress"));

        let captured = handle.join().unwrap();
        assert_eq!(captured.method, "PATCH");
        assert_eq!(captured.url, "/tickets/TKT-7/admin-update");
        assert!(captured.body.contains("adminSuggestion"));
    }

    #[test]
    fn test_login_sends_no_token() {
        let (url, handle) = serve_once(
            200,
            r#"{"message":"Login successful","token":"jwt","user":{"userId":"U1","name":"Ada","email":"ada@example.com","role":"admin"}}"#,
        );
        let client = HttpClient::new(&url).unwrap();
        let creds = Credentials {
            email: "ada@example.com".to_string(),
            password: "Secret1!".to_string(),
        };

        let response = client.login(&creds).unwrap();
        assert_eq!(response.token, "jwt");
        assert_eq!(response.user.role, Role::Admin);

        let captured = handle.join().unwrap();
        assert_eq!(captured.url, "/auth/login");
        assert!(captured.authorization.is_none());
    }

    #[test]
    fn test_non_2xx_surfaces_detail() {
        let (url, handle) = serve_once(401, r#"{"detail":"Invalid email or password"}"#);
        let client = HttpClient::new(&url).unwrap();
        let creds = Credentials {
            email: "ada@example.com".to_string(),
            password: "Wrong1!!".to_string(),
        };

        let err = client.login(&creds).unwrap_err();
        handle.join().unwrap();
        match err {
            ClientError::Server { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid email or password");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_not_found() {
        let (url, handle) = serve_once(404, r#"{"detail":"Ticket not found"}"#);
        let client = HttpClient::new(&url).unwrap();

        let err = client.ticket(Some("tok"), "TKT-404").unwrap_err();
        handle.join().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_register_accepts_any_success_body() {
        let (url, handle) = serve_once(200, r#"{"message":"User registered successfully"}"#);
        let client = HttpClient::new(&url).unwrap();
        let registration = Registration {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "Secret1!".to_string(),
            role: Role::User,
        };

        client.register(&registration).unwrap();
        let captured = handle.join().unwrap();
        let sent: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(sent["role"], "user");
    }

    #[test]
    fn test_unreachable_backend_is_network_error() {
        // Bind then drop to get a port nobody is listening on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HttpClient::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        let err = client.my_tickets(None).unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[test]
    fn test_error_message_variants() {
        assert_eq!(error_message(""), None);
        assert_eq!(error_message(r#"{"detail":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(
            error_message(r#"{"detail":[{"msg":"field required"}]}"#).as_deref(),
            Some(r#"{"detail":[{"msg":"field required"}]}"#)
        );
        assert_eq!(error_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
    }

    #[test]
    fn test_ticket_id_cannot_leave_tickets_path() {
        let (url, handle) = serve_once(404, r#"{"detail":"Ticket not found"}"#);
        let client = HttpClient::new(&url).unwrap();

        let err = client.ticket(Some("tok"), "../auth/login").unwrap_err();
        assert!(err.is_not_found());

        let captured = handle.join().unwrap();
        assert_eq!(captured.url, "/tickets/..%2Fauth%2Flogin");
    }

    #[test]
    fn test_ticket_id_query_and_fragment_encoded() {
        let (url, handle) = serve_once(200, r#"{"ticketId":"TKT?x#y"}"#);
        let client = HttpClient::new(&url).unwrap();

        client
            .admin_update(Some("tok"), "TKT?x#y", &AdminUpdate::default().with_suggestion("Reboot"))
            .unwrap();
        let captured = handle.join().unwrap();
        assert_eq!(captured.url, "/tickets/TKT%3Fx%23y/admin-update");
    }

    #[test]
    fn test_dot_ticket_ids_rejected_before_sending() {
        let client = HttpClient::new(DEFAULT_API_URL).unwrap();
        for id in ["..", ".", "", "  "] {
            let err = client.ticket(Some("tok"), id).unwrap_err();
            assert!(matches!(err, ClientError::Validation(_)), "{:?}", id);
        }
    }

    #[test]
    fn test_base_path_is_kept() {
        let client = HttpClient::new("http://localhost:8000/api/").unwrap();
        let url = client.ticket_endpoint("TKT-1", None).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/tickets/TKT-1");
        let list = client.endpoint(&["tickets", ""]).unwrap();
        assert_eq!(list.as_str(), "http://localhost:8000/api/tickets/");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpClient::new("not a url"),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = HttpClient::new("http://localhost:8000///").unwrap();
        assert_eq!(client.base_url(), DEFAULT_API_URL);
    }
}
