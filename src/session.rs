//! The authenticated identity, passed explicitly to whatever needs it.

use crate::api::Backend;
use crate::db::Database;
use crate::error::ClientError;
use crate::models::{Credentials, Registration, Role, Session, User};
use crate::validate;

pub struct SessionStore<'a> {
    db: &'a Database,
    current: Option<Session>,
}

impl<'a> SessionStore<'a> {
    /// Rehydrate from local storage without contacting the backend.
    ///
    /// Both entries must be present and the user record must parse; anything
    /// less is treated as logged out and the leftovers are cleared. An
    /// expired token is only discovered by the next request that fails.
    pub fn restore(db: &'a Database) -> Self {
        let current = match db.load_session() {
            Ok((Some(token), Some(user_json))) => match serde_json::from_str::<User>(&user_json) {
                Ok(user) if !token.is_empty() => Some(Session { token, user }),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "stored user record is unreadable");
                    None
                }
            },
            Ok((None, None)) => return Self { db, current: None },
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "could not read stored session");
                None
            }
        };

        let store = Self { db, current };
        if store.current.is_none() {
            store.clear_persisted();
        } else {
            tracing::debug!("session restored from local storage");
        }
        store
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Validate, authenticate, then persist token and user together.
    pub fn login<B: Backend>(
        &mut self,
        backend: &B,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        validate::validate_login(email, password)?;

        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = backend.login(&credentials).map_err(|e| match e {
            ClientError::Server { status, message } if (400..500).contains(&status) => {
                ClientError::Authentication(message)
            }
            other => other,
        })?;

        let user_json = serde_json::to_string(&response.user)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        self.db.save_session(&response.token, &user_json)?;

        tracing::info!(user = %response.user.id, role = %response.user.role, "logged in");
        self.current = Some(Session {
            token: response.token,
            user: response.user.clone(),
        });
        Ok(response.user)
    }

    /// Register an account. The caller still has to log in afterwards.
    pub fn signup<B: Backend>(
        &self,
        backend: &B,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<(), ClientError> {
        validate::validate_signup(name, email, password, role)?;

        let registration = Registration {
            name: name.trim().to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        };
        backend.register(&registration).map_err(|e| match e {
            ClientError::Server { status, message } if (400..500).contains(&status) => {
                ClientError::Validation(message)
            }
            other => other,
        })?;

        tracing::info!(email, %role, "account registered");
        Ok(())
    }

    /// Always succeeds. A storage failure is logged, not returned.
    pub fn logout(&mut self) {
        self.current = None;
        self.clear_persisted();
        tracing::info!("logged out");
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.db.clear_session() {
            tracing::warn!(error = %format!("{:#}", e), "failed to clear stored session");
        }
    }
}
