use anyhow::Result;

use crate::api::Backend;
use crate::commands::{load_board, require_session};
use crate::db::Database;
use crate::filter::TicketFilter;
use crate::models::View;
use crate::session::SessionStore;

pub fn run<B: Backend>(
    db: &Database,
    store: &SessionStore<'_>,
    backend: &B,
    filter: &TicketFilter,
    json: bool,
) -> Result<()> {
    let session = require_session(store)?;
    let board = load_board(db, backend, session)?;
    let tickets = board.visible(filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&tickets)?);
        return Ok(());
    }

    if tickets.is_empty() {
        println!("{}", empty_message(filter));
        return Ok(());
    }

    for ticket in tickets {
        let status_display = format!("[{}]", ticket.status);
        match board.view() {
            View::Admin => println!(
                "{:<10} {:13} {:<40} {:8} {:10} {}",
                ticket.id,
                status_display,
                truncate(&ticket.subject, 40),
                ticket.urgency,
                ticket.date_key(),
                ticket.owner.as_deref().unwrap_or("-")
            ),
            View::User => println!(
                "{:<10} {:13} {:<40} {:8} {}",
                ticket.id,
                status_display,
                truncate(&ticket.subject, 40),
                ticket.urgency,
                ticket.date_key()
            ),
        }
    }

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", truncated)
    }
}

fn empty_message(filter: &TicketFilter) -> &'static str {
    if filter.is_empty() {
        "No tickets found."
    } else {
        "No tickets match the filters."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixtureBackend;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn setup_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).unwrap();
        (db, dir)
    }

    // ==================== Unit Tests ====================

    #[test]
    fn test_list_requires_login() {
        let (db, _dir) = setup_test_db();
        let backend = FixtureBackend::new();
        let store = SessionStore::restore(&db);
        assert!(run(&db, &store, &backend, &TicketFilter::new(), false).is_err());
        assert_eq!(backend.request_count(), 0);
    }

    #[test]
    fn test_list_as_user_and_admin() {
        let (db, _dir) = setup_test_db();
        let backend = FixtureBackend::new();
        let mut store = SessionStore::restore(&db);

        store.login(&backend, "user@example.com", "Secret1!").unwrap();
        assert!(run(&db, &store, &backend, &TicketFilter::new(), false).is_ok());

        store.login(&backend, "admin@example.com", "Secret1!").unwrap();
        let filter = TicketFilter::new().with_status(Some("pending"));
        assert!(run(&db, &store, &backend, &filter, true).is_ok());
    }

    #[test]
    fn test_list_backend_down() {
        let (db, _dir) = setup_test_db();
        let backend = FixtureBackend::new();
        let mut store = SessionStore::restore(&db);
        store.login(&backend, "user@example.com", "Secret1!").unwrap();

        backend.set_offline(true);
        let err = run(&db, &store, &backend, &TicketFilter::new(), false).unwrap_err();
        assert!(err.to_string().contains("network error"));
    }

    #[test]
    fn test_empty_message_mentions_filters() {
        assert_eq!(empty_message(&TicketFilter::new()), "No tickets found.");
        let filter = TicketFilter::new().with_year(Some("1999"));
        assert_eq!(empty_message(&filter), "No tickets match the filters.");
        let filter = TicketFilter::new().with_status(Some("all"));
        assert_eq!(empty_message(&filter), "No tickets found.");
    }

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("Printer offline", 40), "Printer offline");
    }

    #[test]
    fn test_truncate_long() {
        let long = "a".repeat(50);
        let result = truncate(&long, 40);
        assert_eq!(result.chars().count(), 40);
        assert!(result.ends_with("..."));
    }

    // ==================== Property-Based Tests ====================

    proptest! {
        #[test]
        fn prop_truncate_never_exceeds_max(s in "\\PC{0,100}", max in 4usize..60) {
            prop_assert!(truncate(&s, max).chars().count() <= max);
        }
    }
}
