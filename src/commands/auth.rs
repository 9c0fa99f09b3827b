use anyhow::{anyhow, Result};

use crate::api::Backend;
use crate::models::Role;
use crate::session::SessionStore;

pub fn login<B: Backend>(
    store: &mut SessionStore<'_>,
    backend: &B,
    email: &str,
    password: &str,
) -> Result<()> {
    let user = store.login(backend, email, password)?;
    let name = if user.name.is_empty() { &user.email } else { &user.name };
    println!("Logged in as {} ({})", name, user.role);
    Ok(())
}

pub fn signup<B: Backend>(
    store: &SessionStore<'_>,
    backend: &B,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<()> {
    let role: Role = role.parse().map_err(|e: String| anyhow!(e))?;
    store.signup(backend, name, email, password, role)?;
    println!("Account created for {}. Run 'ticketdesk login' to sign in.", email);
    Ok(())
}

pub fn logout(store: &mut SessionStore<'_>) {
    if store.is_authenticated() {
        store.logout();
        println!("Logged out.");
    } else {
        store.logout();
        println!("Not logged in.");
    }
}

/// Print the identity restored from local storage. Never touches the network.
pub fn whoami(store: &SessionStore<'_>) {
    match store.user() {
        Some(user) => {
            println!("User: {}", user.id);
            if !user.name.is_empty() {
                println!("Name: {}", user.name);
            }
            if !user.email.is_empty() {
                println!("Email: {}", user.email);
            }
            println!("Role: {}", user.role);
        }
        None => println!("Not logged in."),
    }
}
