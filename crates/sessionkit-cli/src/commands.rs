//! Subcommand implementations.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use tracing::warn;

use sessionkit_core::{ApiError, AuthenticatedClient, Config};

fn prompt(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .with_context(|| format!("Failed to read {}", label))?;
    Ok(line.trim().to_string())
}

fn prompt_password() -> Result<String> {
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

pub async fn login(
    client: &AuthenticatedClient,
    config: &mut Config,
    email: Option<String>,
) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email")?,
    };
    let password = prompt_password()?;

    let profile = match client.login(&email, &password).await {
        Ok(profile) => profile,
        Err(ApiError::Unauthorized(_)) => bail!("Invalid email or password"),
        Err(e) => return Err(e).context("Login failed"),
    };

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to remember email in config");
    }

    println!("Logged in as {} <{}>", profile.name, profile.email);
    Ok(())
}

pub async fn register(client: &AuthenticatedClient, username: &str, email: &str) -> Result<()> {
    let password = prompt_password()?;
    let confirm = rpassword::prompt_password("Confirm password: ")
        .context("Failed to read password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    match client.register(username, email, &password).await {
        Ok(body) => {
            println!("Account created");
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(ApiError::DuplicateAccount(_)) => bail!("An account already exists for {}", email),
        Err(ApiError::Validation(reason)) => bail!("Registration rejected: {}", reason),
        Err(e) => Err(e).context("Registration failed"),
    }
}

pub async fn update_profile(client: &AuthenticatedClient, username: &str) -> Result<()> {
    let Some(profile) = client.current_profile()? else {
        bail!("Not logged in");
    };

    client
        .update_profile(username, &profile.email)
        .await
        .context("Profile update failed")?;
    println!("Display name changed to {}", username);
    Ok(())
}

pub fn logout(client: &AuthenticatedClient) -> Result<()> {
    client.logout();
    println!("Logged out");
    Ok(())
}

pub fn status(client: &AuthenticatedClient) -> Result<()> {
    if !client.is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }

    match client.current_profile()? {
        Some(profile) => println!("Logged in as {} <{}>", profile.name, profile.email),
        None => println!("Logged in (no cached profile)"),
    }

    let claims = client.credential()?.and_then(|c| c.claims());
    if let Some(expiry) = claims.as_ref().and_then(|c| c.expires_at()) {
        let state = if client.credential_expired()? { "expired" } else { "expires" };
        println!("Credential {} {}", state, expiry.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

pub async fn get(client: &AuthenticatedClient, path: &str) -> Result<()> {
    match client.get(path).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(ApiError::Unauthorized(_)) => bail!("Session expired, please log in again"),
        Err(e) => Err(e).with_context(|| format!("GET {} failed", path)),
    }
}
