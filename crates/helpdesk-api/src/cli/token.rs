//! `helpdesk token`: mint a signed member credential.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// One year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Validate `--ttl-minutes` and turn it into a lifetime.
fn token_lifetime(ttl_minutes: i64) -> Result<chrono::Duration> {
    if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
        anyhow::bail!("--ttl-minutes must be between 1 and {MAX_TTL_MINUTES}");
    }
    chrono::Duration::try_minutes(ttl_minutes)
        .ok_or_else(|| anyhow::anyhow!("--ttl-minutes {ttl_minutes} is out of range"))
}

pub fn issue_token(
    state: &AppState,
    user: &str,
    role: Option<String>,
    org: Option<i64>,
    ttl_minutes: i64,
    json: bool,
) -> Result<()> {
    if state.config.auth.jwt_secret.is_none() {
        anyhow::bail!(
            "No JWT secret configured. Set [auth] jwt_secret in config.toml or HELPDESK_JWT_SECRET"
        );
    }
    if user.trim().is_empty() {
        anyhow::bail!("User id must not be empty");
    }
    let lifetime = token_lifetime(ttl_minutes)?;

    let token = state.credentials.issue(user, role, org, lifetime)?;

    if json {
        println!(
            "{}",
            serde_json::json!({"user": user, "token": token, "ttlMinutes": ttl_minutes})
        );
    } else {
        println!(
            "  {} Credential for {} (valid {} min):",
            style("🔑").bold(),
            style(user).bold(),
            ttl_minutes
        );
        println!();
        println!("  {}", style(&token).yellow());
        println!();
    }
    Ok(())
}
