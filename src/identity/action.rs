//! `GET_SAID_IDENTITY` action: surfaces the agent's identity to end users.
//!
//! The host wires [`validate`] and [`handle`] into its action registry. An
//! unverified identity is shown as pending, never as an error.

use super::Identity;
use super::manager::IdentityManager;

pub const ACTION_NAME: &str = "GET_SAID_IDENTITY";

pub const SIMILES: &[&str] = &[
    "SHOW_SAID_IDENTITY",
    "MY_SOLANA_IDENTITY",
    "SAID_PROFILE",
    "WHO_AM_I_ONCHAIN",
];

pub const DESCRIPTION: &str =
    "Returns this agent's on-chain SAID Protocol identity and profile URL";

/// Reply when initialization has not produced an identity yet.
pub const NOT_AVAILABLE: &str = "SAID identity not available.";

/// Whether the action can run: an identity must be available.
pub fn validate(manager: &IdentityManager) -> bool {
    manager.identity().is_some()
}

/// Produce the reply text for the action.
pub fn handle(manager: &IdentityManager) -> String {
    match manager.identity() {
        Some(identity) => render(identity),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Render wallet, profile URL and verification state.
pub fn render(identity: &Identity) -> String {
    let verified = if identity.verified {
        "✅"
    } else {
        "❌ (pending)"
    };
    format!(
        "My on-chain identity:\n\nWallet: `{wallet}`\nProfile: {profile}\nVerified: {verified}\n\nView my public profile at {profile}",
        wallet = identity.wallet,
        profile = identity.profile_url,
    )
}
