//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action to run. Identity server options
//! are checked here, the message catalog is loaded when the server starts.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, identity};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let identity_opts = identity::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        identity_url: identity_opts.url,
        identity_api_key: identity_opts.api_key,
        messages_path: identity_opts.messages_path,
    }))
}
