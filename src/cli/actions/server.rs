use crate::{
    i18n::Catalog,
    identity::{IdentityClient, IdentityConfig},
    portal,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub identity_url: Url,
    pub identity_api_key: SecretString,
    pub messages_path: Option<String>,
}

/// Handle the server action
/// # Errors
/// Returns an error if the catalog cannot be loaded or the server fails to start
pub async fn execute(args: Args) -> Result<()> {
    let catalog = Catalog::load(args.messages_path.as_deref())
        .context("Failed to load the message catalog")?;

    let identity = IdentityClient::new(IdentityConfig::new(
        args.identity_url,
        args.identity_api_key,
    ))
    .context("Failed to build the identity client")?;

    portal::new(args.port, Arc::new(identity), Arc::new(catalog)).await
}
