use anyhow::{Context, bail};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_IDENTITY_URL: &str = "identity-url";
pub const ARG_IDENTITY_API_KEY: &str = "identity-api-key";
pub const ARG_MESSAGES: &str = "messages";

#[derive(Debug, Clone)]
pub struct Options {
    pub url: Url,
    pub api_key: SecretString,
    pub messages_path: Option<String>,
}

impl Options {
    /// Parse identity server arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the URL or API key are missing, or the URL is not http(s).
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(raw_url) = get_non_empty(ARG_IDENTITY_URL) else {
            bail!("missing required argument: --{ARG_IDENTITY_URL}");
        };

        let url = Url::parse(raw_url.trim())
            .with_context(|| format!("invalid --{ARG_IDENTITY_URL}: {raw_url}"))?;

        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "invalid --{ARG_IDENTITY_URL}: unsupported scheme {}",
                url.scheme()
            );
        }

        let Some(api_key) = get_non_empty(ARG_IDENTITY_API_KEY) else {
            bail!("missing required argument: --{ARG_IDENTITY_API_KEY}");
        };

        Ok(Self {
            url,
            api_key: SecretString::from(api_key),
            messages_path: get_non_empty(ARG_MESSAGES),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDENTITY_URL)
                .long(ARG_IDENTITY_URL)
                .help("Identity server base URL, example: https://identity.tld")
                .env("ACTIVATION_IDENTITY_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_IDENTITY_API_KEY)
                .long(ARG_IDENTITY_API_KEY)
                .help("API key sent as a bearer token to the identity server")
                .env("ACTIVATION_IDENTITY_API_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_MESSAGES)
                .long(ARG_MESSAGES)
                .help("Path to a JSON message catalog (default: built-in English messages)")
                .env("ACTIVATION_MESSAGES"),
        )
}
