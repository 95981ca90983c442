//! # Activation Portal
//!
//! `activation-portal` serves the account activation form. Citizens receive a
//! 10-character activation code together with a temporary password; the form
//! lets them pick a new password, which is forwarded to the identity server.
//!
//! ## Flow
//!
//! - `GET /` renders the form, pre-filling the activation code from `?code=`.
//! - `POST /` validates the submission locally. Nothing is sent upstream until
//!   every field passes.
//! - Valid submissions call `POST {identity}/api/citizens/change-password`.
//!   The provider's verdict is rendered back as a success page or as an error
//!   on the same form.
//!
//! The crate also exposes [`identity::IdentityClient::authenticate`], a login
//! proxy that reduces the provider's answer to `true`/`false`.
//!
//! No state is kept between requests: the identity client and the message
//! catalog are immutable and shared read-only.

pub mod cli;
pub mod i18n;
pub mod identity;
pub mod portal;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
