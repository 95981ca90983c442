//! Account activation form.
//!
//! `GET /` shows the form and `POST /` submits it. Every outcome is an HTML
//! page: validation problems and identity server failures re-render the form
//! with the submitted data, a successful change renders the success page.

use crate::{
    i18n::{Catalog, ValidationMessages},
    identity::{ChangePassword, IdentityClient},
    portal::{
        handlers::{strong_password, valid_activation_code, valid_email, valid_mobile_phone},
        views::{self, ActivationView, SuccessView},
    },
};
use axum::{
    Form,
    extract::{Extension, Query},
    response::Response,
};
use serde::Deserialize;
use std::{collections::BTreeMap, fmt, sync::Arc};
use tracing::{debug, error, info, instrument};

pub const FIELD_ACTIVATION_CODE: &str = "activationCode";
pub const FIELD_OLD_PASSWORD: &str = "oldPassword";
pub const FIELD_NEW_PASSWORD: &str = "newPassword";
pub const FIELD_NEW_PASSWORD_CONFIRMATION: &str = "newPasswordConfirmation";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PHONE_NUMBER: &str = "phoneNumber";

#[derive(Debug, Default, Deserialize)]
pub struct ActivationQuery {
    pub code: Option<String>,
}

/// Submitted form. Missing fields are empty strings.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivationForm {
    pub activation_code: String,
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
    pub email: String,
    pub phone_number: String,
}

impl fmt::Debug for ActivationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationForm")
            .field("activation_code", &self.activation_code)
            .field("old_password", &"***")
            .field("new_password", &"***")
            .field("new_password_confirmation", &"***")
            .field("email", &self.email)
            .field("phone_number", &self.phone_number)
            .finish()
    }
}

/// Field name to message, first failure per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn add(&mut self, field: &'static str, message: &str) {
        self.0
            .entry(field)
            .or_insert_with(|| message.to_string());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Message for `field`, empty when the field is valid.
    #[must_use]
    pub fn message(&self, field: &str) -> &str {
        self.get(field).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Check every field of the form. An empty result means the form can be sent.
#[must_use]
pub fn validate(form: &ActivationForm, messages: &ValidationMessages) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if !valid_activation_code(&form.activation_code) {
        errors.add(FIELD_ACTIVATION_CODE, &messages.activation_code);
    }

    for (field, value) in [
        (FIELD_OLD_PASSWORD, &form.old_password),
        (FIELD_NEW_PASSWORD, &form.new_password),
        (FIELD_NEW_PASSWORD_CONFIRMATION, &form.new_password_confirmation),
    ] {
        if !strong_password(value) {
            errors.add(field, &messages.password);
        }
    }

    if form.new_password == form.old_password {
        errors.add(
            FIELD_NEW_PASSWORD,
            &messages.new_password_must_be_different_from_old_password,
        );
    }

    if form.new_password_confirmation != form.new_password {
        errors.add(
            FIELD_NEW_PASSWORD_CONFIRMATION,
            &messages.password_confirmation_does_not_match_password,
        );
    }

    // optional, empty means not given
    if !form.email.is_empty() && !valid_email(&form.email) {
        errors.add(FIELD_EMAIL, &messages.email);
    }

    if !form.phone_number.is_empty() && !valid_mobile_phone(&form.phone_number) {
        errors.add(FIELD_PHONE_NUMBER, &messages.phone_number);
    }

    errors
}

// axum handler for GET /
pub async fn show(query: Option<Query<ActivationQuery>>) -> Response {
    let form = ActivationForm {
        activation_code: query.and_then(|Query(q)| q.code).unwrap_or_default(),
        ..ActivationForm::default()
    };

    views::render(&ActivationView::new(&form))
}

// axum handler for POST /
#[instrument(skip_all)]
pub async fn submit(
    identity: Extension<Arc<IdentityClient>>,
    catalog: Extension<Arc<Catalog>>,
    form: Option<Form<ActivationForm>>,
) -> Response {
    let form: ActivationForm = match form {
        Some(Form(form)) => form,
        None => {
            debug!("Undecodable form body, treating it as empty");

            ActivationForm::default()
        }
    };

    debug!("form: {:?}", form);

    let errors = validate(&form, &catalog.validation_message);

    if !errors.is_empty() {
        debug!("{} invalid field(s)", errors.len());

        return views::render(&ActivationView::new(&form).with_validation_errors(&errors));
    }

    let request =
        ChangePassword::activation_code(&form.activation_code, &form.old_password, &form.new_password);

    match identity.change_password(&request).await {
        Ok(response) => {
            info!("Account activated: {:?}", response.message);

            views::render(&SuccessView {
                message: &catalog.messages.activate_login_success_title,
                sub_message: &catalog.messages.activate_login_success_message,
            })
        }

        Err(e) => {
            error!("Error changing password: {:?}", e);

            let message = e.to_string();

            views::render(&ActivationView::new(&form).with_error(&message))
        }
    }
}
