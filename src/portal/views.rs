//! Server-rendered pages, templates live in `templates/`.

use crate::portal::handlers::activation::{ActivationForm, ValidationErrors};
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

static NO_ERRORS: ValidationErrors = ValidationErrors::new();

#[derive(Template)]
#[template(path = "activation.html")]
pub struct ActivationView<'a> {
    pub data: &'a ActivationForm,
    pub validation_errors: &'a ValidationErrors,
    pub error: Option<&'a str>,
}

impl<'a> ActivationView<'a> {
    #[must_use]
    pub fn new(data: &'a ActivationForm) -> Self {
        Self {
            data,
            validation_errors: &NO_ERRORS,
            error: None,
        }
    }

    #[must_use]
    pub fn with_validation_errors(mut self, errors: &'a ValidationErrors) -> Self {
        self.validation_errors = errors;
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: &'a str) -> Self {
        self.error = Some(error);
        self
    }
}

#[derive(Template)]
#[template(path = "success.html")]
pub struct SuccessView<'a> {
    pub message: &'a str,
    pub sub_message: &'a str,
}

/// Render a page, falling back to a bare 500 if the template fails.
pub fn render<T: Template>(view: &T) -> Response {
    match view.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template error: {e}");

            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
