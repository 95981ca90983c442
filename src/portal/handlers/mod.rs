pub mod health;
pub use self::health::health;

pub mod activation;

// field checks shared by the form handlers
use regex::Regex;
use std::sync::LazyLock;
use validator::ValidateEmail;

pub const ACTIVATION_CODE_LENGTH: usize = 10;
pub const PASSWORD_MIN_LENGTH: usize = 8;

// pt-PT and es-ES mobile numbers, optional country prefix
const MOBILE_PHONE_PATTERNS: [&str; 2] = [r"^(\+?351)?9[1236]\d{7}$", r"^(\+?34)?[67]\d{8}$"];

static MOBILE_PHONES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    MOBILE_PHONE_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

pub fn valid_activation_code(code: &str) -> bool {
    code.chars().count() == ACTIVATION_CODE_LENGTH
}

/// At least 8 characters with one lowercase and one uppercase letter.
/// Digits and symbols are allowed but not required.
pub fn strong_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_LENGTH
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
}

/// Syntactically valid address whose domain has a top-level label.
pub fn valid_email(email: &str) -> bool {
    email.validate_email()
        && email
            .rsplit_once('@')
            .and_then(|(_, domain)| domain.rsplit_once('.'))
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

pub fn valid_mobile_phone(phone: &str) -> bool {
    MOBILE_PHONES.iter().any(|re| re.is_match(phone))
}
