//! Account validation rules
//!
//! Two layers live here. The structural validators check field presence and
//! shape of a whole record; the business rules check a single raw value
//! (username, email, password). Structural validation always runs first.

use thiserror::Error;

use super::entity::Account;

/// Typed validation failures, one variant per rule
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Username is too short. Minimum length is {0} characters")]
    UsernameTooShort(usize),

    #[error("Username exceeds maximum length of {0} characters")]
    UsernameTooLong(usize),

    #[error("Username cannot contain spaces")]
    UsernameContainsSpace,

    #[error("Username may only contain letters, digits, '_' and '.', and needs at least one letter or digit")]
    UsernameDisallowedCharacters,

    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email must contain '@' and '.'")]
    EmailMissingAtOrDot,

    #[error("Email cannot contain spaces")]
    EmailContainsSpace,

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Password cannot contain spaces")]
    PasswordContainsSpace,

    #[error("Field '{field}' exceeds maximum length of {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("Field '{field}' contains control characters")]
    ControlCharacters { field: &'static str },

    #[error("Too many tags. Maximum is {0}")]
    TooManyTags(usize),

    #[error("Tags cannot be blank")]
    BlankTag,

    #[error("Update timestamp precedes creation timestamp")]
    TimestampsOutOfOrder,
}

impl AccountValidationError {
    /// Name of the field the violation refers to
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyUsername
            | Self::UsernameTooShort(_)
            | Self::UsernameTooLong(_)
            | Self::UsernameContainsSpace
            | Self::UsernameDisallowedCharacters => "username",
            Self::EmptyEmail | Self::EmailMissingAtOrDot | Self::EmailContainsSpace => "email",
            Self::EmptyPassword
            | Self::PasswordTooShort(_)
            | Self::PasswordTooLong(_)
            | Self::PasswordContainsSpace => "password",
            Self::FieldTooLong { field, .. } | Self::ControlCharacters { field } => field,
            Self::TooManyTags(_) | Self::BlankTag => "tags",
            Self::TimestampsOutOfOrder => "updated_at",
        }
    }
}

const MIN_USERNAME_LENGTH: usize = 8;
const MAX_USERNAME_LENGTH: usize = 20;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 20;

const MAX_IDENTITY_FIELD_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 100;
const MAX_ROLE_LENGTH: usize = 64;
const MAX_TAGS: usize = 32;
const MAX_TAG_LENGTH: usize = 64;
const MAX_PASSWORD_INPUT_LENGTH: usize = 1024;

/// Validate a username
///
/// Rules:
/// - Cannot be empty
/// - Between 8 and 20 characters
/// - No spaces
/// - Only letters, ASCII digits, `_` and `.`, with at least one letter or digit
///
/// Length is counted in characters, not bytes.
pub fn validate_username(username: &str) -> Result<(), AccountValidationError> {
    if username.is_empty() {
        return Err(AccountValidationError::EmptyUsername);
    }

    let length = username.chars().count();

    if length < MIN_USERNAME_LENGTH {
        return Err(AccountValidationError::UsernameTooShort(MIN_USERNAME_LENGTH));
    }

    if length > MAX_USERNAME_LENGTH {
        return Err(AccountValidationError::UsernameTooLong(MAX_USERNAME_LENGTH));
    }

    if username.contains(' ') {
        return Err(AccountValidationError::UsernameContainsSpace);
    }

    let mut has_letter_or_digit = false;

    for c in username.chars() {
        if c.is_alphabetic() || c.is_ascii_digit() {
            has_letter_or_digit = true;
        } else if c != '_' && c != '.' {
            return Err(AccountValidationError::UsernameDisallowedCharacters);
        }
    }

    if !has_letter_or_digit {
        return Err(AccountValidationError::UsernameDisallowedCharacters);
    }

    Ok(())
}

/// Validate an email
///
/// A coarse syntactic check, not RFC 5322: the value must contain `@` and `.`
/// and no space.
pub fn validate_email(email: &str) -> Result<(), AccountValidationError> {
    if email.is_empty() {
        return Err(AccountValidationError::EmptyEmail);
    }

    if !email.contains('@') || !email.contains('.') {
        return Err(AccountValidationError::EmailMissingAtOrDot);
    }

    if email.contains(' ') {
        return Err(AccountValidationError::EmailContainsSpace);
    }

    Ok(())
}

/// Validate a plaintext password
///
/// Rules:
/// - Cannot be empty
/// - Between 8 and 20 characters
/// - No spaces
pub fn validate_password(password: &str) -> Result<(), AccountValidationError> {
    if password.is_empty() {
        return Err(AccountValidationError::EmptyPassword);
    }

    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(AccountValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(AccountValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    if password.contains(' ') {
        return Err(AccountValidationError::PasswordContainsSpace);
    }

    Ok(())
}

/// Structural check of an account record
pub fn validate_account_structure(account: &Account) -> Result<(), AccountValidationError> {
    check_field("username", account.username(), MAX_IDENTITY_FIELD_LENGTH)?;
    check_field("email", account.email(), MAX_IDENTITY_FIELD_LENGTH)?;
    check_field("role", account.role(), MAX_ROLE_LENGTH)?;
    check_field("first_name", account.first_name(), MAX_NAME_LENGTH)?;
    check_field("last_name", account.last_name(), MAX_NAME_LENGTH)?;

    if account.tags().len() > MAX_TAGS {
        return Err(AccountValidationError::TooManyTags(MAX_TAGS));
    }

    for tag in account.tags() {
        if tag.trim().is_empty() {
            return Err(AccountValidationError::BlankTag);
        }

        check_field("tags", tag, MAX_TAG_LENGTH)?;
    }

    if account.updated_at() < account.created_at() {
        return Err(AccountValidationError::TimestampsOutOfOrder);
    }

    Ok(())
}

/// Structural check of a plaintext password before the business rules run
pub fn validate_password_structure(password: &str) -> Result<(), AccountValidationError> {
    check_field("password", password, MAX_PASSWORD_INPUT_LENGTH)
}

fn check_field(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), AccountValidationError> {
    if value.chars().count() > max {
        return Err(AccountValidationError::FieldTooLong { field, max });
    }

    if value.chars().any(char::is_control) {
        return Err(AccountValidationError::ControlCharacters { field });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Username tests
    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("John.Doe").is_ok());
        assert!(validate_username("valid_user123").is_ok());
        assert!(validate_username("Qwe123_ee").is_ok());
        assert!(validate_username("12345678").is_ok());
    }

    #[test]
    fn test_empty_username() {
        assert_eq!(
            validate_username(""),
            Err(AccountValidationError::EmptyUsername)
        );
    }

    #[test]
    fn test_username_too_short() {
        assert_eq!(
            validate_username("short"),
            Err(AccountValidationError::UsernameTooShort(8))
        );
    }

    #[test]
    fn test_username_too_long() {
        assert_eq!(
            validate_username("toolongusernameisdefinitelytoolong"),
            Err(AccountValidationError::UsernameTooLong(20))
        );
    }

    #[test]
    fn test_username_with_space_is_rejected() {
        for username in ["user name", "username ", " username", "a b c d e f"] {
            assert!(validate_username(username).is_err(), "{username:?}");
        }

        assert_eq!(
            validate_username("user name"),
            Err(AccountValidationError::UsernameContainsSpace)
        );
    }

    #[test]
    fn test_username_disallowed_characters() {
        assert_eq!(
            validate_username("asd!^+.++dfghdr"),
            Err(AccountValidationError::UsernameDisallowedCharacters)
        );
        assert_eq!(
            validate_username("user-name1"),
            Err(AccountValidationError::UsernameDisallowedCharacters)
        );
    }

    #[test]
    fn test_username_of_only_separators_is_rejected() {
        assert_eq!(
            validate_username("________"),
            Err(AccountValidationError::UsernameDisallowedCharacters)
        );
        assert_eq!(
            validate_username("........"),
            Err(AccountValidationError::UsernameDisallowedCharacters)
        );
        assert_eq!(
            validate_username("......"),
            Err(AccountValidationError::UsernameTooShort(8))
        );
    }

    #[test]
    fn test_numeric_symbols_are_not_digits() {
        for username in ["john.doe½", "user²name"] {
            assert_eq!(
                validate_username(username),
                Err(AccountValidationError::UsernameDisallowedCharacters),
                "{username:?}"
            );
        }
    }

    #[test]
    fn test_username_length_counts_characters() {
        assert!(validate_username("jöhnsmith").is_ok());
    }

    #[test]
    fn test_username_length_boundaries() {
        assert!(validate_username(&"a".repeat(7)).is_err());
        assert!(validate_username(&"a".repeat(8)).is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username(&"a".repeat(21)).is_err());
    }

    // Email tests
    #[test]
    fn test_valid_emails() {
        assert!(validate_email("john@example.com").is_ok());
        assert!(validate_email("a.b@c.d").is_ok());
    }

    #[test]
    fn test_empty_email() {
        assert_eq!(validate_email(""), Err(AccountValidationError::EmptyEmail));
    }

    #[test]
    fn test_email_missing_at_or_dot() {
        assert_eq!(
            validate_email("john.example.com"),
            Err(AccountValidationError::EmailMissingAtOrDot)
        );
        assert_eq!(
            validate_email("john@example"),
            Err(AccountValidationError::EmailMissingAtOrDot)
        );
    }

    #[test]
    fn test_email_with_space() {
        assert_eq!(
            validate_email("john doe@example.com"),
            Err(AccountValidationError::EmailContainsSpace)
        );
    }

    // Password tests
    #[test]
    fn test_valid_passwords() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("P@ssw0rd!").is_ok());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_empty_password() {
        assert_eq!(
            validate_password(""),
            Err(AccountValidationError::EmptyPassword)
        );
    }

    #[test]
    fn test_password_length_boundaries() {
        assert_eq!(
            validate_password("1234567"),
            Err(AccountValidationError::PasswordTooShort(8))
        );
        assert!(validate_password(&"p".repeat(20)).is_ok());
        assert_eq!(
            validate_password(&"p".repeat(21)),
            Err(AccountValidationError::PasswordTooLong(20))
        );
    }

    #[test]
    fn test_password_with_space() {
        assert_eq!(
            validate_password("pass word1"),
            Err(AccountValidationError::PasswordContainsSpace)
        );
    }

    // Structural tests
    #[test]
    fn test_valid_account_structure() {
        let account = Account::new("valid_user", "valid@example.com")
            .with_names("John", "Doe")
            .with_tags(vec!["beta".to_string()]);

        assert!(validate_account_structure(&account).is_ok());
    }

    #[test]
    fn test_structure_rejects_control_characters() {
        let account = Account::new("valid_user", "valid@example.com").with_names("Jo\u{0}hn", "");

        assert_eq!(
            validate_account_structure(&account),
            Err(AccountValidationError::ControlCharacters {
                field: "first_name"
            })
        );
    }

    #[test]
    fn test_structure_rejects_blank_and_excess_tags() {
        let blank = Account::new("valid_user", "valid@example.com").with_tags(vec!["  ".into()]);
        assert_eq!(
            validate_account_structure(&blank),
            Err(AccountValidationError::BlankTag)
        );

        let many = Account::new("valid_user", "valid@example.com")
            .with_tags((0..33).map(|i| format!("tag{i}")).collect());
        assert_eq!(
            validate_account_structure(&many),
            Err(AccountValidationError::TooManyTags(32))
        );
    }

    #[test]
    fn test_structure_rejects_long_role() {
        let account = Account::new("valid_user", "valid@example.com").with_role("r".repeat(65));

        assert_eq!(
            validate_account_structure(&account),
            Err(AccountValidationError::FieldTooLong {
                field: "role",
                max: 64
            })
        );
    }

    #[test]
    fn test_password_structure() {
        assert!(validate_password_structure("password123").is_ok());
        assert_eq!(
            validate_password_structure("pass\tword"),
            Err(AccountValidationError::ControlCharacters { field: "password" })
        );
    }

    #[test]
    fn test_violation_fields() {
        assert_eq!(AccountValidationError::EmptyUsername.field(), "username");
        assert_eq!(AccountValidationError::EmailContainsSpace.field(), "email");
        assert_eq!(AccountValidationError::PasswordTooLong(20).field(), "password");
        assert_eq!(AccountValidationError::BlankTag.field(), "tags");
        assert_eq!(
            AccountValidationError::FieldTooLong {
                field: "last_name",
                max: 100
            }
            .field(),
            "last_name"
        );
    }
}
