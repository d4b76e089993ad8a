//! Input constraints for the account form.
//!
//! These are presentation rules: the store accepts any well-typed record, and
//! only the row-level commands consult them before saving.

use std::fmt;

use crate::models::{AccountRow, AccountType};

pub const LABEL_MAX_LENGTH: usize = 50;
pub const LOGIN_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIssue {
    EmptyLogin,
    LoginTooLong,
    LabelsTooLong,
    EmptyPassword,
}

impl RowIssue {
    /// Form field the issue should be highlighted on.
    pub fn field(&self) -> &'static str {
        match self {
            RowIssue::EmptyLogin | RowIssue::LoginTooLong => "login",
            RowIssue::LabelsTooLong => "labelsInput",
            RowIssue::EmptyPassword => "password",
        }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssue::EmptyLogin => write!(f, "Login is required"),
            RowIssue::LoginTooLong => {
                write!(f, "Login too long (max {LOGIN_MAX_LENGTH} chars)")
            }
            RowIssue::LabelsTooLong => {
                write!(f, "Labels too long (max {LABEL_MAX_LENGTH} chars)")
            }
            RowIssue::EmptyPassword => write!(f, "Password is required for local accounts"),
        }
    }
}

/// Lists every rule the row breaks; an empty list means it can be saved.
pub fn validate_row(row: &AccountRow) -> Vec<RowIssue> {
    let mut issues = Vec::new();

    let login = row.login.trim();
    if login.is_empty() {
        issues.push(RowIssue::EmptyLogin);
    } else if row.login.chars().count() > LOGIN_MAX_LENGTH {
        issues.push(RowIssue::LoginTooLong);
    }

    if row.labels_input.chars().count() > LABEL_MAX_LENGTH {
        issues.push(RowIssue::LabelsTooLong);
    }

    if row.account_type == AccountType::Local
        && row.password.as_deref().map_or(true, |p| p.trim().is_empty())
    {
        issues.push(RowIssue::EmptyPassword);
    }

    issues
}
