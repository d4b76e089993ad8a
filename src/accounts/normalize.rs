//! Conversions between form rows and canonical accounts.
//!
//! Every function here is total: malformed input collapses into defaults
//! (dropped label segments, empty passwords) rather than errors.

use crate::models::{Account, AccountDraft, AccountRow, AccountType, Label};

use super::identity::IdentityGenerator;

pub const LABEL_SEPARATOR: char = ';';

pub fn is_ldap(account_type: AccountType) -> bool {
    account_type == AccountType::Ldap
}

/// Splits on `;`, trims each segment and drops the empty ones.
pub fn parse_labels(input: &str) -> Vec<Label> {
    input
        .split(LABEL_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(Label::new)
        .collect()
}

pub fn format_labels(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|label| label.text.as_str())
        .collect::<Vec<_>>()
        .join(&format!("{LABEL_SEPARATOR} "))
}

/// LDAP accounts never carry a password; local ones always carry a string.
pub fn enforce_password_invariant(
    account_type: AccountType,
    value: Option<String>,
) -> Option<String> {
    if is_ldap(account_type) {
        None
    } else {
        Some(value.unwrap_or_default())
    }
}

/// Returns the draft as an account, minting an identity only if it has none.
/// A blank id counts as none.
pub fn ensure_identity(mut draft: AccountDraft, ids: &dyn IdentityGenerator) -> Account {
    let id = draft
        .id
        .take()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| ids.next_id());
    draft.into_account(id)
}

/// `ensure_identity` plus the password invariant; the shape the store keeps.
pub fn normalize_account(draft: AccountDraft, ids: &dyn IdentityGenerator) -> Account {
    let mut account = ensure_identity(draft, ids);
    account.password = enforce_password_invariant(account.account_type, account.password.take());
    account
}

pub fn row_to_account(row: &AccountRow) -> Account {
    Account {
        id: row.id.clone(),
        labels: parse_labels(&row.labels_input),
        account_type: row.account_type,
        login: row.login.clone(),
        password: enforce_password_invariant(row.account_type, row.password.clone()),
    }
}

pub fn account_to_row(account: &Account) -> AccountRow {
    AccountRow {
        id: account.id.clone(),
        labels_input: format_labels(&account.labels),
        account_type: account.account_type,
        login: account.login.clone(),
        password: enforce_password_invariant(account.account_type, account.password.clone()),
    }
}

/// Template for a new, unsaved form entry.
pub fn create_empty_row(ids: &dyn IdentityGenerator) -> AccountRow {
    AccountRow {
        id: ids.next_id(),
        labels_input: String::new(),
        account_type: AccountType::Local,
        login: String::new(),
        password: Some(String::new()),
    }
}
