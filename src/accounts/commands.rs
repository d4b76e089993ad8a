//! Row-level entry points for the account form.

use crate::models::AccountRow;

use super::{
    normalize::{account_to_row, create_empty_row, row_to_account},
    store::AccountStore,
    validation::validate_row,
};

pub fn list_rows(store: &AccountStore) -> Vec<AccountRow> {
    store.list_all().iter().map(account_to_row).collect()
}

/// Blank row with a fresh identity. Nothing is stored until it is saved.
pub fn new_row(store: &AccountStore) -> AccountRow {
    create_empty_row(store.identity_generator())
}

/// Saves a row if it passes form validation, returning the stored record
/// re-rendered as a row. Rejections list `field: message` pairs.
pub fn save_row(store: &AccountStore, row: AccountRow) -> Result<AccountRow, String> {
    let issues = validate_row(&row);
    if !issues.is_empty() {
        return Err(issues
            .iter()
            .map(|issue| format!("{}: {issue}", issue.field()))
            .collect::<Vec<_>>()
            .join("; "));
    }

    let saved = store.save(row_to_account(&row));
    Ok(account_to_row(&saved))
}

/// Deleting a row that was never saved is not an error.
pub fn delete_row(store: &AccountStore, id: &str) -> bool {
    store.remove(id)
}
