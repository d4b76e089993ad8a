pub mod commands;
pub mod identity;
pub mod normalize;
pub mod store;
pub mod validation;

pub use identity::{IdentityGenerator, OpaqueIdGenerator};
pub use normalize::{
    account_to_row, create_empty_row, enforce_password_invariant, ensure_identity,
    format_labels, is_ldap, normalize_account, parse_labels, row_to_account, LABEL_SEPARATOR,
};
pub use store::{AccountStore, Listener, SubscriptionId};
pub use validation::{validate_row, RowIssue, LABEL_MAX_LENGTH, LOGIN_MAX_LENGTH};
