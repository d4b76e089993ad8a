pub mod account;

pub use account::{
    Account, AccountDraft, AccountId, AccountRow, AccountType, Label, ACCOUNT_TYPE_OPTIONS,
};
