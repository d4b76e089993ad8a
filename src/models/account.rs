//! Account data models.
//!
//! `Account` is the canonical record held by the store and written to the
//! persisted blob. `AccountDraft` is the same shape with an optional identity,
//! used for hydrated and caller-supplied records that have not been assigned
//! one yet. `AccountRow` is the form-bound edit buffer.

use serde::{Deserialize, Deserializer, Serialize};

pub type AccountId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum AccountType {
    #[default]
    #[serde(rename = "Локальная", alias = "Local")]
    Local,
    #[serde(rename = "LDAP", alias = "Ldap")]
    Ldap,
}

impl AccountType {
    /// Display text for the type selector; also the persisted form.
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Local => "Локальная",
            AccountType::Ldap => "LDAP",
        }
    }
}

/// Types offered by the type selector, in display order.
pub const ACCOUNT_TYPE_OPTIONS: [AccountType; 2] = [AccountType::Local, AccountType::Ldap];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub text: String,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub labels: Vec<Label>,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub login: String,
    /// Always `None` for LDAP accounts, always `Some` for local ones.
    pub password: Option<String>,
}

/// An account that may still be missing its identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AccountDraft {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<AccountId>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl AccountDraft {
    /// Attaches `id`, keeping every other field.
    pub fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            labels: self.labels,
            account_type: self.account_type,
            login: self.login,
            password: self.password,
        }
    }
}

impl From<Account> for AccountDraft {
    fn from(account: Account) -> Self {
        Self {
            id: Some(account.id),
            labels: account.labels,
            account_type: account.account_type,
            login: account.login,
            password: account.password,
        }
    }
}

/// Edit buffer bound to a form row; labels are flattened to one string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountRow {
    pub id: AccountId,
    pub labels_input: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub login: String,
    pub password: Option<String>,
}

/// Identities persisted by older builds were creation timestamps stored as
/// plain numbers. Both shapes are read back as strings; blank ids count as
/// missing so the store assigns a fresh one.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<AccountId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawId::Text(text)) if !text.trim().is_empty() => Some(text),
        Some(RawId::Text(_)) | None => None,
        Some(RawId::Signed(value)) => Some(value.to_string()),
        Some(RawId::Unsigned(value)) => Some(value.to_string()),
    })
}
