use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::not_blank;

/// A persisted company record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub created_by_user: String,
    pub activated: bool,
    pub created_date: DateTime<Utc>,
    pub last_modified_by_user: String,
    pub last_modified_date: DateTime<Utc>,
}

impl Company {
    /// A fresh, activated record owned by `owner`.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        let owner = owner.into();
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            created_by_user: owner.clone(),
            activated: true,
            created_date: now,
            last_modified_by_user: owner,
            last_modified_date: now,
        }
    }

    pub fn is_owned_by(&self, user: &str) -> bool {
        self.created_by_user == user
    }
}

/// Client-writable fields of a company.
///
/// Anything else a client sends (`id`, `createdByUser`, dates) is ignored.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub name: String,

    #[serde(default = "default_activated")]
    pub activated: bool,
}

fn default_activated() -> bool {
    true
}
