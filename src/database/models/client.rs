use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// Relationship stage of a client.
    ClientStatus ("client status") {
        Active => "active",
        Inactive => "inactive",
        #[default]
        Lead => "lead",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Contact name. Stored as an empty string when the form leaves it blank.
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ClientStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn display_name(&self) -> &str {
        display_name(self.company.as_deref(), &self.name)
    }

    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id,
            name: self.name.clone(),
            company: self.company.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// The client columns expanded onto projects and offered in the project form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ClientSummary {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ClientSummary {
    pub fn display_name(&self) -> &str {
        display_name(self.company.as_deref(), &self.name)
    }
}

fn display_name<'a>(company: Option<&'a str>, name: &'a str) -> &'a str {
    match company {
        Some(company) if !company.is_empty() => company,
        _ => name,
    }
}

/// Insert payload. The owner is supplied by the scoped repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: ClientStatus,
    pub notes: Option<String>,
}
