//! Drafts submitted by the create forms and their JSON counterparts.
//!
//! Every draft is trimmed, validated, then converted into the store's insert
//! payload. Conversion never touches the owner; the workspace supplies it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::database::models::{round_cents, ClientStatus, NewClient, NewProject, ProjectStatus, UnknownVariant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0}")]
    Invalid(String),

    #[error("Budget must be a non-negative number")]
    InvalidBudget,

    #[error("{0} must be a date (YYYY-MM-DD)")]
    InvalidDate(&'static str),

    #[error("Please select a client")]
    InvalidClient,

    #[error(transparent)]
    InvalidChoice(#[from] UnknownVariant),
}

impl From<ValidationErrors> for FormError {
    /// Keeps the first message by field name so the reported error is stable.
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .next()
            .unwrap_or_else(|| "Invalid form submission".to_string());
        FormError::Invalid(message)
    }
}

fn optional(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_date(value: &str, field: &'static str) -> Result<Option<NaiveDate>, FormError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FormError::InvalidDate(field))
}

fn parse_status<T>(value: &str) -> Result<T, FormError>
where
    T: FromStr<Err = UnknownVariant> + Default,
{
    if value.is_empty() {
        Ok(T::default())
    } else {
        Ok(value.parse()?)
    }
}

/// Accepts `"1500.5"` from a form post and `1500.5` from a JSON body.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

/// Parses a budget entry into a non-negative amount rounded to cents.
pub fn parse_budget(value: &str) -> Result<Option<Decimal>, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let amount = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| FormError::InvalidBudget)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(FormError::InvalidBudget);
    }
    Ok(Some(round_cents(amount)))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NewClientForm {
    #[validate(length(min = 1, message = "Company is required"))]
    pub company: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: String,
    pub notes: String,
}

impl NewClientForm {
    pub fn trimmed(mut self) -> Self {
        for field in [
            &mut self.company,
            &mut self.name,
            &mut self.email,
            &mut self.phone,
            &mut self.status,
        ] {
            *field = field.trim().to_string();
        }
        self
    }

    pub fn into_new_client(self) -> Result<NewClient, FormError> {
        let form = self.trimmed();
        form.validate()?;
        Ok(NewClient {
            status: parse_status::<ClientStatus>(&form.status)?,
            name: form.name,
            email: optional(form.email),
            phone: optional(form.phone),
            company: optional(form.company),
            notes: optional(form.notes),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NewProjectForm {
    #[validate(length(min = 1, message = "Please select a client"))]
    pub client_id: String,
    #[validate(length(min = 1, message = "Project name is required"))]
    pub name: String,
    pub description: String,
    pub status: String,
    pub start_date: String,
    pub due_date: String,
    #[serde(deserialize_with = "text_or_number")]
    pub budget: String,
}

impl NewProjectForm {
    pub fn trimmed(mut self) -> Self {
        for field in [
            &mut self.client_id,
            &mut self.name,
            &mut self.status,
            &mut self.start_date,
            &mut self.due_date,
            &mut self.budget,
        ] {
            *field = field.trim().to_string();
        }
        self
    }

    pub fn into_new_project(self) -> Result<NewProject, FormError> {
        let form = self.trimmed();
        form.validate()?;
        let client_id = Uuid::parse_str(&form.client_id).map_err(|_| FormError::InvalidClient)?;
        Ok(NewProject {
            client_id,
            status: parse_status::<ProjectStatus>(&form.status)?,
            start_date: parse_date(&form.start_date, "Start date")?,
            due_date: parse_date(&form.due_date, "Due date")?,
            budget: parse_budget(&form.budget)?,
            name: form.name,
            description: optional(form.description),
        })
    }
}

/// The inline "Add Task" box. Only the title is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NewTaskForm {
    #[validate(length(min = 1, message = "Task title is required"))]
    pub title: String,
}

impl NewTaskForm {
    pub fn into_title(self) -> Result<String, FormError> {
        let form = NewTaskForm {
            title: self.title.trim().to_string(),
        };
        form.validate()?;
        Ok(form.title)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CredentialsForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl CredentialsForm {
    /// E-mail is trimmed and lowercased; the password is taken as typed.
    pub fn normalized(self) -> Result<Self, FormError> {
        let form = CredentialsForm {
            email: self.email.trim().to_lowercase(),
            password: self.password,
        };
        form.validate()?;
        Ok(form)
    }
}
