//! HTML templates compiled into the binary.

use axum::response::Html;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

use crate::database::models::{status_label, SessionUser};
use crate::listing::truncate_description;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("landing.html", include_str!("../../templates/landing.html")),
    ("auth.html", include_str!("../../templates/auth.html")),
    ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ("clients.html", include_str!("../../templates/clients.html")),
    ("projects.html", include_str!("../../templates/projects.html")),
    ("project_detail.html", include_str!("../../templates/project_detail.html")),
    ("confirm_delete.html", include_str!("../../templates/confirm_delete.html")),
    ("error.html", include_str!("../../templates/error.html")),
];

/// Minimal page used when the error template itself cannot be rendered.
const FALLBACK_ERROR: &str = "<!doctype html><title>Error</title><h1>{{ status }}</h1><p>{{ message }}</p>";

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        tera.register_filter("shorten", shorten);
        tera.register_filter("status_label", label);
        tera.register_filter("money", money);
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>, tera::Error> {
        self.tera.render(name, context).map(Html)
    }

    /// Renders the error page; never fails.
    pub fn render_error(&self, status: u16, message: &str, user: Option<&SessionUser>) -> Html<String> {
        let mut context = Context::new();
        context.insert("user", &user);
        context.insert("status", &status);
        context.insert("message", message);
        match self.tera.render("error.html", &context) {
            Ok(html) => Html(html),
            Err(err) => {
                tracing::error!("Failed to render error page: {}", err);
                Html(Tera::one_off(FALLBACK_ERROR, &context, true).unwrap_or_else(|_| message.to_string()))
            }
        }
    }
}

/// `{{ text | shorten(length=60) }}`
fn shorten(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("shorten filter requires a string"))?;
    let length = args.get("length").and_then(|v| v.as_u64()).unwrap_or(60) as usize;
    Ok(Value::String(truncate_description(text, length)))
}

/// `{{ "on-hold" | status_label }}` renders "On Hold".
fn label(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("status_label filter requires a string"))?;
    Ok(Value::String(status_label(text)))
}

/// Two decimal places with thousands separators: 12500.5 renders "12,500.50".
fn money(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let amount = value
        .as_f64()
        .ok_or_else(|| tera::Error::msg("money filter requires a number"))?;
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    Ok(Value::String(format!("{}{}.{}", sign, grouped, cents)))
}
