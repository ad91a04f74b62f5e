//! CAS login-form scraping.
//!
//! The CAS login page carries two hidden inputs binding a submission to a
//! server-side login flow. The portal only ever needs those two values, so
//! this is a targeted scan of the served markup rather than a full HTML
//! parser. An unrecognizable form is a typed error, never a panic.

use crate::error::AuthError;

/// Flow tokens scraped from the CAS login form, scoped to one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasLoginForm {
    /// The `lt` (login ticket) hidden-field value.
    pub login_ticket: String,
    /// The `execution` hidden-field value.
    pub execution_id: String,
}

/// Whether the body looks like the CAS login form at all. A CAS session
/// established earlier skips the form and serves the layout JSON directly.
pub fn contains_login_form(html: &str) -> bool {
    html.contains(r#"name="lt""#)
}

/// Extract the `lt` and `execution` hidden-field values.
pub fn parse_login_form(html: &str) -> Result<CasLoginForm, AuthError> {
    let login_ticket = input_value(html, "lt").ok_or(AuthError::FormNotRecognized)?;
    let execution_id = input_value(html, "execution").ok_or(AuthError::FormNotRecognized)?;
    Ok(CasLoginForm {
        login_ticket: login_ticket.to_string(),
        execution_id: execution_id.to_string(),
    })
}

/// Find the `value` attribute of the tag whose `name` attribute is `name`.
/// Scans the whole tag, so attribute order does not matter.
fn input_value<'a>(html: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!(r#"name="{name}""#);
    let at = html.find(&marker)?;
    let tag_start = html[..at].rfind('<')?;
    let tag_end = at + html[at..].find('>')?;
    let tag = &html[tag_start..tag_end];

    let value_marker = r#"value=""#;
    let value_at = tag.find(value_marker)? + value_marker.len();
    let rest = &tag[value_at..];
    rest.find('"').map(|end| &rest[..end])
}
