//! Handlebars rendering for handler email templates.
//!
//! `{{ name }}` expands to the display form of the cleaned value of the
//! field called `name`; `{{ form_title }}` to the form's title. Unknown
//! placeholders render as the empty string. Output is plain-text email, so
//! nothing is HTML-escaped.

use handlebars::Handlebars;
use serde_json::{Map, Value};

use formforge_types::error::HandlerError;
use formforge_types::submission::Submission;

const SUBJECT: &str = "subject";
const BODY: &str = "body";

/// A compiled subject/body pair.
pub struct MailTemplates {
    handlebars: Handlebars<'static>,
    listing_body: bool,
}

impl MailTemplates {
    /// Compile both templates. A blank body renders as a listing of every
    /// cleaned value instead.
    pub fn new(subject: &str, body: &str) -> Result<Self, HandlerError> {
        let mut hb = Handlebars::new();
        hb.register_escape_fn(handlebars::no_escape);
        hb.register_template_string(SUBJECT, subject)?;

        let listing_body = body.trim().is_empty();
        if !listing_body {
            hb.register_template_string(BODY, body)?;
        }

        Ok(Self {
            handlebars: hb,
            listing_body,
        })
    }

    pub fn subject(&self, submission: &Submission) -> Result<String, HandlerError> {
        Ok(self.handlebars.render(SUBJECT, &template_data(submission))?)
    }

    pub fn body(&self, submission: &Submission) -> Result<String, HandlerError> {
        if self.listing_body {
            return Ok(render_data_listing(submission));
        }
        Ok(self.handlebars.render(BODY, &template_data(submission))?)
    }
}

/// Plain-text dump of every cleaned value, one `name: value` line each.
pub fn render_data_listing(submission: &Submission) -> String {
    submission
        .data
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// A field called `form_title` shadows the title.
fn template_data(submission: &Submission) -> Value {
    let mut data = Map::new();
    data.insert(
        "form_title".to_string(),
        Value::String(submission.form_title.clone()),
    );
    for (name, value) in submission.data.iter() {
        data.insert(name.to_string(), Value::String(value.to_string()));
    }
    Value::Object(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use formforge_types::form::FormId;
    use formforge_types::submission::{CleanedData, FieldValue};

    fn submission() -> Submission {
        let mut data = CleanedData::new();
        data.insert("name", FieldValue::Text("Ada".to_string()));
        data.insert("agree", FieldValue::Bool(true));
        Submission {
            form_id: FormId::new(),
            form_title: "Contact".to_string(),
            target_model: None,
            data,
            submitted_at: Utc::now(),
        }
    }

    fn render(template: &str, submission: &Submission) -> String {
        MailTemplates::new(template, "b")
            .unwrap()
            .subject(submission)
            .unwrap()
    }

    #[test]
    fn test_substitutes_fields_and_title() {
        let out = render("Hi {{ name }}, thanks for {{form_title}}!", &submission());
        assert_eq!(out, "Hi Ada, thanks for Contact!");
    }

    #[test]
    fn test_unknown_placeholder_is_empty() {
        let out = render("[{{ nope }}]", &submission());
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_field_named_form_title_wins() {
        let mut s = submission();
        s.data.insert("form_title", FieldValue::Text("override".to_string()));
        assert_eq!(render("{{ form_title }}", &s), "override");
    }

    #[test]
    fn test_values_are_not_html_escaped() {
        let mut s = submission();
        s.data.insert("name", FieldValue::Text("Tom & <Jerry>".to_string()));
        let templates = MailTemplates::new("{{ name }}", "Hello {{ name }}").unwrap();
        assert_eq!(templates.subject(&s).unwrap(), "Tom & <Jerry>");
        assert_eq!(templates.body(&s).unwrap(), "Hello Tom & <Jerry>");
    }

    #[test]
    fn test_conditional_sections() {
        let templates =
            MailTemplates::new("{{#if agree}}opted in{{else}}opted out{{/if}}", "b").unwrap();
        assert_eq!(templates.subject(&submission()).unwrap(), "opted in");
    }

    #[test]
    fn test_blank_body_lists_data() {
        let templates = MailTemplates::new("s", "  ").unwrap();
        assert_eq!(templates.body(&submission()).unwrap(), "agree: yes\nname: Ada");
    }

    #[test]
    fn test_malformed_template_is_rejected() {
        let err = MailTemplates::new("{{#if name}}unclosed", "b").err().unwrap();
        assert!(matches!(err, HandlerError::InvalidTemplate(_)));
    }

    #[test]
    fn test_data_listing() {
        let out = render_data_listing(&submission());
        assert_eq!(out, "agree: yes\nname: Ada");
    }
}
