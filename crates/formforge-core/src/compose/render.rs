//! HTML rendering of a composed form.
//!
//! Output is a plain `<form>` element with one block per input, in input
//! order. Bound forms re-display the submitted values and any messages.

use std::fmt::Write;

use formforge_types::error::{NON_FIELD_ERRORS, ValidationErrors};
use formforge_types::field::{Choice, FieldType, Widget};
use formforge_types::submission::{FieldValue, SubmittedData};
use handlebars::html_escape as escape;

use super::form::{FormDescriptor, FormInput};

const EMPTY_LABEL: &str = "---------";

pub fn render_form(
    descriptor: &FormDescriptor,
    data: Option<&SubmittedData>,
    errors: Option<&ValidationErrors>,
) -> String {
    let mut html = String::new();
    let _ = writeln!(
        html,
        r#"<form method="post" data-form-id="{}">"#,
        descriptor.form_id
    );

    if let Some(errors) = errors {
        write_error_list(&mut html, errors.get(NON_FIELD_ERRORS));
    }

    for input in &descriptor.inputs {
        let messages = errors.map(|e| e.get(&input.name)).unwrap_or(&[]);
        render_input(&mut html, input, data, messages);
    }

    html.push_str("  <button type=\"submit\">Submit</button>\n</form>\n");
    html
}

fn render_input(
    html: &mut String,
    input: &FormInput,
    data: Option<&SubmittedData>,
    messages: &[String],
) {
    let values = current_values(input, data);

    if input.widget == Widget::HiddenInput {
        let _ = writeln!(
            html,
            r#"  <input type="hidden" name="{name}" id="id_{name}" value="{value}">"#,
            name = escape(&input.name),
            value = escape(values.first().map(String::as_str).unwrap_or("")),
        );
        return;
    }

    let mut class = format!("field field-{}", input.field_type);
    if input.required {
        class.push_str(" required");
    }
    if !messages.is_empty() {
        class.push_str(" has-errors");
    }
    let _ = writeln!(html, r#"  <div class="{class}">"#);
    let _ = writeln!(
        html,
        r#"    <label for="id_{}">{}</label>"#,
        escape(&input.name),
        escape(&input.label)
    );
    html.push_str("    ");
    html.push_str(&render_widget(input, &values));
    html.push('\n');
    if !input.help_text.is_empty() {
        let _ = writeln!(html, r#"    <p class="help">{}</p>"#, escape(&input.help_text));
    }
    write_error_list(html, messages);
    html.push_str("  </div>\n");
}

fn write_error_list(html: &mut String, messages: &[String]) {
    if messages.is_empty() {
        return;
    }
    html.push_str("    <ul class=\"errorlist\">");
    for message in messages {
        let _ = write!(html, "<li>{}</li>", escape(message));
    }
    html.push_str("</ul>\n");
}

/// The values to pre-fill: submitted data when bound, else the initial value.
fn current_values(input: &FormInput, data: Option<&SubmittedData>) -> Vec<String> {
    match data {
        Some(data) => match data.get(&input.name) {
            Some(raw) if input.is_multiple() => raw.as_list(),
            Some(raw) => raw.as_text().into_iter().collect(),
            None => Vec::new(),
        },
        None => match input.initial() {
            FieldValue::Null => Vec::new(),
            FieldValue::List(items) => items,
            FieldValue::Bool(b) => vec![b.to_string()],
            FieldValue::Date(d) => vec![d.format("%Y-%m-%d").to_string()],
            FieldValue::DateTime(dt) => vec![dt.format("%Y-%m-%dT%H:%M").to_string()],
            other => vec![other.to_string()],
        },
    }
}

fn attrs(input: &FormInput) -> String {
    let name = escape(&input.name);
    let mut attrs = format!(r#"name="{name}" id="id_{name}""#);
    if input.required && input.field_type != FieldType::Boolean {
        attrs.push_str(" required");
    }
    attrs
}

fn render_widget(input: &FormInput, values: &[String]) -> String {
    let value = values.first().map(String::as_str).unwrap_or("");
    match input.widget {
        Widget::TextInput => text_input("text", input, value),
        Widget::PasswordInput => text_input("password", input, ""),
        Widget::HiddenInput => text_input("hidden", input, value),
        Widget::EmailInput => text_input("email", input, value),
        Widget::UrlInput => text_input("url", input, value),
        Widget::DateInput => text_input("date", input, value),
        Widget::DateTimeInput => text_input("datetime-local", input, value),
        Widget::TimeInput => text_input("time", input, value),
        Widget::NumberInput => text_input("number", input, value),
        Widget::Textarea => format!(
            r#"<textarea {} rows="10" cols="40">{}</textarea>"#,
            attrs(input),
            escape(value)
        ),
        Widget::SplitDateTime => {
            let (date, time) = value.split_once([' ', 'T']).unwrap_or((value, ""));
            let name = escape(&input.name);
            format!(
                r#"<input type="date" name="{name}_0" id="id_{name}_0" value="{}"><input type="time" name="{name}_1" id="id_{name}_1" value="{}">"#,
                escape(date),
                escape(time)
            )
        }
        Widget::CheckboxInput => {
            let checked = is_truthy(value);
            format!(
                r#"<input type="checkbox" {}{}>"#,
                attrs(input),
                if checked { " checked" } else { "" }
            )
        }
        Widget::NullBooleanSelect => select(
            input,
            &null_boolean_choices(),
            &[null_boolean_key(value)],
            false,
        ),
        Widget::Select => {
            let mut choices = input.choices().to_vec();
            if !input.required || values.is_empty() {
                choices.insert(0, Choice::new("", EMPTY_LABEL));
            }
            select(input, &choices, values, false)
        }
        Widget::SelectMultiple => select(input, input.choices(), values, true),
        Widget::RadioSelect => {
            if input.field_type == FieldType::NullBoolean {
                choice_list(input, "radio", &null_boolean_choices(), &[null_boolean_key(value)])
            } else {
                choice_list(input, "radio", input.choices(), values)
            }
        }
        Widget::CheckboxSelectMultiple => choice_list(input, "checkbox", input.choices(), values),
    }
}

fn text_input(kind: &str, input: &FormInput, value: &str) -> String {
    let mut extra = String::new();
    if let Some(max) = max_length(input) {
        let _ = write!(extra, r#" maxlength="{max}""#);
    }
    if kind == "number" && matches!(input.field_type, FieldType::Decimal | FieldType::Float) {
        extra.push_str(r#" step="any""#);
    }
    format!(
        r#"<input type="{kind}" {}{extra} value="{}">"#,
        attrs(input),
        escape(value)
    )
}

fn max_length(input: &FormInput) -> Option<u32> {
    use formforge_types::field::FieldKind;
    match &input.kind {
        FieldKind::Char { max_length, .. }
        | FieldKind::Text { max_length, .. }
        | FieldKind::Email { max_length, .. }
        | FieldKind::Url { max_length, .. } => *max_length,
        _ => None,
    }
}

fn select(input: &FormInput, choices: &[Choice], selected: &[String], multiple: bool) -> String {
    let mut html = format!(
        "<select {}{}>",
        attrs(input),
        if multiple { " multiple" } else { "" }
    );
    for choice in choices {
        let is_selected = selected.iter().any(|s| s == &choice.value);
        let _ = write!(
            html,
            r#"<option value="{}"{}>{}</option>"#,
            escape(&choice.value),
            if is_selected { " selected" } else { "" },
            escape(&choice.label)
        );
    }
    html.push_str("</select>");
    html
}

fn choice_list(input: &FormInput, kind: &str, choices: &[Choice], selected: &[String]) -> String {
    let name = escape(&input.name);
    let mut html = format!(r#"<ul id="id_{name}">"#);
    for (i, choice) in choices.iter().enumerate() {
        let checked = selected.iter().any(|s| s == &choice.value);
        let _ = write!(
            html,
            r#"<li><label for="id_{name}_{i}"><input type="{kind}" name="{name}" value="{}" id="id_{name}_{i}"{}> {}</label></li>"#,
            escape(&choice.value),
            if checked { " checked" } else { "" },
            escape(&choice.label)
        );
    }
    html.push_str("</ul>");
    html
}

fn null_boolean_choices() -> Vec<Choice> {
    vec![
        Choice::new("unknown", "Unknown"),
        Choice::new("true", "Yes"),
        Choice::new("false", "No"),
    ]
}

fn null_boolean_key(value: &str) -> String {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => "true",
        "false" | "0" | "no" | "off" => "false",
        _ => "unknown",
    }
    .to_string()
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "false" | "0" | "off" | "no"
    )
}
