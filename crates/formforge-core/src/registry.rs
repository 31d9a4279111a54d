//! Static registry of field and handler subtypes.
//!
//! Drives the admin "choose a type" screens, widget allow-lists, the
//! attribute-type → field-type mapping for model-bound forms, and the
//! resolution of stored discriminators back to registered subtypes.

use formforge_types::error::{ConfigurationError, FormError};
use formforge_types::field::{FieldKind, FieldType, Widget};
use formforge_types::handler::HandlerType;
use formforge_types::model::{AttributeSpec, AttributeType};
use serde::Serialize;

/// Registration entry for one field subtype.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldTypeDescriptor {
    pub field_type: FieldType,
    pub label: &'static str,
    /// Permitted widgets; never empty, the first is the default.
    pub widgets: &'static [Widget],
}

/// Registration entry for one handler subtype.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HandlerTypeDescriptor {
    pub handler_type: HandlerType,
    pub label: &'static str,
    pub description: &'static str,
}

const CHAR: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Char,
    label: "Text",
    widgets: &[
        Widget::TextInput,
        Widget::Textarea,
        Widget::PasswordInput,
        Widget::HiddenInput,
    ],
};

const TEXT: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Text,
    label: "Long text",
    widgets: &[Widget::Textarea, Widget::TextInput],
};

const BOOLEAN: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Boolean,
    label: "Checkbox",
    widgets: &[Widget::CheckboxInput],
};

const NULL_BOOLEAN: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::NullBoolean,
    label: "Yes / no / unknown",
    widgets: &[Widget::NullBooleanSelect, Widget::RadioSelect],
};

const DATE: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Date,
    label: "Date",
    widgets: &[Widget::DateInput, Widget::TextInput],
};

const DATE_TIME: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::DateTime,
    label: "Date and time",
    widgets: &[Widget::DateTimeInput, Widget::SplitDateTime],
};

const TIME: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Time,
    label: "Time",
    widgets: &[Widget::TimeInput],
};

const DECIMAL: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Decimal,
    label: "Decimal number",
    widgets: &[Widget::NumberInput, Widget::TextInput],
};

const EMAIL: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Email,
    label: "Email address",
    widgets: &[Widget::EmailInput],
};

const FLOAT: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Float,
    label: "Floating point number",
    widgets: &[Widget::NumberInput, Widget::TextInput],
};

const INTEGER: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Integer,
    label: "Whole number",
    widgets: &[Widget::NumberInput, Widget::TextInput, Widget::HiddenInput],
};

const URL: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Url,
    label: "URL",
    widgets: &[Widget::UrlInput],
};

const CHOICE: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::Choice,
    label: "Choice",
    widgets: &[Widget::Select, Widget::RadioSelect],
};

const MULTIPLE_CHOICE: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::MultipleChoice,
    label: "Multiple choice",
    widgets: &[Widget::SelectMultiple, Widget::CheckboxSelectMultiple],
};

const FOREIGN_KEY: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::ForeignKey,
    label: "Related object",
    widgets: &[Widget::Select, Widget::RadioSelect],
};

const MANY_TO_MANY: FieldTypeDescriptor = FieldTypeDescriptor {
    field_type: FieldType::ManyToMany,
    label: "Related objects",
    widgets: &[Widget::SelectMultiple, Widget::CheckboxSelectMultiple],
};

pub static FIELD_TYPES: &[FieldTypeDescriptor] = &[
    CHAR,
    TEXT,
    BOOLEAN,
    NULL_BOOLEAN,
    DATE,
    DATE_TIME,
    TIME,
    DECIMAL,
    EMAIL,
    FLOAT,
    INTEGER,
    URL,
    CHOICE,
    MULTIPLE_CHOICE,
    FOREIGN_KEY,
    MANY_TO_MANY,
];

const EMAIL_NOTIFICATION: HandlerTypeDescriptor = HandlerTypeDescriptor {
    handler_type: HandlerType::EmailNotification,
    label: "Email notification",
    description: "Send the submitted data to a fixed list of recipients",
};

const SAVE_INSTANCE: HandlerTypeDescriptor = HandlerTypeDescriptor {
    handler_type: HandlerType::SaveInstance,
    label: "Save instance",
    description: "Store the submitted data as an instance of the target model",
};

const EMAIL_CONFIRMATION: HandlerTypeDescriptor = HandlerTypeDescriptor {
    handler_type: HandlerType::EmailConfirmation,
    label: "Email confirmation",
    description: "Email the submitter at the address entered in an email field",
};

pub static HANDLER_TYPES: &[HandlerTypeDescriptor] = &[
    EMAIL_NOTIFICATION,
    SAVE_INSTANCE,
    EMAIL_CONFIRMATION,
];

/// Look up the registration for a field type.
pub fn field_descriptor(field_type: FieldType) -> &'static FieldTypeDescriptor {
    match field_type {
        FieldType::Char => &CHAR,
        FieldType::Text => &TEXT,
        FieldType::Boolean => &BOOLEAN,
        FieldType::NullBoolean => &NULL_BOOLEAN,
        FieldType::Date => &DATE,
        FieldType::DateTime => &DATE_TIME,
        FieldType::Time => &TIME,
        FieldType::Decimal => &DECIMAL,
        FieldType::Email => &EMAIL,
        FieldType::Float => &FLOAT,
        FieldType::Integer => &INTEGER,
        FieldType::Url => &URL,
        FieldType::Choice => &CHOICE,
        FieldType::MultipleChoice => &MULTIPLE_CHOICE,
        FieldType::ForeignKey => &FOREIGN_KEY,
        FieldType::ManyToMany => &MANY_TO_MANY,
    }
}

pub fn handler_descriptor(handler_type: HandlerType) -> &'static HandlerTypeDescriptor {
    match handler_type {
        HandlerType::EmailNotification => &EMAIL_NOTIFICATION,
        HandlerType::SaveInstance => &SAVE_INSTANCE,
        HandlerType::EmailConfirmation => &EMAIL_CONFIRMATION,
    }
}

pub fn permitted_widgets(field_type: FieldType) -> &'static [Widget] {
    field_descriptor(field_type).widgets
}

pub fn default_widget(field_type: FieldType) -> Widget {
    permitted_widgets(field_type)[0]
}

/// True when the admin must be offered a widget choice; otherwise the
/// widget is fixed and hidden.
pub fn widget_choice_required(field_type: FieldType) -> bool {
    permitted_widgets(field_type).len() > 1
}

/// Check a widget against the subtype's allow-list.
pub fn validate_widget(field_type: FieldType, widget: Widget) -> Result<(), FormError> {
    if permitted_widgets(field_type).contains(&widget) {
        Ok(())
    } else {
        Err(FormError::invalid(
            "widget",
            format!("'{widget}' is not a permitted widget for {field_type} fields"),
        ))
    }
}

/// Parse a widget name, reporting unknown names as a validation error.
pub fn parse_widget(name: &str) -> Result<Widget, FormError> {
    name.parse::<Widget>()
        .map_err(|msg| FormError::invalid("widget", msg))
}

/// Resolve a stored field discriminator.
pub fn resolve_field_discriminator(tag: &str) -> Result<FieldType, ConfigurationError> {
    tag.parse()
        .map_err(|_| ConfigurationError::UnregisteredDiscriminator {
            kind: "field",
            tag: tag.to_string(),
        })
}

/// Resolve a stored handler discriminator.
pub fn resolve_handler_discriminator(tag: &str) -> Result<HandlerType, ConfigurationError> {
    tag.parse()
        .map_err(|_| ConfigurationError::UnregisteredDiscriminator {
            kind: "handler",
            tag: tag.to_string(),
        })
}

/// Map an attribute's semantic type to its field subtype.
///
/// Relations map to `ForeignKey`; see [`field_type_for`] for to-many
/// relations and choice-constrained attributes.
pub fn resolve_attribute_type(attr_type: AttributeType) -> Result<FieldType, FormError> {
    match attr_type {
        AttributeType::Text => Ok(FieldType::Char),
        AttributeType::LongText => Ok(FieldType::Text),
        AttributeType::Boolean => Ok(FieldType::Boolean),
        AttributeType::Date => Ok(FieldType::Date),
        AttributeType::DateTime => Ok(FieldType::DateTime),
        AttributeType::Time => Ok(FieldType::Time),
        AttributeType::Decimal => Ok(FieldType::Decimal),
        AttributeType::Float => Ok(FieldType::Float),
        AttributeType::Integer => Ok(FieldType::Integer),
        AttributeType::Email => Ok(FieldType::Email),
        AttributeType::Url => Ok(FieldType::Url),
        AttributeType::Relation => Ok(FieldType::ForeignKey),
        AttributeType::Binary | AttributeType::Json => Err(FormError::NotSupported(format!(
            "no field type for attribute type '{attr_type}'"
        ))),
    }
}

/// Field subtype for a concrete attribute.
pub fn field_type_for(attr: &AttributeSpec) -> Result<FieldType, FormError> {
    let base = resolve_attribute_type(attr.attr_type)?;
    Ok(match base {
        FieldType::ForeignKey if attr.many => FieldType::ManyToMany,
        FieldType::Char if !attr.choices.is_empty() => FieldType::Choice,
        other => other,
    })
}

/// Build the field configuration for a model attribute.
pub fn kind_from_attribute(attr: &AttributeSpec) -> Result<FieldKind, FormError> {
    let field_type = field_type_for(attr)?;
    let kind = match FieldKind::empty(field_type) {
        FieldKind::Char { .. } => FieldKind::Char {
            max_length: attr.max_length,
            min_length: None,
            initial: None,
        },
        FieldKind::Text { .. } => FieldKind::Text {
            max_length: attr.max_length,
            min_length: None,
            initial: None,
        },
        FieldKind::Email { .. } => FieldKind::Email {
            max_length: attr.max_length,
            initial: None,
        },
        FieldKind::Url { .. } => FieldKind::Url {
            max_length: attr.max_length,
            initial: None,
        },
        FieldKind::Decimal { .. } => FieldKind::Decimal {
            max_digits: attr.max_digits,
            decimal_places: attr.decimal_places,
            min_value: None,
            max_value: None,
            initial: None,
        },
        FieldKind::Choice { .. } => FieldKind::Choice {
            choices: attr.choices.clone(),
            initial: None,
        },
        FieldKind::ForeignKey { .. } => FieldKind::ForeignKey {
            related_model: related_model(attr)?,
            choices: attr.choices.clone(),
            initial: None,
        },
        FieldKind::ManyToMany { .. } => FieldKind::ManyToMany {
            related_model: related_model(attr)?,
            choices: attr.choices.clone(),
            initial: Vec::new(),
        },
        other => other,
    };
    Ok(kind)
}

fn related_model(attr: &AttributeSpec) -> Result<String, FormError> {
    attr.related_model.clone().ok_or_else(|| {
        FormError::NotSupported(format!(
            "relation attribute '{}' has no related model",
            attr.name
        ))
    })
}
