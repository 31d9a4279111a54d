//! Deep copy of a form schema with fresh identities.

use std::collections::HashMap;

use chrono::Utc;
use formforge_types::error::{ConfigurationError, FormError};
use formforge_types::field::{FieldDef, FieldId};
use formforge_types::form::{Form, FormId, FormSchema};
use formforge_types::handler::{HandlerDef, HandlerId, HandlerKind};

/// Build an in-memory copy of `source` titled `title`.
///
/// Every form, field, and handler gets a fresh id. Field configuration and
/// order are copied as-is; relation fields keep their `related_model` and
/// choices. Confirmation handlers are re-pointed at the cloned field with
/// the same name as the one they referenced in the source.
pub fn clone_schema(source: &FormSchema, title: &str) -> Result<FormSchema, FormError> {
    let now = Utc::now();
    let form_id = FormId::new();

    let form = Form {
        id: form_id,
        title: title.to_string(),
        target_model: source.form.target_model.clone(),
        created_at: now,
        updated_at: now,
    };

    let fields: Vec<FieldDef> = source
        .fields
        .iter()
        .map(|f| FieldDef {
            id: FieldId::new(),
            form_id,
            created_at: now,
            ..f.clone()
        })
        .collect();

    // Field names are unique per form, so name is a stable join key.
    let by_name: HashMap<&str, FieldId> =
        fields.iter().map(|f| (f.name.as_str(), f.id)).collect();

    let handlers = source
        .handlers
        .iter()
        .map(|h| -> Result<HandlerDef, FormError> {
            let kind = match &h.kind {
                HandlerKind::EmailConfirmation {
                    email_field,
                    subject_template,
                    body_template,
                    from_address,
                } => {
                    let cloned_field = source
                        .field(email_field)
                        .and_then(|f| by_name.get(f.name.as_str()).copied())
                        .ok_or_else(|| ConfigurationError::DanglingFieldReference {
                            handler: h.name.clone(),
                            field: email_field.to_string(),
                        })?;
                    HandlerKind::EmailConfirmation {
                        email_field: cloned_field,
                        subject_template: subject_template.clone(),
                        body_template: body_template.clone(),
                        from_address: from_address.clone(),
                    }
                }
                other => other.clone(),
            };
            Ok(HandlerDef {
                id: HandlerId::new(),
                form_id,
                name: h.name.clone(),
                order: h.order,
                kind,
                created_at: now,
            })
        })
        .collect::<Result<Vec<_>, FormError>>()?;

    Ok(FormSchema {
        form,
        fields,
        handlers,
    })
}
