//! Composer behaviour: ordering, determinism, binding, and the handler chain.

mod common;

use std::sync::Arc;

use common::{MemoryCatalog, MemoryFormRepository, RecordingMailer, MemoryInstanceStore, ScriptedFactory};
use formforge_core::compose::FormComposer;
use formforge_core::handler::StandardHandlerFactory;
use formforge_core::permission::PermissionGate;
use formforge_core::service::FormAdminService;
use formforge_types::error::{ConfigurationError, FormError};
use formforge_types::field::{FieldKind, FieldType, NewField};
use formforge_types::form::{CreateFormRequest, FormId};
use formforge_types::handler::{HandlerKind, NewHandler};
use formforge_types::permission::Actor;
use formforge_types::submission::{FieldValue, SubmittedData};

fn admin() -> Actor {
    Actor::superuser("admin")
}

fn service(repo: &MemoryFormRepository) -> FormAdminService<MemoryFormRepository, MemoryCatalog> {
    FormAdminService::new(repo.clone(), MemoryCatalog::default(), PermissionGate::new())
}

async fn create_form(svc: &FormAdminService<MemoryFormRepository, MemoryCatalog>) -> FormId {
    svc.create_form(
        &admin(),
        CreateFormRequest {
            title: "Contact".to_string(),
            target_model: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn field(name: &str, field_type: FieldType, order: Option<i32>) -> NewField {
    let mut f = NewField::new(name, FieldKind::empty(field_type));
    f.order = order;
    f
}

fn scripted(name: &str, order: i32) -> NewHandler {
    NewHandler {
        name: name.to_string(),
        order: Some(order),
        kind: HandlerKind::EmailNotification {
            recipients: vec!["staff@example.com".to_string()],
            subject_template: "s".to_string(),
            body_template: "b".to_string(),
            from_address: None,
        },
    }
}

#[tokio::test]
async fn compose_is_deterministic() {
    let repo = MemoryFormRepository::new();
    let svc = service(&repo);
    let form_id = create_form(&svc).await;
    svc.add_field(&admin(), &form_id, field("title", FieldType::Char, None))
        .await
        .unwrap();
    svc.add_field(&admin(), &form_id, field("email", FieldType::Email, None))
        .await
        .unwrap();

    let composer = FormComposer::new(repo.clone(), Arc::new(ScriptedFactory::default()));
    let a = composer.compose(&form_id, None).await.unwrap();
    let b = composer.compose(&form_id, None).await.unwrap();

    assert_eq!(a.descriptor(), b.descriptor());
    let names: Vec<&str> = a.inputs().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["title", "email"]);
}

#[tokio::test]
async fn fields_follow_order_with_ties_in_insertion_order() {
    let repo = MemoryFormRepository::new();
    let svc = service(&repo);
    let form_id = create_form(&svc).await;
    for (name, order) in [("c", 5), ("a", 1), ("b", 5), ("z", 0)] {
        svc.add_field(&admin(), &form_id, field(name, FieldType::Char, Some(order)))
            .await
            .unwrap();
    }

    let composer = FormComposer::new(repo.clone(), Arc::new(ScriptedFactory::default()));
    let form = composer.compose(&form_id, None).await.unwrap();
    let names: Vec<&str> = form.inputs().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["z", "a", "c", "b"]);
}

#[tokio::test]
async fn compose_unknown_form_is_not_found() {
    let composer = FormComposer::new(
        MemoryFormRepository::new(),
        Arc::new(ScriptedFactory::default()),
    );
    let err = composer.compose(&FormId::new(), None).await.unwrap_err();
    assert!(matches!(err, FormError::NotFound { entity: "form", .. }));
}

#[tokio::test]
async fn save_on_unbound_form_is_configuration_error() {
    let repo = MemoryFormRepository::new();
    let svc = service(&repo);
    let form_id = create_form(&svc).await;

    let composer = FormComposer::new(repo.clone(), Arc::new(ScriptedFactory::default()));
    let form = composer.compose(&form_id, None).await.unwrap();

    assert!(!form.is_bound());
    assert!(!form.is_valid());
    assert!(matches!(
        form.save().await,
        Err(FormError::Configuration(ConfigurationError::SaveOnUnboundForm))
    ));
}

#[tokio::test]
async fn failing_handler_stops_the_chain() {
    let repo = MemoryFormRepository::new();
    let svc = service(&repo);
    let form_id = create_form(&svc).await;
    svc.add_handler(&admin(), &form_id, scripted("second", 2)).await.unwrap();
    svc.add_handler(&admin(), &form_id, scripted("fail_first", 1)).await.unwrap();

    let factory = Arc::new(ScriptedFactory::default());
    let composer = FormComposer::new(repo.clone(), factory.clone());
    let form = composer
        .compose(&form_id, Some(SubmittedData::new()))
        .await
        .unwrap();

    let err = form.save().await.unwrap_err();
    match err {
        FormError::Configuration(ConfigurationError::HandlerFailed { handler, order, .. }) => {
            assert_eq!(handler, "fail_first");
            assert_eq!(order, 1);
        }
        other => panic!("expected HandlerFailed, got {other:?}"),
    }
    assert_eq!(factory.invoked(), vec!["fail_first"]);
}

#[tokio::test]
async fn handlers_run_in_ascending_order() {
    let repo = MemoryFormRepository::new();
    let svc = service(&repo);
    let form_id = create_form(&svc).await;
    svc.add_handler(&admin(), &form_id, scripted("b", 2)).await.unwrap();
    svc.add_handler(&admin(), &form_id, scripted("a", 1)).await.unwrap();
    svc.add_handler(&admin(), &form_id, scripted("c", 3)).await.unwrap();

    let factory = Arc::new(ScriptedFactory::default());
    let composer = FormComposer::new(repo.clone(), factory.clone());
    let form = composer
        .compose(&form_id, Some(SubmittedData::new()))
        .await
        .unwrap();
    let receipt = form.save().await.unwrap();

    assert_eq!(receipt.handlers_run, vec!["a", "b", "c"]);
    assert_eq!(factory.invoked(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn end_to_end_required_title() {
    let repo = MemoryFormRepository::new();
    let svc = service(&repo);
    let form_id = create_form(&svc).await;
    svc.add_field(&admin(), &form_id, field("title", FieldType::Char, None))
        .await
        .unwrap();
    svc.add_handler(&admin(), &form_id, scripted("record", 0)).await.unwrap();

    let factory = Arc::new(ScriptedFactory::default());
    let composer = FormComposer::new(repo.clone(), factory.clone());

    // Valid submission: handler runs exactly once.
    let form = composer
        .compose(&form_id, Some(SubmittedData::new().with("title", "hello")))
        .await
        .unwrap();
    assert!(form.is_valid());
    assert_eq!(
        form.cleaned_data().unwrap().get("title"),
        Some(&FieldValue::Text("hello".to_string()))
    );
    form.save().await.unwrap();
    assert_eq!(factory.invoked(), vec!["record"]);

    // Empty submission: error on title, no handler.
    let form = composer
        .compose(&form_id, Some(SubmittedData::new()))
        .await
        .unwrap();
    assert!(!form.is_valid());
    assert_eq!(form.errors().unwrap().get("title"), ["This field is required."]);
    assert!(matches!(form.save().await, Err(FormError::Validation(_))));
    assert_eq!(factory.invoked().len(), 1);
}

#[tokio::test]
async fn bind_reuses_composition() {
    let repo = MemoryFormRepository::new();
    let svc = service(&repo);
    let form_id = create_form(&svc).await;
    svc.add_field(&admin(), &form_id, field("title", FieldType::Char, None))
        .await
        .unwrap();

    let composer = FormComposer::new(repo.clone(), Arc::new(ScriptedFactory::default()));
    let unbound = composer.compose(&form_id, None).await.unwrap();
    let bound = unbound.bind(SubmittedData::new().with("title", "x"));

    assert!(!unbound.is_bound());
    assert!(bound.is_valid());
    assert_eq!(unbound.descriptor(), bound.descriptor());

    let html = bound.render_html();
    assert!(html.contains(r#"value="x""#));
}

#[tokio::test]
async fn standard_factory_sends_confirmation() {
    let repo = MemoryFormRepository::new();
    let svc = service(&repo);
    let form_id = create_form(&svc).await;
    let email = svc
        .add_field(&admin(), &form_id, field("email", FieldType::Email, None))
        .await
        .unwrap();
    svc.add_handler(
        &admin(),
        &form_id,
        NewHandler {
            name: "confirm".to_string(),
            order: None,
            kind: HandlerKind::EmailConfirmation {
                email_field: email.id,
                subject_template: "Thanks for contacting us".to_string(),
                body_template: "We received {{ email }}.".to_string(),
                from_address: None,
            },
        },
    )
    .await
    .unwrap();

    let mailer = Arc::new(RecordingMailer::default());
    let factory = StandardHandlerFactory::new(
        mailer.clone(),
        Arc::new(MemoryInstanceStore::default()),
        "forms@localhost",
    );
    let composer = FormComposer::new(repo.clone(), Arc::new(factory));
    let form = composer
        .compose(
            &form_id,
            Some(SubmittedData::new().with("email", "ada@example.com")),
        )
        .await
        .unwrap();
    form.save().await.unwrap();

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["ada@example.com"]);
    assert_eq!(sent[0].from, "forms@localhost");
    assert_eq!(sent[0].body, "We received ada@example.com.");
}
