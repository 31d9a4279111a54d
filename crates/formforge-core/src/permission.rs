//! Permission gate for administrative mutations.
//!
//! Every admin write passes through [`PermissionGate::authorize`] before it
//! touches storage. The gate runs the attribute-level model permission check
//! first, then each configured external check in order. The first veto wins
//! and later checks are not evaluated.

use std::collections::HashSet;
use std::sync::Arc;

use formforge_types::config::PermissionConfig;
use formforge_types::error::FormError;
use formforge_types::form::FormId;
use formforge_types::permission::{Actor, AdminAction};
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A veto from one permission check.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{check}: {reason}")]
pub struct PermissionDenied {
    /// Name of the check that vetoed.
    pub check: String,
    pub reason: String,
}

impl From<PermissionDenied> for FormError {
    fn from(denied: PermissionDenied) -> Self {
        FormError::PermissionDenied(denied.to_string())
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// One authorization rule. Sync and side-effect free.
pub trait PermissionCheck: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, actor: &Actor, action: &AdminAction) -> Result<(), PermissionDenied>;
}

/// Standard attribute-level check: superusers pass, everyone else needs the
/// action's codename.
#[derive(Debug, Default)]
pub struct ModelPermissionCheck;

impl PermissionCheck for ModelPermissionCheck {
    fn name(&self) -> &str {
        "model_permission"
    }

    fn check(&self, actor: &Actor, action: &AdminAction) -> Result<(), PermissionDenied> {
        let codename = action.codename();
        if actor.has_permission(&codename) {
            Ok(())
        } else {
            Err(PermissionDenied {
                check: self.name().to_string(),
                reason: format!("user '{}' lacks '{codename}'", actor.username),
            })
        }
    }
}

/// Vetoes every action by a read-only actor.
#[derive(Debug, Default)]
pub struct ReadOnlyActorCheck;

impl PermissionCheck for ReadOnlyActorCheck {
    fn name(&self) -> &str {
        "read_only_actor"
    }

    fn check(&self, actor: &Actor, _action: &AdminAction) -> Result<(), PermissionDenied> {
        if actor.read_only {
            Err(PermissionDenied {
                check: self.name().to_string(),
                reason: format!("user '{}' is read-only", actor.username),
            })
        } else {
            Ok(())
        }
    }
}

/// Vetoes any action on a frozen form.
///
/// Cloning reads the source form without modifying it, so it is allowed.
#[derive(Debug, Default)]
pub struct FrozenFormCheck {
    frozen: HashSet<FormId>,
}

impl FrozenFormCheck {
    pub fn new(frozen: impl IntoIterator<Item = FormId>) -> Self {
        Self {
            frozen: frozen.into_iter().collect(),
        }
    }
}

impl PermissionCheck for FrozenFormCheck {
    fn name(&self) -> &str {
        "frozen_form"
    }

    fn check(&self, _actor: &Actor, action: &AdminAction) -> Result<(), PermissionDenied> {
        if matches!(action, AdminAction::CloneForm { .. }) {
            return Ok(());
        }
        match action.form_id() {
            Some(form_id) if self.frozen.contains(form_id) => Err(PermissionDenied {
                check: self.name().to_string(),
                reason: format!("form {form_id} is frozen"),
            }),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// PermissionGate
// ---------------------------------------------------------------------------

/// Ordered chain of permission checks with short-circuit on first veto.
#[derive(Clone)]
pub struct PermissionGate {
    checks: Vec<Arc<dyn PermissionCheck>>,
}

impl PermissionGate {
    /// A gate with only the model permission check.
    pub fn new() -> Self {
        Self {
            checks: vec![Arc::new(ModelPermissionCheck)],
        }
    }

    /// Gate with the model check plus the built-in external checks driven by
    /// configuration.
    pub fn from_config(config: &PermissionConfig) -> Self {
        Self::new()
            .with_check(Arc::new(ReadOnlyActorCheck))
            .with_check(Arc::new(FrozenFormCheck::new(
                config.frozen_forms.iter().copied(),
            )))
    }

    /// Append an external check. Checks run in the order they were added.
    pub fn with_check(mut self, check: Arc<dyn PermissionCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Names of the checks, in evaluation order.
    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn authorize(&self, actor: &Actor, action: &AdminAction) -> Result<(), FormError> {
        for check in &self.checks {
            if let Err(denied) = check.check(actor, action) {
                debug!(
                    user = %actor.username,
                    action = %action,
                    check = check.name(),
                    "permission denied"
                );
                return Err(denied.into());
            }
        }
        Ok(())
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("checks", &self.check_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use formforge_types::field::FieldType;
    use formforge_types::permission::Verb;

    struct Veto;

    impl PermissionCheck for Veto {
        fn name(&self) -> &str {
            "veto"
        }

        fn check(&self, _: &Actor, _: &AdminAction) -> Result<(), PermissionDenied> {
            Err(PermissionDenied {
                check: "veto".to_string(),
                reason: "no".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl PermissionCheck for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn check(&self, _: &Actor, _: &AdminAction) -> Result<(), PermissionDenied> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn add_email(form_id: FormId) -> AdminAction {
        AdminAction::Field {
            verb: Verb::Add,
            form_id,
            field_type: FieldType::Email,
        }
    }

    #[test]
    fn test_superuser_passes_model_check() {
        let gate = PermissionGate::new();
        assert!(gate
            .authorize(&Actor::superuser("root"), &AdminAction::CreateForm)
            .is_ok());
    }

    #[test]
    fn test_codename_scoped_to_subtype() {
        let gate = PermissionGate::new();
        let form_id = FormId::new();
        let actor = Actor::with_permissions("ed", ["add_email_field"]);

        assert!(gate.authorize(&actor, &add_email(form_id)).is_ok());

        let add_char = AdminAction::Field {
            verb: Verb::Add,
            form_id,
            field_type: FieldType::Char,
        };
        let err = gate.authorize(&actor, &add_char).unwrap_err();
        match err {
            FormError::PermissionDenied(msg) => assert!(msg.contains("add_char_field")),
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }

    #[test]
    fn test_first_veto_short_circuits() {
        let counting = Arc::new(Counting::default());
        let gate = PermissionGate::new()
            .with_check(Arc::new(Veto))
            .with_check(counting.clone());

        let result = gate.authorize(&Actor::superuser("root"), &AdminAction::CreateForm);
        assert!(matches!(result, Err(FormError::PermissionDenied(_))));
        assert_eq!(counting.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_external_checks_run_after_model_check() {
        let counting = Arc::new(Counting::default());
        let gate = PermissionGate::new().with_check(counting.clone());

        // Model check vetoes first; the external check never runs.
        let nobody = Actor::with_permissions("nobody", Vec::<String>::new());
        assert!(gate.authorize(&nobody, &AdminAction::CreateForm).is_err());
        assert_eq!(counting.0.load(Ordering::SeqCst), 0);

        assert!(gate
            .authorize(&Actor::superuser("root"), &AdminAction::CreateForm)
            .is_ok());
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_read_only_actor_vetoed_even_as_superuser() {
        let gate = PermissionGate::from_config(&PermissionConfig::default());
        let mut actor = Actor::superuser("auditor");
        actor.read_only = true;
        assert!(gate.authorize(&actor, &AdminAction::CreateForm).is_err());
    }

    #[test]
    fn test_frozen_form_check() {
        let frozen = FormId::new();
        let gate = PermissionGate::from_config(&PermissionConfig {
            frozen_forms: vec![frozen],
        });
        let root = Actor::superuser("root");

        assert!(gate
            .authorize(&root, &AdminAction::UpdateForm { form_id: frozen })
            .is_err());
        assert!(gate.authorize(&root, &add_email(frozen)).is_err());
        assert!(gate
            .authorize(&root, &AdminAction::CloneForm { source: frozen })
            .is_ok());
        assert!(gate.authorize(&root, &add_email(FormId::new())).is_ok());
    }

    #[test]
    fn test_check_order() {
        let gate = PermissionGate::from_config(&PermissionConfig::default());
        assert_eq!(
            gate.check_names(),
            vec!["model_permission", "read_only_actor", "frozen_form"]
        );
    }
}
