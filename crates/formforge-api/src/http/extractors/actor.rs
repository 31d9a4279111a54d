//! Acting-user extractor for admin routes.
//!
//! The acting user is named by the `X-Formforge-User` header and resolved
//! against the `users` table in config.toml. Permission checks downstream
//! run against the resolved [`Actor`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use formforge_types::config::GlobalConfig;
use formforge_types::permission::Actor;

use crate::http::error::AppError;
use crate::state::AppState;

pub const USER_HEADER: &str = "x-formforge-user";

/// The configured user performing an admin request.
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_actor(parts, &state.config).map(CurrentActor)
    }
}

fn resolve_actor(parts: &Parts, config: &GlobalConfig) -> Result<Actor, AppError> {
    let header = parts.headers.get(USER_HEADER).ok_or_else(|| {
        AppError::Unauthorized(
            "Missing user. Provide the acting user via the 'X-Formforge-User' header.".to_string(),
        )
    })?;
    let username = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid X-Formforge-User header encoding".to_string()))?
        .trim();

    config
        .user(username)
        .cloned()
        .ok_or_else(|| AppError::Unauthorized(format!("Unknown user '{username}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    fn config() -> GlobalConfig {
        GlobalConfig {
            users: vec![
                Actor::superuser("root"),
                Actor::with_permissions("editor", ["change_form"]),
            ],
            ..Default::default()
        }
    }

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/forms");
        if let Some(value) = header {
            builder = builder.header(USER_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_known_user_resolves() {
        let actor = resolve_actor(&parts(Some(" editor ")), &config()).unwrap();
        assert_eq!(actor.username, "editor");
        assert!(!actor.is_superuser);
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let err = resolve_actor(&parts(None), &config()).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unknown_user_is_unauthorized() {
        let err = resolve_actor(&parts(Some("mallory")), &config()).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
