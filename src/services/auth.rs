// src/services/auth.rs

//! Sign-in, registration and the persisted session.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::gateway::MonitorApi;
use crate::models::{AuthSession, User};
use crate::storage::SessionStore;

pub const MIN_PASSWORD_LEN: usize = 6;

const REQUIRED_FIELDS: &str = "Please fill in all required fields";

/// Registration form as entered.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Check the form before anything is sent.
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.name.trim().is_empty() || self.password.is_empty()
        {
            return Err(AppError::validation(REQUIRED_FIELDS));
        }
        if self.password != self.confirm_password {
            return Err(AppError::validation("Passwords do not match"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
        Ok(())
    }
}

pub struct AuthService {
    api: Arc<dyn MonitorApi>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(api: Arc<dyn MonitorApi>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { api, sessions }
    }

    /// Sign in and persist the session.
    ///
    /// `Ok(None)` means the credentials were rejected.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation(REQUIRED_FIELDS));
        }

        match self.api.authenticate(email, password).await {
            Some(session) => self.persist(session).await.map(Some),
            None => {
                log::info!("Sign-in rejected for {}", email);
                Ok(None)
            }
        }
    }

    /// Create an account and persist the new session.
    pub async fn register(&self, form: &RegisterForm) -> Result<Option<User>> {
        form.validate()?;

        let email = form.email.trim();
        match self
            .api
            .register_user(email, &form.password, form.name.trim())
            .await
        {
            Some(session) => self.persist(session).await.map(Some),
            None => {
                log::info!("Registration rejected for {}", email);
                Ok(None)
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        self.sessions.clear_session().await
    }

    /// The signed-in user, restored from storage.
    pub async fn current_user(&self) -> Option<User> {
        self.sessions.load_session().await.map(|s| s.user)
    }

    async fn persist(&self, session: AuthSession) -> Result<User> {
        self.sessions.save_session(&session).await?;
        log::info!("Signed in as {} ({})", session.user.email, session.user.role);
        Ok(session.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FallbackData;
    use crate::gateway::fallback::OFFLINE_TOKEN;
    use crate::models::Role;
    use crate::services::testing::ScriptedApi;
    use crate::storage::MemoryStorage;

    fn form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            email: "new@example.com".into(),
            name: "New User".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    fn validation_message(result: Result<()>) -> String {
        match result {
            Err(AppError::Validation(message)) => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_register_form_checks() {
        assert!(form("secret", "secret").validate().is_ok());

        assert_eq!(
            validation_message(
                RegisterForm {
                    name: " ".into(),
                    ..form("secret", "secret")
                }
                .validate()
            ),
            REQUIRED_FIELDS
        );
        assert_eq!(
            validation_message(form("secret", "secreT").validate()),
            "Passwords do not match"
        );
        assert_eq!(
            validation_message(form("12345", "12345").validate()),
            "Password must be at least 6 characters long"
        );
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let api = Arc::new(ScriptedApi::online());
        let sessions = Arc::new(MemoryStorage::new());
        let auth = AuthService::new(api.clone(), sessions.clone());

        let user = auth
            .login(" researcher@example.com ", "password")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, Role::Researcher);
        assert_eq!(api.calls(), vec!["login researcher@example.com"]);
        assert_eq!(auth.current_user().await, Some(user));

        auth.logout().await.unwrap();
        assert!(auth.current_user().await.is_none());
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_call() {
        let api = Arc::new(ScriptedApi::online());
        let auth = AuthService::new(api.clone(), Arc::new(MemoryStorage::new()));

        assert!(matches!(
            auth.login("", "password").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            auth.register(&form("secret", "other")).await,
            Err(AppError::Validation(_))
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_no_session() {
        let sessions = Arc::new(MemoryStorage::new());
        let auth = AuthService::new(Arc::new(ScriptedApi::online()), sessions.clone());

        let user = auth.login("nobody@example.com", "password").await.unwrap();
        assert!(user.is_none());
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_offline_register() {
        let sessions = Arc::new(MemoryStorage::new());
        let auth = AuthService::new(
            Arc::new(ScriptedApi::offline(FallbackData::demo())),
            sessions.clone(),
        );

        let user = auth
            .register(&form("secret", "secret"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.role, Role::Citizen);
        assert!(user.id.starts_with('U'));

        let session = sessions.load_session().await.unwrap();
        assert_eq!(session.token, OFFLINE_TOKEN);
    }

    #[tokio::test]
    async fn test_offline_register_refused_without_demo_data() {
        let auth = AuthService::new(
            Arc::new(ScriptedApi::offline(FallbackData::empty())),
            Arc::new(MemoryStorage::new()),
        );
        assert!(auth.register(&form("secret", "secret")).await.unwrap().is_none());
    }
}
