use crate::error::AppError;

use super::{EventRegistry, User, UserId, UserSummary};

const MIN_PASSWORD_LEN: usize = 6;

impl EventRegistry {
    pub fn register(&mut self, username: &str, password: &str) -> Result<UserSummary, AppError> {
        let username = username.trim();

        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "username and password must not be empty".to_string(),
            ));
        }

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        // Usernames are compared exactly, case included
        if self.users.values().any(|user| user.username == username) {
            return Err(AppError::Validation("username already exists".to_string()));
        }

        let id = self.next_user_id;
        self.next_user_id += 1;

        let user = User {
            id,
            username: username.to_string(),
            password: password.to_string(),
            created_at: self.now(),
        };
        self.users.insert(id, user);

        tracing::debug!(user_id = id, "user registered");

        Ok(UserSummary {
            id,
            username: username.to_string(),
        })
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<UserSummary, AppError> {
        let username = username.trim();

        self.users
            .values()
            .find(|user| user.username == username && user.password == password)
            .map(|user| UserSummary {
                id: user.id,
                username: user.username.clone(),
            })
            .ok_or_else(|| AppError::Auth("invalid username or password".to_string()))
    }

    pub fn current_user(&self, caller: Option<UserId>) -> Result<UserSummary, AppError> {
        let user = self.require_user(caller)?;

        Ok(UserSummary {
            id: user.id,
            username: user.username.clone(),
        })
    }
}
