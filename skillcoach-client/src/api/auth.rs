//! `/auth` endpoints

use super::ApiClient;
use crate::error::{Error, Result};
use skillcoach_common::api::{
    ChangePasswordRequest, RegisterRequest, StatusMessage, Token, User,
};
use tracing::info;

impl ApiClient {
    /// Exchange credentials for a token, store it and cache the user.
    ///
    /// `username` is an email; the backend also accepts a bare admin login.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(Error::BadRequest(
                "username and password are required".to_string(),
            ));
        }

        let token: Token = self
            .post_form("/auth/login", &[("username", username), ("password", password)])
            .await?;
        self.session().set_token(token).await?;

        let user = self.me().await?;
        info!(user = %user.email, admin = user.is_admin(), "Logged in");
        Ok(user)
    }

    /// Create an account (does not log in)
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.post_json("/auth/register", request).await
    }

    /// Fetch the current user and refresh the session cache
    pub async fn me(&self) -> Result<User> {
        let user: User = self.get_json("/auth/me", &[]).await?;
        self.session().set_user(user.clone()).await?;
        Ok(user)
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<StatusMessage> {
        let request = ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.post_json("/auth/change-password", &request).await
    }

    /// Forget the token locally
    pub async fn logout(&self) -> Result<()> {
        self.session().clear().await?;
        info!("Logged out");
        Ok(())
    }
}
