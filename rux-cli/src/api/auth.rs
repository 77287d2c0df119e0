//! Account and session endpoints

use reqwest::Method;
use rux_session::PENDING_EMAIL_KEY;
use serde_json::json;
use tracing::info;

use crate::api::{Client, Error, Result};
use crate::model::auth::UserIdResponse;
use crate::model::{AuthResponse, Login, Otp, Signup};

impl AuthResponse {
    /// Turns the `error` entry into an error
    fn accepted(self) -> Result<Self> {
        match self.error {
            Some(error) => Err(Error::Rejected(error)),
            None => Ok(self),
        }
    }
}

impl Client {
    async fn auth_call(&self, path: &str, body: &impl serde::Serialize) -> Result<AuthResponse> {
        let request = self.request(Method::POST, path).json(body);
        let response: AuthResponse = self.send_json(path, request).await?;
        response.accepted()
    }

    /// Registers a new account
    ///
    /// The account stays unverified until the emailed OTP is confirmed. Email is remembered for
    /// the verification step.
    pub async fn signup(&self, signup: &Signup) -> Result<AuthResponse> {
        let response = self.auth_call("/auth/signup", signup).await?;
        self.session()
            .store()
            .set(PENDING_EMAIL_KEY, &signup.email)?;

        info!(email = %signup.email, "Signup registered, waiting for OTP");
        Ok(response)
    }

    /// Email of the signup waiting for verification
    pub fn pending_email(&self) -> Option<String> {
        self.session().store().get(PENDING_EMAIL_KEY)
    }

    /// Looks up the user id registered for the email
    pub async fn user_id_by_email(&self, email: &str) -> Result<String> {
        let path = "/auth/get-userId";
        let request = self
            .request(Method::POST, path)
            .json(&json!({ "email": email }));
        let response: UserIdResponse = self.send_json(path, request).await?;
        Ok(response.user_id)
    }

    /// Resolves the user id of pending signup
    async fn pending_user_id(&self) -> Result<String> {
        let email = self.pending_email().ok_or(Error::MissingPendingEmail)?;
        self.user_id_by_email(&email).await
    }

    /// Confirms the pending signup with the emailed code, signing the user in
    pub async fn verify_otp(&self, code: &str) -> Result<()> {
        let user_id = self.pending_user_id().await?;
        let path = format!("/auth/verify-otp/{user_id}");
        let otp = Otp {
            otp_code: code.to_owned(),
        };

        let response = self.auth_call(&path, &otp).await?;
        let token = response.token.ok_or(Error::MissingToken)?;
        self.session().sign_in(&token)?;
        self.session().store().remove(PENDING_EMAIL_KEY)?;

        info!(%user_id, "Signup verified");
        Ok(())
    }

    /// Requests a new code for the pending signup
    pub async fn resend_otp(&self) -> Result<AuthResponse> {
        let user_id = self.pending_user_id().await?;
        let path = format!("/auth/resend-otp/{user_id}");
        self.auth_call(&path, &json!({})).await
    }

    /// Logs in with password, persisting the issued token
    pub async fn login(&self, login: &Login) -> Result<()> {
        let response = self.auth_call("/auth/login", login).await?;
        let token = response.token.ok_or(Error::MissingToken)?;
        self.session().sign_in(&token)?;
        Ok(())
    }

    /// Asks the server if the persisted token is still accepted
    ///
    /// Rejection closes the session the same way as any other `401` answer.
    pub async fn validate_token(&self) -> Result<AuthResponse> {
        let token = self.session().token().ok_or(Error::NotSignedIn)?;
        self.auth_call("/auth/validate", &json!({ "token": token }))
            .await
    }

    /// Starts the password reset flow
    pub async fn forgot_password(&self, email: &str) -> Result<AuthResponse> {
        self.auth_call("/auth/forgot-password", &json!({ "email": email }))
            .await
    }

    /// Sets a new password using the emailed reset token
    pub async fn reset_password(&self, reset_token: &str, password: &str) -> Result<AuthResponse> {
        let path = "/auth/reset-password";
        let request = self
            .request(Method::POST, path)
            .query(&[("token", reset_token)])
            .json(&json!({ "password": password }));
        let response: AuthResponse = self.send_json(path, request).await?;
        response.accepted()
    }

    /// Ends the session locally
    pub fn logout(&self) -> Result<()> {
        self.session().sign_out()?;
        Ok(())
    }
}
