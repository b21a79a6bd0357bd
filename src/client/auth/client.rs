//! Client wrappers for the auth endpoints. Login is the only call that touches
//! the token store, and reset-code verification is the only one that re-maps an
//! error; everything else passes `ApiError` through untouched.

use super::types::{
    CodeBody, EmailBody, ForgotPasswordResponse, ForgotPasswordVerifyError,
    ForgotPasswordVerifyResponse, LoginBody, RegisterBody, RegisterRequest,
    ResendVerificationResponse, ResetPasswordBody, ResetPasswordResponse, TokenResponse, User,
    UserUpdate, VerifyEmailResponse, VerifyResetCodeBody,
};
use crate::client::{ApiClient, ApiError, RequestOptions};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Clone, Debug)]
pub struct AuthClient {
    client: Arc<ApiClient>,
}

impl AuthClient {
    #[must_use]
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Creates an account. First and last name are sent empty.
    ///
    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let body = RegisterBody {
            email: &request.email,
            password: &request.password,
            kennitala: &request.kennitala,
            first_name: "",
            last_name: "",
        };
        self.client
            .request("/api/auth/register", RequestOptions::post(&body)?)
            .await
    }

    /// Logs in and stores the returned token pair before handing it back.
    /// Tokens are left alone when the call fails.
    ///
    /// # Errors
    /// Propagates any `ApiError` from the request.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let response: TokenResponse = self
            .client
            .request(
                "/api/auth/login",
                RequestOptions::post(&LoginBody { email, password })?,
            )
            .await?;
        self.client
            .set_tokens(response.access_token.clone(), response.refresh_token.clone());
        debug!("login succeeded, session stored");
        Ok(response)
    }

    /// Drops the local session. There is no server-side logout for bearer tokens.
    pub fn logout(&self) {
        self.client.clear_tokens();
    }

    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.client
            .request("/api/auth/me", RequestOptions::get())
            .await
    }

    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn update_current_user(&self, update: &UserUpdate) -> Result<User, ApiError> {
        self.client
            .request("/api/auth/me", RequestOptions::put(update)?)
            .await
    }

    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn verify_email(&self, code: &str) -> Result<VerifyEmailResponse, ApiError> {
        self.client
            .request("/api/auth/verify-email", RequestOptions::post(&CodeBody { code })?)
            .await
    }

    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn resend_verification(&self) -> Result<ResendVerificationResponse, ApiError> {
        self.client
            .request("/api/auth/resend-verification", RequestOptions::post_empty())
            .await
    }

    /// Requests a reset code. The server answers the same way for unknown emails.
    ///
    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordResponse, ApiError> {
        self.client
            .request(
                "/api/auth/forgot-password",
                RequestOptions::post(&EmailBody { email })?,
            )
            .await
    }

    /// Exchanges a reset code for a reset token.
    ///
    /// # Errors
    /// A rejected code whose body carries `attempts_remaining` becomes
    /// `ApiError::VerifyCode` with the original message; any other error is
    /// returned unchanged.
    #[instrument(skip_all)]
    pub async fn forgot_password_verify(
        &self,
        email: &str,
        code: &str,
    ) -> Result<ForgotPasswordVerifyResponse, ApiError> {
        self.client
            .request(
                "/api/auth/forgot-password/verify",
                RequestOptions::post(&VerifyResetCodeBody { email, code })?,
            )
            .await
            .map_err(into_verify_code_error)
    }

    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<ResetPasswordResponse, ApiError> {
        self.client
            .request(
                "/api/auth/reset-password",
                RequestOptions::post(&ResetPasswordBody {
                    reset_token,
                    new_password,
                })?,
            )
            .await
    }
}

fn into_verify_code_error(err: ApiError) -> ApiError {
    if let ApiError::Request {
        status,
        message,
        body,
    } = &err
    {
        if let Ok(rejected) = serde_json::from_value::<ForgotPasswordVerifyError>(body.clone()) {
            return ApiError::VerifyCode {
                status: *status,
                message: message.clone(),
                attempts_remaining: rejected.attempts_remaining,
            };
        }
    }
    err
}
