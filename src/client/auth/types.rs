//! Request and response types for the auth endpoints. Password, code and token
//! fields must never be logged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub kennitala: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Sign-up payload. Names are collected later on the profile page.
#[derive(Clone, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub kennitala: String,
}

#[derive(Serialize)]
pub(super) struct RegisterBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub kennitala: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

#[derive(Serialize)]
pub(super) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub is_verified: bool,
}

// Tokens stay out of Debug output.
impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("is_verified", &self.is_verified)
            .finish_non_exhaustive()
    }
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Serialize)]
pub(super) struct CodeBody<'a> {
    pub code: &'a str,
}

#[derive(Serialize)]
pub(super) struct EmailBody<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
pub(super) struct VerifyResetCodeBody<'a> {
    pub email: &'a str,
    pub code: &'a str,
}

#[derive(Serialize)]
pub(super) struct ResetPasswordBody<'a> {
    pub reset_token: &'a str,
    pub new_password: &'a str,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyEmailResponse {
    pub message: String,
    pub is_verified: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResendVerificationResponse {
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForgotPasswordResponse {
    pub message: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ForgotPasswordVerifyResponse {
    pub reset_token: String,
}

/// Error body returned when a reset code is rejected.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForgotPasswordVerifyError {
    #[serde(default)]
    pub detail: String,
    pub attempts_remaining: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResetPasswordResponse {
    pub message: String,
}
