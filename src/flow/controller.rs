use super::state::{AuthFlow, FlowEvent, FlowExit, FlowState};
use crate::client::auth::types::TokenResponse;
use crate::client::{ApiError, AuthClient};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};

const LOGIN_FAILED: &str = "Login failed";
const SOMETHING_WENT_WRONG: &str = "Something went wrong";
const VERIFICATION_FAILED: &str = "Verification failed";
const RESET_FAILED: &str = "Failed to reset password";
const INVALID_EMAIL: &str = "Enter a valid email address";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("a submission is already in progress")]
    Busy,
    #[error("cannot submit the {expected} step from {actual}")]
    WrongStep {
        expected: FlowState,
        actual: FlowState,
    },
}

/// Drives an [`AuthFlow`] against the backend. Holding `&mut self` across each
/// submission keeps at most one request in flight; dropping a pending future
/// drops its outcome with it.
#[derive(Debug)]
pub struct AuthFlowController<'a> {
    auth: &'a AuthClient,
    flow: AuthFlow,
}

impl<'a> AuthFlowController<'a> {
    #[must_use]
    pub fn new(auth: &'a AuthClient) -> Self {
        Self {
            auth,
            flow: AuthFlow::new(),
        }
    }

    #[must_use]
    pub const fn flow(&self) -> &AuthFlow {
        &self.flow
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.flow.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.flow.password = SecretString::from(password.into());
    }

    pub fn set_new_password(&mut self, new_password: impl Into<String>) {
        self.flow.new_password = SecretString::from(new_password.into());
    }

    pub fn click_forgot(&mut self) {
        self.flow.apply(FlowEvent::ForgotClicked);
    }

    pub fn back_to_login(&mut self) {
        self.flow.apply(FlowEvent::BackToLogin);
    }

    /// Logs in with the current email and password. `Some` means the flow is
    /// done and the caller should navigate away.
    ///
    /// # Errors
    /// Returns `FlowError` if another submission has not completed or the flow
    /// is not on the login step.
    #[instrument(skip(self), fields(step = %self.flow.state()))]
    pub async fn submit_login(&mut self) -> Result<Option<TokenResponse>, FlowError> {
        let auth = self.auth;
        let mut submission = Submission::begin(&mut self.flow, FlowState::Login)?;
        if submission.flow.password_is_empty() {
            submission.finish(FlowEvent::LoginFailed(LOGIN_FAILED.to_string()));
            return Ok(None);
        }

        let result = auth
            .login(&submission.flow.email, submission.flow.password.expose_secret())
            .await;
        match result {
            Ok(tokens) => match submission.finish(FlowEvent::LoginSucceeded) {
                Some(FlowExit::LoggedIn) => Ok(Some(tokens)),
                None => Ok(None),
            },
            Err(err) => {
                submission.fail(FlowEvent::LoginFailed(err.user_message(LOGIN_FAILED)), &err);
                Ok(None)
            }
        }
    }

    /// Requests a reset code for the current email.
    ///
    /// # Errors
    /// Returns `FlowError` if another submission has not completed or the flow
    /// is not on the forgot step.
    #[instrument(skip(self), fields(step = %self.flow.state()))]
    pub async fn submit_forgot(&mut self) -> Result<(), FlowError> {
        let auth = self.auth;
        let mut submission = Submission::begin(&mut self.flow, FlowState::Forgot)?;
        let email = submission.flow.email.trim().to_string();
        if !valid_email(&email) {
            submission.finish(FlowEvent::CodeRequestFailed(INVALID_EMAIL.to_string()));
            return Ok(());
        }
        submission.flow.email = email;

        match auth.forgot_password(&submission.flow.email).await {
            Ok(_) => {
                submission.finish(FlowEvent::CodeSent);
            }
            Err(err) => {
                submission.fail(
                    FlowEvent::CodeRequestFailed(err.user_message(SOMETHING_WENT_WRONG)),
                    &err,
                );
            }
        }
        Ok(())
    }

    /// Verifies the code the user typed.
    ///
    /// # Errors
    /// Returns `FlowError` if another submission has not completed or the flow
    /// is not on the code step.
    #[instrument(skip_all, fields(step = %self.flow.state()))]
    pub async fn submit_code(&mut self, code: &str) -> Result<(), FlowError> {
        let auth = self.auth;
        let mut submission = Submission::begin(&mut self.flow, FlowState::Code)?;

        match auth
            .forgot_password_verify(&submission.flow.email, code.trim())
            .await
        {
            Ok(response) => {
                submission.finish(FlowEvent::CodeVerified {
                    reset_token: SecretString::from(response.reset_token),
                });
            }
            Err(err) => {
                let attempts_remaining = match &err {
                    ApiError::VerifyCode {
                        attempts_remaining, ..
                    } => Some(*attempts_remaining),
                    _ => None,
                };
                submission.fail(
                    FlowEvent::CodeRejected {
                        message: err.user_message(VERIFICATION_FAILED),
                        attempts_remaining,
                    },
                    &err,
                );
            }
        }
        Ok(())
    }

    /// Sets the new password using the reset token captured at the code step.
    ///
    /// # Errors
    /// Returns `FlowError` if another submission has not completed or the flow
    /// is not on the reset step.
    #[instrument(skip(self), fields(step = %self.flow.state()))]
    pub async fn submit_reset(&mut self) -> Result<(), FlowError> {
        let auth = self.auth;
        let mut submission = Submission::begin(&mut self.flow, FlowState::Reset)?;
        let Some(reset_token) = submission.flow.reset_token().cloned() else {
            submission.finish(FlowEvent::PasswordResetFailed(RESET_FAILED.to_string()));
            return Ok(());
        };

        let result = auth
            .reset_password(
                reset_token.expose_secret(),
                submission.flow.new_password.expose_secret(),
            )
            .await;
        match result {
            Ok(_) => {
                submission.finish(FlowEvent::PasswordReset);
            }
            Err(err) => {
                submission.fail(
                    FlowEvent::PasswordResetFailed(err.user_message(RESET_FAILED)),
                    &err,
                );
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> FlowState {
        self.flow.state()
    }
}

/// An open submission. Dropping it ends the submission, so a cancelled request
/// future leaves the flow ready for the next one.
struct Submission<'f> {
    flow: &'f mut AuthFlow,
}

impl<'f> Submission<'f> {
    fn begin(flow: &'f mut AuthFlow, step: FlowState) -> Result<Self, FlowError> {
        if flow.is_submitting() {
            return Err(FlowError::Busy);
        }
        if flow.state() != step {
            return Err(FlowError::WrongStep {
                expected: step,
                actual: flow.state(),
            });
        }
        flow.apply(FlowEvent::SubmitStarted);
        Ok(Self { flow })
    }

    fn finish(&mut self, event: FlowEvent) -> Option<FlowExit> {
        self.flow.apply(event)
    }

    fn fail(&mut self, event: FlowEvent, err: &ApiError) {
        debug!(status = ?err.status(), "Submission failed: {err}");
        self.flow.apply(event);
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        self.flow.abandon_submission();
    }
}

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::{ApiClient, ClientConfig};
    use serde_json::json;
    use std::{sync::Arc, time::Duration};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_client(server: &MockServer) -> AuthClient {
        AuthClient::new(Arc::new(
            ApiClient::new(ClientConfig::new(server.uri())).unwrap(),
        ))
    }

    #[test]
    fn email_format() {
        assert!(valid_email("jon@naglasupan.is"));
        assert!(!valid_email("jon@naglasupan"));
        assert!(!valid_email("jon naglasupan.is"));
        assert!(!valid_email(""));
    }

    #[tokio::test]
    async fn login_success_exits_with_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "token_type": "bearer",
                "is_verified": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.set_email("jon@naglasupan.is");
        controller.set_password("hunter2");

        let exit = controller.submit_login().await.unwrap();
        assert!(exit.is_some());
        assert!(!controller.flow().is_submitting());
        assert_eq!(controller.flow().error(), None);
    }

    #[tokio::test]
    async fn login_failure_shows_server_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.set_email("jon@naglasupan.is");
        controller.set_password("wrong");

        assert!(matches!(controller.submit_login().await, Ok(None)));
        assert_eq!(controller.state(), FlowState::Login);
        assert_eq!(controller.flow().error(), Some("Invalid credentials"));
    }

    #[tokio::test]
    async fn malformed_email_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.click_forgot();
        controller.set_email("not-an-email");

        controller.submit_forgot().await.unwrap();
        assert_eq!(controller.state(), FlowState::Forgot);
        assert_eq!(controller.flow().error(), Some(INVALID_EMAIL));
    }

    #[tokio::test]
    async fn busy_controller_rejects_second_submission() {
        let server = MockServer::start().await;
        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.flow.apply(FlowEvent::SubmitStarted);

        assert!(matches!(
            controller.submit_login().await,
            Err(FlowError::Busy)
        ));
        assert_eq!(controller.submit_forgot().await, Err(FlowError::Busy));
        assert!(controller.flow().is_submitting());

        controller.back_to_login();
        assert!(!controller.flow().is_submitting());
    }

    #[tokio::test]
    async fn cancelled_login_does_not_block_the_next_one() {
        let server = MockServer::start().await;
        let tokens = json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer",
            "is_verified": true
        });
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(tokens.clone())
                    .set_delay(Duration::from_secs(2)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tokens))
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.set_email("jon@naglasupan.is");
        controller.set_password("hunter2");

        let timed_out =
            tokio::time::timeout(Duration::from_millis(100), controller.submit_login()).await;
        assert!(timed_out.is_err());
        assert!(!controller.flow().is_submitting());
        assert_eq!(controller.state(), FlowState::Login);

        let exit = controller.submit_login().await.unwrap();
        assert!(exit.is_some());
    }

    #[tokio::test]
    async fn submissions_from_another_step_send_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.set_email("jon@naglasupan.is");

        assert_eq!(
            controller.submit_forgot().await,
            Err(FlowError::WrongStep {
                expected: FlowState::Forgot,
                actual: FlowState::Login,
            })
        );
        assert_eq!(
            controller.submit_code("123456").await,
            Err(FlowError::WrongStep {
                expected: FlowState::Code,
                actual: FlowState::Login,
            })
        );
        assert_eq!(
            controller.submit_reset().await,
            Err(FlowError::WrongStep {
                expected: FlowState::Reset,
                actual: FlowState::Login,
            })
        );
        assert!(!controller.flow().is_submitting());
    }

    #[tokio::test]
    async fn login_from_code_step_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.click_forgot();
        controller.set_email("jon@naglasupan.is");
        controller.submit_forgot().await.unwrap();
        assert_eq!(controller.state(), FlowState::Code);

        controller.set_password("hunter2");
        assert!(matches!(
            controller.submit_login().await,
            Err(FlowError::WrongStep {
                expected: FlowState::Login,
                actual: FlowState::Code,
            })
        ));
        assert_eq!(controller.state(), FlowState::Code);
    }

    #[tokio::test]
    async fn recovery_walk_against_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password"))
            .and(body_json(json!({"email": "jon@naglasupan.is"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Code sent"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password/verify"))
            .and(body_json(json!({"email": "jon@naglasupan.is", "code": "000000"})))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "detail": "Invalid code",
                "attempts_remaining": 2
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password/verify"))
            .and(body_json(json!({"email": "jon@naglasupan.is", "code": "123456"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"reset_token": "reset-abc"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/reset-password"))
            .and(body_json(json!({"reset_token": "reset-abc", "new_password": "n3w-pass"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Password reset"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.click_forgot();
        controller.set_email("  jon@naglasupan.is ");

        controller.submit_forgot().await.unwrap();
        assert_eq!(controller.state(), FlowState::Code);

        controller.submit_code("000000").await.unwrap();
        assert_eq!(controller.state(), FlowState::Code);
        assert_eq!(controller.flow().error(), Some("Invalid code"));
        assert_eq!(controller.flow().attempts_remaining(), Some(2));
        assert_eq!(controller.flow().pin_key(), 1);

        controller.submit_code("123456").await.unwrap();
        assert_eq!(controller.state(), FlowState::Reset);

        controller.set_new_password("n3w-pass");
        controller.submit_reset().await.unwrap();
        assert_eq!(controller.state(), FlowState::Login);
        assert_eq!(
            controller.flow().success(),
            Some(super::super::state::PASSWORD_UPDATED)
        );
    }

    #[tokio::test]
    async fn code_failure_without_attempts_uses_message_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password/verify"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Boom"})))
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.click_forgot();
        controller.set_email("jon@naglasupan.is");
        controller.submit_forgot().await.unwrap();

        controller.submit_code("123456").await.unwrap();
        assert_eq!(controller.state(), FlowState::Code);
        assert_eq!(controller.flow().error(), Some("Boom"));
        assert_eq!(controller.flow().attempts_remaining(), None);
        assert_eq!(controller.flow().attempts_label(), None);
    }

    #[tokio::test]
    async fn reset_failure_keeps_token_and_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password/verify"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"reset_token": "reset-abc"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/reset-password"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({})))
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let mut controller = AuthFlowController::new(&auth);
        controller.click_forgot();
        controller.set_email("jon@naglasupan.is");
        controller.submit_forgot().await.unwrap();
        controller.submit_code("123456").await.unwrap();
        controller.set_new_password("short");

        controller.submit_reset().await.unwrap();
        assert_eq!(controller.state(), FlowState::Reset);
        assert_eq!(controller.flow().error(), Some("Request failed (400)"));
        assert!(controller.flow().reset_token().is_some());

        controller.back_to_login();
        assert_eq!(controller.state(), FlowState::Login);
        assert!(controller.flow().reset_token().is_none());
    }
}
