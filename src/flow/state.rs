//! Login page state as a tagged union plus a pure transition function. Nothing
//! here performs I/O; the controller feeds request outcomes back in as events.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

pub const PASSWORD_UPDATED: &str = "Password updated. Please log in.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Login,
    Forgot,
    Code,
    Reset,
}

impl fmt::Display for FlowState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::Forgot => "forgot",
            Self::Code => "code",
            Self::Reset => "reset",
        };
        formatter.write_str(name)
    }
}

/// Inputs to [`AuthFlow::apply`]: user actions and request outcomes.
#[derive(Clone, Debug)]
pub enum FlowEvent {
    ForgotClicked,
    BackToLogin,
    SubmitStarted,
    LoginSucceeded,
    LoginFailed(String),
    CodeSent,
    CodeRequestFailed(String),
    CodeVerified { reset_token: SecretString },
    CodeRejected {
        message: String,
        attempts_remaining: Option<u32>,
    },
    PasswordReset,
    PasswordResetFailed(String),
}

impl FlowEvent {
    const fn completes_submission(&self) -> bool {
        !matches!(
            self,
            Self::ForgotClicked | Self::BackToLogin | Self::SubmitStarted
        )
    }
}

/// Leaving the flow; the caller decides where to navigate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowExit {
    LoggedIn,
}

#[derive(Clone, Debug, Default)]
pub struct AuthFlow {
    state: FlowState,
    pub email: String,
    pub password: SecretString,
    pub new_password: SecretString,
    reset_token: Option<SecretString>,
    error: Option<String>,
    success: Option<String>,
    submitting: bool,
    attempts_remaining: Option<u32>,
    pin_key: u64,
}

impl AuthFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> FlowState {
        self.state
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub const fn attempts_remaining(&self) -> Option<u32> {
        self.attempts_remaining
    }

    #[must_use]
    pub const fn reset_token(&self) -> Option<&SecretString> {
        self.reset_token.as_ref()
    }

    /// Identity of the code input. It changes after every rejected code so the
    /// view rebuilds the widget and the previous digits disappear.
    #[must_use]
    pub const fn pin_key(&self) -> u64 {
        self.pin_key
    }

    /// Applies one event. Events that do not belong to the current state leave
    /// it unchanged, except that any request outcome ends the submission.
    pub fn apply(&mut self, event: FlowEvent) -> Option<FlowExit> {
        if event.completes_submission() {
            self.submitting = false;
        }

        match (self.state, event) {
            (_, FlowEvent::BackToLogin) => self.go_to_login(),
            (_, FlowEvent::SubmitStarted) => {
                if self.state == FlowState::Login {
                    self.success = None;
                }
                self.error = None;
                self.submitting = true;
            }
            (FlowState::Login, FlowEvent::ForgotClicked) => {
                self.state = FlowState::Forgot;
                self.error = None;
                self.success = None;
            }
            (FlowState::Login, FlowEvent::LoginSucceeded) => return Some(FlowExit::LoggedIn),
            (FlowState::Login, FlowEvent::LoginFailed(message))
            | (FlowState::Forgot, FlowEvent::CodeRequestFailed(message))
            | (FlowState::Reset, FlowEvent::PasswordResetFailed(message)) => {
                self.error = Some(message);
            }
            (FlowState::Forgot, FlowEvent::CodeSent) => self.state = FlowState::Code,
            (FlowState::Code, FlowEvent::CodeVerified { reset_token }) => {
                self.reset_token = Some(reset_token);
                self.state = FlowState::Reset;
            }
            (
                FlowState::Code,
                FlowEvent::CodeRejected {
                    message,
                    attempts_remaining,
                },
            ) => {
                if attempts_remaining.is_some() {
                    self.attempts_remaining = attempts_remaining;
                }
                self.error = Some(message);
                self.pin_key = self.pin_key.wrapping_add(1);
            }
            (FlowState::Reset, FlowEvent::PasswordReset) => {
                self.success = Some(PASSWORD_UPDATED.to_string());
                self.go_to_login();
            }
            _ => {}
        }

        None
    }

    fn go_to_login(&mut self) {
        self.state = FlowState::Login;
        self.error = None;
        self.submitting = false;
        self.new_password = SecretString::default();
        self.reset_token = None;
        self.attempts_remaining = None;
    }

    /// Title and subtitle for the current step.
    #[must_use]
    pub fn heading(&self) -> (String, String) {
        let (heading, sub) = match self.state {
            FlowState::Login => ("Welcome back", "Log in to manage your projects".to_string()),
            FlowState::Forgot => (
                "Forgotten password?",
                "Enter your email to receive a reset code".to_string(),
            ),
            FlowState::Code => (
                "Enter your code",
                format!("We sent a 6-digit code to {}", self.email),
            ),
            FlowState::Reset => (
                "Set new password",
                "Choose a new password for your account".to_string(),
            ),
        };
        (heading.to_string(), sub)
    }

    /// "N attempts remaining", shown only while the code step has attempts left.
    #[must_use]
    pub fn attempts_label(&self) -> Option<String> {
        match self.attempts_remaining {
            Some(1) => Some("1 attempt remaining".to_string()),
            Some(n) if n > 0 => Some(format!("{n} attempts remaining")),
            _ => None,
        }
    }

    /// Ends a submission whose outcome never arrived.
    pub(crate) fn abandon_submission(&mut self) {
        self.submitting = false;
    }

    pub(crate) fn password_is_empty(&self) -> bool {
        self.password.expose_secret().is_empty()
    }
}
