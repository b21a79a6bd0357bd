//! Login and password recovery flow.
//!
//! [`AuthFlow`] is the page model and its pure transition function;
//! [`AuthFlowController`] runs the backend calls and feeds their outcomes back
//! as [`FlowEvent`]s.

mod controller;
mod state;

pub use controller::{AuthFlowController, FlowError};
pub use state::{AuthFlow, FlowEvent, FlowExit, FlowState, PASSWORD_UPDATED};
