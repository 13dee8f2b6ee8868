mod challenge;
mod clock;
mod errors;
mod machine;
mod observer;
mod registry;
mod runner;
mod schemas;
mod validation;

pub use challenge::{OtpChallenge, OtpPolicy};
pub use clock::{Clock, SystemClock};
pub use errors::FlowRejection;
pub use machine::{Effect, EffectResult, SubmissionFlow, Ticket};
pub use observer::{FlowObserver, TracingObserver};
pub use registry::FlowRegistry;
pub use runner::{Collaborators, FlowHandle};
pub use schemas::{
    CodeError, CodeErrorReason, FieldError, FlowSnapshot, FlowState, Intent, IntentKind,
    LeadDraft, LeadField, LeadForm, LeadRecord, PhoneNumber,
};
pub use validation::{validate_code, validate_lead_form};
