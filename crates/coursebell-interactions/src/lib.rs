//! # CourseBell Interactions
//!
//! Everything between an inbound chat callback and a domain handler:
//!
//! ```text
//! component callback ("draft_confirm-42")
//!   ├── codec: decode the opaque identifier
//!   ├── actions: validate against the static action catalog
//!   ├── request: wrap with the reply-dispatch contract (ack exactly once)
//!   └── dispatch: route to the named handler, map errors to user replies
//! ```
//!
//! Identifiers are untrusted input — stale buttons from an old deployment,
//! hand-crafted ids — so decoding validates shape strictly and never leaks
//! internal state in what the requester gets back.

pub mod actions;
pub mod codec;
pub mod dispatch;
pub mod request;

pub use actions::{ActionKind, ActionRegistry, ActionSpec, CallbackClass};
pub use codec::{ArgMap, DecodedAction, MAX_COMPONENT_ID_LEN, decode, encode, fits_component_id};
pub use dispatch::{Dispatcher, InteractionHandler};
pub use request::{
    CompositeMessage, FormField, FormRequest, InteractionRequest, ReplyMode, ReplyRenderer,
    ReplyState, ResponsePayload, RichContent,
};
