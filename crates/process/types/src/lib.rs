//! Process Domain Types for Procesio
//!
//! A process is a quota-gated stage sequence: an organization authors an
//! ordered list of stages, each stage gated by one or more application
//! quotas (how many documents of a given type it requires), and the
//! runtime advances automatically as documents are registered and
//! approved against those quotas.
//!
//! # Key Concepts
//!
//! - **ProcessTemplate**: The authored blueprint — stages with quotas,
//!   validated before any process is expanded from it.
//! - **Process**: A running instance; owns its stage rows, quota slots,
//!   registered documents and member set.
//! - **ProcessStageApplication**: A quota slot — one document type's
//!   min/max requirement, bound to a stage or spanning the process.
//! - **Quota**: The count requirement; the upper bound is `Bounded(n)`
//!   or `Unbounded` (the legacy `"n"`).
//! - **ProcessDoc**: One external document registered against a slot,
//!   with an append-only status history.
//! - **ProcessActivity**: The append-only audit trail of transitions.
//! - **OutboundEvent**: Side effects returned to the caller for
//!   fire-and-forget dispatch — the engine never notifies directly.

#![deny(unsafe_code)]

mod activity;
mod application;
mod document;
mod errors;
mod events;
mod ids;
mod process;
mod quota;
mod stage;
mod template;

pub use activity::*;
pub use application::*;
pub use document::*;
pub use errors::*;
pub use events::*;
pub use ids::*;
pub use process::*;
pub use quota::*;
pub use stage::*;
pub use template::*;
