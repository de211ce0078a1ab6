//! Membership guard: who may act on a process
//!
//! Every actor-initiated mutation passes through the guard. The rule is
//! flat: an actor is either in the process's member set or not. Role
//! distinctions live in the outer layers, not here.

use process_types::{ActorId, Process, ProcessError, ProcessResult, SlotId};

/// Gate for actor-initiated process mutations
#[derive(Clone, Copy, Debug, Default)]
pub struct MembershipGuard;

impl MembershipGuard {
    pub fn new() -> Self {
        Self
    }

    /// Whether the actor belongs to the process
    pub fn is_member(&self, process: &Process, actor: &ActorId) -> bool {
        process.is_member(actor)
    }

    /// Membership check scoped to a slot: the slot must belong to the
    /// process, then the process's member set decides
    pub fn is_member_of_slot(
        &self,
        process: &Process,
        slot: &SlotId,
        actor: &ActorId,
    ) -> ProcessResult<bool> {
        if process.application(slot).is_none() {
            return Err(ProcessError::ApplicationNotFound(slot.clone()));
        }
        Ok(self.is_member(process, actor))
    }

    /// Require membership, erroring for flows that must surface the denial
    pub fn require_member(&self, process: &Process, actor: &ActorId) -> ProcessResult<()> {
        if self.is_member(process, actor) {
            Ok(())
        } else {
            tracing::trace!(
                process = %process.id,
                actor = %actor,
                "Membership check failed"
            );
            Err(ProcessError::PermissionDenied(actor.clone()))
        }
    }
}
