//! Stage controller: the cascade that moves a process forward
//!
//! One entry point, `check_current_stage`, re-evaluated after every
//! mutation that could complete a slot. The cascade is a bounded loop
//! over the stage sequence: it stops at the first stage with pending
//! slots, advances past completed stages one order at a time, and
//! finishes the process when the end stage is reached. Each hop
//! validates its successor before mutating anything, so a broken
//! sequence errors out with the process untouched.

use crate::ActivityLog;
use chrono::Utc;
use process_types::{
    OutboundEvent, Process, ProcessError, ProcessResult, SlotId, StageId,
};

/// Drives the current-stage cascade
#[derive(Clone, Copy, Debug, Default)]
pub struct StageControl;

impl StageControl {
    pub fn new() -> Self {
        Self
    }

    /// Re-evaluate the current stage and cascade forward as far as the
    /// slots allow. Returns whether the process moved at all.
    ///
    /// `from_slot` is the slot whose counts were just mutated; its
    /// completion flag is refreshed before the cascade starts. On a
    /// terminal process this is a no-op.
    pub fn check_current_stage(
        &self,
        process: &mut Process,
        from_slot: Option<&SlotId>,
        log: &mut ActivityLog,
        events: &mut Vec<OutboundEvent>,
    ) -> ProcessResult<bool> {
        if process.is_terminal() {
            return Ok(false);
        }
        if let Some(slot_id) = from_slot {
            self.refresh_slot_completion(process, slot_id);
        }

        let mut moved = false;
        // Each pass either advances one order, finishes, or returns, so
        // stage count + 1 passes always suffice.
        let max_hops = process.stages.len() + 1;
        for _ in 0..max_hops {
            let current_id = match process.stage_current.clone() {
                Some(id) => id,
                None => break,
            };
            let stage = process
                .stage(&current_id)
                .ok_or_else(|| ProcessError::StageNotFound(current_id.clone()))?;
            let order = stage.order_number;
            let is_end = stage.is_end();

            if !is_end && process.pending_application_count(&current_id) > 0 {
                return Ok(moved);
            }

            if is_end {
                self.finish(process, &current_id, log, events);
                return Ok(true);
            }

            // Resolve the successor before mutating anything
            let (next_id, next_order) = process
                .stage_by_order(order + 1)
                .map(|s| (s.id.clone(), s.order_number))
                .ok_or(ProcessError::BrokenStageSequence { after: order })?;

            let now = Utc::now();
            if let Some(stage) = process.stage_mut(&current_id) {
                stage.mark_done(now);
            }
            process.set_current_stage(next_id.clone());
            log.record_next_stage(&process.id, &next_id);
            events.push(OutboundEvent::StageAdvanced {
                process: process.id.clone(),
                stage: next_id.clone(),
                order: next_order,
            });
            tracing::info!(
                process = %process.id.short(),
                stage = %next_id.short(),
                order = next_order,
                "Stage advanced"
            );
            moved = true;
        }
        Ok(moved)
    }

    /// Flip a slot to done if its approved count now satisfies the quota.
    /// Unbounded slots never flip here.
    fn refresh_slot_completion(&self, process: &mut Process, slot_id: &SlotId) {
        let now = Utc::now();
        if let Some(slot) = process.application_mut(slot_id) {
            if !slot.was_done && slot.auto_completes() {
                slot.mark_done(now);
                tracing::trace!(slot = %slot_id.short(), "Slot auto-completed");
            }
        }
    }

    /// The end stage was reached: close it and the process
    fn finish(
        &self,
        process: &mut Process,
        end_stage: &StageId,
        log: &mut ActivityLog,
        events: &mut Vec<OutboundEvent>,
    ) {
        let now = Utc::now();
        if let Some(stage) = process.stage_mut(end_stage) {
            stage.mark_done(now);
        }
        process.mark_done(now);
        log.record_finish(&process.id, end_stage);
        events.push(OutboundEvent::ProcessFinished {
            process: process.id.clone(),
        });
        tracing::info!(process = %process.id.short(), "Process finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use process_types::{
        ActorId, DocumentTypeId, ProcessStage, ProcessStageApplication, ProcessTemplate, Quota,
        StageTemplate, SystemStageCode,
    };

    fn base_process() -> Process {
        let template = ProcessTemplate::new("Sales")
            .with_stage(StageTemplate::start())
            .with_stage(StageTemplate::end());
        Process::new("Deal", "", &template, ActorId::new("alice"), None)
    }

    /// Materialize stages [start, plain stages, end] and point the
    /// process at the start stage
    fn materialize(process: &mut Process, plain_titles: &[&str]) -> Vec<StageId> {
        let mut ids = Vec::new();
        let start = ProcessStage::system(SystemStageCode::Start, "Start", 1);
        ids.push(start.id.clone());
        process.stages.push(start);
        for (i, title) in plain_titles.iter().enumerate() {
            let stage = ProcessStage::new(*title, (i + 2) as u32);
            ids.push(stage.id.clone());
            process.stages.push(stage);
        }
        let end = ProcessStage::system(
            SystemStageCode::End,
            "End",
            (plain_titles.len() + 2) as u32,
        );
        ids.push(end.id.clone());
        process.stages.push(end);
        process.is_ready = true;
        process.stage_current = Some(ids[0].clone());
        ids
    }

    fn add_slot(process: &mut Process, stage: &StageId, quota: Quota) -> SlotId {
        let slot = ProcessStageApplication::new(
            Some(stage.clone()),
            DocumentTypeId::new("invoice"),
            "Invoices",
            quota,
            1,
        );
        let id = slot.id.clone();
        process.applications.push(slot);
        id
    }

    #[test]
    fn test_cascade_stops_at_pending_stage() {
        let mut process = base_process();
        let ids = materialize(&mut process, &["Review"]);
        add_slot(&mut process, &ids[1], Quota::bounded(1, 1));

        let control = StageControl::new();
        let mut log = ActivityLog::new();
        let mut events = Vec::new();
        let moved = control
            .check_current_stage(&mut process, None, &mut log, &mut events)
            .unwrap();

        // Skipped past start, then held at Review
        assert!(moved);
        assert_eq!(process.stage_current.as_ref(), Some(&ids[1]));
        assert!(!process.is_terminal());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_cascade_through_empty_stages_finishes() {
        let mut process = base_process();
        let ids = materialize(&mut process, &["A", "B"]);
        let slot = add_slot(&mut process, &ids[1], Quota::bounded(1, 1));
        process.stage_current = Some(ids[1].clone());
        if let Some(s) = process.application_mut(&slot) {
            s.set_counts(1, 1);
        }

        // B has no slots, so satisfying A's quota runs through to the end
        let control = StageControl::new();
        let mut log = ActivityLog::new();
        let mut events = Vec::new();
        control
            .check_current_stage(&mut process, Some(&slot), &mut log, &mut events)
            .unwrap();

        assert!(process.is_terminal());
        assert!(process.stage_current.is_none());
        assert!(process.application(&slot).unwrap().was_done);
        // Advanced to B, then end, then finished
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events.last().unwrap(),
            OutboundEvent::ProcessFinished { .. }
        ));
        // Every stage from A onward was closed by the cascade
        assert!(process
            .stages
            .iter()
            .filter(|s| s.order_number >= 2)
            .all(|s| s.was_done));
    }

    #[test]
    fn test_terminal_process_is_noop() {
        let mut process = base_process();
        materialize(&mut process, &[]);
        process.mark_done(Utc::now());
        let before = process.updated_at;

        let control = StageControl::new();
        let mut log = ActivityLog::new();
        let mut events = Vec::new();
        let moved = control
            .check_current_stage(&mut process, None, &mut log, &mut events)
            .unwrap();

        assert!(!moved);
        assert!(events.is_empty());
        assert_eq!(log.total_entries(), 0);
        assert_eq!(process.updated_at, before);
    }

    #[test]
    fn test_unbounded_slot_holds_the_stage() {
        let mut process = base_process();
        let ids = materialize(&mut process, &["Collect"]);
        let slot = add_slot(&mut process, &ids[1], Quota::unbounded(1));
        process.stage_current = Some(ids[1].clone());
        if let Some(s) = process.application_mut(&slot) {
            s.set_counts(10, 10);
        }

        let control = StageControl::new();
        let mut log = ActivityLog::new();
        let mut events = Vec::new();
        let moved = control
            .check_current_stage(&mut process, Some(&slot), &mut log, &mut events)
            .unwrap();

        // Ten approved documents do not finish an unbounded slot
        assert!(!moved);
        assert!(!process.application(&slot).unwrap().was_done);
        assert_eq!(process.stage_current.as_ref(), Some(&ids[1]));
    }

    #[test]
    fn test_broken_sequence_errors_without_mutation() {
        let mut process = base_process();
        let ids = materialize(&mut process, &["Review"]);
        process.stage_current = Some(ids[1].clone());
        // Corrupt the sequence: drop the end stage
        process.stages.retain(|s| !s.is_end());

        let control = StageControl::new();
        let mut log = ActivityLog::new();
        let mut events = Vec::new();
        let result = control.check_current_stage(&mut process, None, &mut log, &mut events);

        assert!(matches!(
            result,
            Err(ProcessError::BrokenStageSequence { after: 2 })
        ));
        // The current stage was not marked done
        assert!(!process.stage(&ids[1]).unwrap().was_done);
        assert_eq!(process.stage_current.as_ref(), Some(&ids[1]));
    }
}
