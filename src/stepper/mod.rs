//! Folds parsed step batches into the running project state.
//!
//! Exactly one step is `Active` at a time. Steps are activated in ascending id
//! order, folded into the tree, then marked `Completed`, so a later write to
//! the same path always wins.

use log::{debug, warn};

use crate::errors::TreeError;
use crate::parse;
use crate::tree::{self, ProjectTree};
use crate::wire::{Step, StepKind, StepStatus};

#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    pub tree: ProjectTree,
    pub steps: Vec<Step>,
    /// Path the UI should show, set whenever a step with a path completes.
    pub selected: Option<String>,
}

/// What one run of the stepper did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advance {
    pub completed: Vec<u32>,
    pub selected: Option<String>,
    pub rejected: Vec<(u32, TreeError)>,
}

impl ProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// First id for the next batch.
    pub fn next_id(&self) -> u32 {
        self.steps.iter().map(|s| s.id).max().map_or(1, |m| m + 1)
    }

    pub fn active(&self) -> Option<&Step> {
        self.steps.iter().find(|s| s.status == StepStatus::Active)
    }

    /// Parse a model response as the next batch and merge it.
    pub fn ingest(&mut self, text: &str) -> Advance {
        let batch = parse::parse_from(text, self.next_id());
        self.merge(batch)
    }

    pub fn merge(&mut self, batch: Vec<Step>) -> Advance {
        self.merge_with(batch, |_| {})
    }

    /// Append `batch` as pending and run the stepper to completion, calling
    /// `observer` for every step as it completes.
    pub fn merge_with<F: FnMut(&Step)>(&mut self, batch: Vec<Step>, observer: F) -> Advance {
        let floor = self.next_id();
        let rebase = batch.iter().any(|s| s.id < floor);
        if rebase {
            warn!("batch ids overlap existing steps; renumbering from {floor}");
        }
        for (i, mut step) in batch.into_iter().enumerate() {
            if rebase {
                step.id = floor + i as u32;
            }
            step.status = StepStatus::Pending;
            self.steps.push(step);
        }
        self.steps.sort_by_key(|s| s.id);
        self.advance_with(observer)
    }

    /// Promote the lowest-id pending step, unless a step is already active.
    pub fn activate_next(&mut self) -> Option<u32> {
        if self.active().is_some() {
            return None;
        }
        let step = self
            .steps
            .iter_mut()
            .filter(|s| s.status == StepStatus::Pending)
            .min_by_key(|s| s.id)?;
        step.status = StepStatus::Active;
        Some(step.id)
    }

    /// Fold the active step into the tree and mark it completed. Steps that do
    /// not fit (missing path/code, path collisions) still complete.
    pub fn complete_active(&mut self) -> Option<(u32, Result<(), TreeError>)> {
        let idx = self.steps.iter().position(|s| s.status == StepStatus::Active)?;
        let step = &mut self.steps[idx];
        let mut outcome = Ok(());

        if step.kind == StepKind::CreateFile {
            if let (Some(path), Some(code)) = (&step.path, &step.code) {
                match self.tree.fold_file(path, code) {
                    Ok(how) => debug!("step {}: {:?} {}", step.id, how, path),
                    Err(e) => {
                        warn!("step {} not folded: {}", step.id, e);
                        outcome = Err(e);
                    }
                }
            }
        }
        if let Some(path) = &step.path {
            // Select under the key the tree stores the file by.
            self.selected = Some(tree::normalized(path).unwrap_or_else(|_| path.clone()));
        }
        step.status = StepStatus::Completed;
        Some((step.id, outcome))
    }

    pub fn advance(&mut self) -> Advance {
        self.advance_with(|_| {})
    }

    pub fn advance_with<F: FnMut(&Step)>(&mut self, mut observer: F) -> Advance {
        let mut out = Advance::default();
        loop {
            if self.active().is_none() && self.activate_next().is_none() {
                break;
            }
            let Some((id, res)) = self.complete_active() else { break };
            if let Err(e) = res {
                out.rejected.push((id, e));
            }
            if let Some(step) = self.steps.iter().find(|s| s.id == id) {
                if step.path.is_some() {
                    out.selected = self.selected.clone();
                }
                observer(step);
            }
            out.completed.push(id);
        }
        out
    }

    /// Single-active invariant: completed below the active id, pending above.
    pub fn is_consistent(&self) -> bool {
        let actives: Vec<u32> = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Active)
            .map(|s| s.id)
            .collect();
        match actives.as_slice() {
            [] => true,
            [a] => self.steps.iter().all(|s| {
                (s.id < *a && s.status == StepStatus::Completed)
                    || s.id == *a
                    || (s.id > *a && s.status == StepStatus::Pending)
            }),
            _ => false,
        }
    }
}
