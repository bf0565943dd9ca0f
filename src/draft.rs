//! Sequencing of edits and saves for one workflow's draft.
//!
//! The record store applies last-write-wins, so two saves racing each other can drop
//! an edit. [`DraftStore`] keeps at most one save in flight, keeps editing against the
//! latest local state meanwhile, and only moves its acknowledged copy forward when the
//! server confirms a newer revision.

use crate::document::NodeDocument;
use crate::error::{DraftError, GraphError};
use crate::workflow::Workflow;
use tracing::{debug, info, warn};

/// A save handed to the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// Revision the edit was made against; the server should reject the write if its
    /// current revision differs.
    pub base_revision: u64,
    pub document: NodeDocument,
}

/// What the persistence layer reports back for the save in flight.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    /// The server stored the draft under a new revision.
    Saved { revision: u64 },
    /// The server holds a newer draft written by someone else.
    Conflict { workflow: Workflow, revision: u64 },
    /// The save did not go through; edits are kept for the next attempt.
    Failed,
}

/// How [`DraftStore::finish_save`] settled the save in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveResolution {
    /// The server confirmed the snapshot.
    Saved { revision: u64 },
    /// The server's draft replaced the local one. `discarded` is the local working
    /// copy that was dropped, so the editor can show or re-apply it.
    Adopted {
        revision: u64,
        discarded: Workflow,
        /// Edits were made after the save was handed off, on top of the snapshot.
        edited_during_save: bool,
    },
    /// Nothing was stored; the edits stay dirty for the next save.
    Retry,
}

#[derive(Debug, Clone)]
struct InFlight {
    base_revision: u64,
    snapshot: Workflow,
}

/// Editing state of one workflow draft.
#[derive(Debug, Clone)]
pub struct DraftStore {
    acknowledged: Workflow,
    revision: u64,
    working: Workflow,
    dirty: bool,
    in_flight: Option<InFlight>,
}

impl DraftStore {
    /// Starts from a draft the server has confirmed at `revision`.
    pub fn new(workflow: Workflow, revision: u64) -> Self {
        Self {
            acknowledged: workflow.clone(),
            revision,
            working: workflow,
            dirty: false,
            in_flight: None,
        }
    }

    /// The latest local state, including unsaved edits.
    pub fn workflow(&self) -> &Workflow {
        &self.working
    }

    /// The last state the server confirmed.
    pub fn acknowledged(&self) -> &Workflow {
        &self.acknowledged
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether there are local edits not yet handed to a save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Applies one edit to the working copy. On failure nothing changes.
    pub fn apply<F>(&mut self, edit: F) -> Result<&Workflow, GraphError>
    where
        F: FnOnce(&Workflow) -> Result<Workflow, GraphError>,
    {
        let updated = edit(&self.working)?;
        if updated != self.working {
            self.working = updated;
            self.dirty = true;
        }
        Ok(&self.working)
    }

    /// Hands the working copy to the persistence layer.
    ///
    /// Returns `Ok(None)` when there is nothing to save, and `SaveInFlight` while an
    /// earlier save has not been answered.
    pub fn begin_save(&mut self) -> Result<Option<SaveRequest>, DraftError> {
        if self.in_flight.is_some() {
            return Err(DraftError::SaveInFlight);
        }
        if !self.dirty {
            return Ok(None);
        }

        let snapshot = self.working.clone();
        let request = SaveRequest {
            base_revision: self.revision,
            document: snapshot.to_document(),
        };
        self.in_flight = Some(InFlight {
            base_revision: self.revision,
            snapshot,
        });
        self.dirty = false;

        debug!(base_revision = self.revision, "Draft save started");
        Ok(Some(request))
    }

    /// Records the answer to the save in flight.
    pub fn finish_save(&mut self, outcome: SaveOutcome) -> Result<SaveResolution, DraftError> {
        let in_flight = self.in_flight.take().ok_or(DraftError::NoSaveInFlight)?;

        match outcome {
            SaveOutcome::Saved { revision } => {
                if revision <= in_flight.base_revision {
                    // Keep the edits so the next save carries them.
                    self.dirty = true;
                    return Err(DraftError::StaleRevision {
                        base: in_flight.base_revision,
                        found: revision,
                    });
                }
                self.acknowledged = in_flight.snapshot;
                self.revision = revision;
                info!(revision, "Draft saved");
                Ok(SaveResolution::Saved { revision })
            }
            SaveOutcome::Conflict { workflow, revision } => {
                let edited_during_save = self.dirty || self.working != in_flight.snapshot;
                warn!(
                    base_revision = in_flight.base_revision,
                    server_revision = revision,
                    edited_during_save,
                    "Draft save conflicted; adopting the server version"
                );
                self.acknowledged = workflow.clone();
                let discarded = std::mem::replace(&mut self.working, workflow);
                self.revision = revision;
                self.dirty = false;
                Ok(SaveResolution::Adopted {
                    revision,
                    discarded,
                    edited_during_save,
                })
            }
            SaveOutcome::Failed => {
                warn!(base_revision = in_flight.base_revision, "Draft save failed");
                self.dirty = true;
                Ok(SaveResolution::Retry)
            }
        }
    }

    /// Checks the working copy may be activated: every node must be configured.
    pub fn ensure_activatable(&self) -> Result<(), DraftError> {
        match self.working.first_unvalidated() {
            Some(node) => Err(DraftError::NotValidated {
                node_id: node.id.clone(),
            }),
            None => Ok(()),
        }
    }
}
