use http::StatusCode;

use super::{report, Dashboard};
use crate::entity::{EntityKind, EntityRef};
use crate::error::{AdminError, AdminResult};
use crate::modal::ModalKind;
use crate::session::{DeleteSession, Session, SessionError, SessionEvent};
use crate::sync::reconcile::remove_entity;
use crate::sync::{
    classify, send_with, RequestKind, SyncOutcome, SyncRequest, SyncResponse, Transport,
};
use crate::tree::NodeId;

/// A delete request in flight. Carries the ids captured when the delete
/// was started.
#[derive(Debug)]
pub struct PendingDelete {
    generation: u64,
    entity: EntityRef,
    request: SyncRequest,
}

impl PendingDelete {
    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    pub fn request(&self) -> &SyncRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    /// The server refused. Nothing on the page changed.
    Rejected { status: StatusCode, message: String },
    /// The rows were already gone.
    Stale,
}

/// Whether deleting `deleted` takes the rows of `edited` with it.
fn covers(deleted: EntityRef, edited: EntityRef) -> bool {
    match deleted {
        EntityRef::Category { category_id } => edited.category_id() == category_id,
        EntityRef::Link { .. } => deleted == edited,
    }
}

impl Dashboard {
    pub fn delete_link(&mut self, trigger: NodeId) -> AdminResult<()> {
        report("delete_link", self.start_delete(EntityKind::Link, trigger))
    }

    pub fn delete_category(&mut self, trigger: NodeId) -> AdminResult<()> {
        report("delete_category", self.start_delete(EntityKind::Category, trigger))
    }

    fn start_delete(&mut self, kind: EntityKind, trigger: NodeId) -> AdminResult<()> {
        let (entity, row) = self.locate_row(kind, trigger)?;
        self.abandon_session()?;

        let (name_tag, slot_id, modal) = match kind {
            EntityKind::Category => ("h2", "category-name", ModalKind::CategoryDelete),
            EntityKind::Link => ("h3", "link-name", ModalKind::LinkDelete),
        };
        let display_name = match self.tree.find_by_tag(row, name_tag) {
            Some(name) => self.tree.text_content(name)?,
            None => String::new(),
        };
        if let Some(slot) = self.tree.get_element_by_id(slot_id) {
            self.tree.set_text_content(slot, &display_name)?;
        }
        self.modal.open(&mut self.tree, modal, None)?;

        self.machine.transition(SessionEvent::StartDelete(kind))?;
        let generation = self.next_generation();
        self.session = Some(Session::Delete(DeleteSession {
            generation,
            entity,
            display_name,
        }));
        tracing::info!(?entity, generation, "delete requested");
        Ok(())
    }

    /// Builds the delete request for the pending confirmation.
    pub fn begin_confirm_delete(&mut self, kind: EntityKind) -> AdminResult<PendingDelete> {
        report("confirm_delete", self.prepare_delete(kind))
    }

    fn prepare_delete(&mut self, kind: EntityKind) -> AdminResult<PendingDelete> {
        self.machine.check(SessionEvent::ConfirmDelete(kind))?;
        let Some(Session::Delete(delete)) = &self.session else {
            return Err(SessionError::InvalidTransition {
                from: self.machine.state(),
                event: SessionEvent::ConfirmDelete(kind),
            }
            .into());
        };
        Ok(PendingDelete {
            generation: delete.generation,
            entity: delete.entity,
            request: SyncRequest::delete(delete.entity),
        })
    }

    /// Applies the server's answer to a delete. A confirmed delete removes
    /// the rows even if another session has started since.
    pub fn complete_confirm_delete(
        &mut self,
        pending: PendingDelete,
        response: SyncResponse,
    ) -> AdminResult<DeleteOutcome> {
        report("confirm_delete", self.finish_delete(pending, response))
    }

    fn finish_delete(
        &mut self,
        pending: PendingDelete,
        response: SyncResponse,
    ) -> AdminResult<DeleteOutcome> {
        if let SyncOutcome::Rejected { status, message } = classify(RequestKind::Delete, response) {
            tracing::warn!(entity = ?pending.entity, %status, %message, "delete rejected");
            return Ok(DeleteOutcome::Rejected { status, message });
        }

        if matches!(&self.session, Some(Session::Edit(edit)) if covers(pending.entity, edit.entity))
        {
            self.cancel_edit()?;
        }
        let removed = remove_entity(&mut self.tree, pending.entity)?;

        let current = self.session.as_ref().map(Session::generation) == Some(pending.generation);
        if current {
            self.modal
                .close(&mut self.tree, &mut self.scheduler, self.config.close_transition_ms)?;
            self.machine
                .transition(SessionEvent::ConfirmDelete(pending.entity.kind()))?;
            self.session = None;
        }

        if removed {
            tracing::info!(entity = ?pending.entity, "entity deleted");
            Ok(DeleteOutcome::Removed)
        } else {
            tracing::warn!(entity = ?pending.entity, "deleted rows were already gone");
            Ok(DeleteOutcome::Stale)
        }
    }

    fn confirm_delete(
        &mut self,
        kind: EntityKind,
        transport: &mut dyn Transport,
    ) -> AdminResult<DeleteOutcome> {
        let pending = self.begin_confirm_delete(kind)?;
        let response = report(
            "confirm_delete",
            send_with(transport, pending.request()).map_err(AdminError::from),
        )?;
        self.complete_confirm_delete(pending, response)
    }

    pub fn confirm_delete_link(
        &mut self,
        transport: &mut dyn Transport,
    ) -> AdminResult<DeleteOutcome> {
        self.confirm_delete(EntityKind::Link, transport)
    }

    pub fn confirm_delete_category(
        &mut self,
        transport: &mut dyn Transport,
    ) -> AdminResult<DeleteOutcome> {
        self.confirm_delete(EntityKind::Category, transport)
    }

    pub fn cancel_delete(&mut self) -> AdminResult<()> {
        report("cancel_delete", self.close_delete())
    }

    fn close_delete(&mut self) -> AdminResult<()> {
        self.machine.check(SessionEvent::CancelDelete)?;
        self.modal
            .close(&mut self.tree, &mut self.scheduler, self.config.close_transition_ms)?;
        self.machine.transition(SessionEvent::CancelDelete)?;
        if let Some(Session::Delete(delete)) = self.session.take() {
            tracing::info!(entity = ?delete.entity, "delete cancelled");
        }
        Ok(())
    }
}
