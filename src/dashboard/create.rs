use http::StatusCode;

use super::edit::accepted_icons;
use super::{report, Dashboard};
use crate::entity::EntityId;
use crate::error::{AdminError, AdminResult};
use crate::forms::{self, FormKind};
use crate::icon::icon_to_data_url;
use crate::modal::ModalKind;
use crate::scheduler::Deferred;
use crate::session::SessionError;
use crate::sync::reconcile::{
    insert_category, insert_link_card, NewRow, CATEGORY_ID_ATTR, OPEN_MODAL_ATTR,
};
use crate::sync::{
    classify, send_with, RequestKind, SyncError, SyncOutcome, SyncRequest, SyncResponse, Transport,
};
use crate::tree::NodeId;

/// A create request built from one of the creation forms.
#[derive(Debug)]
pub struct PendingCreate {
    kind: FormKind,
    category_id: Option<EntityId>,
    /// Preview of the uploaded icon, converted before the request is sent.
    icon_src: Option<String>,
    request: SyncRequest,
}

impl PendingCreate {
    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn request(&self) -> &SyncRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A required input is blank. Nothing was sent.
    Invalid,
    /// New row inserted. Holds the category header or the link card.
    Inserted(NodeId),
    /// The server refused. Its message is shown in the form.
    Rejected { status: StatusCode, message: String },
    /// The category the link belonged to is no longer on the page.
    Stale,
}

const fn modal_for(kind: FormKind) -> ModalKind {
    match kind {
        FormKind::Category => ModalKind::Category,
        FormKind::Link => ModalKind::Link,
    }
}

impl Dashboard {
    /// Opens a creation form. Links need the category they will join.
    pub fn open_create_modal(
        &mut self,
        kind: FormKind,
        category_id: Option<EntityId>,
    ) -> AdminResult<()> {
        report("open_create_modal", self.open_form(kind, category_id))
    }

    /// Opens the form named by a trigger's `data-open-modal` attribute,
    /// such as the "add link" tile at the end of each grid.
    pub fn open_modal_for(&mut self, trigger: NodeId) -> AdminResult<()> {
        let node = self.tree.node(trigger)?;
        let kind = match node.attr(OPEN_MODAL_ATTR) {
            Some("category") => FormKind::Category,
            Some("link") => FormKind::Link,
            _ => return Err(AdminError::MissingPageElement(OPEN_MODAL_ATTR)),
        };
        let category_id = node.attr(CATEGORY_ID_ATTR).and_then(EntityId::parse_prefix);
        self.open_create_modal(kind, category_id)
    }

    fn open_form(&mut self, kind: FormKind, category_id: Option<EntityId>) -> AdminResult<()> {
        let target = match kind {
            FormKind::Category => None,
            FormKind::Link => Some(category_id.ok_or(SessionError::MissingTargetCategory)?),
        };
        self.modal.open(&mut self.tree, modal_for(kind), target)?;
        Ok(())
    }

    /// Checks the form and builds its create request. `None` when a
    /// required input is blank; those inputs are marked invalid. An icon of
    /// the wrong type, or one that cannot be previewed, fails here so the
    /// server is never asked to create a row the page could not show.
    pub fn begin_create(&mut self, kind: FormKind) -> AdminResult<Option<PendingCreate>> {
        report("create", self.prepare_create(kind))
    }

    fn prepare_create(&mut self, kind: FormKind) -> AdminResult<Option<PendingCreate>> {
        forms::mark_required(&mut self.tree, kind)?;
        if forms::has_blank_required(&self.tree, kind)? {
            tracing::debug!(form = kind.form_id(), "create blocked by blank required input");
            return Ok(None);
        }
        let form = forms::collect(&self.tree, kind)?
            .ok_or(AdminError::MissingPageElement(kind.form_id()))?;
        let icon_src = match form.file("icon") {
            Some(file) => {
                accepted_icons(kind.entity_kind()).check(file)?;
                Some(icon_to_data_url(file, &self.config.svg_theme_color)?)
            }
            None => None,
        };

        let (category_id, request) = match kind {
            FormKind::Category => (None, SyncRequest::create_category(form)),
            FormKind::Link => {
                let category_id = self
                    .modal
                    .target_category()
                    .ok_or(SessionError::MissingTargetCategory)?;
                (Some(category_id), SyncRequest::create_link(category_id, form))
            }
        };
        Ok(Some(PendingCreate {
            kind,
            category_id,
            icon_src,
            request,
        }))
    }

    pub fn complete_create(
        &mut self,
        pending: PendingCreate,
        response: SyncResponse,
    ) -> AdminResult<CreateOutcome> {
        report("create", self.finish_create(pending, response))
    }

    fn finish_create(
        &mut self,
        pending: PendingCreate,
        response: SyncResponse,
    ) -> AdminResult<CreateOutcome> {
        let body = match classify(RequestKind::Create, response) {
            SyncOutcome::Accepted(body) => body,
            SyncOutcome::Rejected { status, message } => {
                tracing::warn!(form = pending.kind.form_id(), %status, %message, "create rejected");
                forms::show_message(&mut self.tree, pending.kind, &message)?;
                return Ok(CreateOutcome::Rejected { status, message });
            }
        };

        let form = &pending.request.body;
        let icon_src = pending.icon_src.as_deref();
        let inserted = match pending.kind {
            FormKind::Category => {
                let category = body
                    .category
                    .ok_or(SyncError::MissingCreatedEntity("category"))?;
                let name = category
                    .name
                    .as_deref()
                    .or(form.text("name"))
                    .unwrap_or_default();
                let row = NewRow {
                    id: category.id,
                    name,
                    description: "",
                    icon_src,
                };
                Some(insert_category(&mut self.tree, &row)?)
            }
            FormKind::Link => {
                let link = body.link.ok_or(SyncError::MissingCreatedEntity("link"))?;
                let category_id = pending
                    .category_id
                    .ok_or(SessionError::MissingTargetCategory)?;
                let row = NewRow {
                    id: link.id,
                    name: link.name.as_deref().or(form.text("name")).unwrap_or_default(),
                    description: link
                        .description
                        .as_deref()
                        .or(form.text("description"))
                        .unwrap_or_default(),
                    icon_src,
                };
                insert_link_card(&mut self.tree, category_id, &row)?
            }
        };

        if self.modal.active() == Some(modal_for(pending.kind)) {
            self.modal
                .close(&mut self.tree, &mut self.scheduler, self.config.close_transition_ms)?;
        }
        self.scheduler
            .set_timeout(self.config.close_transition_ms, Deferred::ResetForm(pending.kind));

        Ok(match inserted {
            Some(node) => {
                tracing::info!(form = pending.kind.form_id(), node, "created");
                CreateOutcome::Inserted(node)
            }
            None => CreateOutcome::Stale,
        })
    }

    /// Runs a whole create against `transport`.
    pub fn submit_create(
        &mut self,
        kind: FormKind,
        transport: &mut dyn Transport,
    ) -> AdminResult<CreateOutcome> {
        let Some(pending) = self.begin_create(kind)? else {
            return Ok(CreateOutcome::Invalid);
        };
        let response = report(
            "create",
            send_with(transport, pending.request()).map_err(AdminError::from),
        )?;
        self.complete_create(pending, response)
    }
}
