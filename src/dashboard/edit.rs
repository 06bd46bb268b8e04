use http::StatusCode;

use super::{report, Dashboard, ICON_UPLOAD_ID};
use crate::entity::{EntityKind, EntityRef};
use crate::error::{AdminError, AdminResult};
use crate::icon::{icon_to_data_url, IconAccept, IconFile};
use crate::relocator::SharedControl;
use crate::resizer::{FieldTarget, LayoutContext};
use crate::scheduler::Deferred;
use crate::session::{EditNodes, EditSession, Session, SessionError, SessionEvent, Snapshot};
use crate::sync::reconcile::{
    EDIT_ACTIONS_ATTR, IMG_CONTAINER_ATTR, PRIMARY_ACTIONS_ATTR, TEXT_CONTAINER_ATTR,
};
use crate::sync::{
    classify, send_with, FormData, RequestKind, SyncOutcome, SyncRequest, SyncResponse, Transport,
};
use crate::tree::NodeId;

/// First half of a confirm: what, if anything, has to go to the server.
#[derive(Debug)]
pub enum ConfirmStep {
    /// Name is empty after trimming. Nothing was sent.
    Invalid,
    /// Nothing differs from the snapshot. The edit has been closed.
    Unchanged,
    Pending(PendingEdit),
}

/// An update request in flight for one edit session.
#[derive(Debug)]
pub struct PendingEdit {
    generation: u64,
    entity: EntityRef,
    name: String,
    description: Option<String>,
    request: SyncRequest,
}

impl PendingEdit {
    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    pub fn request(&self) -> &SyncRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Invalid,
    Unchanged,
    Applied,
    /// The server refused. The fields stay open with the user's input.
    Rejected { status: StatusCode, message: String },
    /// The session this response belonged to has already ended.
    Stale,
}

enum EditExit {
    Cancel,
    Unchanged,
    Saved {
        name: String,
        description: Option<String>,
    },
}

impl Dashboard {
    pub fn edit_link(&mut self, trigger: NodeId) -> AdminResult<()> {
        report("edit_link", self.start_edit(EntityKind::Link, trigger))
    }

    pub fn edit_category(&mut self, trigger: NodeId) -> AdminResult<()> {
        report("edit_category", self.start_edit(EntityKind::Category, trigger))
    }

    fn start_edit(&mut self, kind: EntityKind, trigger: NodeId) -> AdminResult<()> {
        let (entity, row) = self.locate_row(kind, trigger)?;
        self.abandon_session()?;

        let missing = |part| SessionError::MissingElement { kind, part };
        let image_container = self
            .tree
            .find_by_attr(row, IMG_CONTAINER_ATTR)
            .ok_or(missing("icon"))?;
        let image = self
            .tree
            .find_by_tag(image_container, "img")
            .ok_or(missing("icon"))?;
        let edit_actions = self
            .tree
            .find_by_attr(row, EDIT_ACTIONS_ATTR)
            .ok_or(missing("edit actions"))?;
        let primary_actions = self.tree.find_by_attr(edit_actions, PRIMARY_ACTIONS_ATTR);
        let (name, description) = match kind {
            EntityKind::Category => (
                self.tree.find_by_tag(row, "h2").ok_or(missing("name"))?,
                None,
            ),
            EntityKind::Link => {
                let text = self
                    .tree
                    .find_by_attr(row, TEXT_CONTAINER_ATTR)
                    .ok_or(missing("text"))?;
                (
                    self.tree.find_by_tag(text, "h3").ok_or(missing("name"))?,
                    Some(self.tree.find_by_tag(text, "p").ok_or(missing("description"))?),
                )
            }
        };

        let original = Snapshot {
            name: self.tree.text_content(name)?,
            description: description
                .map(|node| self.tree.text_content(node))
                .transpose()?,
            icon_src: self.tree.node(image)?.attr("src").map(str::to_string),
        };

        self.controls
            .relocate(&mut self.tree, SharedControl::IconPicker, image_container)?;
        self.controls
            .relocate(&mut self.tree, SharedControl::ConfirmActions, edit_actions)?;
        if let Some(primary) = primary_actions {
            self.tree.node_mut(primary)?.style.hidden = true;
        }
        if let Some(upload) = self.tree.get_element_by_id(ICON_UPLOAD_ID) {
            self.tree
                .node_mut(upload)?
                .set_attr("accept", accepted_icons(kind).as_attr());
        }

        let mut targets = vec![FieldTarget::grow(name)];
        targets.extend(description.map(FieldTarget::fill));
        let mut ctx = LayoutContext {
            tree: &mut self.tree,
            probes: &mut self.probes,
            metrics: self.metrics.as_ref(),
        };
        let (fields, guard) = match self.resizer.replace_with_fields(&mut ctx, &targets) {
            Ok(replaced) => replaced,
            Err(err) => {
                self.controls.unrelocate_all(&mut self.tree)?;
                if let Some(primary) = primary_actions {
                    self.tree.node_mut(primary)?.style.hidden = false;
                }
                return Err(err.into());
            }
        };
        let name_field = fields[0];
        self.scheduler.set_timeout(0, Deferred::FocusNode(name_field));

        self.machine.transition(SessionEvent::StartEdit(kind))?;
        let generation = self.next_generation();
        self.session = Some(Session::Edit(EditSession {
            generation,
            entity,
            original,
            nodes: EditNodes {
                image,
                edit_actions,
                primary_actions,
                name_field,
                description_field: fields.get(1).copied(),
            },
            staged_icon: None,
            cleanup: Some(guard),
        }));
        tracing::info!(?entity, generation, "edit started");
        Ok(())
    }

    /// Previews a picked icon on the edited row and stages it for upload.
    pub fn select_icon(&mut self, file: IconFile) -> AdminResult<()> {
        report("select_icon", self.stage_icon(file))
    }

    fn stage_icon(&mut self, file: IconFile) -> AdminResult<()> {
        let Some(Session::Edit(edit)) = self.session.as_mut() else {
            return Err(SessionError::NoActiveEdit.into());
        };
        accepted_icons(edit.entity.kind()).check(&file)?;
        let url = icon_to_data_url(&file, &self.config.svg_theme_color)?;
        self.tree.node_mut(edit.nodes.image)?.set_attr("src", url);
        if let Some(upload) = self.tree.get_element_by_id(ICON_UPLOAD_ID) {
            self.tree.node_mut(upload)?.set_files(vec![file.clone()]);
        }
        tracing::debug!(icon = %file.name, "icon staged");
        edit.staged_icon = Some(file);
        Ok(())
    }

    /// Validates the fields and builds the update for whatever changed.
    pub fn begin_confirm_edit(&mut self) -> AdminResult<ConfirmStep> {
        report("confirm_edit", self.prepare_confirm())
    }

    fn prepare_confirm(&mut self) -> AdminResult<ConfirmStep> {
        self.machine.check(SessionEvent::Confirm)?;
        let Some(Session::Edit(edit)) = &self.session else {
            return Err(SessionError::NoActiveEdit.into());
        };
        let generation = edit.generation;
        let entity = edit.entity;
        let nodes = edit.nodes;
        let original = edit.original.clone();
        let staged_icon = edit.staged_icon.clone();

        let name = self.read_trimmed(nodes.name_field)?;
        let description = nodes
            .description_field
            .map(|field| self.read_trimmed(field))
            .transpose()?;
        if name.is_empty() {
            tracing::debug!(?entity, "confirm ignored: name is empty");
            return Ok(ConfirmStep::Invalid);
        }

        let mut body = FormData::new();
        if name != original.name {
            body.append_text("name", name.clone());
        }
        if let Some(description) = &description {
            if original.description.as_ref() != Some(description) {
                body.append_text("description", description.clone());
            }
        }
        if let Some(icon) = staged_icon {
            body.append_file("icon", icon);
        }
        if body.is_empty() {
            self.close_edit(EditExit::Unchanged)?;
            return Ok(ConfirmStep::Unchanged);
        }

        Ok(ConfirmStep::Pending(PendingEdit {
            generation,
            entity,
            name,
            description,
            request: SyncRequest::update(entity, body),
        }))
    }

    fn read_trimmed(&mut self, field: NodeId) -> AdminResult<String> {
        let node = self.tree.node_mut(field)?;
        let trimmed = node.value().unwrap_or_default().trim().to_string();
        node.set_value(trimmed.clone());
        Ok(trimmed)
    }

    /// Applies the server's answer to an update begun by
    /// [`Dashboard::begin_confirm_edit`].
    pub fn complete_confirm_edit(
        &mut self,
        pending: PendingEdit,
        response: SyncResponse,
    ) -> AdminResult<ConfirmOutcome> {
        let current = matches!(
            &self.session,
            Some(Session::Edit(edit)) if edit.generation == pending.generation
        );
        if !current {
            tracing::warn!(entity = ?pending.entity, "dropping update response for an ended edit");
            return Ok(ConfirmOutcome::Stale);
        }

        match classify(RequestKind::Update, response) {
            SyncOutcome::Accepted(_) => {
                if let Some(upload) = self.tree.get_element_by_id(ICON_UPLOAD_ID) {
                    let node = self.tree.node_mut(upload)?;
                    node.set_files(Vec::new());
                    node.set_value("");
                }
                report(
                    "confirm_edit",
                    self.close_edit(EditExit::Saved {
                        name: pending.name,
                        description: pending.description,
                    }),
                )?;
                Ok(ConfirmOutcome::Applied)
            }
            SyncOutcome::Rejected { status, message } => {
                tracing::warn!(entity = ?pending.entity, %status, %message, "update rejected");
                Ok(ConfirmOutcome::Rejected { status, message })
            }
        }
    }

    /// Runs a whole confirm against `transport`. A transport failure leaves
    /// the edit open.
    pub fn confirm_edit(&mut self, transport: &mut dyn Transport) -> AdminResult<ConfirmOutcome> {
        let pending = match self.begin_confirm_edit()? {
            ConfirmStep::Invalid => return Ok(ConfirmOutcome::Invalid),
            ConfirmStep::Unchanged => return Ok(ConfirmOutcome::Unchanged),
            ConfirmStep::Pending(pending) => pending,
        };
        let response = report(
            "confirm_edit",
            send_with(transport, pending.request()).map_err(AdminError::from),
        )?;
        self.complete_confirm_edit(pending, response)
    }

    pub fn cancel_edit(&mut self) -> AdminResult<()> {
        report("cancel_edit", self.close_edit(EditExit::Cancel))
    }

    fn close_edit(&mut self, exit: EditExit) -> AdminResult<()> {
        let event = match exit {
            EditExit::Cancel => SessionEvent::Cancel,
            EditExit::Unchanged | EditExit::Saved { .. } => SessionEvent::Confirm,
        };
        self.machine.check(event)?;
        let Some(Session::Edit(edit)) = &self.session else {
            return Err(SessionError::NoActiveEdit.into());
        };
        let entity = edit.entity;
        let nodes = edit.nodes;
        let original = edit.original.clone();
        let revert = matches!(exit, EditExit::Cancel) && edit.staged_icon.is_some();

        // the session stays in place until every tree change has landed
        if revert {
            self.revert_icon(nodes.image, original.icon_src.as_deref())?;
        }
        let (name, description) = match exit {
            EditExit::Saved { name, description } => (name, description),
            EditExit::Cancel | EditExit::Unchanged => (original.name, original.description),
        };

        if let Some(primary) = nodes.primary_actions.filter(|id| self.tree.contains(*id)) {
            self.tree.node_mut(primary)?.style.hidden = false;
        }
        self.controls.unrelocate_all(&mut self.tree)?;
        if self.tree.contains(nodes.name_field) {
            self.resizer
                .restore(&mut self.tree, nodes.name_field, &name)?;
        }
        if let (Some(field), Some(text)) = (nodes.description_field, description) {
            if self.tree.contains(field) {
                self.resizer.restore(&mut self.tree, field, &text)?;
            }
        }

        self.machine.transition(event)?;
        if let Some(Session::Edit(mut edit)) = self.session.take() {
            drop(edit.cleanup.take());
        }
        tracing::info!(?entity, ?event, "edit closed");
        Ok(())
    }

    fn revert_icon(&mut self, image: NodeId, src: Option<&str>) -> AdminResult<()> {
        if !self.tree.contains(image) {
            return Ok(());
        }
        let node = self.tree.node_mut(image)?;
        match src {
            Some(src) => node.set_attr("src", src),
            None => node.remove_attr("src"),
        }
        if let Some(upload) = self.tree.get_element_by_id(ICON_UPLOAD_ID) {
            self.tree.node_mut(upload)?.set_files(Vec::new());
        }
        Ok(())
    }
}

pub(super) fn accepted_icons(kind: EntityKind) -> IconAccept {
    match kind {
        EntityKind::Category => IconAccept::SvgOnly,
        EntityKind::Link => IconAccept::AnyImage,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::{json, ok, Page, ScriptedTransport};
    use super::*;
    use crate::icon::SVG_MIME;
    use crate::relocator::SharedControl;
    use crate::session::SessionState;
    use crate::sync::FormValue;
    use http::Method;

    fn fields(page: &Page) -> (NodeId, Option<NodeId>) {
        let nodes = page.dashboard.edit_session().expect("editing").nodes();
        (nodes.name_field, nodes.description_field)
    }

    #[test]
    fn edit_link_swaps_text_for_fields_and_moves_controls_in() {
        let mut page = Page::new();
        let card = page.link_cards[0];

        page.dashboard.edit_link(page.link_edit[0]).expect("edit");

        assert_eq!(page.dashboard.state(), SessionState::EditingLink);
        let (name, description) = fields(&page);
        let tree = page.dashboard.tree();
        assert_eq!(tree.node(name).unwrap().value(), Some("Git"));
        assert_eq!(
            tree.node(description.expect("link has a description")).unwrap().value(),
            Some("Source hosting")
        );
        let picker = page
            .dashboard
            .controls()
            .holder(tree, SharedControl::IconPicker)
            .unwrap()
            .unwrap();
        assert!(tree.node(picker).unwrap().attr("data-img-container").is_some());
        assert!(tree.descendants(card).contains(&picker));
        let primary = tree.find_by_attr(card, PRIMARY_ACTIONS_ATTR).unwrap();
        assert!(tree.node(primary).unwrap().style.hidden);
        let upload = tree.get_element_by_id(ICON_UPLOAD_ID).unwrap();
        assert_eq!(tree.node(upload).unwrap().attr("accept"), Some("image/*"));
        assert!(page.dashboard.edit_session().unwrap().is_tracking_resizes());
    }

    #[test]
    fn cancel_restores_exact_originals_after_typing_and_icon_change() {
        let mut page = Page::new();
        let card = page.link_cards[0];
        page.dashboard.edit_link(page.link_edit[0]).expect("edit");
        let (name, description) = fields(&page);

        page.type_into(name, "Gitea mirror with a long name");
        page.type_into(description.unwrap(), "");
        page.dashboard
            .select_icon(IconFile::new("new.png", "image/png", vec![1, 2, 3]))
            .expect("png is fine for links");
        assert!(page.icon_src(card).unwrap().starts_with("data:image/png;base64,"));

        page.dashboard.cancel_edit().expect("cancel");

        assert_eq!(page.dashboard.state(), SessionState::Idle);
        assert_eq!(page.text_of(page.name_node(card, "h3")), "Git");
        assert_eq!(page.text_of(page.name_node(card, "p")), "Source hosting");
        assert_eq!(page.icon_src(card).as_deref(), Some("/icons/10.png"));
        let tree = page.dashboard.tree();
        let primary = tree.find_by_attr(card, PRIMARY_ACTIONS_ATTR).unwrap();
        assert!(!tree.node(primary).unwrap().style.hidden);
        assert!(page.dashboard.controls().is_stored(tree).unwrap());
        assert_eq!(page.dashboard.resizer().active_listener_count(), 0);
    }

    #[test]
    fn restored_text_keeps_original_tag_and_class() {
        let mut page = Page::new();
        page.dashboard.edit_category(page.category_edit).expect("edit");
        page.dashboard.cancel_edit().expect("cancel");

        let header = page.name_node(page.category_header, "h2");
        let node = page.dashboard.tree().node(header).unwrap();
        assert_eq!(node.class_name(), "text-2xl font-semibold");
        assert_eq!(node.style.text.font_size, 24.0);
    }

    #[test]
    fn confirm_sends_only_changed_fields_and_shows_new_values() {
        let mut page = Page::new();
        let card = page.link_cards[1];
        page.dashboard.edit_link(page.link_edit[1]).expect("edit");
        let (name, _) = fields(&page);
        page.type_into(name, "  Manuals  ");
        let mut transport = ScriptedTransport::replying([ok()]);

        let outcome = page.dashboard.confirm_edit(&mut transport).expect("confirm");

        assert_eq!(outcome, ConfirmOutcome::Applied);
        assert_eq!(transport.sent.len(), 1);
        let request = &transport.sent[0];
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.path, "/api/category/1/link/11");
        assert_eq!(request.body.names().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(request.body.text("name"), Some("Manuals"));
        assert_eq!(page.text_of(page.name_node(card, "h3")), "Manuals");
        assert_eq!(page.text_of(page.name_node(card, "p")), "Reference manuals");
        assert_eq!(page.dashboard.state(), SessionState::Idle);
    }

    #[test]
    fn confirm_with_blank_name_stays_editing_and_sends_nothing() {
        let mut page = Page::new();
        page.dashboard.edit_link(page.link_edit[0]).expect("edit");
        let (name, _) = fields(&page);
        page.type_into(name, "   ");
        let mut transport = ScriptedTransport::default();

        let outcome = page.dashboard.confirm_edit(&mut transport).expect("confirm");

        assert_eq!(outcome, ConfirmOutcome::Invalid);
        assert!(transport.sent.is_empty());
        assert_eq!(page.dashboard.state(), SessionState::EditingLink);
        assert_eq!(page.dashboard.tree().node(name).unwrap().value(), Some(""));
    }

    #[test]
    fn unchanged_confirm_makes_no_request_and_ends_the_edit() {
        let mut page = Page::new();
        page.dashboard.edit_category(page.category_edit).expect("edit");
        let (name, _) = fields(&page);
        page.type_into(name, " Dev Tools ");
        let mut transport = ScriptedTransport::default();

        let outcome = page.dashboard.confirm_edit(&mut transport).expect("confirm");

        assert_eq!(outcome, ConfirmOutcome::Unchanged);
        assert!(transport.sent.is_empty());
        assert_eq!(page.dashboard.state(), SessionState::Idle);
        assert_eq!(
            page.text_of(page.name_node(page.category_header, "h2")),
            "Dev Tools"
        );
    }

    #[test]
    fn rejected_update_keeps_fields_and_session() {
        let mut page = Page::new();
        page.dashboard.edit_link(page.link_edit[0]).expect("edit");
        let (name, _) = fields(&page);
        page.type_into(name, "Forge");
        let mut transport =
            ScriptedTransport::replying([json(409, r#"{"message":"name already taken"}"#)]);

        let outcome = page.dashboard.confirm_edit(&mut transport).expect("confirm");

        assert_eq!(
            outcome,
            ConfirmOutcome::Rejected {
                status: StatusCode::CONFLICT,
                message: "name already taken".to_string()
            }
        );
        assert_eq!(page.dashboard.state(), SessionState::EditingLink);
        assert_eq!(page.dashboard.tree().node(name).unwrap().value(), Some("Forge"));
        assert!(page.dashboard.edit_session().unwrap().is_tracking_resizes());
    }

    #[test]
    fn transport_failure_is_an_error_and_keeps_editing() {
        let mut page = Page::new();
        page.dashboard.edit_link(page.link_edit[0]).expect("edit");
        let (name, _) = fields(&page);
        page.type_into(name, "Forge");
        let mut transport = ScriptedTransport::default();

        let err = page
            .dashboard
            .confirm_edit(&mut transport)
            .expect_err("nothing answers");

        assert!(matches!(err, AdminError::Sync(_)));
        assert_eq!(page.dashboard.state(), SessionState::EditingLink);
    }

    #[test]
    fn response_for_a_replaced_session_is_ignored() {
        let mut page = Page::new();
        page.dashboard.edit_link(page.link_edit[0]).expect("edit");
        let (name, _) = fields(&page);
        page.type_into(name, "Forge");
        let ConfirmStep::Pending(pending) = page.dashboard.begin_confirm_edit().expect("begin")
        else {
            panic!("name changed, so an update is due");
        };

        page.dashboard.edit_link(page.link_edit[1]).expect("second click wins");
        let outcome = page
            .dashboard
            .complete_confirm_edit(pending, ok())
            .expect("complete");

        assert_eq!(outcome, ConfirmOutcome::Stale);
        assert_eq!(page.dashboard.state(), SessionState::EditingLink);
        assert_eq!(page.text_of(page.name_node(page.link_cards[0], "h3")), "Git");
        let (second, _) = fields(&page);
        assert_eq!(page.dashboard.tree().node(second).unwrap().value(), Some("Docs"));
    }

    #[test]
    fn category_icons_must_be_svg_and_get_the_theme_color() {
        let mut page = Page::new();
        page.dashboard.edit_category(page.category_edit).expect("edit");

        let err = page
            .dashboard
            .select_icon(IconFile::new("photo.png", "image/png", vec![0]))
            .expect_err("categories take svg only");
        assert!(matches!(err, AdminError::Icon(_)));

        let svg = r#"<svg fill="currentColor"/>"#;
        page.dashboard
            .select_icon(IconFile::new("dev.svg", SVG_MIME, svg.as_bytes().to_vec()))
            .expect("svg accepted");
        let mut transport = ScriptedTransport::replying([ok()]);
        page.dashboard.confirm_edit(&mut transport).expect("confirm");

        let request = &transport.sent[0];
        assert_eq!(request.path, "/api/category/1");
        assert!(matches!(
            request.body.get("icon"),
            Some(FormValue::File(file)) if file.name == "dev.svg"
        ));
        let src = page.icon_src(page.category_header).unwrap();
        assert!(src.starts_with("data:image/svg+xml"));
        let tree = page.dashboard.tree();
        let upload = tree.get_element_by_id(ICON_UPLOAD_ID).unwrap();
        assert!(tree.node(upload).unwrap().files().is_empty());
    }

    #[test]
    fn select_icon_without_an_edit_fails() {
        let mut page = Page::new();

        let err = page
            .dashboard
            .select_icon(IconFile::new("a.png", "image/png", vec![0]))
            .expect_err("no edit");

        assert!(matches!(err, AdminError::Session(SessionError::NoActiveEdit)));
    }

    #[test]
    fn failed_cancel_keeps_session_and_state_in_step() {
        let mut page = Page::new();
        page.dashboard.edit_link(page.link_edit[0]).expect("edit");
        let storage = page.dashboard.controls().storage();
        page.dashboard.tree_mut().remove(storage).unwrap();

        let err = page
            .dashboard
            .cancel_edit()
            .expect_err("controls have nowhere to go");

        assert!(matches!(err, AdminError::Tree(_)));
        assert_eq!(page.dashboard.state(), SessionState::EditingLink);
        let edit = page.dashboard.edit_session().expect("session kept");
        assert!(edit.is_tracking_resizes());
    }

    #[test]
    fn confirm_and_cancel_are_invalid_when_idle() {
        let mut page = Page::new();

        assert!(matches!(
            page.dashboard.begin_confirm_edit(),
            Err(AdminError::Session(SessionError::InvalidTransition { .. }))
        ));
        assert!(matches!(
            page.dashboard.cancel_edit(),
            Err(AdminError::Session(SessionError::InvalidTransition { .. }))
        ));
    }
}
