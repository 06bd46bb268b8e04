//! Dashboard controller. Owns the page tree, the shared controls and the
//! single edit-or-delete session, and exposes the click handlers the
//! templated action buttons are bound to.

mod create;
mod delete;
mod edit;
#[cfg(test)]
mod fixture;

pub use create::{CreateOutcome, PendingCreate};
pub use delete::{DeleteOutcome, PendingDelete};
pub use edit::{ConfirmOutcome, ConfirmStep, PendingEdit};

use crate::config::AdminConfig;
use crate::entity::{EntityId, EntityKind, EntityRef};
use crate::error::{AdminError, AdminResult};
use crate::forms;
use crate::measure::{FixedAdvanceMetrics, Probes, TextMetrics};
use crate::modal::Modal;
use crate::relocator::{self, SharedControls};
use crate::resizer::{LayoutContext, Resizer};
use crate::scheduler::{Deferred, Scheduler};
use crate::session::{
    DeleteSession, EditSession, Session, SessionError, SessionState, StateMachine,
    StateTransition,
};
use crate::sync::reconcile::{CATEGORY_HEADER_CLASS, LINK_CARD_CLASS};
use crate::tree::{NodeId, Tree};

pub const ICON_UPLOAD_ID: &str = "icon-upload";

pub struct Dashboard {
    tree: Tree,
    probes: Probes,
    metrics: Box<dyn TextMetrics>,
    resizer: Resizer,
    controls: SharedControls,
    scheduler: Scheduler,
    modal: Modal,
    config: AdminConfig,
    machine: StateMachine,
    session: Option<Session>,
    generation: u64,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("state", &self.machine.state())
            .field("session", &self.session)
            .field("modal", &self.modal)
            .finish_non_exhaustive()
    }
}

fn report<T>(operation: &'static str, result: AdminResult<T>) -> AdminResult<T> {
    if let Err(err) = &result {
        tracing::error!(operation, %err, "dashboard operation failed");
    }
    result
}

impl Dashboard {
    pub fn new(
        tree: Tree,
        metrics: Box<dyn TextMetrics>,
        config: AdminConfig,
    ) -> AdminResult<Self> {
        let controls = SharedControls::locate(&tree)
            .ok_or(AdminError::MissingPageElement(relocator::STORAGE_ID))?;
        Ok(Self {
            tree,
            probes: Probes::new(),
            metrics,
            resizer: Resizer::new(&config),
            controls,
            scheduler: Scheduler::new(),
            modal: Modal::new(),
            config,
            machine: StateMachine::new(),
            session: None,
            generation: 0,
        })
    }

    /// Dashboard measuring text with [`FixedAdvanceMetrics`].
    pub fn headless(tree: Tree, config: AdminConfig) -> AdminResult<Self> {
        Self::new(tree, Box::new(FixedAdvanceMetrics::default()), config)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Host access for layout results and typed input.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    pub fn transitions(&self) -> &[StateTransition] {
        self.machine.history()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        match &self.session {
            Some(Session::Edit(edit)) => Some(edit),
            _ => None,
        }
    }

    pub fn delete_session(&self) -> Option<&DeleteSession> {
        match &self.session {
            Some(Session::Delete(delete)) => Some(delete),
            _ => None,
        }
    }

    pub fn controls(&self) -> SharedControls {
        self.controls
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn resizer(&self) -> &Resizer {
        &self.resizer
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn row_id(&self, kind: EntityKind, row: NodeId) -> AdminResult<EntityId> {
        let element_id = self.tree.node(row)?.attr("id").unwrap_or_default();
        EntityId::parse_prefix(element_id).ok_or_else(|| {
            SessionError::MissingIdentifier {
                kind,
                element_id: element_id.to_string(),
            }
            .into()
        })
    }

    /// Resolves the row a clicked control belongs to. Edit and delete both
    /// resolve through here, so a link's category always comes from the
    /// header preceding its grid at click time.
    fn locate_row(&self, kind: EntityKind, trigger: NodeId) -> AdminResult<(EntityRef, NodeId)> {
        let missing = |part| SessionError::MissingElement { kind, part };
        match kind {
            EntityKind::Category => {
                let header = self
                    .tree
                    .closest_with_class(trigger, CATEGORY_HEADER_CLASS)
                    .ok_or(missing("header"))?;
                let category_id = self.row_id(kind, header)?;
                Ok((EntityRef::Category { category_id }, header))
            }
            EntityKind::Link => {
                let card = self
                    .tree
                    .closest_with_class(trigger, LINK_CARD_CLASS)
                    .ok_or(missing("card"))?;
                let link_id = self.row_id(kind, card)?;
                let grid = self.tree.parent(card)?.ok_or(missing("link grid"))?;
                let header = self
                    .tree
                    .previous_sibling(grid)
                    .ok_or(missing("category header"))?;
                let category_id = self.row_id(EntityKind::Category, header)?;
                Ok((
                    EntityRef::Link {
                        category_id,
                        link_id,
                    },
                    card,
                ))
            }
        }
    }

    /// Fully ends whatever session is live. Completes before returning, so
    /// a new session never overlaps the old one.
    fn abandon_session(&mut self) -> AdminResult<()> {
        match &self.session {
            Some(Session::Edit(_)) => self.cancel_edit(),
            Some(Session::Delete(_)) => self.cancel_delete(),
            None => Ok(()),
        }
    }

    /// Background click or close button on the modal.
    pub fn close_modal(&mut self) -> AdminResult<()> {
        if self.delete_session().is_some() {
            return self.cancel_delete();
        }
        report(
            "close_modal",
            self.modal
                .close(&mut self.tree, &mut self.scheduler, self.config.close_transition_ms)
                .map_err(AdminError::from),
        )
    }

    /// Content change in an edit field.
    pub fn on_field_input(&mut self, field: NodeId) -> AdminResult<()> {
        let mut ctx = LayoutContext {
            tree: &mut self.tree,
            probes: &mut self.probes,
            metrics: self.metrics.as_ref(),
        };
        report("field_input", self.resizer.on_input(&mut ctx, field).map_err(AdminError::from))
    }

    pub fn on_viewport_resize(&mut self) {
        self.resizer.on_viewport_resize(&mut self.scheduler);
    }

    /// Runs the work queued for the frame about to render.
    pub fn on_frame(&mut self) -> AdminResult<()> {
        for task in self.scheduler.take_frame_tasks() {
            self.run_deferred(task)?;
        }
        Ok(())
    }

    /// Advances the timer clock and runs whatever came due.
    pub fn advance_clock(&mut self, elapsed_ms: u64) -> AdminResult<()> {
        for task in self.scheduler.advance(elapsed_ms) {
            self.run_deferred(task)?;
        }
        Ok(())
    }

    fn run_deferred(&mut self, task: Deferred) -> AdminResult<()> {
        tracing::trace!(?task, "running deferred task");
        match task {
            Deferred::ViewportResize => {
                let mut ctx = LayoutContext {
                    tree: &mut self.tree,
                    probes: &mut self.probes,
                    metrics: self.metrics.as_ref(),
                };
                self.resizer.on_frame(&mut ctx)?;
            }
            Deferred::FocusNode(node) => {
                if self.tree.contains(node) {
                    self.tree.focus(node)?;
                }
            }
            Deferred::ResetForm(kind) => forms::reset(&mut self.tree, kind)?,
            Deferred::HideModalContents(kind) => self.modal.hide_contents(&mut self.tree, kind)?,
        }
        Ok(())
    }
}
