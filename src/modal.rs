use crate::entity::EntityId;
use crate::forms::{self, FormKind};
use crate::scheduler::{Deferred, Scheduler};
use crate::tree::{Tree, TreeResult};

pub const CONTAINER_ID: &str = "modal-container";
pub const BLUR_TARGET_ID: &str = "blur-target";
const VISIBLE_CLASS: &str = "is-visible";
const HIDDEN_CLASS: &str = "hidden";
const PAGE_BLUR: &str = "blur(20px)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Category,
    Link,
    CategoryDelete,
    LinkDelete,
}

impl ModalKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Link => "link",
            Self::CategoryDelete => "category-delete",
            Self::LinkDelete => "link-delete",
        }
    }

    pub fn contents_id(self) -> String {
        format!("{}-contents", self.name())
    }

    pub const fn form(self) -> Option<FormKind> {
        match self {
            Self::Category => Some(FormKind::Category),
            Self::Link => Some(FormKind::Link),
            Self::CategoryDelete | Self::LinkDelete => None,
        }
    }
}

/// Open/close chrome for the dashboard's single modal surface.
#[derive(Debug, Default)]
pub struct Modal {
    active: Option<ModalKind>,
    target_category: Option<EntityId>,
}

impl Modal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ModalKind> {
        self.active
    }

    /// Category a new link will be created in.
    pub fn target_category(&self) -> Option<EntityId> {
        self.target_category
    }

    fn set_visible(tree: &mut Tree, visible: bool) -> TreeResult<()> {
        let Some(container) = tree.get_element_by_id(CONTAINER_ID) else {
            return Ok(());
        };
        let panel = tree.node(container)?.children().first().copied();
        for id in std::iter::once(container).chain(panel) {
            let node = tree.node_mut(id)?;
            if visible {
                node.add_class(VISIBLE_CLASS);
            } else {
                node.remove_class(VISIBLE_CLASS);
            }
        }
        Ok(())
    }

    fn set_page_blur(tree: &mut Tree, blurred: bool) -> TreeResult<()> {
        if let Some(page) = tree.get_element_by_id(BLUR_TARGET_ID) {
            tree.node_mut(page)?.style.filter = blurred.then(|| PAGE_BLUR.to_string());
        }
        Ok(())
    }

    pub fn open(
        &mut self,
        tree: &mut Tree,
        kind: ModalKind,
        target_category: Option<EntityId>,
    ) -> TreeResult<()> {
        self.active = Some(kind);
        self.target_category = target_category;

        Self::set_page_blur(tree, true)?;
        if let Some(contents) = tree.get_element_by_id(&kind.contents_id()) {
            tree.node_mut(contents)?.remove_class(HIDDEN_CLASS);
        }
        Self::set_visible(tree, true)?;
        if let Some(form) = kind.form() {
            forms::reset(tree, form)?;
        }
        tracing::debug!(modal = kind.name(), "opened modal");
        Ok(())
    }

    /// Starts the close transition. The contents are hidden once the
    /// transition has had `transition_ms` to play.
    pub fn close(
        &mut self,
        tree: &mut Tree,
        scheduler: &mut Scheduler,
        transition_ms: u64,
    ) -> TreeResult<()> {
        Self::set_page_blur(tree, false)?;
        Self::set_visible(tree, false)?;

        if let Some(kind) = self.active.take() {
            scheduler.set_timeout(transition_ms, Deferred::HideModalContents(kind));
            if let Some(form) = kind.form() {
                forms::clear_required_marks(tree, form)?;
            }
            tracing::debug!(modal = kind.name(), "closing modal");
        }
        self.target_category = None;
        Ok(())
    }

    /// Deferred half of `close`. Skipped if the same modal was reopened
    /// while the transition played.
    pub fn hide_contents(&self, tree: &mut Tree, kind: ModalKind) -> TreeResult<()> {
        if self.active == Some(kind) {
            return Ok(());
        }
        if let Some(contents) = tree.get_element_by_id(&kind.contents_id()) {
            tree.node_mut(contents)?.add_class(HIDDEN_CLASS);
        }
        Ok(())
    }
}
