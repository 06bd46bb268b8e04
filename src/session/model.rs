use crate::entity::{EntityKind, EntityRef};
use crate::icon::IconFile;
use crate::resizer::ResizeGuard;
use crate::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    EditingCategory,
    EditingLink,
    ConfirmingDeleteCategory,
    ConfirmingDeleteLink,
}

impl SessionState {
    pub const fn editing(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Category => Self::EditingCategory,
            EntityKind::Link => Self::EditingLink,
        }
    }

    pub const fn confirming_delete(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Category => Self::ConfirmingDeleteCategory,
            EntityKind::Link => Self::ConfirmingDeleteLink,
        }
    }

    pub const fn edit_kind(self) -> Option<EntityKind> {
        match self {
            Self::EditingCategory => Some(EntityKind::Category),
            Self::EditingLink => Some(EntityKind::Link),
            _ => None,
        }
    }

    pub const fn delete_kind(self) -> Option<EntityKind> {
        match self {
            Self::ConfirmingDeleteCategory => Some(EntityKind::Category),
            Self::ConfirmingDeleteLink => Some(EntityKind::Link),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    StartEdit(EntityKind),
    Confirm,
    Cancel,
    StartDelete(EntityKind),
    ConfirmDelete(EntityKind),
    CancelDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionState,
    pub event: SessionEvent,
    pub to: SessionState,
}

impl StateTransition {
    pub const fn new(from: SessionState, event: SessionEvent, to: SessionState) -> Self {
        Self { from, event, to }
    }
}

/// Display values captured when an edit starts, used for rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub name: String,
    /// Present only for links.
    pub description: Option<String>,
    pub icon_src: Option<String>,
}

/// The page nodes an edit session works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditNodes {
    pub image: NodeId,
    pub edit_actions: NodeId,
    pub primary_actions: Option<NodeId>,
    pub name_field: NodeId,
    pub description_field: Option<NodeId>,
}

#[derive(Debug)]
pub struct EditSession {
    pub(crate) generation: u64,
    pub(crate) entity: EntityRef,
    pub(crate) original: Snapshot,
    pub(crate) nodes: EditNodes,
    pub(crate) staged_icon: Option<IconFile>,
    /// Viewport tracking for the session's fields; released on every exit.
    pub(crate) cleanup: Option<ResizeGuard>,
}

impl EditSession {
    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    pub fn original(&self) -> &Snapshot {
        &self.original
    }

    pub fn nodes(&self) -> EditNodes {
        self.nodes
    }

    pub fn staged_icon(&self) -> Option<&IconFile> {
        self.staged_icon.as_ref()
    }

    pub fn is_tracking_resizes(&self) -> bool {
        self.cleanup.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSession {
    pub(crate) generation: u64,
    pub(crate) entity: EntityRef,
    pub(crate) display_name: String,
}

impl DeleteSession {
    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// The single live session. Holding it in one `Option` is what keeps two
/// sessions from ever coexisting.
#[derive(Debug)]
pub enum Session {
    Edit(EditSession),
    Delete(DeleteSession),
}

impl Session {
    pub fn state(&self) -> SessionState {
        match self {
            Self::Edit(edit) => SessionState::editing(edit.entity.kind()),
            Self::Delete(delete) => SessionState::confirming_delete(delete.entity.kind()),
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Self::Edit(edit) => edit.generation,
            Self::Delete(delete) => delete.generation,
        }
    }

    pub fn entity(&self) -> EntityRef {
        match self {
            Self::Edit(edit) => edit.entity,
            Self::Delete(delete) => delete.entity,
        }
    }
}
