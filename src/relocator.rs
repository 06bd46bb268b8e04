//! Sole owner of the shared edit controls. Controls are moved, never
//! cloned, so handlers bound to them survive every relocation.

use crate::tree::{NodeId, Tree, TreeResult};

pub const STORAGE_ID: &str = "teleport-storage";
pub const CONFIRM_ACTIONS_ID: &str = "confirm-actions";
pub const ICON_PICKER_ID: &str = "select-icon-button";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedControl {
    IconPicker,
    ConfirmActions,
}

impl SharedControl {
    pub const ALL: [Self; 2] = [Self::IconPicker, Self::ConfirmActions];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedControls {
    storage: NodeId,
    icon_picker: NodeId,
    confirm_actions: NodeId,
}

impl SharedControls {
    pub const fn new(storage: NodeId, icon_picker: NodeId, confirm_actions: NodeId) -> Self {
        Self {
            storage,
            icon_picker,
            confirm_actions,
        }
    }

    /// Resolves the storage container and both controls by element id.
    pub fn locate(tree: &Tree) -> Option<Self> {
        Some(Self::new(
            tree.get_element_by_id(STORAGE_ID)?,
            tree.get_element_by_id(ICON_PICKER_ID)?,
            tree.get_element_by_id(CONFIRM_ACTIONS_ID)?,
        ))
    }

    fn node(&self, control: SharedControl) -> NodeId {
        match control {
            SharedControl::IconPicker => self.icon_picker,
            SharedControl::ConfirmActions => self.confirm_actions,
        }
    }

    pub fn storage(&self) -> NodeId {
        self.storage
    }

    /// Moves `control` to the end of `destination`.
    pub fn relocate(
        &self,
        tree: &mut Tree,
        control: SharedControl,
        destination: NodeId,
    ) -> TreeResult<()> {
        tree.append_child(destination, self.node(control))?;
        tracing::debug!(?control, destination, "relocated shared control");
        Ok(())
    }

    pub fn unrelocate(&self, tree: &mut Tree, control: SharedControl) -> TreeResult<()> {
        self.relocate(tree, control, self.storage)
    }

    /// Returns both controls to storage. Used before any new edit starts.
    pub fn unrelocate_all(&self, tree: &mut Tree) -> TreeResult<()> {
        for control in SharedControl::ALL {
            self.unrelocate(tree, control)?;
        }
        Ok(())
    }

    /// Current parent of `control`.
    pub fn holder(&self, tree: &Tree, control: SharedControl) -> TreeResult<Option<NodeId>> {
        tree.parent(self.node(control))
    }

    pub fn is_stored(&self, tree: &Tree) -> TreeResult<bool> {
        for control in SharedControl::ALL {
            if self.holder(tree, control)? != Some(self.storage) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Tree, SharedControls, NodeId, NodeId) {
        let mut tree = Tree::new();
        let storage = tree.create_element("div");
        tree.node_mut(storage).unwrap().set_attr("id", STORAGE_ID);
        let picker = tree.create_element("button");
        tree.node_mut(picker).unwrap().set_attr("id", ICON_PICKER_ID);
        let confirm = tree.create_element("div");
        tree.node_mut(confirm).unwrap().set_attr("id", CONFIRM_ACTIONS_ID);
        tree.append_child(tree.root(), storage).unwrap();
        tree.append_child(storage, picker).unwrap();
        tree.append_child(storage, confirm).unwrap();

        let first = tree.create_element("div");
        let second = tree.create_element("div");
        tree.append_child(tree.root(), first).unwrap();
        tree.append_child(tree.root(), second).unwrap();

        let controls = SharedControls::locate(&tree).expect("controls present");
        (tree, controls, first, second)
    }

    #[test]
    fn relocation_moves_the_same_node_between_holders() {
        let (mut tree, controls, first, second) = fixture();
        let picker = tree.get_element_by_id(ICON_PICKER_ID).unwrap();

        controls
            .relocate(&mut tree, SharedControl::IconPicker, first)
            .expect("into first");
        controls
            .relocate(&mut tree, SharedControl::IconPicker, second)
            .expect("into second");

        assert_eq!(tree.node(first).unwrap().children(), &[] as &[NodeId]);
        assert_eq!(tree.node(second).unwrap().children(), &[picker]);
        assert_eq!(
            controls.holder(&tree, SharedControl::IconPicker).unwrap(),
            Some(second)
        );
    }

    #[test]
    fn relocating_twice_into_same_holder_is_stable() {
        let (mut tree, controls, first, _) = fixture();

        for _ in 0..2 {
            controls
                .relocate(&mut tree, SharedControl::ConfirmActions, first)
                .expect("relocate");
        }

        assert_eq!(tree.node(first).unwrap().children().len(), 1);
    }

    #[test]
    fn unrelocate_all_returns_controls_to_storage() {
        let (mut tree, controls, first, second) = fixture();
        controls
            .relocate(&mut tree, SharedControl::IconPicker, first)
            .unwrap();
        controls
            .relocate(&mut tree, SharedControl::ConfirmActions, second)
            .unwrap();
        assert!(!controls.is_stored(&tree).unwrap());

        controls.unrelocate_all(&mut tree).expect("unrelocate");

        assert!(controls.is_stored(&tree).unwrap());
    }
}
