use crate::entity::{category_element_id, link_element_id, EntityId, EntityRef};
use crate::tree::{NodeId, Tree};

use super::{SyncError, SyncResult};

pub const LINK_CARD_TEMPLATE: &str = "template-link-card";
pub const CATEGORY_TEMPLATE: &str = "template-category";
pub const EDIT_ACTIONS_TEMPLATE: &str = "template-edit-actions";
pub const ADD_CATEGORY_BUTTON: &str = "add-category-button";
pub const IMG_CONTAINER_ATTR: &str = "data-img-container";
pub const TEXT_CONTAINER_ATTR: &str = "data-text-container";
pub const EDIT_ACTIONS_ATTR: &str = "data-edit-actions";
pub const PRIMARY_ACTIONS_ATTR: &str = "data-primary-actions";
pub const ACTION_ATTR: &str = "data-action";
pub const OPEN_MODAL_ATTR: &str = "data-open-modal";
pub const CATEGORY_ID_ATTR: &str = "data-category-id";
pub const LINK_CARD_CLASS: &str = "link-card";
pub const CATEGORY_HEADER_CLASS: &str = "category-header";
const HIDDEN_CLASS: &str = "hidden";

/// Name and label of one templated action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionButton {
    pub action: &'static str,
    pub label: &'static str,
}

pub const LINK_ACTIONS: [ActionButton; 2] = [
    ActionButton {
        action: "editLink",
        label: "Edit link",
    },
    ActionButton {
        action: "deleteLink",
        label: "Delete link",
    },
];

pub const CATEGORY_ACTIONS: [ActionButton; 2] = [
    ActionButton {
        action: "editCategory",
        label: "Edit category",
    },
    ActionButton {
        action: "deleteCategory",
        label: "Delete category",
    },
];

/// Display data for a freshly created row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRow<'a> {
    pub id: EntityId,
    pub name: &'a str,
    pub description: &'a str,
    pub icon_src: Option<&'a str>,
}

fn template(tree: &Tree, template_id: &'static str) -> SyncResult<NodeId> {
    tree.get_element_by_id(template_id)
        .ok_or(SyncError::MissingTemplate(template_id))
}

fn part(found: Option<NodeId>, template: &'static str, part: &'static str) -> SyncResult<NodeId> {
    found.ok_or(SyncError::MalformedTemplate { template, part })
}

/// Clones a template, dropping its id and hidden marker.
fn instantiate(tree: &mut Tree, template_id: &'static str) -> SyncResult<NodeId> {
    let source = template(tree, template_id)?;
    let copy = tree.deep_clone(source)?;
    let node = tree.node_mut(copy)?;
    node.remove_attr("id");
    node.remove_class(HIDDEN_CLASS);
    Ok(copy)
}

/// Builds an edit/delete action group wired to `buttons`.
pub fn clone_edit_actions(tree: &mut Tree, buttons: &[ActionButton]) -> SyncResult<NodeId> {
    let actions = instantiate(tree, EDIT_ACTIONS_TEMPLATE)?;
    let primary = part(
        tree.find_by_attr(actions, PRIMARY_ACTIONS_ATTR),
        EDIT_ACTIONS_TEMPLATE,
        PRIMARY_ACTIONS_ATTR,
    )?;
    let slots = tree.node(primary)?.children().to_vec();
    for (slot, button) in slots.into_iter().zip(buttons) {
        let node = tree.node_mut(slot)?;
        node.set_attr(ACTION_ATTR, button.action);
        node.set_attr("aria-label", button.label);
    }
    Ok(actions)
}

fn set_row_icon(tree: &mut Tree, row: NodeId, src: Option<&str>, alt: &str) -> SyncResult<()> {
    let container = part(
        tree.find_by_attr(row, IMG_CONTAINER_ATTR),
        "row",
        IMG_CONTAINER_ATTR,
    )?;
    let img = part(tree.find_by_tag(container, "img"), "row", "img")?;
    let node = tree.node_mut(img)?;
    if let Some(src) = src {
        node.set_attr("src", src);
    }
    node.set_attr("alt", alt);
    Ok(())
}

/// Inserts a new link card as the second-to-last child of its category's
/// grid, ahead of the "add link" tile. Returns `None` when the category is
/// no longer on the page.
pub fn insert_link_card(
    tree: &mut Tree,
    category_id: EntityId,
    row: &NewRow<'_>,
) -> SyncResult<Option<NodeId>> {
    let Some(header) = tree.get_element_by_id(&category_element_id(category_id)) else {
        tracing::warn!(%category_id, "category vanished before link insert");
        return Ok(None);
    };
    let grid = part(tree.next_sibling(header), "category", "link grid")?;

    let card = instantiate(tree, LINK_CARD_TEMPLATE)?;
    {
        let node = tree.node_mut(card)?;
        for class in [LINK_CARD_CLASS, "admin", "relative"] {
            node.add_class(class);
        }
        node.set_attr("id", link_element_id(row.id));
    }
    set_row_icon(tree, card, row.icon_src, row.name)?;

    let name = part(tree.find_by_tag(card, "h3"), LINK_CARD_TEMPLATE, "h3")?;
    tree.set_text_content(name, row.name)?;
    let description = part(tree.find_by_tag(card, "p"), LINK_CARD_TEMPLATE, "p")?;
    tree.set_text_content(description, row.description)?;

    let actions = clone_edit_actions(tree, &LINK_ACTIONS)?;
    {
        let node = tree.node_mut(actions)?;
        for class in ["absolute", "right-1", "top-1"] {
            node.add_class(class);
        }
    }
    tree.append_child(card, actions)?;

    let add_tile = tree.last_child(grid);
    tree.insert_before(grid, card, add_tile)?;
    tracing::debug!(link_id = %row.id, %category_id, "inserted link card");
    Ok(Some(card))
}

/// Inserts a new category header and its empty link grid just before the
/// "add category" button. Returns the header node.
pub fn insert_category(tree: &mut Tree, row: &NewRow<'_>) -> SyncResult<NodeId> {
    let add_button = template(tree, ADD_CATEGORY_BUTTON)?;
    let container = tree
        .parent(add_button)?
        .ok_or(SyncError::MalformedTemplate {
            template: ADD_CATEGORY_BUTTON,
            part: "parent",
        })?;

    let wrapper = instantiate(tree, CATEGORY_TEMPLATE)?;
    let header = part(
        tree.find_by_class(wrapper, CATEGORY_HEADER_CLASS),
        CATEGORY_TEMPLATE,
        CATEGORY_HEADER_CLASS,
    )?;
    let grid = part(tree.next_sibling(header), CATEGORY_TEMPLATE, "link grid")?;

    tree.node_mut(header)?
        .set_attr("id", category_element_id(row.id));
    let name = part(tree.find_by_tag(header, "h2"), CATEGORY_TEMPLATE, "h2")?;
    tree.set_text_content(name, row.name)?;
    set_row_icon(tree, header, row.icon_src, row.name)?;

    let actions = clone_edit_actions(tree, &CATEGORY_ACTIONS)?;
    tree.node_mut(actions)?.add_class("pl-2");
    tree.append_child(header, actions)?;

    let add_link_tile = part(tree.find_by_tag(grid, "div"), CATEGORY_TEMPLATE, "add link tile")?;
    {
        let node = tree.node_mut(add_link_tile)?;
        node.set_attr(OPEN_MODAL_ATTR, "link");
        node.set_attr(CATEGORY_ID_ATTR, row.id.to_string());
    }

    tree.insert_before(container, header, Some(add_button))?;
    tree.insert_before(container, grid, Some(add_button))?;
    tree.remove(wrapper)?;
    tracing::debug!(category_id = %row.id, "inserted category");
    Ok(header)
}

/// Removes a deleted entity's rows. A category takes its link grid with it.
/// Returns `false` when the rows were already gone.
pub fn remove_entity(tree: &mut Tree, entity: EntityRef) -> SyncResult<bool> {
    let Some(row) = tree.get_element_by_id(&entity.element_id()) else {
        return Ok(false);
    };
    if let EntityRef::Category { .. } = entity {
        let grid = tree.next_sibling(row).filter(|sibling| {
            tree.node(*sibling).is_ok_and(|node| {
                !node.has_class(CATEGORY_HEADER_CLASS)
                    && node.attr("id") != Some(ADD_CATEGORY_BUTTON)
            })
        });
        if let Some(grid) = grid {
            tree.remove(grid)?;
        }
    }
    tree.remove(row)?;
    Ok(true)
}
