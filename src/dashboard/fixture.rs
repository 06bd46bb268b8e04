//! Test page: one "Dev Tools" category holding two links, plus the hidden
//! templates, the control storage and the modal the dashboard expects.

use std::collections::VecDeque;

use http::StatusCode;

use super::{Dashboard, ICON_UPLOAD_ID};
use crate::config::AdminConfig;
use crate::entity::EntityId;
use crate::geometry::{Edges, Rect};
use crate::relocator::{CONFIRM_ACTIONS_ID, ICON_PICKER_ID, STORAGE_ID};
use crate::sync::reconcile::{
    ACTION_ATTR, ADD_CATEGORY_BUTTON, CATEGORY_HEADER_CLASS, CATEGORY_TEMPLATE, EDIT_ACTIONS_ATTR,
    EDIT_ACTIONS_TEMPLATE, IMG_CONTAINER_ATTR, LINK_CARD_TEMPLATE, PRIMARY_ACTIONS_ATTR,
    TEXT_CONTAINER_ATTR,
};
use crate::sync::{ResponseBody, SyncRequest, SyncResponse, Transport};
use crate::tree::{NodeId, TextStyle, Tree};

pub(super) fn id(raw: u64) -> EntityId {
    EntityId::new(raw).expect("non-zero id")
}

fn element(tree: &mut Tree, parent: NodeId, tag: &str, class: &str) -> NodeId {
    let node = tree.create_element(tag);
    tree.node_mut(node).unwrap().set_class_name(class);
    tree.append_child(parent, node).unwrap();
    node
}

fn with_id(tree: &mut Tree, parent: NodeId, tag: &str, element_id: &str) -> NodeId {
    let node = element(tree, parent, tag, "");
    tree.node_mut(node).unwrap().set_attr("id", element_id);
    node
}

fn sized(tree: &mut Tree, node: NodeId, width: f64, height: f64) {
    tree.node_mut(node).unwrap().set_rect(Rect::sized(width, height));
}

fn typography(size: f64, line_height: f64) -> TextStyle {
    TextStyle {
        font_size: size,
        line_height,
        ..TextStyle::default()
    }
}

fn text(
    tree: &mut Tree,
    parent: NodeId,
    tag: &str,
    class: &str,
    content: &str,
    style: TextStyle,
) -> NodeId {
    let node = tree.create_text_element(tag, class, content);
    {
        let node = tree.node_mut(node).unwrap();
        node.style.text = style;
        node.style.border = Edges::uniform(1.0);
    }
    tree.append_child(parent, node).unwrap();
    node
}

/// Action group as the server renders it. Returns (group, edit, delete).
fn actions(
    tree: &mut Tree,
    parent: NodeId,
    edit: &str,
    delete: &str,
) -> (NodeId, NodeId, NodeId) {
    let group = element(tree, parent, "div", "flex");
    tree.node_mut(group).unwrap().set_attr(EDIT_ACTIONS_ATTR, "");
    sized(tree, group, 60.0, 40.0);
    let primary = element(tree, group, "div", "flex gap-1");
    tree.node_mut(primary).unwrap().set_attr(PRIMARY_ACTIONS_ATTR, "");
    let edit_button = element(tree, primary, "button", "");
    tree.node_mut(edit_button).unwrap().set_attr(ACTION_ATTR, edit);
    let delete_button = element(tree, primary, "button", "");
    tree.node_mut(delete_button).unwrap().set_attr(ACTION_ATTR, delete);
    (group, edit_button, delete_button)
}

fn icon(tree: &mut Tree, parent: NodeId, src: &str, size: f64) -> NodeId {
    let container = element(tree, parent, "div", "shrink-0");
    tree.node_mut(container)
        .unwrap()
        .set_attr(IMG_CONTAINER_ATTR, "");
    sized(tree, container, size, size);
    let img = element(tree, container, "img", "");
    if !src.is_empty() {
        tree.node_mut(img).unwrap().set_attr("src", src);
    }
    img
}

pub(super) struct LinkRow {
    pub card: NodeId,
    pub edit: NodeId,
    pub delete: NodeId,
}

fn link_card(
    tree: &mut Tree,
    grid: NodeId,
    link_id: u64,
    name: &str,
    description: &str,
) -> LinkRow {
    let card = element(tree, grid, "div", "link-card admin relative");
    tree.node_mut(card)
        .unwrap()
        .set_attr("id", format!("{link_id}_link"));
    sized(tree, card, 280.0, 120.0);
    icon(tree, card, &format!("/icons/{link_id}.png"), 48.0);

    let text_box = element(tree, card, "div", "flex flex-col");
    tree.node_mut(text_box)
        .unwrap()
        .set_attr(TEXT_CONTAINER_ATTR, "");
    sized(tree, text_box, 200.0, 80.0);
    let title = text(tree, text_box, "h3", "font-medium", name, typography(16.0, 24.0));
    sized(tree, title, 60.0, 26.0);
    tree.node_mut(title)
        .unwrap()
        .set_attr("data-placeholder", "Link name");
    let body = text(tree, text_box, "p", "text-sm", description, typography(14.0, 20.0));
    sized(tree, body, 198.0, 42.0);

    let (_, edit, delete) = actions(tree, card, "editLink", "deleteLink");
    LinkRow { card, edit, delete }
}

fn templates(tree: &mut Tree) {
    let root = tree.root();

    let card = with_id(tree, root, "div", LINK_CARD_TEMPLATE);
    tree.node_mut(card).unwrap().add_class("hidden");
    icon(tree, card, "", 48.0);
    let text_box = element(tree, card, "div", "flex flex-col");
    tree.node_mut(text_box)
        .unwrap()
        .set_attr(TEXT_CONTAINER_ATTR, "");
    text(tree, text_box, "h3", "font-medium", "", typography(16.0, 24.0));
    text(tree, text_box, "p", "text-sm", "", typography(14.0, 20.0));

    let category = with_id(tree, root, "div", CATEGORY_TEMPLATE);
    tree.node_mut(category).unwrap().add_class("hidden");
    let header = element(tree, category, "div", CATEGORY_HEADER_CLASS);
    icon(tree, header, "", 40.0);
    text(tree, header, "h2", "text-2xl", "", typography(24.0, 32.0));
    let grid = element(tree, category, "div", "link-grid");
    element(tree, grid, "div", "add-link");

    let group = with_id(tree, root, "div", EDIT_ACTIONS_TEMPLATE);
    {
        let node = tree.node_mut(group).unwrap();
        node.add_class("hidden");
        node.set_attr(EDIT_ACTIONS_ATTR, "");
    }
    let primary = element(tree, group, "div", "flex gap-1");
    tree.node_mut(primary)
        .unwrap()
        .set_attr(PRIMARY_ACTIONS_ATTR, "");
    element(tree, primary, "button", "");
    element(tree, primary, "button", "");
}

fn shared_controls(tree: &mut Tree) {
    let root = tree.root();
    let storage = with_id(tree, root, "div", STORAGE_ID);
    with_id(tree, storage, "button", ICON_PICKER_ID);
    let confirm = with_id(tree, storage, "div", CONFIRM_ACTIONS_ID);
    element(tree, confirm, "button", "confirm");
    element(tree, confirm, "button", "cancel");

    let upload = with_id(tree, root, "input", ICON_UPLOAD_ID);
    tree.node_mut(upload).unwrap().set_attr("type", "file");
}

fn input(tree: &mut Tree, form: NodeId, name: &str, required: bool, file: bool) -> NodeId {
    let node = element(tree, form, "input", "");
    let input = tree.node_mut(node).unwrap();
    input.set_attr("name", name);
    if required {
        input.set_attr("required", "");
    }
    if file {
        input.set_attr("type", "file");
    }
    node
}

fn modal(tree: &mut Tree) {
    let root = tree.root();
    let container = with_id(tree, root, "div", crate::modal::CONTAINER_ID);
    let panel = element(tree, container, "div", "panel");

    let category = with_id(tree, panel, "div", "category-contents");
    tree.node_mut(category).unwrap().add_class("hidden");
    let form = with_id(tree, category, "form", "category-form");
    input(tree, form, "name", true, false);
    input(tree, form, "icon", true, true);
    with_id(tree, category, "p", "category-message");

    let link = with_id(tree, panel, "div", "link-contents");
    tree.node_mut(link).unwrap().add_class("hidden");
    let form = with_id(tree, link, "form", "link-form");
    input(tree, form, "name", true, false);
    input(tree, form, "description", false, false);
    input(tree, form, "icon", true, true);
    with_id(tree, link, "p", "link-message");

    for (contents, slot) in [
        ("link-delete-contents", "link-name"),
        ("category-delete-contents", "category-name"),
    ] {
        let node = with_id(tree, panel, "div", contents);
        tree.node_mut(node).unwrap().add_class("hidden");
        with_id(tree, node, "span", slot);
    }
}

pub(super) struct Page {
    pub dashboard: Dashboard,
    pub categories: NodeId,
    pub category_header: NodeId,
    pub category_edit: NodeId,
    pub category_delete: NodeId,
    pub link_grid: NodeId,
    pub link_cards: [NodeId; 2],
    pub link_edit: [NodeId; 2],
    pub link_delete: [NodeId; 2],
    pub add_link_tile: NodeId,
}

impl Page {
    pub fn new() -> Self {
        let mut tree = Tree::new();
        let root = tree.root();
        let main = with_id(&mut tree, root, "main", crate::modal::BLUR_TARGET_ID);
        let categories = element(&mut tree, main, "div", "flex flex-col");
        sized(&mut tree, categories, 800.0, 600.0);

        let category_header = element(&mut tree, categories, "div", CATEGORY_HEADER_CLASS);
        tree.node_mut(category_header)
            .unwrap()
            .set_attr("id", "1_category");
        sized(&mut tree, category_header, 600.0, 40.0);
        icon(&mut tree, category_header, "/icons/dev.svg", 40.0);
        let title = text(
            &mut tree,
            category_header,
            "h2",
            "text-2xl font-semibold",
            "Dev Tools",
            typography(24.0, 32.0),
        );
        sized(&mut tree, title, 110.0, 34.0);
        let (_, category_edit, category_delete) =
            actions(&mut tree, category_header, "editCategory", "deleteCategory");

        let link_grid = element(&mut tree, categories, "div", "link-grid");
        sized(&mut tree, link_grid, 600.0, 260.0);
        let git = link_card(&mut tree, link_grid, 10, "Git", "Source hosting");
        let docs = link_card(&mut tree, link_grid, 11, "Docs", "Reference manuals");
        let add_link_tile = element(&mut tree, link_grid, "div", "add-link");

        let add_category = element(&mut tree, categories, "button", "");
        tree.node_mut(add_category)
            .unwrap()
            .set_attr("id", ADD_CATEGORY_BUTTON);

        templates(&mut tree);
        shared_controls(&mut tree);
        modal(&mut tree);

        let dashboard =
            Dashboard::headless(tree, AdminConfig::default()).expect("page has shared controls");
        Self {
            dashboard,
            categories,
            category_header,
            category_edit,
            category_delete,
            link_grid,
            link_cards: [git.card, docs.card],
            link_edit: [git.edit, docs.edit],
            link_delete: [git.delete, docs.delete],
            add_link_tile,
        }
    }

    pub fn text_of(&self, node: NodeId) -> String {
        self.dashboard.tree().text_content(node).expect("text")
    }

    /// Static name element of a row, whatever node currently holds it.
    pub fn name_node(&self, row: NodeId, tag: &str) -> NodeId {
        self.dashboard
            .tree()
            .find_by_tag(row, tag)
            .expect("row has a name element")
    }

    pub fn icon_src(&self, row: NodeId) -> Option<String> {
        let tree = self.dashboard.tree();
        let img = tree.find_by_tag(row, "img").expect("row has an icon");
        tree.node(img).unwrap().attr("src").map(str::to_string)
    }

    pub fn type_into(&mut self, field: NodeId, value: &str) {
        self.dashboard
            .tree_mut()
            .node_mut(field)
            .unwrap()
            .set_value(value);
        self.dashboard.on_field_input(field).expect("input");
    }
}

/// Answers requests from a script and records what was sent.
#[derive(Default)]
pub(super) struct ScriptedTransport {
    responses: VecDeque<SyncResponse>,
    pub sent: Vec<SyncRequest>,
}

impl ScriptedTransport {
    pub fn replying(responses: impl IntoIterator<Item = SyncResponse>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            sent: Vec::new(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, request: &SyncRequest) -> anyhow::Result<SyncResponse> {
        self.sent.push(request.clone());
        self.responses
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("connection refused"))
    }
}

pub(super) fn ok() -> SyncResponse {
    SyncResponse::new(StatusCode::OK, ResponseBody::default())
}

pub(super) fn json(status: u16, body: &str) -> SyncResponse {
    SyncResponse::from_json(StatusCode::from_u16(status).unwrap(), body.as_bytes())
        .expect("valid json")
}
