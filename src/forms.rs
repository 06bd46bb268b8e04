//! Creation forms for categories and links.

use crate::entity::EntityKind;
use crate::sync::FormData;
use crate::tree::{NodeId, Tree, TreeResult};

/// Marks required inputs so the page styles them as invalid once the user
/// has tried to submit.
pub const SHOW_INVALID_CLASS: &str = "show-invalid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Category,
    Link,
}

impl FormKind {
    pub const fn entity_kind(self) -> EntityKind {
        match self {
            Self::Category => EntityKind::Category,
            Self::Link => EntityKind::Link,
        }
    }

    pub const fn form_id(self) -> &'static str {
        match self {
            Self::Category => "category-form",
            Self::Link => "link-form",
        }
    }

    pub const fn message_id(self) -> &'static str {
        match self {
            Self::Category => "category-message",
            Self::Link => "link-message",
        }
    }
}

fn named_inputs(tree: &Tree, form: NodeId) -> Vec<NodeId> {
    tree.descendants(form)
        .into_iter()
        .filter(|id| {
            tree.node(*id)
                .map(|node| node.attr("name").is_some())
                .unwrap_or(false)
        })
        .collect()
}

/// Collects the named inputs of a form. File inputs contribute their first
/// file, or nothing when empty.
pub fn collect(tree: &Tree, kind: FormKind) -> TreeResult<Option<FormData>> {
    let Some(form) = tree.get_element_by_id(kind.form_id()) else {
        return Ok(None);
    };
    let mut data = FormData::new();
    for input in named_inputs(tree, form) {
        let node = tree.node(input)?;
        let name = node.attr("name").unwrap_or_default();
        if node.attr("type") == Some("file") {
            if let Some(file) = node.files().first() {
                data.append_file(name, file.clone());
            }
            continue;
        }
        data.append_text(name, node.value().unwrap_or_default());
    }
    Ok(Some(data))
}

/// Clears every named input of the form. Missing forms are ignored.
pub fn reset(tree: &mut Tree, kind: FormKind) -> TreeResult<()> {
    let Some(form) = tree.get_element_by_id(kind.form_id()) else {
        return Ok(());
    };
    for input in named_inputs(tree, form) {
        let node = tree.node_mut(input)?;
        node.set_value(String::new());
        node.set_files(Vec::new());
    }
    Ok(())
}

fn required_inputs(tree: &Tree, form: NodeId) -> Vec<NodeId> {
    tree.descendants(form)
        .into_iter()
        .filter(|id| {
            tree.node(*id)
                .map(|node| node.attr("required").is_some())
                .unwrap_or(false)
        })
        .collect()
}

pub fn mark_required(tree: &mut Tree, kind: FormKind) -> TreeResult<()> {
    let Some(form) = tree.get_element_by_id(kind.form_id()) else {
        return Ok(());
    };
    for input in required_inputs(tree, form) {
        tree.node_mut(input)?.add_class(SHOW_INVALID_CLASS);
    }
    Ok(())
}

pub fn clear_required_marks(tree: &mut Tree, kind: FormKind) -> TreeResult<()> {
    let Some(form) = tree.get_element_by_id(kind.form_id()) else {
        return Ok(());
    };
    for input in required_inputs(tree, form) {
        tree.node_mut(input)?.remove_class(SHOW_INVALID_CLASS);
    }
    Ok(())
}

/// Whether a required input is still blank. File inputs count as blank
/// until a file is picked.
pub fn has_blank_required(tree: &Tree, kind: FormKind) -> TreeResult<bool> {
    let Some(form) = tree.get_element_by_id(kind.form_id()) else {
        return Ok(false);
    };
    for input in required_inputs(tree, form) {
        let node = tree.node(input)?;
        let blank = if node.attr("type") == Some("file") {
            node.files().is_empty()
        } else {
            node.value().unwrap_or_default().trim().is_empty()
        };
        if blank {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Writes a server message into the form's message slot.
pub fn show_message(tree: &mut Tree, kind: FormKind, message: &str) -> TreeResult<bool> {
    let Some(slot) = tree.get_element_by_id(kind.message_id()) else {
        tracing::warn!(form = kind.form_id(), %message, "form has no message slot");
        return Ok(false);
    };
    tree.set_text_content(slot, message)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::IconFile;

    fn link_form() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let form = tree.create_element("form");
        tree.node_mut(form).unwrap().set_attr("id", "link-form");
        tree.append_child(tree.root(), form).unwrap();

        let name = tree.create_element("input");
        {
            let node = tree.node_mut(name).unwrap();
            node.set_attr("name", "name");
            node.set_attr("required", "");
            node.set_value("Docs");
        }
        let icon = tree.create_element("input");
        {
            let node = tree.node_mut(icon).unwrap();
            node.set_attr("name", "icon");
            node.set_attr("type", "file");
            node.set_files(vec![IconFile::new("docs.png", "image/png", vec![1, 2])]);
        }
        let submit = tree.create_element("button");
        for child in [name, icon, submit] {
            tree.append_child(form, child).unwrap();
        }
        (tree, form, name, icon)
    }

    #[test]
    fn collect_reads_text_and_file_inputs() {
        let (tree, _, _, _) = link_form();

        let data = collect(&tree, FormKind::Link)
            .expect("collect")
            .expect("form exists");

        assert_eq!(data.text("name"), Some("Docs"));
        assert_eq!(data.file("icon").map(|file| file.name.as_str()), Some("docs.png"));
        assert_eq!(data.names().collect::<Vec<_>>(), vec!["name", "icon"]);
    }

    #[test]
    fn reset_clears_values_and_files() {
        let (mut tree, _, name, icon) = link_form();

        reset(&mut tree, FormKind::Link).expect("reset");

        assert_eq!(tree.node(name).unwrap().value(), Some(""));
        assert!(tree.node(icon).unwrap().files().is_empty());
    }

    #[test]
    fn required_marks_toggle_only_required_inputs() {
        let (mut tree, _, name, icon) = link_form();

        mark_required(&mut tree, FormKind::Link).expect("mark");
        assert!(tree.node(name).unwrap().has_class(SHOW_INVALID_CLASS));
        assert!(!tree.node(icon).unwrap().has_class(SHOW_INVALID_CLASS));

        clear_required_marks(&mut tree, FormKind::Link).expect("clear");
        assert!(!tree.node(name).unwrap().has_class(SHOW_INVALID_CLASS));
    }

    #[test]
    fn blank_required_inputs_are_detected() {
        let (mut tree, _, name, _) = link_form();
        assert!(!has_blank_required(&tree, FormKind::Link).expect("check"));

        tree.node_mut(name).unwrap().set_value("   ");

        assert!(has_blank_required(&tree, FormKind::Link).expect("check"));
    }

    #[test]
    fn missing_forms_are_ignored() {
        let mut tree = Tree::new();

        assert!(collect(&tree, FormKind::Category).expect("collect").is_none());
        reset(&mut tree, FormKind::Category).expect("reset is a no-op");
        assert!(!show_message(&mut tree, FormKind::Category, "nope").expect("show"));
    }
}
