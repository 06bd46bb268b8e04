//! Swaps static text for auto-sizing edit fields and back.
//!
//! Conversion reads every target's layout first, then decides sizes, then
//! writes, so the host never has to re-run layout between targets.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::config::AdminConfig;
use crate::geometry::{round_to_hundredth, Edges};
use crate::measure::{Probes, TextMetrics};
use crate::scheduler::{Deferred, Scheduler};
use crate::tree::{Length, NodeId, TextStyle, Tree, TreeError, TreeResult};

pub const FIELD_TAG: &str = "textarea";
pub const FIELD_CLASS: &str = "resizable-input";
pub const ORIGINAL_TAG_ATTR: &str = "data-original-element-type";
pub const ORIGINAL_CLASS_ATTR: &str = "data-original-class-name";
pub const PLACEHOLDER_DATA_ATTR: &str = "data-placeholder";
/// Headers sit between an icon and an action group that share their row.
const BOUNDED_HEADER_TAG: &str = "h2";
const FIELD_BACKGROUND: &str = "var(--color-base)";
const FIELD_BORDER_COLOR: &str = "var(--color-highlight-sm)";
const FIELD_BORDER_RADIUS: &str = "0.375rem";
const FIELD_BORDER_WIDTH: f64 = 1.0;

/// Everything the resizer needs to read layout and measure text.
pub struct LayoutContext<'a> {
    pub tree: &'a mut Tree,
    pub probes: &'a mut Probes,
    pub metrics: &'a dyn TextMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTarget {
    pub node: NodeId,
    /// Fill the whole width budget instead of growing with the text.
    pub fill: bool,
}

impl FieldTarget {
    pub const fn grow(node: NodeId) -> Self {
        Self { node, fill: false }
    }

    pub const fn fill(node: NodeId) -> Self {
        Self { node, fill: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizableField {
    pub node: NodeId,
    pub fill: bool,
    pub style: TextStyle,
    pub max_width: f64,
    pub original_tag: String,
    pub original_class: String,
    pub placeholder: Option<String>,
}

#[derive(Debug)]
struct ViewportRegistration {
    fields: Vec<NodeId>,
}

/// Keeps a batch of fields subscribed to viewport resizes. Dropping the
/// guard unsubscribes them; it cannot be released twice.
#[must_use = "dropping the guard immediately stops viewport tracking"]
#[derive(Debug)]
pub struct ResizeGuard {
    registration: Rc<ViewportRegistration>,
}

impl ResizeGuard {
    pub fn fields(&self) -> &[NodeId] {
        &self.registration.fields
    }
}

impl Drop for ResizeGuard {
    fn drop(&mut self) {
        tracing::debug!(
            fields = ?self.registration.fields,
            "released viewport resize listener"
        );
    }
}

struct MeasuredTarget {
    target: FieldTarget,
    tag: String,
    class: String,
    placeholder: Option<String>,
    text: String,
    style: TextStyle,
    height: f64,
    max_width: f64,
}

#[derive(Debug)]
pub struct Resizer {
    fields: HashMap<NodeId, ResizableField>,
    viewport_listeners: Vec<Weak<ViewportRegistration>>,
    resize_scheduled: bool,
    caret_allowance: f64,
    header_max_length: usize,
    body_max_length: usize,
    empty_glyph: String,
}

impl Resizer {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            fields: HashMap::new(),
            viewport_listeners: Vec::new(),
            resize_scheduled: false,
            caret_allowance: config.caret_allowance,
            header_max_length: config.header_max_length,
            body_max_length: config.body_max_length,
            empty_glyph: config.empty_measure_glyph.clone(),
        }
    }

    pub fn field(&self, node: NodeId) -> Option<&ResizableField> {
        self.fields.get(&node)
    }

    pub fn active_listener_count(&self) -> usize {
        self.viewport_listeners
            .iter()
            .filter(|listener| listener.strong_count() > 0)
            .count()
    }

    /// Replaces each target with an edit field of the same position, type
    /// and size. Returns the fields in target order plus the guard that
    /// keeps them tracking viewport resizes.
    pub fn replace_with_fields(
        &mut self,
        ctx: &mut LayoutContext<'_>,
        targets: &[FieldTarget],
    ) -> TreeResult<(Vec<NodeId>, ResizeGuard)> {
        // read
        let mut measured = Vec::with_capacity(targets.len());
        for target in targets {
            let node = ctx.tree.node(target.node)?;
            let tag = node.tag().to_string();
            measured.push(MeasuredTarget {
                target: *target,
                class: node.class_name(),
                placeholder: node.attr(PLACEHOLDER_DATA_ATTR).map(str::to_string),
                text: ctx.tree.text_content(target.node)?,
                style: node.style.text.clone(),
                height: round_to_hundredth(node.rect().height),
                max_width: available_width(ctx.tree, target.node, is_bounded_header(&tag))?,
                tag,
            });
        }

        // decide
        let mut widths = Vec::with_capacity(measured.len());
        for target in &measured {
            let width = self.content_width(
                ctx,
                &target.style,
                &target.text,
                target.placeholder.as_deref(),
                target.target.fill,
                target.max_width,
            )?;
            widths.push(width);
        }

        // write
        let mut created = Vec::with_capacity(measured.len());
        for (target, width) in measured.into_iter().zip(widths) {
            let field = ctx.tree.create_element(FIELD_TAG);
            let max_length = if target.tag.starts_with('h') {
                self.header_max_length
            } else {
                self.body_max_length
            };
            {
                let node = ctx.tree.node_mut(field)?;
                node.set_value(target.text.clone());
                node.set_class_name(FIELD_CLASS);
                if let Some(placeholder) = &target.placeholder {
                    node.set_attr("placeholder", placeholder.clone());
                }
                node.set_attr(ORIGINAL_TAG_ATTR, target.tag.clone());
                node.set_attr(ORIGINAL_CLASS_ATTR, target.class.clone());
                node.set_attr("maxlength", max_length.to_string());
                node.style.text = target.style.clone();
                node.style.background = Some(FIELD_BACKGROUND.to_string());
                node.style.border = Edges::uniform(FIELD_BORDER_WIDTH);
                node.style.border_color = Some(FIELD_BORDER_COLOR.to_string());
                node.style.border_radius = Some(FIELD_BORDER_RADIUS.to_string());
                node.style.width = Length::Px(width);
                node.style.height = Length::Px(target.height);
            }
            ctx.tree.replace_node(target.target.node, field)?;

            self.fields.insert(
                field,
                ResizableField {
                    node: field,
                    fill: target.target.fill,
                    style: target.style,
                    max_width: target.max_width,
                    original_tag: target.tag,
                    original_class: target.class,
                    placeholder: target.placeholder,
                },
            );
            created.push(field);
        }

        let registration = Rc::new(ViewportRegistration {
            fields: created.clone(),
        });
        self.viewport_listeners.retain(|listener| listener.strong_count() > 0);
        self.viewport_listeners.push(Rc::downgrade(&registration));
        tracing::debug!(fields = ?created, "replaced static text with edit fields");

        Ok((created, ResizeGuard { registration }))
    }

    /// Width for a field showing `text`: the whole budget in fill mode,
    /// otherwise the natural text width plus caret room, capped by budget.
    fn content_width(
        &self,
        ctx: &mut LayoutContext<'_>,
        style: &TextStyle,
        text: &str,
        placeholder: Option<&str>,
        fill: bool,
        max_width: f64,
    ) -> TreeResult<f64> {
        if fill {
            return Ok(max_width);
        }
        let sample = measuring_sample(text, placeholder, &self.empty_glyph);
        let natural = ctx
            .probes
            .measure_text_width(ctx.tree, ctx.metrics, style, sample)?;
        Ok(round_to_hundredth(
            (natural + self.caret_allowance).min(max_width),
        ))
    }

    /// Content-change handler for a live field.
    pub fn on_input(&mut self, ctx: &mut LayoutContext<'_>, node: NodeId) -> TreeResult<()> {
        if !ctx.tree.contains(node) {
            self.fields.remove(&node);
            return Ok(());
        }
        if !self.fields.contains_key(&node) {
            return Ok(());
        }
        self.resize_field(ctx, node)
    }

    fn resize_field(&mut self, ctx: &mut LayoutContext<'_>, node: NodeId) -> TreeResult<()> {
        let Some(field) = self.fields.get(&node) else {
            return Ok(());
        };
        let fill = field.fill;
        let header = is_bounded_header(&field.original_tag);
        let placeholder = field.placeholder.clone();

        let field_node = ctx.tree.node(node)?;
        let style = field_node.style.text.clone();
        let border = field_node.style.border;
        let value = field_node.value().unwrap_or_default().to_string();

        let max_width = available_width(ctx.tree, node, header)?;
        let width =
            self.content_width(ctx, &style, &value, placeholder.as_deref(), fill, max_width)?;

        // collapse first so a removed line shrinks the field
        ctx.tree.node_mut(node)?.style.height = Length::Px(0.0);
        let sample = measuring_sample(&value, placeholder.as_deref(), &self.empty_glyph);
        let height = ctx
            .probes
            .measure_wrapped_height(ctx.tree, ctx.metrics, &style, border, width, sample)?;

        let field_node = ctx.tree.node_mut(node)?;
        field_node.style.width = Length::Px(width);
        field_node.style.height = Length::Px(height);
        if let Some(field) = self.fields.get_mut(&node) {
            field.max_width = max_width;
        }
        Ok(())
    }

    /// Viewport resize notification. Bursts collapse into one recompute on
    /// the next animation frame.
    pub fn on_viewport_resize(&mut self, scheduler: &mut Scheduler) {
        if self.resize_scheduled || self.active_listener_count() == 0 {
            return;
        }
        self.resize_scheduled = true;
        scheduler.request_frame(Deferred::ViewportResize);
    }

    /// Runs the coalesced viewport recompute for every subscribed field.
    pub fn on_frame(&mut self, ctx: &mut LayoutContext<'_>) -> TreeResult<()> {
        self.resize_scheduled = false;
        self.viewport_listeners.retain(|listener| listener.strong_count() > 0);
        let nodes: Vec<NodeId> = self
            .viewport_listeners
            .iter()
            .filter_map(Weak::upgrade)
            .flat_map(|registration| registration.fields.clone())
            .collect();
        for node in nodes {
            if ctx.tree.contains(node) {
                self.resize_field(ctx, node)?;
            }
        }
        Ok(())
    }

    /// Turns a field back into static text showing `text`, with the tag and
    /// class it had before editing. Returns the new static node.
    pub fn restore(&mut self, tree: &mut Tree, field: NodeId, text: &str) -> TreeResult<NodeId> {
        self.fields.remove(&field);
        let field_node = tree.node(field)?;
        let tag = field_node
            .attr(ORIGINAL_TAG_ATTR)
            .unwrap_or("span")
            .to_string();
        let class = field_node
            .attr(ORIGINAL_CLASS_ATTR)
            .unwrap_or_default()
            .to_string();
        let placeholder = field_node.attr("placeholder").map(str::to_string);
        let style = field_node.style.text.clone();
        let border = field_node.style.border;

        let restored = tree.create_text_element(&tag, &class, text);
        {
            let node = tree.node_mut(restored)?;
            if let Some(placeholder) = placeholder {
                node.set_attr(PLACEHOLDER_DATA_ATTR, placeholder);
            }
            node.style.text = style;
            // same thickness as the field so the row does not jump
            node.style.border = border;
            node.style.border_color = Some("transparent".to_string());
        }
        tree.replace_node(field, restored)?;
        Ok(restored)
    }
}

fn is_bounded_header(tag: &str) -> bool {
    tag.eq_ignore_ascii_case(BOUNDED_HEADER_TAG)
}

fn measuring_sample<'a>(text: &'a str, placeholder: Option<&'a str>, glyph: &'a str) -> &'a str {
    if !text.is_empty() {
        return text;
    }
    placeholder.filter(|value| !value.is_empty()).unwrap_or(glyph)
}

/// Width budget for the field in `node`'s slot: the parent's width less the
/// field's borders, and for bounded headers less the leading icon and
/// trailing actions too. Creation and every later recompute share it.
fn available_width(tree: &Tree, node: NodeId, header: bool) -> TreeResult<f64> {
    let parent = tree.parent(node)?.ok_or(TreeError::Detached(node))?;
    let mut max_width =
        tree.rect(parent)?.width - Edges::uniform(FIELD_BORDER_WIDTH).horizontal();
    if header {
        let sibling_width = |sibling: Option<NodeId>| -> TreeResult<f64> {
            sibling.map_or(Ok(0.0), |id| Ok(tree.rect(id)?.width))
        };
        max_width -= sibling_width(tree.previous_sibling(node))?
            + sibling_width(tree.next_sibling(node))?;
    }
    Ok(round_to_hundredth(max_width))
}
