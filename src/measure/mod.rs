//! Text extent measurement through shared off-screen probe nodes.

use unicode_width::UnicodeWidthChar;

use crate::geometry::{round_to_hundredth, Edges, Rect};
use crate::tree::{Length, NodeId, TextStyle, Tree, TreeResult, WhiteSpace};

/// Host text shaping. Implementations answer for a single style at a time.
pub trait TextMetrics {
    /// Width of `text` laid out on one line without wrapping.
    fn line_width(&self, text: &str, style: &TextStyle) -> f64;

    /// Content height of `text` wrapped (pre-wrap, break-word) to `width`.
    fn wrapped_height(&self, text: &str, style: &TextStyle, width: f64) -> f64;
}

/// Headless metrics: each terminal column advances by a fixed share of the
/// font size, and lines wrap greedily at spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceMetrics {
    pub advance_ratio: f64,
}

impl Default for FixedAdvanceMetrics {
    fn default() -> Self {
        Self { advance_ratio: 0.5 }
    }
}

impl FixedAdvanceMetrics {
    fn char_advance(&self, c: char, style: &TextStyle) -> f64 {
        let columns = c.width().unwrap_or(0) as f64;
        columns * style.font_size * self.advance_ratio + style.letter_spacing
    }

    fn wrapped_line_count(&self, line: &str, style: &TextStyle, width: f64) -> usize {
        let mut lines = 1;
        let mut current = 0.0;
        for word in line.split_inclusive(' ') {
            let word_width: f64 = word.chars().map(|c| self.char_advance(c, style)).sum();
            if current + word_width <= width {
                current += word_width;
                continue;
            }
            if current > 0.0 {
                lines += 1;
                current = 0.0;
            }
            if word_width <= width {
                current = word_width;
                continue;
            }
            // break-word: split an over-long word across lines
            for c in word.chars() {
                let advance = self.char_advance(c, style);
                if current + advance > width && current > 0.0 {
                    lines += 1;
                    current = 0.0;
                }
                current += advance;
            }
        }
        lines
    }
}

impl TextMetrics for FixedAdvanceMetrics {
    fn line_width(&self, text: &str, style: &TextStyle) -> f64 {
        text.chars().map(|c| self.char_advance(c, style)).sum()
    }

    fn wrapped_height(&self, text: &str, style: &TextStyle, width: f64) -> f64 {
        let width = width.max(0.0);
        let lines: usize = text
            .split('\n')
            .map(|line| self.wrapped_line_count(line, style, width))
            .sum();
        lines as f64 * style.line_height
    }
}

/// The two process-lifetime probes. Created on first use and never removed.
#[derive(Debug, Default)]
pub struct Probes {
    inline: Option<NodeId>,
    block: Option<NodeId>,
}

impl Probes {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(
        slot: &mut Option<NodeId>,
        tree: &mut Tree,
        tag: &str,
        white_space: WhiteSpace,
    ) -> TreeResult<NodeId> {
        if let Some(probe) = slot.filter(|probe| tree.contains(*probe)) {
            return Ok(probe);
        }
        let probe = tree.create_element(tag);
        {
            let style = &mut tree.node_mut(probe)?.style;
            style.offscreen = true;
            style.white_space = white_space;
        }
        tree.append_child(tree.root(), probe)?;
        tracing::debug!(probe, tag, "created measuring probe");
        *slot = Some(probe);
        Ok(probe)
    }

    pub fn inline_probe(&mut self, tree: &mut Tree) -> TreeResult<NodeId> {
        Self::ensure(&mut self.inline, tree, "span", WhiteSpace::NoWrap)
    }

    pub fn block_probe(&mut self, tree: &mut Tree) -> TreeResult<NodeId> {
        Self::ensure(&mut self.block, tree, "div", WhiteSpace::PreWrap)
    }

    /// Natural single-line width of `text` rendered in `style`.
    pub fn measure_text_width(
        &mut self,
        tree: &mut Tree,
        metrics: &dyn TextMetrics,
        style: &TextStyle,
        text: &str,
    ) -> TreeResult<f64> {
        let probe = self.inline_probe(tree)?;
        tree.set_text_content(probe, text)?;
        let node = tree.node_mut(probe)?;
        node.style.text = style.clone();
        let width = metrics.line_width(text, style);
        node.set_rect(Rect::sized(width, style.line_height));
        Ok(round_to_hundredth(node.rect().width))
    }

    /// Border-box height of `text` wrapped inside a block of border-box `width`.
    pub fn measure_wrapped_height(
        &mut self,
        tree: &mut Tree,
        metrics: &dyn TextMetrics,
        style: &TextStyle,
        border: Edges,
        width: f64,
        text: &str,
    ) -> TreeResult<f64> {
        let probe = self.block_probe(tree)?;
        tree.set_text_content(probe, text)?;
        let node = tree.node_mut(probe)?;
        node.style.text = style.clone();
        node.style.border = border;
        node.style.width = Length::Px(width);
        let content_width = (width - border.horizontal()).max(0.0);
        let height = metrics.wrapped_height(text, style, content_width) + border.vertical();
        node.set_rect(Rect::sized(width, height));
        Ok(round_to_hundredth(node.rect().height))
    }
}
