//! # Box Layout Engine
//!
//! Computes the rendered rectangle of every node in a [`BoxTree`], in mm.
//!
//! The root receives the page rectangle. Everything below it is derived in
//! one pass that always starts from scratch, so laying out the same tree
//! twice gives identical rectangles:
//!
//! 1. **Measure** (bottom-up): each node's natural size. A declared width
//!    or height wins; containers sum their children along the flow axis and
//!    take the maximum across it, plus the inset on both sides; text measures
//!    its lines; every other leaf is empty.
//! 2. **Arrange** (top-down), per node:
//!    - the *dirty rectangle* is the node shrunk by its inset;
//!    - children are placed contiguously along the flow axis, stretched
//!      across it unless they declare a cross size; a child without a
//!      declared height is re-measured at the width it receives, so text
//!      wrapped deep inside it grows every frame on the way up;
//!    - in vertical flow, spring children (those with a fill ratio) grow to
//!      their share of the free height and push later siblings down;
//!    - children are aligned along the main axis as one block, and across
//!      it one by one;
//!    - then each child is arranged in turn.
//!
//! Springs never shrink a child, and a vertical container with springs
//! skips main-axis alignment: the springs already own the free space.

pub mod spring;

use crate::boxtree::{BoxTree, NodeId, NodeKind};
use crate::error::ReportError;
use crate::font::FontContext;
use crate::geometry::Rect;
use crate::style::LayoutAxis;
use crate::text::TextLayout;
use crate::units::{mm_to_points, points_to_mm};

use self::spring::FlowItem;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Size {
    width: f64,
    height: f64,
}

/// Start of `rect` along `axis`.
fn start(rect: &Rect, axis: LayoutAxis) -> f64 {
    match axis {
        LayoutAxis::Horizontal => rect.left,
        _ => rect.top,
    }
}

/// Extent of `rect` along `axis`.
fn extent(rect: &Rect, axis: LayoutAxis) -> f64 {
    match axis {
        LayoutAxis::Horizontal => rect.width,
        _ => rect.height,
    }
}

fn offset(axis: LayoutAxis, amount: f64) -> (f64, f64) {
    match axis {
        LayoutAxis::Horizontal => (amount, 0.0),
        _ => (0.0, amount),
    }
}

/// Offset that moves `content` to `fraction` of the free space in
/// `container`, or `None` when there is nothing to do.
fn alignment_offset(container: &Rect, content: &Rect, axis: LayoutAxis, fraction: f64) -> Option<f64> {
    let slack = extent(container, axis) - extent(content, axis);
    if fraction > 0.0 && slack > 0.0 {
        Some(slack * fraction - (start(content, axis) - start(container, axis)))
    } else {
        None
    }
}

/// Size across the flow axis: children stretch unless they declare a size
/// and are not expandable.
fn cross_size(tree: &BoxTree<'_>, child: NodeId, declared: Option<f64>, natural: f64, room: f64) -> f64 {
    if declared.is_none() || tree.is_expandable(child) {
        room
    } else {
        natural.min(room).max(0.0)
    }
}

/// Widths of the children of a horizontal row: natural widths, with the
/// last expandable child taking whatever `room` is left.
fn row_widths(tree: &BoxTree<'_>, children: &[NodeId], natural: &[Size], room: f64) -> Vec<f64> {
    let mut widths: Vec<f64> = children.iter().map(|c| natural[c.index()].width).collect();
    let free = room - widths.iter().sum::<f64>();
    if free > 0.0 {
        if let Some(pos) = children.iter().rposition(|&c| tree.is_expandable(c)) {
            widths[pos] += free;
        }
    }
    widths
}

#[derive(Default)]
pub struct LayoutEngine {
    text_layout: TextLayout,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            text_layout: TextLayout::new(),
        }
    }

    /// Lay out the whole tree inside `page_rect`.
    ///
    /// Fails only when a text node has no text style anywhere up its
    /// ancestor chain.
    pub fn layout(
        &self,
        tree: &mut BoxTree<'_>,
        page_rect: Rect,
        font_context: &FontContext,
    ) -> Result<(), ReportError> {
        if tree.is_empty() {
            return Ok(());
        }

        let mut natural = vec![Size::default(); tree.len()];
        let root = tree.root();
        self.measure(tree, root, font_context, &mut natural)?;

        tree.set_rect(root, page_rect.normalized_size());
        self.arrange(tree, root, font_context, &natural)
    }

    fn measure(
        &self,
        tree: &BoxTree<'_>,
        id: NodeId,
        font_context: &FontContext,
        natural: &mut [Size],
    ) -> Result<Size, ReportError> {
        let mut child_sizes = Vec::with_capacity(tree.children(id).len());
        for &child in tree.children(id) {
            child_sizes.push(self.measure(tree, child, font_context, natural)?);
        }

        let node = tree.node(id);
        let content = match &node.kind {
            NodeKind::Text { text } => self.text_size(tree, id, text, f64::INFINITY, font_context)?,
            _ if child_sizes.is_empty() => Size::default(),
            _ => {
                let widths = child_sizes.iter().map(|s| s.width);
                let heights = child_sizes.iter().map(|s| s.height);
                let (width, height) = match node.layout_axis() {
                    LayoutAxis::Vertical => (widths.fold(0.0, f64::max), heights.sum::<f64>()),
                    LayoutAxis::Horizontal => (widths.sum::<f64>(), heights.fold(0.0, f64::max)),
                    LayoutAxis::None => (widths.fold(0.0, f64::max), heights.fold(0.0, f64::max)),
                };
                Size {
                    width: width + 2.0 * tree.inset_horizontal(id),
                    height: height + 2.0 * tree.inset_vertical(id),
                }
            }
        };

        let size = Size {
            width: node.item.width.unwrap_or(content.width).max(0.0),
            height: node.item.height.unwrap_or(content.height).max(0.0),
        };
        natural[id.index()] = size;
        Ok(size)
    }

    /// Size of a text node's lines wrapped at `max_width` mm.
    fn text_size(
        &self,
        tree: &BoxTree<'_>,
        id: NodeId,
        text: &str,
        max_width: f64,
        font_context: &FontContext,
    ) -> Result<Size, ReportError> {
        let font = &tree.effective_text_style(id)?.font;
        let lines = self
            .text_layout
            .break_into_lines(font_context, text, mm_to_points(max_width), font);

        let count = lines.len() as f64;
        let widest = lines.iter().map(|l| l.width).fold(0.0, f64::max);
        let height = count * font_context.line_height(font) + (count - 1.0).max(0.0) * font_context.leading(font);

        Ok(Size {
            width: points_to_mm(widest),
            height: points_to_mm(height),
        })
    }

    /// Height of `id` when placed at `width`, with every undeclared height
    /// below it following text wrapped at the width it will receive.
    fn fit_height(
        &self,
        tree: &BoxTree<'_>,
        id: NodeId,
        width: f64,
        font_context: &FontContext,
        natural: &[Size],
    ) -> Result<f64, ReportError> {
        let node = tree.node(id);
        if let Some(height) = node.item.height {
            return Ok(height.max(0.0));
        }
        if let NodeKind::Text { text } = &node.kind {
            return Ok(self.text_size(tree, id, text, width, font_context)?.height);
        }

        let children = tree.children(id);
        if children.is_empty() {
            return Ok(natural[id.index()].height);
        }

        let room = (width - 2.0 * tree.inset_horizontal(id)).max(0.0);
        let widths = match node.layout_axis() {
            LayoutAxis::Horizontal => row_widths(tree, children, natural, room),
            _ => children
                .iter()
                .map(|&c| cross_size(tree, c, tree.node(c).item.width, natural[c.index()].width, room))
                .collect(),
        };

        let mut heights = Vec::with_capacity(children.len());
        for (&child, child_width) in children.iter().zip(widths) {
            heights.push(self.fit_height(tree, child, child_width, font_context, natural)?);
        }
        let content = match node.layout_axis() {
            LayoutAxis::Vertical => heights.iter().sum::<f64>(),
            _ => heights.iter().copied().fold(0.0, f64::max),
        };
        Ok(content + 2.0 * tree.inset_vertical(id))
    }

    fn arrange(
        &self,
        tree: &mut BoxTree<'_>,
        id: NodeId,
        font_context: &FontContext,
        natural: &[Size],
    ) -> Result<(), ReportError> {
        let children = tree.children(id).to_vec();
        if children.is_empty() {
            return Ok(());
        }

        let dirty = tree.dirty_rect(id);
        if !dirty.is_valid() {
            log::debug!(
                "{}: inset leaves no room ({}), collapsing children",
                tree.describe(id),
                dirty
            );
            let origin = tree.rect(id).top_left();
            for &child in &children {
                tree.set_rect(child, Rect::new(origin.x, origin.y, 0.0, 0.0));
                self.arrange(tree, child, font_context, natural)?;
            }
            return Ok(());
        }

        log::debug!("{}: dirty rect {}", tree.describe(id), dirty);

        self.place_children(tree, id, &children, dirty, font_context, natural)?;
        if tree.node(id).layout_axis() == LayoutAxis::Vertical {
            self.expand_vertical_springs(tree, id, &children, dirty);
        }
        self.align_children(tree, id, &children, dirty);

        for &child in &children {
            self.arrange(tree, child, font_context, natural)?;
        }
        Ok(())
    }

    /// Contiguous placement from the dirty origin along the flow axis.
    fn place_children(
        &self,
        tree: &mut BoxTree<'_>,
        id: NodeId,
        children: &[NodeId],
        dirty: Rect,
        font_context: &FontContext,
        natural: &[Size],
    ) -> Result<(), ReportError> {
        match tree.node(id).layout_axis() {
            LayoutAxis::Vertical => {
                let mut y = dirty.top;
                for &child in children {
                    let nat = natural[child.index()];
                    let item = tree.node(child).item;
                    let width = cross_size(tree, child, item.width, nat.width, dirty.width);

                    // Undeclared heights follow text wrapped at the placed width
                    let height = match item.height {
                        Some(_) => nat.height,
                        None => self.fit_height(tree, child, width, font_context, natural)?,
                    };

                    tree.set_rect(child, Rect::new(dirty.left, y, width, height));
                    y += height;
                }
            }
            LayoutAxis::Horizontal => {
                let mut x = dirty.left;
                for (&child, width) in children.iter().zip(row_widths(tree, children, natural, dirty.width)) {
                    let nat = natural[child.index()];
                    let item = tree.node(child).item;
                    let height = cross_size(tree, child, item.height, nat.height, dirty.height);
                    if width > nat.width {
                        log::debug!("{}: stretched by {:.3}mm", tree.describe(child), width - nat.width);
                    }
                    tree.set_rect(child, Rect::new(x, dirty.top, width, height));
                    x += width;
                }
            }
            LayoutAxis::None => {
                for &child in children {
                    let nat = natural[child.index()];
                    let item = tree.node(child).item;
                    let width = cross_size(tree, child, item.width, nat.width, dirty.width);
                    let height = cross_size(tree, child, item.height, nat.height, dirty.height);
                    tree.set_rect(child, Rect::new(dirty.left, dirty.top, width, height));
                }
            }
        }
        Ok(())
    }

    /// Grow spring children to their share of the free height. Each child is
    /// moved down by the growth of the springs before it.
    fn expand_vertical_springs(&self, tree: &mut BoxTree<'_>, id: NodeId, children: &[NodeId], dirty: Rect) {
        if !tree.has_spring_children(id) {
            return;
        }

        let items: Vec<FlowItem> = children
            .iter()
            .map(|&c| match tree.node(c).fill_ratio() {
                Some(ratio) => FlowItem::Spring(ratio),
                None => FlowItem::Fixed(tree.rect(c).height),
            })
            .collect();
        let targets = spring::distribute(dirty.height, &items);

        let mut shift = 0.0;
        for (&child, target) in children.iter().zip(targets) {
            if shift != 0.0 {
                tree.shift(child, 0.0, shift);
            }
            let Some(target) = target else {
                continue;
            };
            let mut rect = tree.rect(child);
            if target > rect.height {
                shift += target - rect.height;
                rect.height = target;
                tree.set_rect(child, rect);
                log::debug!("{}: spring grown to {:.3}mm", tree.describe(child), target);
            } else {
                log::debug!(
                    "{}: spring target {:.3}mm below current {:.3}mm, kept",
                    tree.describe(child),
                    target,
                    rect.height
                );
            }
        }
    }

    fn align_children(&self, tree: &mut BoxTree<'_>, id: NodeId, children: &[NodeId], dirty: Rect) {
        let node = tree.node(id);
        let alignment = node.item.alignment;
        if alignment.is_default() {
            return;
        }

        let main = node.layout_axis();
        if main == LayoutAxis::None {
            for &child in children {
                for axis in [LayoutAxis::Horizontal, LayoutAxis::Vertical] {
                    self.align_one(tree, child, dirty, axis, alignment.fraction(axis));
                }
            }
            return;
        }

        if main == LayoutAxis::Vertical && tree.has_spring_children(id) {
            log::debug!("{}: springs present, main-axis alignment skipped", tree.describe(id));
        } else {
            let block = children
                .iter()
                .map(|&c| tree.rect(c))
                .reduce(|a, b| a.union(&b));
            if let Some(amount) = block.and_then(|b| alignment_offset(&dirty, &b, main, alignment.fraction(main))) {
                let (dx, dy) = offset(main, amount);
                for &child in children {
                    tree.shift(child, dx, dy);
                }
                log::debug!("{}: block aligned by {:.3}mm", tree.describe(id), amount);
            }
        }

        let cross = main.orthogonal();
        for &child in children {
            self.align_one(tree, child, dirty, cross, alignment.fraction(cross));
        }
    }

    fn align_one(&self, tree: &mut BoxTree<'_>, child: NodeId, dirty: Rect, axis: LayoutAxis, fraction: f64) {
        if let Some(amount) = alignment_offset(&dirty, &tree.rect(child), axis, fraction) {
            let (dx, dy) = offset(axis, amount);
            tree.shift(child, dx, dy);
        }
    }
}
