//! # Box Tree
//!
//! The mutable layout-side mirror of a [`ReportItem`] tree. Nodes live in an
//! arena in pre-order and are addressed by [`NodeId`]; each node keeps a
//! reference to its source item, its rendered rectangle in mm, and the
//! payload decoded from the item (checkbox state, image pixels, picture
//! commands).
//!
//! A tree is built fresh for every layout and paint cycle. Layout mutates
//! rectangles through `&mut BoxTree`; paint only ever sees `&BoxTree`.

use std::fmt::Write as _;

use once_cell::unsync::OnceCell;

use crate::error::ReportError;
use crate::geometry::Rect;
use crate::image_loader::{self, RasterImage};
use crate::model::{ImagePayload, ItemKind, ReportItem};
use crate::picture::Picture;
use crate::style::{LayoutAxis, Pen, Sides, TextStyle};
use crate::text::parse_check;

/// Index of a node in its [`BoxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decoded image content.
#[derive(Debug, Clone)]
pub enum ImageContent {
    Raster(RasterImage),
    Picture(Picture),
}

/// Node kind with payloads decoded once at build time.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Frame,
    Report,
    Text {
        text: String,
    },
    /// `None` when the payload is not a checkbox token.
    Check {
        checked: Option<bool>,
    },
    /// `None` when the payload failed to decode.
    Image {
        content: Option<ImageContent>,
        suppress_print: bool,
    },
}

#[derive(Debug)]
pub struct BoxNode<'a> {
    /// Rendered rectangle in mm. Only layout writes it.
    pub rect: Rect,
    pub item: &'a ReportItem,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
    /// The node is a spring, or has a child that is expandable.
    pub expandable: bool,
    /// Node that supplies the effective text style, resolved on first use.
    text_style_source: OnceCell<Option<NodeId>>,
}

impl<'a> BoxNode<'a> {
    /// Fill ratio of a spring. Negative and NaN ratios mean a fixed item.
    pub fn fill_ratio(&self) -> Option<f64> {
        self.item.fill_ratio.filter(|r| *r >= 0.0)
    }

    pub fn is_spring(&self) -> bool {
        self.fill_ratio().is_some()
    }

    pub fn layout_axis(&self) -> LayoutAxis {
        self.item.layout
    }
}

#[derive(Debug)]
pub struct BoxTree<'a> {
    nodes: Vec<BoxNode<'a>>,
}

impl<'a> BoxTree<'a> {
    /// Build a tree mirroring `root`. Payload decoding failures are logged
    /// and leave the node without content.
    pub fn build(root: &'a ReportItem) -> Self {
        let mut tree = BoxTree { nodes: Vec::new() };
        tree.push(root, None);

        // Pre-order: every child sits after its parent
        for i in (0..tree.nodes.len()).rev() {
            let expandable = tree.nodes[i].is_spring()
                || tree.nodes[i]
                    .children
                    .iter()
                    .any(|c| tree.nodes[c.0].expandable);
            tree.nodes[i].expandable = expandable;
        }

        tree
    }

    fn push(&mut self, item: &'a ReportItem, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(BoxNode {
            rect: Rect::default(),
            item,
            parent,
            children: Vec::with_capacity(item.children.len()),
            kind: decode_kind(item),
            expandable: false,
            text_style_source: OnceCell::new(),
        });

        for child in &item.children {
            let child_id = self.push(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }

        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> &BoxNode<'a> {
        &self.nodes[id.0]
    }

    pub fn rect(&self, id: NodeId) -> Rect {
        self.nodes[id.0].rect
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        self.nodes[id.0].rect = rect;
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_expandable(&self, id: NodeId) -> bool {
        self.nodes[id.0].expandable
    }

    /// True if any direct child carries a fill ratio.
    pub fn has_spring_children(&self, id: NodeId) -> bool {
        self.children(id).iter().any(|&c| self.node(c).is_spring())
    }

    pub fn inset_horizontal(&self, id: NodeId) -> f64 {
        self.nodes[id.0].item.inset.map_or(0.0, |i| i.horizontal)
    }

    pub fn inset_vertical(&self, id: NodeId) -> f64 {
        self.nodes[id.0].item.inset.map_or(0.0, |i| i.vertical)
    }

    /// The node rectangle shrunk by its inset on all four sides.
    pub fn dirty_rect(&self, id: NodeId) -> Rect {
        let h = self.inset_horizontal(id);
        let v = self.inset_vertical(id);
        self.rect(id).inset(h, v, h, v)
    }

    /// Per-side pens: override first, then the shared border pen.
    pub fn borders(&self, id: NodeId) -> Sides<Pen> {
        let item = self.nodes[id.0].item;
        Sides::resolve(item.borders.as_ref(), item.border)
    }

    /// The text style of the nearest node, starting at `id`, that defines
    /// one.
    pub fn effective_text_style(&self, id: NodeId) -> Result<&'a TextStyle, ReportError> {
        let source = *self.nodes[id.0].text_style_source.get_or_init(|| {
            let mut current = Some(id);
            while let Some(n) = current {
                if self.nodes[n.0].item.text_style.is_some() {
                    return Some(n);
                }
                current = self.nodes[n.0].parent;
            }
            None
        });

        source
            .and_then(|n| {
                let item: &'a ReportItem = self.nodes[n.0].item;
                item.text_style.as_ref()
            })
            .ok_or_else(|| ReportError::MissingTextStyle {
                node: self.describe(id),
            })
    }

    /// Short human-readable name: item id if present, arena index otherwise.
    pub fn describe(&self, id: NodeId) -> String {
        let node = &self.nodes[id.0];
        match &node.item.id {
            Some(item_id) => format!("'{}' ({})", item_id, node.item.kind.name()),
            None => format!("{} ({})", id, node.item.kind.name()),
        }
    }

    /// First node, in pre-order, whose item id equals `item_id`.
    pub fn find_by_id(&self, item_id: &str) -> Option<NodeId> {
        self.ids()
            .find(|&id| self.nodes[id.0].item.id.as_deref() == Some(item_id))
    }

    /// Move a node together with its whole subtree.
    pub fn shift(&mut self, id: NodeId, dx: f64, dy: f64) {
        self.nodes[id.0].rect.translate(dx, dy);
        self.shift_children(id, dx, dy);
    }

    /// Move every descendant of a node, leaving the node itself in place.
    pub fn shift_children(&mut self, id: NodeId, dx: f64, dy: f64) {
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.clone();
        while let Some(n) = stack.pop() {
            self.nodes[n.0].rect.translate(dx, dy);
            stack.extend_from_slice(&self.nodes[n.0].children);
        }
    }

    /// Indented diagnostic listing of the tree.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if !self.is_empty() {
            self.dump_node(self.root(), 0, &mut out);
        }
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self.nodes[id.0];
        let _ = write!(out, "{}{} {}", "  ".repeat(depth), node.item.kind.name(), id);
        if let Some(item_id) = &node.item.id {
            let _ = write!(out, " '{}'", item_id);
        }
        let _ = write!(out, " {}", node.rect);
        if let Some(ratio) = node.fill_ratio() {
            let _ = write!(out, " fill={}", ratio);
        }
        match &node.kind {
            NodeKind::Text { text } => {
                let _ = write!(out, " {:?}", text);
            }
            NodeKind::Check { checked } => {
                let _ = write!(out, " checked={:?}", checked);
            }
            NodeKind::Image { content: None, .. } => out.push_str(" <no content>"),
            _ => {}
        }
        out.push('\n');

        for &child in &node.children {
            self.dump_node(child, depth + 1, out);
        }
    }
}

fn decode_kind(item: &ReportItem) -> NodeKind {
    match &item.kind {
        ItemKind::Frame => NodeKind::Frame,
        ItemKind::Report => NodeKind::Report,
        ItemKind::Text { text } => NodeKind::Text { text: text.clone() },
        ItemKind::Check { text } => {
            let checked = parse_check(text);
            if checked.is_none() {
                log::warn!("checkbox payload {:?} is not a check token", text);
            }
            NodeKind::Check { checked }
        }
        ItemKind::Image {
            payload,
            suppress_print,
        } => {
            let content = match payload {
                ImagePayload::Raster { src } => image_loader::load_image(src)
                    .map(ImageContent::Raster)
                    .map_err(ReportError::Image),
                ImagePayload::Svg { content } => Picture::from_svg(content)
                    .map(ImageContent::Picture)
                    .map_err(ReportError::Picture),
            };
            NodeKind::Image {
                content: content
                    .map_err(|e| log::warn!("skipping image {:?}: {}", item.id, e))
                    .ok(),
                suppress_print: *suppress_print,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, Font};

    fn style(size: f64) -> TextStyle {
        TextStyle {
            font: Font {
                size,
                ..Font::default()
            },
            color: Color::BLACK,
        }
    }

    fn sample() -> ReportItem {
        ReportItem::report(vec![
            ReportItem::frame(vec![
                ReportItem::text("a").with_id("a"),
                ReportItem::frame(vec![]).with_fill_ratio(0.0),
            ])
            .with_text_style(style(12.0))
            .with_id("outer"),
            ReportItem::check("@{check:1}"),
        ])
    }

    #[test]
    fn test_build_pre_order() {
        let root = sample();
        let tree = BoxTree::build(&root);
        assert_eq!(tree.len(), 5);
        let outer = tree.find_by_id("outer").unwrap();
        assert_eq!(outer.index(), 1);
        assert_eq!(tree.children(outer).len(), 2);
        assert_eq!(tree.parent(outer), Some(tree.root()));
        assert_eq!(tree.find_by_id("a").map(|n| n.index()), Some(2));
        assert!(tree.find_by_id("missing").is_none());
    }

    #[test]
    fn test_expandable_propagates_up() {
        let root = sample();
        let tree = BoxTree::build(&root);
        let outer = tree.find_by_id("outer").unwrap();
        assert!(tree.is_expandable(NodeId(3)));
        assert!(tree.is_expandable(outer));
        assert!(tree.is_expandable(tree.root()));
        assert!(!tree.is_expandable(NodeId(4)));
        assert!(tree.has_spring_children(outer));
        assert!(!tree.has_spring_children(tree.root()));
    }

    #[test]
    fn test_negative_ratio_is_not_a_spring() {
        let root = ReportItem::frame(vec![
            ReportItem::frame(vec![]).with_fill_ratio(-1.0),
            ReportItem::frame(vec![]).with_fill_ratio(f64::NAN),
        ]);
        let tree = BoxTree::build(&root);
        for id in [NodeId(1), NodeId(2)] {
            assert_eq!(tree.node(id).fill_ratio(), None);
            assert!(!tree.is_expandable(id));
        }
        assert!(!tree.has_spring_children(tree.root()));
    }

    #[test]
    fn test_effective_text_style_inherits() {
        let root = sample();
        let tree = BoxTree::build(&root);
        let a = tree.find_by_id("a").unwrap();
        assert_eq!(tree.effective_text_style(a).unwrap().font.size, 12.0);
        // cached result is stable
        assert_eq!(tree.effective_text_style(a).unwrap().font.size, 12.0);
    }

    #[test]
    fn test_effective_text_style_missing() {
        let root = sample();
        let tree = BoxTree::build(&root);
        let err = tree.effective_text_style(NodeId(4)).unwrap_err();
        assert!(matches!(err, ReportError::MissingTextStyle { .. }));
        assert!(err.to_string().contains("#4 (Check)"));
    }

    #[test]
    fn test_check_payload_decoded() {
        let root = ReportItem::frame(vec![ReportItem::check("@{check:0}"), ReportItem::check("nope")]);
        let tree = BoxTree::build(&root);
        assert!(matches!(tree.node(NodeId(1)).kind, NodeKind::Check { checked: Some(false) }));
        assert!(matches!(tree.node(NodeId(2)).kind, NodeKind::Check { checked: None }));
    }

    #[test]
    fn test_bad_image_has_no_content() {
        let root = ReportItem::raster("not base64 at all!");
        let tree = BoxTree::build(&root);
        assert!(matches!(tree.node(tree.root()).kind, NodeKind::Image { content: None, .. }));
    }

    #[test]
    fn test_insets_and_borders() {
        let pen = Pen::solid(1.0, Color::BLACK);
        let root = ReportItem::frame(vec![]).with_inset(2.0, 3.0).with_border(pen);
        let mut tree = BoxTree::build(&root);
        let id = tree.root();
        tree.set_rect(id, Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(tree.inset_horizontal(id), 2.0);
        assert_eq!(tree.inset_vertical(id), 3.0);
        assert_eq!(tree.dirty_rect(id), Rect::new(2.0, 3.0, 16.0, 14.0));
        assert_eq!(tree.borders(id), Sides::uniform(pen));
    }

    #[test]
    fn test_shift_moves_subtree() {
        let root = sample();
        let mut tree = BoxTree::build(&root);
        let outer = tree.find_by_id("outer").unwrap();
        tree.shift(outer, 1.0, 2.0);
        assert_eq!(tree.rect(outer), Rect::new(1.0, 2.0, 0.0, 0.0));
        assert_eq!(tree.rect(NodeId(2)), Rect::new(1.0, 2.0, 0.0, 0.0));
        assert_eq!(tree.rect(tree.root()), Rect::default());

        tree.shift_children(outer, 1.0, 0.0);
        assert_eq!(tree.rect(outer).left, 1.0);
        assert_eq!(tree.rect(NodeId(3)).left, 2.0);
    }

    #[test]
    fn test_dump_lists_every_node() {
        let root = sample();
        let tree = BoxTree::build(&root);
        let dump = tree.dump();
        assert_eq!(dump.lines().count(), 5);
        assert!(dump.starts_with("Report #0"));
        assert!(dump.contains("  Frame #1 'outer'"));
        assert!(dump.contains("\"a\""));
        assert!(dump.contains("checked=Some(true)"));
    }
}
