//! The rendering pass.
//!
//! Every element with a renderer is turned into a [`Fragment`] of text once
//! all of its children have been rendered.  Renderers only see their
//! children's output (as [`Content`]), the node they are rendering and the
//! [`LayoutBox`] computed for them from their parent's.

use std::collections::HashMap;

pub mod layout;
pub mod registry;
pub(crate) mod renderers;
pub mod settings;
pub mod text;

use crate::dom::{Document, Link, Node, NodeData, NodeId};
use crate::{tree_map_reduce, OutputFormat, Placement, TreeMapResult};
use layout::{LayoutBox, Sides};
use renderers::renderer_for;
use settings::{RendererKind, Settings};
use text::{visible_width, MENU_END, MENU_START};

/// A piece of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    /// Text which flows with the surrounding text.
    Inline(String),
    /// Lines which stand on their own.
    Block(String),
}

impl Fragment {
    fn is_block(&self) -> bool {
        matches!(self, Fragment::Block(_))
    }

    fn as_str(&self) -> &str {
        match self {
            Fragment::Inline(s) | Fragment::Block(s) => s,
        }
    }
}

/// The rendered children of a node, in order.  Adjacent inline fragments
/// are merged; inline whitespace next to a block is dropped.
#[derive(Debug, Default, Clone)]
pub(crate) struct Content {
    parts: Vec<Fragment>,
}

impl Content {
    pub fn push(&mut self, fragment: Fragment) {
        match fragment {
            Fragment::Inline(text) => {
                let text = if matches!(self.parts.last(), Some(Fragment::Block(_))) {
                    text.trim_start().to_string()
                } else {
                    text
                };
                if text.is_empty() {
                    return;
                }
                match self.parts.last_mut() {
                    Some(Fragment::Inline(prev)) => prev.push_str(&text),
                    _ => self.parts.push(Fragment::Inline(text)),
                }
            }
            Fragment::Block(text) => {
                if let Some(Fragment::Inline(prev)) = self.parts.last_mut() {
                    let len = prev.trim_end().len();
                    prev.truncate(len);
                    if prev.is_empty() {
                        self.parts.pop();
                    }
                }
                self.parts.push(Fragment::Block(text));
            }
        }
    }

    /// Drop spaces at the very start and end of the content.
    pub fn trim_edges(&mut self) {
        if let Some(Fragment::Inline(first)) = self.parts.first_mut() {
            let len = first.len() - first.trim_start_matches(' ').len();
            first.drain(..len);
        }
        if let Some(Fragment::Inline(last)) = self.parts.last_mut() {
            let len = last.trim_end_matches(' ').len();
            last.truncate(len);
        }
        self.parts.retain(|part| !part.as_str().is_empty());
    }

    pub fn has_block(&self) -> bool {
        self.parts.iter().any(Fragment::is_block)
    }

    pub fn into_parts(self) -> Vec<Fragment> {
        self.parts
    }

    /// Join the fragments, starting each block on a fresh line.
    pub fn into_string(self) -> String {
        let mut out = String::new();
        let mut after_block = false;
        for part in self.parts {
            let is_block = part.is_block();
            if (is_block || after_block) && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(part.as_str());
            after_block = is_block;
        }
        out
    }
}

impl From<Fragment> for Content {
    fn from(fragment: Fragment) -> Content {
        let mut content = Content::default();
        content.push(fragment);
        content
    }
}

/// Everything a renderer knows about the node it is rendering.
#[derive(Debug, Clone)]
pub(crate) struct NodeContext<'a> {
    pub doc: &'a Document,
    pub id: NodeId,
    pub kind: RendererKind,
    pub settings: Settings,
    pub format: OutputFormat,
}

impl<'a> NodeContext<'a> {
    pub fn node(&self) -> &'a Node {
        self.doc.node(self.id)
    }

    pub fn link(&self) -> Option<&'a Link> {
        self.node().link()
    }

    pub fn tag_name(&self) -> &'a str {
        self.node().tag_name().unwrap_or("")
    }

    /// True inside a `pre` element, or for the `pre` itself.
    pub fn in_pre(&self) -> bool {
        let mut current = Some(self.id);
        while let Some(id) = current {
            let node = self.doc.node(id);
            if node.tag_name() == Some("pre") {
                return true;
            }
            current = node.parent;
        }
        false
    }

    pub fn parent_tag(&self) -> Option<&'a str> {
        self.node()
            .parent
            .and_then(|parent| self.doc.node(parent).tag_name())
    }
}

/// The behaviour behind a [`RendererKind`].
///
/// Block renderers go through three steps after their children are done:
/// the inner transform, border and padding, then margins.  Inline renderers
/// only have the inner transform.
pub(crate) trait Renderer: Sync {
    /// Adjust the settings from the node's position in the tree, before
    /// the layout is worked out.
    fn prepare(&self, _ctx: &mut NodeContext<'_>) {}

    /// A template added to each line, which takes up room in the box.
    fn line_template<'s>(&self, _settings: &'s Settings) -> Option<&'s str> {
        None
    }

    /// The box for this node.  Inline renderers share their parent's.
    fn layout(&self, ctx: &NodeContext<'_>, parent: &LayoutBox) -> LayoutBox {
        if !ctx.kind.is_block() {
            return parent.clone();
        }
        let s = &ctx.settings;
        LayoutBox::nested(
            parent,
            s.margin.clone(),
            s.padding.clone(),
            s.border.widths(),
            self.line_template(s),
        )
    }

    /// Turn the rendered children into this node's content.
    fn render_inner(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, content: Content) -> String;

    /// Add padding and borders.
    fn render_border(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, text: String) -> String {
        if ctx.kind.is_block() {
            border_render(&text, layout, &ctx.settings.border)
        } else {
            text
        }
    }

    /// Add margins.
    fn render_outer(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, text: String) -> String {
        if ctx.kind.is_block() {
            outer_render(&text, layout)
        } else {
            text
        }
    }

    fn render(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, content: Content) -> Fragment {
        if !ctx.kind.is_block() && content.has_block() {
            // An inline element wrapped around blocks leaves them alone.
            return Fragment::Block(content.into_string());
        }
        let mut content = content;
        if ctx.kind.is_block() && !ctx.in_pre() {
            content.trim_edges();
        }
        let inner = self.render_inner(ctx, layout, content);
        let bordered = self.render_border(ctx, layout, inner);
        let text = self.render_outer(ctx, layout, bordered);
        if ctx.kind.is_block() {
            Fragment::Block(text)
        } else {
            Fragment::Inline(text)
        }
    }
}

/// Pad every line to the box's width and surround it with the borders.
pub(crate) fn border_render(text: &str, layout: &LayoutBox, border: &Sides<String>) -> String {
    let padding = layout.padding();
    let padded_width = layout.padded_width();
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            let fill = padded_width.saturating_sub(padding.left + visible_width(line));
            format!(
                "{}{}{}{}{}",
                border.left,
                " ".repeat(padding.left),
                line,
                " ".repeat(fill),
                border.right
            )
        })
        .collect();

    let blank = format!("{}{}{}", border.left, " ".repeat(padded_width), border.right);
    for _ in 0..padding.top {
        lines.insert(0, blank.clone());
    }
    for _ in 0..padding.bottom {
        lines.push(blank.clone());
    }

    let bordered_width = layout.bordered_width();
    for c in border.top.chars().rev() {
        lines.insert(0, c.to_string().repeat(bordered_width));
    }
    for c in border.bottom.chars() {
        lines.push(c.to_string().repeat(bordered_width));
    }
    lines.join("\n")
}

/// Indent every line by the left margin and add the top and bottom margins.
pub(crate) fn outer_render(text: &str, layout: &LayoutBox) -> String {
    let margin = layout.margin();
    let indent = " ".repeat(margin.left);
    let mut out = "\n".repeat(margin.top);
    for line in text.split_inclusive('\n') {
        out.push_str(&indent);
        out.push_str(line);
    }
    out.push_str(&"\n".repeat(margin.bottom));
    out
}

/// Document-wide rendering options.
#[derive(Debug, Clone)]
pub(crate) struct RenderOptions {
    pub width: usize,
    pub margin: Sides<usize>,
    pub padding: Sides<usize>,
    pub border: Sides<String>,
    pub format: OutputFormat,
    pub optimise: bool,
}

/// State for rendering one document.
struct RenderSession<'a> {
    doc: &'a Document,
    format: OutputFormat,
    root: LayoutBox,
    boxes: Vec<LayoutBox>,
    /// Links to show after each open block, innermost last.
    scopes: Vec<Vec<NodeId>>,
    /// After-block links with no enclosing block.
    orphans: Vec<NodeId>,
    /// The rendered text of every link reached so far.
    descriptions: HashMap<NodeId, String>,
}

impl<'a> RenderSession<'a> {
    fn new(doc: &'a Document, format: OutputFormat, root: LayoutBox) -> RenderSession<'a> {
        RenderSession {
            doc,
            format,
            root,
            boxes: Vec::new(),
            scopes: Vec::new(),
            orphans: Vec::new(),
            descriptions: HashMap::new(),
        }
    }

    fn current_box(&self) -> &LayoutBox {
        self.boxes.last().unwrap_or(&self.root)
    }

    /// Render the extracted form of a link inside `parent`.
    fn render_extracted(&self, id: NodeId, parent: &LayoutBox) -> Option<Fragment> {
        let assignment = self.doc.node(id).extracted.as_ref()?;
        let description = self.descriptions.get(&id)?;
        let mut ctx = NodeContext {
            doc: self.doc,
            id,
            kind: assignment.kind,
            settings: assignment.settings.clone(),
            format: self.format,
        };
        let renderer = renderer_for(ctx.kind);
        renderer.prepare(&mut ctx);
        let layout = renderer.layout(&ctx, parent);
        html_trace_quiet!("render_extracted: {} as {:?}", id, ctx.kind);
        Some(renderer.render(
            &ctx,
            &layout,
            Fragment::Inline(description.clone()).into(),
        ))
    }

    /// The footer: footer links and orphaned after-block links, in
    /// reference order.
    fn render_footer(&mut self) -> String {
        let mut ids: Vec<NodeId> = self
            .doc
            .footer_links
            .iter()
            .chain(self.orphans.iter())
            .copied()
            .filter(|id| self.descriptions.contains_key(id))
            .collect();
        ids.sort_by_key(|&id| self.doc.node(id).link().and_then(|l| l.reference));
        let root = self.root.clone();
        let mut footer = Content::default();
        for id in ids {
            if let Some(fragment) = self.render_extracted(id, &root) {
                footer.push(fragment);
            }
        }
        footer.into_string()
    }
}

fn process_node<'a>(
    session: &mut RenderSession<'a>,
    id: NodeId,
) -> TreeMapResult<'a, RenderSession<'a>, NodeId, Fragment> {
    let doc = session.doc;
    let node = doc.node(id);
    let assignment = match (&node.data, &node.renderer) {
        (NodeData::Text(text), _) => return TreeMapResult::Finished(Fragment::Inline(text.clone())),
        (_, Some(assignment)) => assignment,
        (_, None) => return TreeMapResult::Nothing,
    };
    if assignment.kind == RendererKind::None {
        html_trace_quiet!("process_node: skipping <{}>", node.tag_name().unwrap_or(""));
        return TreeMapResult::Nothing;
    }

    let mut ctx = NodeContext {
        doc,
        id,
        kind: assignment.kind,
        settings: assignment.settings.clone(),
        format: session.format,
    };
    let renderer = renderer_for(ctx.kind);
    renderer.prepare(&mut ctx);
    let layout = renderer.layout(&ctx, session.current_box());
    html_trace!(
        "process_node: <{}> as {:?}, inner width {}",
        ctx.tag_name(),
        ctx.kind,
        layout.inner_width()
    );
    session.boxes.push(layout.clone());
    let is_block = ctx.kind.is_block();
    if is_block {
        session.scopes.push(Vec::new());
    }

    TreeMapResult::PendingChildren {
        children: node.children.clone(),
        cons: Box::new(move |session, fragments| {
            session.boxes.pop();
            let mut content = Content::default();
            for fragment in fragments {
                content.push(fragment);
            }

            if let Some(link) = ctx.link() {
                let description = content.clone().into_string();
                // Bare anchors have nothing to extract.
                let bare = link.href.is_empty() && description.trim().is_empty();
                if link.placement != Placement::Inline && !bare {
                    session.descriptions.insert(ctx.id, description);
                }
                if link.placement == Placement::AfterBlock && !bare {
                    match session.scopes.last_mut() {
                        Some(scope) => scope.push(ctx.id),
                        None => session.orphans.push(ctx.id),
                    }
                }
            }

            let rendered = renderer.render(&ctx, &layout, content);
            if !is_block {
                return Some(rendered);
            }
            let pending = session.scopes.pop().unwrap_or_default();
            if pending.is_empty() {
                return Some(rendered);
            }
            let parent = session.current_box().clone();
            let mut joined = Content::from(rendered);
            for link_id in pending {
                if let Some(fragment) = session.render_extracted(link_id, &parent) {
                    joined.push(fragment);
                }
            }
            Some(Fragment::Block(joined.into_string()))
        }),
    }
}

/// Keep only the menu text of lines holding a gophermap menu entry; they
/// can't have margins or padding around them.
fn strip_menu_markers(text: &str) -> String {
    if !text.contains(MENU_START) {
        return text.to_string();
    }
    text.split('\n')
        .map(|line| match (line.find(MENU_START), line.rfind(MENU_END)) {
            (Some(start), Some(end)) if start < end => {
                line[start + MENU_START.len_utf8()..end].to_string()
            }
            _ => line.replace([MENU_START, MENU_END], ""),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn optimise(text: &str) -> String {
    text.split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a complete document.
pub(crate) fn render_document(doc: &Document, options: &RenderOptions) -> String {
    let root = LayoutBox::root(
        options.width,
        options.margin.clone(),
        options.padding.clone(),
        options.border.widths(),
    );
    let mut session = RenderSession::new(doc, options.format, root.clone());

    let mut body = Content::default();
    for &id in &doc.roots {
        if let Some(fragment) = tree_map_reduce(&mut session, id, process_node) {
            body.push(fragment);
        }
    }
    let mut text = body.into_string();

    let footer = session.render_footer();
    if !footer.is_empty() {
        if !text.is_empty() {
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text.push('\n');
        }
        text.push_str(&footer);
    }

    let has_frame = root.padding() != &Sides::all(0) || root.border() != &Sides::all(0);
    if has_frame {
        text = border_render(&text, &root, &options.border);
    }
    text = outer_render(&text, &root);

    if options.format == OutputFormat::Gophermap {
        text = strip_menu_markers(&text);
    }
    if options.optimise {
        text = optimise(&text);
    }
    text
}
