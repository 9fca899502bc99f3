//! The built-in renderers, one per family of [`RendererKind`]s.

use crate::css::SelectorNode;
use crate::render::layout::LayoutBox;
use crate::render::settings::{RendererKind, Settings};
use crate::render::text::{
    capitalize, center, format_template, justify, spread, visible_width, WrapOptions, MENU_END,
    MENU_START,
};
use crate::render::{Content, Fragment, NodeContext, Renderer};
use crate::{OutputFormat, Placement};

/// The renderer implementing `kind`.
pub(crate) fn renderer_for(kind: RendererKind) -> &'static dyn Renderer {
    use RendererKind::*;
    match kind {
        None => &Discard,
        Inline | Emphasis | Strong | Underline | Strikethrough => &InlineText,
        Break => &LineBreak,
        Code => &CodeSpan,
        Link => &LinkText,
        Image => &ImageText,
        AnsiEscape => &AnsiEscapeText,
        Block | List | DefinitionList => &PlainBlock,
        Header | MarkdownHeader | DefinitionTerm => &Heading,
        Paragraph => &WrappedParagraph,
        Pre => &Preformatted,
        BlockQuote => &Quotation,
        ListItem | OrderedListItem | DefinitionItem => &Item,
        HorizontalRule => &Rule,
        ExtractedLink | ExtractedImage => &Extracted,
    }
}

fn maybe_capitalize(settings: &Settings, text: String) -> String {
    if settings.capitalized {
        capitalize(&text)
    } else {
        text
    }
}

fn wrap_options(settings: &Settings, width: usize) -> WrapOptions {
    WrapOptions {
        width,
        initial_indent: " ".repeat(settings.initial_indent),
        subsequent_indent: " ".repeat(settings.subsequent_indent),
        fix_sentence_endings: settings.fix_sentence_endings,
        break_long_words: settings.break_long_words,
        break_on_hyphens: settings.break_on_hyphens,
    }
}

fn apply_line_template(template: &str, text: &str) -> String {
    text.split('\n')
        .map(|line| format_template(template, &[line], &[]))
        .collect::<Vec<_>>()
        .join("\n")
}

struct Discard;

impl Renderer for Discard {
    fn render_inner(&self, _ctx: &NodeContext<'_>, _layout: &LayoutBox, _content: Content) -> String {
        String::new()
    }
}

struct InlineText;

impl Renderer for InlineText {
    fn render_inner(&self, ctx: &NodeContext<'_>, _layout: &LayoutBox, content: Content) -> String {
        let text = maybe_capitalize(&ctx.settings, content.into_string());
        format_template(&ctx.settings.template, &[&text], &[])
    }
}

struct LineBreak;

impl Renderer for LineBreak {
    fn render_inner(&self, ctx: &NodeContext<'_>, _layout: &LayoutBox, _content: Content) -> String {
        format_template(&ctx.settings.template, &["\n"], &[])
    }
}

struct CodeSpan;

impl Renderer for CodeSpan {
    fn render_inner(&self, ctx: &NodeContext<'_>, _layout: &LayoutBox, content: Content) -> String {
        let text = content.into_string();
        if ctx.parent_tag() == Some("pre") {
            text
        } else if text.contains('\n') {
            format_template(&ctx.settings.block_template, &[&text], &[])
        } else {
            format_template(&ctx.settings.inline_template, &[&text], &[])
        }
    }
}

struct LinkText;

impl Renderer for LinkText {
    fn render_inner(&self, ctx: &NodeContext<'_>, _layout: &LayoutBox, content: Content) -> String {
        let s = &ctx.settings;
        let text = maybe_capitalize(s, content.into_string());
        let Some(link) = ctx.link() else {
            return text;
        };
        if link.href.is_empty() && text.trim().is_empty() {
            return text;
        }
        let title = link.title.as_deref().unwrap_or("");
        let reference = link.reference.map(|r| r.to_string()).unwrap_or_default();
        let template = match link.placement {
            Placement::Inline if !title.is_empty() => &s.titled_template,
            Placement::Inline => &s.inline_template,
            Placement::Footer | Placement::AfterBlock => &s.reference_template,
        };
        format_template(
            template,
            &[&text],
            &[
                ("content", &text),
                ("href", &link.href),
                ("title", title),
                ("link_reference", &reference),
            ],
        )
    }
}

struct ImageText;

impl Renderer for ImageText {
    fn render_inner(&self, ctx: &NodeContext<'_>, _layout: &LayoutBox, _content: Content) -> String {
        let s = &ctx.settings;
        let Some(link) = ctx.link() else {
            return String::new();
        };
        if link.href.is_empty() {
            return String::new();
        }
        let title = link.title.as_deref().unwrap_or("Image");
        let reference = link.reference.map(|r| r.to_string()).unwrap_or_default();
        let template = match link.placement {
            Placement::Inline if link.title.is_some() => &s.titled_template,
            Placement::Inline => &s.inline_template,
            Placement::Footer | Placement::AfterBlock => &s.reference_template,
        };
        format_template(
            template,
            &[title],
            &[
                ("href", &link.href),
                ("title", title),
                ("link_reference", &reference),
            ],
        )
    }
}

struct AnsiEscapeText;

impl Renderer for AnsiEscapeText {
    fn render_inner(&self, ctx: &NodeContext<'_>, _layout: &LayoutBox, content: Content) -> String {
        let text = maybe_capitalize(&ctx.settings, content.into_string());
        ctx.settings.ansi.wrap(&text)
    }
}

struct PlainBlock;

impl Renderer for PlainBlock {
    fn render_inner(&self, _ctx: &NodeContext<'_>, _layout: &LayoutBox, content: Content) -> String {
        content.into_string()
    }
}

struct Heading;

impl Renderer for Heading {
    fn prepare(&self, ctx: &mut NodeContext<'_>) {
        if ctx.kind != RendererKind::MarkdownHeader {
            return;
        }
        let level = ctx
            .tag_name()
            .strip_prefix('h')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| (1..=6).contains(n))
            .unwrap_or(1);
        let hashes = "#".repeat(level);
        ctx.settings.template = format!("{} {{}} {}", hashes, hashes);
    }

    fn render_inner(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, content: Content) -> String {
        let s = &ctx.settings;
        let width = layout.inner_width_excluding_line_template();
        let mut text = maybe_capitalize(s, content.into_string().trim().to_string());
        if s.spread > 0 {
            text = spread(&text, &s.spread_char, s.spread);
        }
        let heading = format_template(&s.template, &[&text], &[]);
        let place = |line: &str| {
            if s.centered {
                center(line, width)
            } else {
                line.to_string()
            }
        };
        let mut lines: Vec<String> = heading.split('\n').map(|line| place(line)).collect();
        if s.underlined {
            let len = if s.underline_full {
                width
            } else {
                heading.split('\n').map(visible_width).max().unwrap_or(0)
            };
            lines.push(place(&s.underline_char.to_string().repeat(len)));
        }
        lines.join("\n")
    }
}

struct WrappedParagraph;

impl WrappedParagraph {
    /// True if the only child is a `code` or `pre` element.
    fn wraps_code(ctx: &NodeContext<'_>) -> bool {
        match ctx.node().children.as_slice() {
            [only] => matches!(ctx.doc.node(*only).tag_name(), Some("code") | Some("pre")),
            _ => false,
        }
    }
}

impl Renderer for WrappedParagraph {
    fn line_template<'s>(&self, settings: &'s Settings) -> Option<&'s str> {
        Some(&settings.line_template)
    }

    fn render_inner(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, content: Content) -> String {
        let s = &ctx.settings;
        if s.skip_for_code_or_pre && Self::wraps_code(ctx) {
            return content.into_string();
        }
        let opts = wrap_options(s, layout.inner_width_excluding_line_template());
        let text = maybe_capitalize(s, content.into_string());
        let justified: Vec<String> = text
            .split('\n')
            .map(|chunk| justify(chunk.trim_matches(' '), s.justification, &opts))
            .collect();
        apply_line_template(&s.line_template, &justified.join("\n"))
    }
}

struct Preformatted;

impl Renderer for Preformatted {
    fn render_inner(&self, ctx: &NodeContext<'_>, _layout: &LayoutBox, content: Content) -> String {
        let s = &ctx.settings;
        let indent = " ".repeat(s.indent);
        content
            .into_string()
            .lines()
            .map(|line| format!("{}{}", indent, format_template(&s.line_template, &[line], &[])))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct Quotation;

impl Renderer for Quotation {
    fn line_template<'s>(&self, settings: &'s Settings) -> Option<&'s str> {
        Some(&settings.line_template)
    }

    fn render_inner(&self, ctx: &NodeContext<'_>, _layout: &LayoutBox, content: Content) -> String {
        content
            .into_string()
            .lines()
            .map(|line| format_template(&ctx.settings.line_template, &[line], &[]))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List items and definitions: the line template marks the first line and
/// the others are indented to match.
struct Item;

impl Item {
    fn ordinal(ctx: &NodeContext<'_>) -> i64 {
        let node = ctx.doc.get(ctx.id);
        let (index, _) = node.sibling_position();
        let start = node
            .parent()
            .filter(|parent| parent.tag_name() == "ol")
            .and_then(|parent| parent.attr("start").and_then(|start| start.trim().parse::<i64>().ok()))
            .unwrap_or(ctx.settings.start_index);
        start + index as i64 * ctx.settings.step
    }
}

impl Renderer for Item {
    fn prepare(&self, ctx: &mut NodeContext<'_>) {
        if ctx.kind == RendererKind::OrderedListItem {
            let ordinal = Self::ordinal(ctx).to_string();
            ctx.settings.line_template =
                format_template(&ctx.settings.line_template, &[&ordinal, "{}"], &[]);
        }
    }

    fn line_template<'s>(&self, settings: &'s Settings) -> Option<&'s str> {
        Some(&settings.line_template)
    }

    fn render_inner(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, content: Content) -> String {
        let s = &ctx.settings;
        let opts = wrap_options(s, layout.inner_width_excluding_line_template());
        let mut lines: Vec<String> = Vec::new();
        for part in content.into_parts() {
            match part {
                Fragment::Inline(text) => {
                    let text = maybe_capitalize(s, text);
                    for chunk in text.split('\n') {
                        let justified = justify(chunk.trim_matches(' '), s.justification, &opts);
                        lines.extend(justified.split('\n').map(String::from));
                    }
                }
                Fragment::Block(text) => lines.extend(text.split('\n').map(String::from)),
            }
        }
        let indent = " ".repeat(layout.line_template_width());
        let mut lines = lines.into_iter();
        let first = lines.next().unwrap_or_default();
        std::iter::once(format_template(&s.line_template, &[&first], &[]))
            .chain(lines.map(|line| format!("{}{}", indent, line)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct Rule;

impl Renderer for Rule {
    fn render_inner(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, _content: Content) -> String {
        ctx.settings
            .rule_char
            .to_string()
            .repeat(layout.inner_width_excluding_line_template())
    }
}

/// The extracted form of links and images, shown after a block or in the
/// footer.  In a gophermap each one is a menu line.
struct Extracted;

fn truncate(text: &str, max: Option<usize>) -> (String, bool) {
    let text = text.trim();
    match max {
        Some(max) if text.chars().count() > max => {
            let mut short: String = text.chars().take(max).collect();
            short.push_str("...");
            (short, true)
        }
        _ => (text.to_string(), false),
    }
}

impl Renderer for Extracted {
    fn render_inner(&self, ctx: &NodeContext<'_>, _layout: &LayoutBox, content: Content) -> String {
        let s = &ctx.settings;
        let Some(link) = ctx.link() else {
            return content.into_string();
        };
        let text = content.into_string();
        let is_image = ctx.kind == RendererKind::ExtractedImage;
        let title = link
            .title
            .as_deref()
            .unwrap_or(if is_image { "Image" } else { "" });
        // A shortened image title is shown in full after the link.
        let (description, titled) = if is_image {
            truncate(title, s.max_link_description)
        } else if ctx.format == OutputFormat::Gophermap && link.title.is_some() {
            (title.to_string(), false)
        } else {
            let (short, _) = truncate(&text, s.max_link_description);
            (short, link.title.is_some())
        };
        let reference = link.reference.map(|r| r.to_string()).unwrap_or_default();

        match ctx.format {
            OutputFormat::Gophermap => {
                let description = description.replace(['\t', '\r', '\n'], " ");
                let port = link.gopher.port.to_string();
                let item_type = link.gopher.item_type.as_char().to_string();
                let entry = format_template(
                    &s.gophermap_template,
                    &[&description],
                    &[
                        ("type", &item_type),
                        ("link_reference", &reference),
                        ("description", &description),
                        ("selector", &link.gopher.selector),
                        ("host", &link.gopher.host),
                        ("port", &port),
                        ("href", &link.href),
                        ("title", title),
                    ],
                );
                entry
                    .split('\n')
                    .map(|line| {
                        if line.is_empty() {
                            String::new()
                        } else {
                            format!("{}{}{}", MENU_START, line, MENU_END)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            OutputFormat::Text => {
                let template = if titled { &s.titled_template } else { &s.template };
                format_template(
                    template,
                    &[&description],
                    &[
                        ("link_reference", &reference),
                        ("description", &description),
                        ("href", &link.href),
                        ("title", title),
                    ],
                )
            }
        }
    }

    fn render_border(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, text: String) -> String {
        match ctx.format {
            OutputFormat::Gophermap => text,
            OutputFormat::Text => crate::render::border_render(&text, layout, &ctx.settings.border),
        }
    }

    fn render_outer(&self, ctx: &NodeContext<'_>, layout: &LayoutBox, text: String) -> String {
        match ctx.format {
            OutputFormat::Gophermap => {
                let margin = layout.margin();
                format!("{}{}{}", "\n".repeat(margin.top), text, "\n".repeat(margin.bottom))
            }
            OutputFormat::Text => crate::render::outer_render(&text, layout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{renderer_for, truncate};
    use crate::dom::{Document, Element, NodeData, NodeId};
    use crate::render::layout::{LayoutBox, Sides};
    use crate::render::settings::{Justification, RendererKind};
    use crate::render::{Content, Fragment, NodeContext};
    use crate::OutputFormat;

    fn element(doc: &mut Document, parent: Option<NodeId>, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        doc.append(parent, NodeData::Element(Element::new(name, attrs)))
    }

    fn context(doc: &Document, id: NodeId, kind: RendererKind) -> NodeContext<'_> {
        NodeContext {
            doc,
            id,
            kind,
            settings: kind.default_settings(),
            format: OutputFormat::Text,
        }
    }

    fn render(ctx: &mut NodeContext<'_>, width: usize, content: Content) -> Fragment {
        let renderer = renderer_for(ctx.kind);
        renderer.prepare(ctx);
        let root = LayoutBox::root(width, Sides::all(0), Sides::all(0), Sides::all(0));
        let layout = renderer.layout(ctx, &root);
        renderer.render(ctx, &layout, content)
    }

    fn text(s: &str) -> Content {
        Fragment::Inline(s.into()).into()
    }

    #[test]
    fn test_inline_templates() {
        let mut doc = Document::new();
        let id = element(&mut doc, None, "strong", &[]);
        let mut ctx = context(&doc, id, RendererKind::Strong);
        assert_eq!(render(&mut ctx, 20, text("loud")), Fragment::Inline("**loud**".into()));
        let mut ctx = context(&doc, id, RendererKind::Strong);
        ctx.settings.capitalized = true;
        assert_eq!(render(&mut ctx, 20, text("loud")), Fragment::Inline("**LOUD**".into()));
    }

    #[test]
    fn test_inline_passes_blocks_through() {
        let mut doc = Document::new();
        let id = element(&mut doc, None, "em", &[]);
        let mut ctx = context(&doc, id, RendererKind::Emphasis);
        let mut content = Content::default();
        content.push(Fragment::Block("block".into()));
        assert_eq!(render(&mut ctx, 20, content), Fragment::Block("block".into()));
    }

    #[test]
    fn test_ordered_item_numbering() {
        let mut doc = Document::new();
        let ol = element(&mut doc, None, "ol", &[("start", "4")]);
        element(&mut doc, Some(ol), "li", &[]);
        let second = element(&mut doc, Some(ol), "li", &[]);
        let mut ctx = context(&doc, second, RendererKind::OrderedListItem);
        ctx.settings.step = 2;
        let out = render(&mut ctx, 12, text("one two three four"));
        assert_eq!(out, Fragment::Block("6. one two  \n   three    \n   four     ".into()));
    }

    #[test]
    fn test_markdown_header_level() {
        let mut doc = Document::new();
        let id = element(&mut doc, None, "h4", &[]);
        let mut ctx = context(&doc, id, RendererKind::MarkdownHeader);
        let out = render(&mut ctx, 12, text("Title"));
        assert_eq!(out, Fragment::Block("\n#### Title ####\n".into()));
    }

    #[test]
    fn test_header_underline() {
        let mut doc = Document::new();
        let id = element(&mut doc, None, "h2", &[]);
        let mut ctx = context(&doc, id, RendererKind::Header);
        ctx.settings.margin = Sides::all(0);
        ctx.settings.underlined = true;
        ctx.settings.underline_char = '-';
        ctx.settings.spread = 1;
        let out = render(&mut ctx, 8, text("abc"));
        assert_eq!(out, Fragment::Block("a b c   \n-----   ".into()));
    }

    #[test]
    fn test_paragraph_justification() {
        let mut doc = Document::new();
        let id = element(&mut doc, None, "p", &[]);
        let mut ctx = context(&doc, id, RendererKind::Paragraph);
        ctx.settings.margin = Sides::all(0);
        ctx.settings.justification = Justification::Right;
        let out = render(&mut ctx, 6, text("ab cd\nef"));
        assert_eq!(out, Fragment::Block(" ab cd\n    ef".into()));
        let mut ctx = context(&doc, id, RendererKind::Paragraph);
        ctx.settings.margin = Sides::all(0);
        ctx.settings.justification = Justification::Center;
        assert_eq!(render(&mut ctx, 5, text("ab")), Fragment::Block("  ab ".into()));
    }

    #[test]
    fn test_rule_and_pre() {
        let mut doc = Document::new();
        let hr = element(&mut doc, None, "hr", &[]);
        let mut ctx = context(&doc, hr, RendererKind::HorizontalRule);
        ctx.settings.rule_char = '~';
        assert_eq!(render(&mut ctx, 5, Content::default()), Fragment::Block("\n~~~~~\n".into()));

        let pre = element(&mut doc, None, "pre", &[]);
        let mut ctx = context(&doc, pre, RendererKind::Pre);
        ctx.settings.margin = Sides::all(0);
        ctx.settings.indent = 2;
        assert_eq!(render(&mut ctx, 8, text("a\n b")), Fragment::Block("  a     \n   b    ".into()));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("  short  ", Some(10)), ("short".to_string(), false));
        assert_eq!(truncate("a longer title", Some(6)), ("a long...".to_string(), true));
        assert_eq!(truncate("anything", None), ("anything".to_string(), false));
    }
}
