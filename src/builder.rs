//! Building the tag tree from markup events.
//!
//! [`DocumentBuilder`] takes start tag, end tag and data events, in the
//! style of a SAX parser, and renders the finished tree.  The html5ever
//! tokenizer is used to produce those events from HTML text.

use std::cell::RefCell;

use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::interface::TokenizerResult;
use log::debug;
use tendril::StrTendril;

use crate::dom::{Document, Element, Link, NodeData, NodeId};
use crate::gopher::GopherLink;
use crate::render::render_document;
use crate::render::text::{MENU_END, MENU_START};
use crate::{Converter, Placement};

/// Elements which never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "br", "img", "hr", "meta", "link", "input", "wbr", "area", "base", "col", "embed", "source",
    "track", "param",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Collapse each run of HTML whitespace to a single space.
/// Remove the private-use characters which mark menu lines in the output.
fn strip_markers(text: &str) -> String {
    text.replace([MENU_START, MENU_END], "")
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Builds a document from markup events, then renders it.
///
/// ```
/// let converter = gopher_render::config::text().width(20).build().unwrap();
/// let mut builder = converter.builder();
/// builder.start("p", vec![]);
/// builder.data("Hello,   world");
/// builder.end("p");
/// assert_eq!(builder.finish(), "\nHello, world\n");
/// ```
#[derive(Debug)]
pub struct DocumentBuilder<'c> {
    converter: &'c Converter,
    doc: Document,
    open: Vec<NodeId>,
    pre_depth: usize,
    next_reference: usize,
}

impl<'c> DocumentBuilder<'c> {
    pub(crate) fn new(converter: &'c Converter) -> DocumentBuilder<'c> {
        DocumentBuilder {
            converter,
            doc: Document::new(),
            open: Vec::new(),
            pre_depth: 0,
            next_reference: 1,
        }
    }

    fn current(&self) -> Option<NodeId> {
        self.open.last().copied()
    }

    fn new_link(&mut self, element: &Element) -> Link {
        let is_image = element.name == "img";
        // A missing target becomes an empty one, which classifies as a web link.
        let href = element
            .attr(if is_image { "src" } else { "href" })
            .unwrap_or("")
            .trim()
            .to_string();
        let title = element
            .attr("title")
            .or_else(|| if is_image { element.attr("alt") } else { None })
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);
        let placement = if is_image {
            self.converter.image_placement
        } else {
            self.converter.link_placement
        };
        let reference = match placement {
            Placement::Inline => None,
            Placement::Footer | Placement::AfterBlock => {
                self.next_reference += 1;
                Some(self.next_reference - 1)
            }
        };
        let gopher = GopherLink::classify(&href, &self.converter.host, self.converter.port);
        Link {
            href,
            title,
            reference,
            placement,
            gopher,
            is_image,
        }
    }

    /// A start tag.  Attribute names are matched case-insensitively.
    pub fn start(&mut self, tag: &str, attrs: Vec<(String, String)>) {
        let attrs = attrs
            .into_iter()
            .map(|(key, value)| (key, strip_markers(&value)))
            .collect();
        let element = Element::new(tag, attrs);
        let name = element.name.clone();
        html_trace_quiet!("start: <{}> {:?}", name, element.attrs);
        let link = match name.as_str() {
            "a" | "img" => Some(self.new_link(&element)),
            _ => None,
        };
        let footer = matches!(&link, Some(l) if l.placement == Placement::Footer);
        let data = match link {
            Some(link) => NodeData::Link { element, link },
            None => NodeData::Element(element),
        };
        let id = self.doc.append(self.current(), data);
        if footer {
            self.doc.footer_links.push(id);
        }
        if is_void(&name) {
            self.doc.node_mut(id).closed = true;
        } else {
            if name == "pre" {
                self.pre_depth += 1;
            }
            self.open.push(id);
        }
    }

    /// An end tag.  Only the innermost open element can be closed; any
    /// other end tag is ignored.
    pub fn end(&mut self, tag: &str) {
        let tag = tag.to_ascii_lowercase();
        html_trace_quiet!("end: </{}>", tag);
        if is_void(&tag) {
            return;
        }
        match self.current() {
            Some(id) if self.doc.node(id).tag_name() == Some(tag.as_str()) => self.close(),
            Some(id) => debug!(
                "Ignoring </{}> while <{}> is open",
                tag,
                self.doc.node(id).tag_name().unwrap_or("")
            ),
            None => debug!("Ignoring dangling </{}>", tag),
        }
    }

    fn close(&mut self) {
        let Some(id) = self.open.pop() else {
            return;
        };
        let node = self.doc.node_mut(id);
        node.closed = true;
        if node.tag_name() == Some("pre") {
            self.pre_depth = self.pre_depth.saturating_sub(1);
        }
    }

    /// Character data.  Outside `pre`, whitespace runs become single
    /// spaces.
    pub fn data(&mut self, text: &str) {
        let text = &strip_markers(text);
        let parent = self.current();
        let text = if self.pre_depth > 0 {
            let first_in_pre = parent
                .map(|p| {
                    let node = self.doc.node(p);
                    node.tag_name() == Some("pre") && node.children.is_empty()
                })
                .unwrap_or(false);
            let text = if first_in_pre {
                text.strip_prefix('\n').unwrap_or(text)
            } else {
                text
            };
            text.to_string()
        } else {
            collapse_whitespace(text)
        };
        if text.is_empty() {
            return;
        }
        self.doc.append(parent, NodeData::Text(text));
    }

    fn assign_renderers(&mut self) {
        let converter = self.converter;
        let assignments: Vec<_> = self
            .doc
            .preorder()
            .into_iter()
            .filter(|&id| self.doc.node(id).element().is_some())
            .map(|id| {
                let node = self.doc.get(id);
                let renderer = converter.renderers.lookup(node);
                let extracted = self
                    .doc
                    .node(id)
                    .link()
                    .map(|_| converter.extracted_renderers.lookup(node));
                (id, renderer, extracted)
            })
            .collect();
        for (id, renderer, extracted) in assignments {
            let node = self.doc.node_mut(id);
            node.renderer = Some(renderer);
            node.extracted = extracted;
        }
    }

    /// Close anything still open and render the document.
    pub fn finish(mut self) -> String {
        while let Some(id) = self.current() {
            debug!(
                "Closing unclosed <{}> at end of document",
                self.doc.node(id).tag_name().unwrap_or("")
            );
            self.close();
        }
        self.assign_renderers();
        render_document(&self.doc, &self.converter.render_options())
    }
}

/// Feeds tokenizer output into a [`DocumentBuilder`], joining adjacent
/// character tokens into one data event.
struct EventSink<'c> {
    builder: RefCell<DocumentBuilder<'c>>,
    text: RefCell<String>,
}

impl<'c> EventSink<'c> {
    fn flush_text(&self) {
        let text = std::mem::take(&mut *self.text.borrow_mut());
        if !text.is_empty() {
            self.builder.borrow_mut().data(&text);
        }
    }
}

impl<'c> TokenSink for EventSink<'c> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) => {
                self.text.borrow_mut().push_str(&text);
            }
            Token::NullCharacterToken => {}
            Token::TagToken(tag) => {
                self.flush_text();
                let name: &str = &tag.name;
                match tag.kind {
                    TagKind::StartTag => {
                        let attrs = tag
                            .attrs
                            .iter()
                            .map(|a| (a.name.local.to_string(), a.value.to_string()))
                            .collect();
                        self.builder.borrow_mut().start(name, attrs);
                        return match name {
                            "script" => TokenSinkResult::RawData(RawKind::ScriptData),
                            "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
                                TokenSinkResult::RawData(RawKind::Rawtext)
                            }
                            "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
                            _ => TokenSinkResult::Continue,
                        };
                    }
                    TagKind::EndTag => self.builder.borrow_mut().end(name),
                }
            }
            Token::EOFToken => self.flush_text(),
            Token::ParseError(_error) => {
                html_trace_quiet!("tokenizer: {}", _error);
            }
            Token::CommentToken(_) | Token::DoctypeToken(_) => {}
        }
        TokenSinkResult::Continue
    }
}

/// Tokenize `html` and build it into a document.
pub(crate) fn build_html<'c>(converter: &'c Converter, html: &str) -> DocumentBuilder<'c> {
    let sink = EventSink {
        builder: RefCell::new(DocumentBuilder::new(converter)),
        text: RefCell::new(String::new()),
    };
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    // The sink never asks for a script to run, but keep going if it did.
    while let TokenizerResult::Script(()) = tokenizer.feed(&input) {
        if input.is_empty() {
            break;
        }
    }
    tokenizer.end();
    tokenizer.sink.flush_text();
    tokenizer
        .sink
        .builder
        .replace(DocumentBuilder::new(converter))
}

#[cfg(test)]
mod tests {
    use super::{build_html, collapse_whitespace};
    use crate::dom::NodeData;
    use crate::render::settings::RendererKind;
    use crate::{config, Placement};

    fn text_of(data: &NodeData) -> Option<&str> {
        match data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t\n b  "), " a b ");
        assert_eq!(collapse_whitespace("a\u{a0}\u{a0}b"), "a\u{a0}\u{a0}b");
    }

    #[test]
    fn test_menu_markers_removed_from_input() {
        let conv = config::gophermap("my.gopher.com", 70).build().unwrap();
        let html = "<p>\u{E000}1[9] fake\tsel\th\t70\u{E001}</p>\
                    <p><a href=\"/a.txt\" title=\"\u{E000}T\u{E001}\">a</a></p>";
        let builder = build_html(&conv, html);
        let doc = &builder.doc;
        let p = doc.node(doc.roots[0]);
        assert_eq!(
            text_of(&doc.node(p.children[0]).data),
            Some("1[9] fake sel h 70")
        );
        let a = doc.node(doc.node(doc.roots[1]).children[0]);
        assert_eq!(a.link().and_then(|l| l.title.as_deref()), Some("T"));
        assert_eq!(
            builder.finish(),
            "\n1[9] fake sel h 70\n\na\n\n0[1] T\t/a.txt\tmy.gopher.com\t70\n"
        );
    }

    #[test]
    fn test_tree_from_tokens() {
        let conv = config::text().build().unwrap();
        let builder = build_html(
            &conv,
            "<!DOCTYPE html><p class=x>one &amp; <b>two</b><!-- c --> three<br>four</p>",
        );
        let doc = &builder.doc;
        assert_eq!(doc.roots.len(), 1);
        let p = doc.node(doc.roots[0]);
        assert_eq!(p.tag_name(), Some("p"));
        assert_eq!(p.element().map(|e| e.classes.clone()), Some(vec!["x".to_string()]));
        let kids: Vec<_> = p.children.iter().map(|&c| doc.node(c)).collect();
        assert_eq!(kids.len(), 5);
        assert_eq!(text_of(&kids[0].data), Some("one & "));
        assert_eq!(kids[1].tag_name(), Some("b"));
        assert_eq!(text_of(&kids[2].data), Some(" three"));
        assert_eq!(kids[3].tag_name(), Some("br"));
        assert!(kids[3].closed);
        assert!(builder.open.is_empty());
    }

    #[test]
    fn test_raw_text_and_pre() {
        let conv = config::text().build().unwrap();
        let builder = build_html(
            &conv,
            "<script>if (a < b) { x(\"</p>\") }</script><pre>\n  keep\n   this</pre>",
        );
        let doc = &builder.doc;
        let script = doc.node(doc.roots[0]);
        assert_eq!(script.children.len(), 1);
        assert_eq!(
            text_of(&doc.node(script.children[0]).data),
            Some("if (a < b) { x(\"</p>\") }")
        );
        let pre = doc.node(doc.roots[1]);
        assert_eq!(text_of(&doc.node(pre.children[0]).data), Some("  keep\n   this"));
        assert_eq!(builder.pre_depth, 0);
    }

    #[test]
    fn test_mismatched_and_unclosed() {
        let conv = config::text().build().unwrap();
        let mut builder = conv.builder();
        builder.end("div");
        builder.start("div", vec![]);
        builder.start("em", vec![]);
        builder.end("div");
        assert_eq!(builder.open.len(), 2);
        builder.data("still inside");
        let em = builder.open[1];
        assert_eq!(builder.doc.node(em).children.len(), 1);
        assert_eq!(builder.finish(), "_still inside_");
    }

    #[test]
    fn test_links_and_references() {
        let conv = config::text()
            .image_placement(Placement::AfterBlock)
            .build()
            .unwrap();
        let mut builder = conv.builder();
        builder.start("a", vec![("href".into(), "/one".into()), ("title".into(), " ".into())]);
        builder.end("a");
        builder.start("a", vec![("name".into(), "anchor".into())]);
        builder.end("a");
        builder.start("img", vec![("src".into(), "cat.png".into()), ("alt".into(), "Cat".into())]);
        builder.end("img");
        let doc = &builder.doc;
        let first = doc.node(doc.roots[0]).link().unwrap();
        assert_eq!(first.reference, Some(1));
        assert_eq!(first.title, None);
        assert_eq!(first.placement, Placement::Footer);
        let anchor = doc.node(doc.roots[1]).link().unwrap();
        assert_eq!(anchor.href, "");
        assert_eq!(anchor.reference, Some(2));
        assert_eq!(anchor.gopher.selector, "URL:");
        let img = doc.node(doc.roots[2]).link().unwrap();
        assert_eq!(img.reference, Some(3));
        assert_eq!(img.title.as_deref(), Some("Cat"));
        assert!(img.is_image);
        assert_eq!(doc.footer_links, vec![doc.roots[0], doc.roots[1]]);
    }

    #[test]
    fn test_assignments() {
        let conv = config::text().build().unwrap();
        let mut builder = build_html(&conv, "<ol><li><a href=x>x</a></li></ol>");
        builder.assign_renderers();
        let doc = &builder.doc;
        let ol = doc.node(doc.roots[0]);
        let li = doc.node(ol.children[0]);
        let a = doc.node(li.children[0]);
        assert_eq!(ol.renderer.as_ref().map(|r| r.kind), Some(RendererKind::List));
        assert_eq!(li.renderer.as_ref().map(|r| r.kind), Some(RendererKind::OrderedListItem));
        assert_eq!(a.renderer.as_ref().map(|r| r.kind), Some(RendererKind::Link));
        assert_eq!(a.extracted.as_ref().map(|r| r.kind), Some(RendererKind::ExtractedLink));
        assert!(li.extracted.is_none());
    }
}
