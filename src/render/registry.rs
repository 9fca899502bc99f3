//! The renderer map: CSS selectors to renderer kinds and settings.

use crate::css::{SelectorList, SelectorNode, Specificity};
use crate::dom::Assignment;
use crate::render::layout::Sides;
use crate::render::settings::{RendererKind, SettingsPatch};
use crate::{Error, Result};

/// What a selector maps to: a renderer kind, settings overrides, or both.
///
/// A spec without a kind only adjusts the settings of whatever renderer a
/// less specific rule chose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RendererSpec {
    /// The renderer to use, if this rule chooses one.
    pub kind: Option<RendererKind>,
    /// Settings to override.
    pub settings: SettingsPatch,
}

impl RendererSpec {
    /// Use `kind` with its default settings.
    pub fn new(kind: RendererKind) -> RendererSpec {
        RendererSpec {
            kind: Some(kind),
            settings: SettingsPatch::default(),
        }
    }

    /// Only override settings.
    pub fn patch(settings: SettingsPatch) -> RendererSpec {
        RendererSpec {
            kind: None,
            settings,
        }
    }

    /// Use `kind` with some settings overridden.
    pub fn with(kind: RendererKind, settings: SettingsPatch) -> RendererSpec {
        RendererSpec {
            kind: Some(kind),
            settings,
        }
    }
}

impl From<RendererKind> for RendererSpec {
    fn from(kind: RendererKind) -> RendererSpec {
        RendererSpec::new(kind)
    }
}

impl From<SettingsPatch> for RendererSpec {
    fn from(settings: SettingsPatch) -> RendererSpec {
        RendererSpec::patch(settings)
    }
}

impl From<(RendererKind, SettingsPatch)> for RendererSpec {
    fn from((kind, settings): (RendererKind, SettingsPatch)) -> RendererSpec {
        RendererSpec::with(kind, settings)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    selectors: SelectorList,
    spec: RendererSpec,
}

/// An ordered registry of selector rules.
#[derive(Debug, Clone)]
pub(crate) struct RendererMap {
    entries: Vec<Entry>,
    default_kind: RendererKind,
}

impl RendererMap {
    pub fn new(default_kind: RendererKind) -> RendererMap {
        RendererMap {
            entries: Vec::new(),
            default_kind,
        }
    }

    /// Add a rule.  A rule with the same selector text replaces the old
    /// one in place, unless it has no kind, in which case its settings are
    /// merged into the old rule.
    pub fn insert(&mut self, selector: &str, spec: impl Into<RendererSpec>) -> Result<()> {
        let selectors = SelectorList::parse(selector).map_err(|message| {
            log::warn!("Rejecting renderer selector {:?}: {}", selector, message);
            Error::InvalidSelector {
                selector: selector.to_string(),
                message,
            }
        })?;
        let entry = Entry {
            key: selector.trim().to_string(),
            selectors,
            spec: spec.into(),
        };
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) if entry.spec.kind.is_none() => {
                existing.spec.settings.merge(&entry.spec.settings)
            }
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// Work out the renderer for `node`.  Matching rules are applied from
    /// least to most specific; between equally specific rules the one added
    /// later wins.
    pub fn lookup<N: SelectorNode>(&self, node: N) -> Assignment {
        let mut matched: Vec<(Specificity, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| entry.selectors.matches(node).map(|spec| (spec, idx)))
            .collect();
        matched.sort();

        let mut kind = self.default_kind;
        let mut patch = SettingsPatch::default();
        for (_, idx) in matched {
            let spec = &self.entries[idx].spec;
            if let Some(k) = spec.kind {
                kind = k;
            }
            patch.merge(&spec.settings);
        }
        let mut settings = kind.default_settings();
        settings.apply(&patch);
        Assignment { kind, settings }
    }

    /// The built-in rules for rendering element content.
    pub fn text_defaults() -> Result<RendererMap> {
        use RendererKind::*;
        let zero = || Sides::all(0usize);
        let top = || Sides::new(1usize, 0, 0, 0);
        let bottom = || Sides::new(0usize, 0, 1, 0);
        let mut map = RendererMap::new(Inline);
        map.insert("head, script, style, template, title", RendererKind::None)?;
        map.insert("p", Paragraph)?;
        map.insert(
            "div, section, article, header, footer, nav, main, aside, figure, address",
            Block,
        )?;
        map.insert(
            "h1",
            (
                Header,
                SettingsPatch::default()
                    .centered(true)
                    .underlined(true)
                    .underline_full(true)
                    .underline_char('='),
            ),
        )?;
        map.insert(
            "h2",
            (
                Header,
                SettingsPatch::default()
                    .centered(true)
                    .underlined(true)
                    .underline_char('-'),
            ),
        )?;
        map.insert(
            "h3, h4, h5, h6",
            (MarkdownHeader, SettingsPatch::default().centered(true)),
        )?;
        map.insert("blockquote", BlockQuote)?;
        map.insert("pre", Pre)?;
        map.insert("code", Code)?;
        map.insert("em, i", Emphasis)?;
        map.insert("strong, b", Strong)?;
        map.insert("u, ins", Underline)?;
        map.insert("s, del, strike", Strikethrough)?;
        map.insert("span", Inline)?;
        map.insert("br", Break)?;
        map.insert("hr", HorizontalRule)?;
        map.insert("a", Link)?;
        map.insert("img", Image)?;
        map.insert("ul, ol", List)?;
        map.insert("li", ListItem)?;
        map.insert("ol > li", OrderedListItem)?;
        map.insert("li > ul, li > ol", SettingsPatch::default().margin(zero()))?;
        map.insert("li > p", SettingsPatch::default().margin(top()))?;
        map.insert("li > p:first-child", SettingsPatch::default().margin(zero()))?;
        map.insert("dl", DefinitionList)?;
        map.insert("dt", DefinitionTerm)?;
        map.insert("dt:first-child", SettingsPatch::default().margin(zero()))?;
        map.insert("dd", DefinitionItem)?;
        map.insert("blockquote > p:first-child", SettingsPatch::default().margin(bottom()))?;
        map.insert("blockquote > p:last-child", SettingsPatch::default().margin(top()))?;
        map.insert(
            "blockquote > p:first-child:last-child",
            SettingsPatch::default().margin(zero()),
        )?;
        map.insert("table, thead, tbody, tfoot, tr, caption", Block)?;
        map.insert("td, th", (Inline, SettingsPatch::default().template("{} ")))?;
        Ok(map)
    }

    /// The text rules adjusted for gophermaps: links and images in the
    /// body show just their text, since the menu lines carry the targets.
    pub fn gophermap_defaults() -> Result<RendererMap> {
        let mut map = RendererMap::text_defaults()?;
        map.insert(
            "a",
            (
                RendererKind::Link,
                SettingsPatch::default().reference_template("{content}"),
            ),
        )?;
        map.insert(
            "img",
            (
                RendererKind::Image,
                SettingsPatch::default().reference_template("[{title}]"),
            ),
        )?;
        Ok(map)
    }

    /// The built-in rules for extracted links.
    pub fn extracted_defaults() -> Result<RendererMap> {
        let mut map = RendererMap::new(RendererKind::ExtractedLink);
        map.insert("a", RendererKind::ExtractedLink)?;
        map.insert("img", RendererKind::ExtractedImage)?;
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::{RendererMap, RendererSpec};
    use crate::dom::{Document, Element, NodeData, NodeId};
    use crate::render::layout::Sides;
    use crate::render::settings::{RendererKind, SettingsPatch};
    use crate::Error;

    fn add(doc: &mut Document, parent: Option<NodeId>, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        doc.append(parent, NodeData::Element(Element::new(name, attrs)))
    }

    #[test]
    fn test_default_kind() {
        let map = RendererMap::text_defaults().unwrap();
        let mut doc = Document::new();
        let unknown = add(&mut doc, None, "blink", &[]);
        let a = map.lookup(doc.get(unknown));
        assert_eq!(a.kind, RendererKind::Inline);
        assert_eq!(a.settings, RendererKind::Inline.default_settings());
    }

    #[test]
    fn test_specificity_ordering() {
        let map = RendererMap::text_defaults().unwrap();
        let mut doc = Document::new();
        let ol = add(&mut doc, None, "ol", &[]);
        let li = add(&mut doc, Some(ol), "li", &[]);
        let p1 = add(&mut doc, Some(li), "p", &[]);
        let p2 = add(&mut doc, Some(li), "p", &[]);
        let sub = add(&mut doc, Some(li), "ul", &[]);

        assert_eq!(map.lookup(doc.get(li)).kind, RendererKind::OrderedListItem);
        let first = map.lookup(doc.get(p1));
        assert_eq!(first.kind, RendererKind::Paragraph);
        assert_eq!(first.settings.margin, Sides::all(0));
        assert_eq!(map.lookup(doc.get(p2)).settings.margin, Sides::new(1, 0, 0, 0));
        let sub = map.lookup(doc.get(sub));
        assert_eq!(sub.kind, RendererKind::List);
        assert_eq!(sub.settings.margin, Sides::all(0));
    }

    #[test]
    fn test_later_rule_wins_ties() {
        let mut map = RendererMap::new(RendererKind::Inline);
        map.insert(".a", SettingsPatch::default().template("<{}>")).unwrap();
        map.insert(".b", SettingsPatch::default().template("[{}]")).unwrap();
        let mut doc = Document::new();
        let node = add(&mut doc, None, "span", &[("class", "a b")]);
        assert_eq!(map.lookup(doc.get(node)).settings.template, "[{}]");

        // Replacing a rule keeps its position.
        map.insert(".a", SettingsPatch::default().template("({})")).unwrap();
        assert_eq!(map.lookup(doc.get(node)).settings.template, "[{}]");
        map.insert(".b", RendererKind::Strong).unwrap();
        assert_eq!(map.lookup(doc.get(node)).kind, RendererKind::Strong);
        assert_eq!(map.lookup(doc.get(node)).settings.template, "({})");
        map.insert("span.a", SettingsPatch::default().template("{{{}}}")).unwrap();
        assert_eq!(map.lookup(doc.get(node)).settings.template, "{{{}}}");
    }

    #[test]
    fn test_patch_keeps_kind() {
        let mut map = RendererMap::text_defaults().unwrap();
        map.insert("p.note", SettingsPatch::default().capitalized(true)).unwrap();
        map.insert(
            "#intro",
            RendererSpec::with(RendererKind::Block, SettingsPatch::default().margin([2, 0, 2, 0])),
        )
        .unwrap();
        let mut doc = Document::new();
        let note = add(&mut doc, None, "p", &[("class", "note")]);
        let intro = add(&mut doc, None, "p", &[("id", "intro"), ("class", "note")]);
        let a = map.lookup(doc.get(note));
        assert_eq!(a.kind, RendererKind::Paragraph);
        assert!(a.settings.capitalized);
        assert_eq!(a.settings.margin, Sides::new(1, 0, 1, 0));
        let b = map.lookup(doc.get(intro));
        assert_eq!(b.kind, RendererKind::Block);
        assert!(b.settings.capitalized);
        assert_eq!(b.settings.margin, Sides::new(2, 0, 2, 0));
    }

    #[test]
    fn test_patch_merges_into_same_selector() {
        let mut map = RendererMap::text_defaults().unwrap();
        map.insert("h1", SettingsPatch::default().underline_char('#')).unwrap();
        let mut doc = Document::new();
        let h1 = add(&mut doc, None, "h1", &[]);
        let a = map.lookup(doc.get(h1));
        assert_eq!(a.kind, RendererKind::Header);
        assert!(a.settings.centered);
        assert_eq!(a.settings.underline_char, '#');
    }

    #[test]
    fn test_invalid_selector() {
        let mut map = RendererMap::new(RendererKind::Inline);
        match map.insert("p >", RendererKind::Block) {
            Err(Error::InvalidSelector { selector, .. }) => assert_eq!(selector, "p >"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_extracted_defaults() {
        let map = RendererMap::extracted_defaults().unwrap();
        let mut doc = Document::new();
        let img = add(&mut doc, None, "img", &[]);
        let a = add(&mut doc, None, "a", &[]);
        assert_eq!(map.lookup(doc.get(img)).kind, RendererKind::ExtractedImage);
        assert_eq!(map.lookup(doc.get(a)).kind, RendererKind::ExtractedLink);
    }
}
