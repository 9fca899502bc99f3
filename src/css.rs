//! CSS selector matching used to pick renderers for tags.
//!
//! Selectors are parsed once (see [`parser`]) and matched against any tree
//! which implements [`SelectorNode`].  Only element nodes take part in
//! matching; structural pseudo-classes and sibling combinators count element
//! siblings only.

pub(crate) mod parser;

use std::fmt;

/// An attribute selector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttrOperator {
    /// `[attr]`
    Exists,
    /// `[attr=value]`
    Equals,
    /// `[attr~=value]`
    Includes,
    /// `[attr|=value]`
    DashMatch,
    /// `[attr^=value]`
    Prefix,
    /// `[attr$=value]`
    Suffix,
    /// `[attr*=value]`
    Substring,
}

impl AttrOperator {
    fn matches(self, attr_value: &str, value: &str) -> bool {
        use AttrOperator::*;
        match self {
            Exists => true,
            Equals => attr_value == value,
            Includes => attr_value.split_whitespace().any(|word| word == value),
            DashMatch => {
                attr_value == value
                    || (attr_value.starts_with(value) && attr_value[value.len()..].starts_with('-'))
            }
            Prefix => !value.is_empty() && attr_value.starts_with(value),
            Suffix => !value.is_empty() && attr_value.ends_with(value),
            Substring => !value.is_empty() && attr_value.contains(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorComponent {
    Element(String),
    Star,
    Id(String),
    Class(String),
    Attr {
        name: String,
        op: AttrOperator,
        value: String,
    },
    /// `:not(...)`; holds a single compound selector.
    Not(Vec<SelectorComponent>),
    FirstChild,
    LastChild,
    /// `:nth-child(n)`, 1-based.
    NthChild(usize),
    /// `:nth-last-child(n)`, 1-based.
    NthLastChild(usize),
    /// Something recognised by the parser which never matches: namespaces,
    /// pseudo-elements and pseudo-classes without support.
    Unsupported(String),
    CombChild,
    CombDescendant,
    CombAdjacentSibling,
    CombGeneralSibling,
    CombColumn,
}

/// The standard CSS specificity triple: (ids, classes/attributes/pseudo-classes,
/// elements).  Comparison is lexicographic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    fn add(self, other: Specificity) -> Specificity {
        Specificity(self.0 + other.0, self.1 + other.1, self.2 + other.2)
    }

    fn of(components: &[SelectorComponent]) -> Specificity {
        use SelectorComponent::*;
        components.iter().fold(Specificity::default(), |acc, comp| {
            let extra = match comp {
                Element(_) => Specificity(0, 0, 1),
                Id(_) => Specificity(1, 0, 0),
                Class(_) | Attr { .. } | FirstChild | LastChild | NthChild(_)
                | NthLastChild(_) => Specificity(0, 1, 0),
                Unsupported(name) if name.starts_with("::") => Specificity(0, 0, 1),
                Unsupported(_) => Specificity(0, 1, 0),
                // The negation itself doesn't count, only its argument.
                Not(inner) => Specificity::of(inner),
                Star | CombChild | CombDescendant | CombAdjacentSibling | CombGeneralSibling
                | CombColumn => Specificity::default(),
            };
            acc.add(extra)
        })
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.0, self.1, self.2)
    }
}

/// The view of a tree node needed to match selectors against it.
///
/// Only element nodes should be presented; text is invisible to selectors.
pub(crate) trait SelectorNode: Copy {
    /// The lower-case tag name.
    fn tag_name(&self) -> &str;
    /// The `id` attribute, if any.
    fn id(&self) -> Option<&str>;
    /// Whether the class list contains `class`.
    fn has_class(&self, class: &str) -> bool;
    /// Look up an attribute value by name.
    fn attr(&self, name: &str) -> Option<&str>;
    /// The parent element, or `None` at the top level.
    fn parent(&self) -> Option<Self>;
    /// The element sibling immediately before this one.
    fn prev_sibling(&self) -> Option<Self>;
    /// This node's 0-based index among its element siblings, and the number
    /// of element siblings (including itself).
    fn sibling_position(&self) -> (usize, usize);
}

/// A single complex selector (no commas).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selector {
    // List of components, right first so we match from the leaf.
    pub(crate) components: Vec<SelectorComponent>,
    pub(crate) specificity: Specificity,
}

impl Selector {
    pub(crate) fn new(components: Vec<SelectorComponent>) -> Selector {
        let specificity = Specificity::of(&components);
        Selector {
            components,
            specificity,
        }
    }

    fn do_matches<N: SelectorNode>(comps: &[SelectorComponent], node: N) -> bool {
        use SelectorComponent::*;
        let Some((comp, rest)) = comps.split_first() else {
            return true;
        };
        match comp {
            Element(name) => node.tag_name() == name && Self::do_matches(rest, node),
            Star => Self::do_matches(rest, node),
            Id(id) => node.id() == Some(id.as_str()) && Self::do_matches(rest, node),
            Class(class) => node.has_class(class) && Self::do_matches(rest, node),
            Attr { name, op, value } => {
                let found = match name.as_str() {
                    // The class list has already been split up, so compare
                    // against the normalised form.
                    "class" => node.attr("class").map(|classes| {
                        op.matches(&classes.split_whitespace().collect::<Vec<_>>().join(" "), value)
                    }),
                    _ => node.attr(name).map(|attr| op.matches(attr, value)),
                };
                found.unwrap_or(false) && Self::do_matches(rest, node)
            }
            Not(inner) => !Self::do_matches(inner, node) && Self::do_matches(rest, node),
            FirstChild => node.sibling_position().0 == 0 && Self::do_matches(rest, node),
            LastChild => {
                let (idx, count) = node.sibling_position();
                idx + 1 == count && Self::do_matches(rest, node)
            }
            NthChild(n) => node.sibling_position().0 + 1 == *n && Self::do_matches(rest, node),
            NthLastChild(n) => {
                let (idx, count) = node.sibling_position();
                count - idx == *n && Self::do_matches(rest, node)
            }
            Unsupported(_) => false,
            CombChild => match node.parent() {
                Some(parent) => Self::do_matches(rest, parent),
                None => false,
            },
            CombDescendant => match node.parent() {
                Some(parent) => Self::do_matches(rest, parent) || Self::do_matches(comps, parent),
                None => false,
            },
            CombAdjacentSibling => match node.prev_sibling() {
                Some(prev) => Self::do_matches(rest, prev),
                None => false,
            },
            CombGeneralSibling => match node.prev_sibling() {
                Some(prev) => Self::do_matches(rest, prev) || Self::do_matches(comps, prev),
                None => false,
            },
            CombColumn => false,
        }
    }

    /// Check whether this selector matches `node`.
    pub(crate) fn matches<N: SelectorNode>(&self, node: N) -> bool {
        Self::do_matches(&self.components, node)
    }
}

/// A comma-separated list of selectors; matches if any alternative does.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectorList {
    pub(crate) selectors: Vec<Selector>,
}

impl SelectorList {
    /// Parse a selector list such as `"ul > li, ol > li:first-child"`.
    pub(crate) fn parse(text: &str) -> Result<SelectorList, String> {
        parser::parse_selector_list(text)
    }

    /// Returns the specificity of the most specific matching alternative,
    /// or `None` if nothing matches.
    pub(crate) fn matches<N: SelectorNode>(&self, node: N) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|sel| sel.matches(node))
            .map(|sel| sel.specificity)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::{SelectorList, SelectorNode, Specificity};

    /// A tiny element tree for exercising the matcher on its own.
    struct Tree {
        nodes: Vec<MockNode>,
        roots: Vec<usize>,
    }

    struct MockNode {
        tag: &'static str,
        attrs: Vec<(&'static str, &'static str)>,
        parent: Option<usize>,
        children: Vec<usize>,
    }

    impl Tree {
        fn new() -> Tree {
            Tree {
                nodes: Vec::new(),
                roots: Vec::new(),
            }
        }

        fn add(
            &mut self,
            parent: Option<usize>,
            tag: &'static str,
            attrs: &[(&'static str, &'static str)],
        ) -> usize {
            let id = self.nodes.len();
            self.nodes.push(MockNode {
                tag,
                attrs: attrs.to_vec(),
                parent,
                children: Vec::new(),
            });
            match parent {
                Some(p) => self.nodes[p].children.push(id),
                None => self.roots.push(id),
            }
            id
        }

        fn node(&self, id: usize) -> Mock<'_> {
            Mock { tree: self, id }
        }

        fn siblings(&self, id: usize) -> &[usize] {
            match self.nodes[id].parent {
                Some(p) => &self.nodes[p].children,
                None => &self.roots,
            }
        }
    }

    #[derive(Clone, Copy)]
    struct Mock<'a> {
        tree: &'a Tree,
        id: usize,
    }

    impl<'a> SelectorNode for Mock<'a> {
        fn tag_name(&self) -> &str {
            self.tree.nodes[self.id].tag
        }
        fn id(&self) -> Option<&str> {
            self.attr("id")
        }
        fn has_class(&self, class: &str) -> bool {
            self.attr("class")
                .map(|c| c.split_whitespace().any(|c| c == class))
                .unwrap_or(false)
        }
        fn attr(&self, name: &str) -> Option<&str> {
            self.tree.nodes[self.id]
                .attrs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
        }
        fn parent(&self) -> Option<Self> {
            self.tree.nodes[self.id].parent.map(|id| Mock {
                tree: self.tree,
                id,
            })
        }
        fn prev_sibling(&self) -> Option<Self> {
            let sibs = self.tree.siblings(self.id);
            let idx = sibs.iter().position(|&s| s == self.id)?;
            if idx == 0 {
                None
            } else {
                Some(Mock {
                    tree: self.tree,
                    id: sibs[idx - 1],
                })
            }
        }
        fn sibling_position(&self) -> (usize, usize) {
            let sibs = self.tree.siblings(self.id);
            let idx = sibs.iter().position(|&s| s == self.id).unwrap_or(0);
            (idx, sibs.len())
        }
    }

    /// h1#bigheader, section#section1.docsec [ h2.sectionheader, p, div.last [ h2.sectionheader, p#special, div ] ]
    fn sample() -> (Tree, Vec<usize>) {
        let mut t = Tree::new();
        let h1 = t.add(None, "h1", &[("id", "bigheader")]);
        let section = t.add(None, "section", &[("id", "section1"), ("class", "docsec")]);
        let h2 = t.add(Some(section), "h2", &[("class", "sectionheader")]);
        let p = t.add(Some(section), "p", &[]);
        let last = t.add(Some(section), "div", &[("class", "last"), ("lang", "en-GB")]);
        let h2b = t.add(Some(last), "h2", &[("class", "sectionheader")]);
        let special = t.add(Some(last), "p", &[("id", "special"), ("title", "a b c")]);
        let inner = t.add(Some(last), "div", &[]);
        (t, vec![h1, section, h2, p, last, h2b, special, inner])
    }

    #[track_caller]
    fn check(selector: &str, expected: &[bool]) {
        let (tree, ids) = sample();
        let list = SelectorList::parse(selector).unwrap();
        let results: Vec<bool> = ids
            .iter()
            .map(|&id| list.matches(tree.node(id)).is_some())
            .collect();
        assert_eq!(results, expected, "selector {:?}", selector);
    }

    #[test]
    fn test_element_and_star() {
        check("h2", &[false, false, true, false, false, true, false, false]);
        check("*", &[true; 8]);
        check("table", &[false; 8]);
    }

    #[test]
    fn test_id_and_class() {
        check("#special", &[false, false, false, false, false, false, true, false]);
        check(".sectionheader", &[false, false, true, false, false, true, false, false]);
        check("h2.sectionheader", &[false, false, true, false, false, true, false, false]);
        check("p.sectionheader", &[false; 8]);
    }

    #[test]
    fn test_attributes() {
        check("[title]", &[false, false, false, false, false, false, true, false]);
        check("[title~=b]", &[false, false, false, false, false, false, true, false]);
        check("[lang|=en]", &[false, false, false, false, true, false, false, false]);
        check("[lang^=en]", &[false, false, false, false, true, false, false, false]);
        check("[lang$=GB]", &[false, false, false, false, true, false, false, false]);
        check("[id*=ect]", &[false, true, false, false, false, false, false, false]);
        check("[class=\"sectionheader\"]", &[false, false, true, false, false, true, false, false]);
    }

    #[test]
    fn test_negation() {
        check("h2:not(.sectionheader)", &[false; 8]);
        check("p:not(#special)", &[false, false, false, true, false, false, false, false]);
    }

    #[test]
    fn test_combinators() {
        check(".last > p", &[false, false, false, false, false, false, true, false]);
        check("section p", &[false, false, false, true, false, false, true, false]);
        check("h2 + p", &[false, false, false, true, false, false, true, false]);
        check("h2 ~ div", &[false, false, false, false, true, false, false, true]);
        check("h1 + section", &[false, true, false, false, false, false, false, false]);
        check("h2 || p", &[false; 8]);
    }

    #[test]
    fn test_structural() {
        check(":first-child", &[true, false, true, false, false, true, false, false]);
        check(":last-child", &[false, true, false, false, true, false, false, true]);
        check(":nth-child(2)", &[false, true, false, true, false, false, true, false]);
        check(":nth-last-child(3)", &[false, false, true, false, false, true, false, false]);
        check("p:nth-child(9)", &[false; 8]);
    }

    #[test]
    fn test_unsupported_never_matches() {
        check("p::before", &[false; 8]);
        check("p:hover", &[false; 8]);
        check("p:is(.x)", &[false; 8]);
        check("svg|p", &[false; 8]);
    }

    #[test]
    fn test_best_specificity() {
        let (tree, ids) = sample();
        let list = SelectorList::parse("p, .last > p, #special").unwrap();
        assert_eq!(list.matches(tree.node(ids[6])), Some(Specificity(1, 0, 0)));
        assert_eq!(list.matches(tree.node(ids[3])), Some(Specificity(0, 0, 1)));
        assert_eq!(list.matches(tree.node(ids[0])), None);
    }

    #[test]
    fn test_specificity_counts() {
        let spec = |s: &str| SelectorList::parse(s).unwrap().selectors[0].specificity;
        assert_eq!(spec("*"), Specificity(0, 0, 0));
        assert_eq!(spec("li"), Specificity(0, 0, 1));
        assert_eq!(spec("ol > li"), Specificity(0, 0, 2));
        assert_eq!(spec("li > p:first-child"), Specificity(0, 1, 2));
        assert_eq!(spec("#a.b[c]"), Specificity(1, 2, 0));
        assert_eq!(spec("p:not(#x)"), Specificity(1, 0, 1));
        assert!(spec("#a") > spec(".a.b.c.d"));
    }
}
