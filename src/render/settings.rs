//! Typed renderer settings.
//!
//! Every renderer reads from the same flat [`Settings`] record; each
//! [`RendererKind`] has its own defaults, and selector matches contribute
//! [`SettingsPatch`]es which override individual fields.

use crate::ansi_colours::AnsiStyle;
use crate::render::layout::Sides;

/// How paragraph-like renderers align wrapped lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justification {
    /// Stretch every line but the last to the full width.
    Full,
    /// Ragged right.
    #[default]
    Left,
    /// Ragged left.
    Right,
    /// Centre each line.
    Center,
    /// Don't wrap or align at all.
    None,
}

macro_rules! settings {
    ($( $(#[$doc:meta])* $name:ident : $ty:ty = $default:expr ),* $(,)?) => {
        /// The full set of settings used by renderers.  Each renderer kind
        /// only looks at the fields relevant to it.
        #[derive(Debug, Clone, PartialEq)]
        pub struct Settings {
            $( $(#[$doc])* pub $name: $ty, )*
        }

        impl Default for Settings {
            fn default() -> Self {
                Settings {
                    $( $name: $default, )*
                }
            }
        }

        /// A partial set of settings; fields which are set override the
        /// corresponding [`Settings`] field.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct SettingsPatch {
            $( $name: Option<$ty>, )*
        }

        impl SettingsPatch {
            $(
                $(#[$doc])*
                pub fn $name(mut self, value: impl Into<$ty>) -> Self {
                    self.$name = Some(value.into());
                    self
                }
            )*

            /// Overlay `other` on top of this patch.
            pub fn merge(&mut self, other: &SettingsPatch) {
                $(
                    if let Some(value) = &other.$name {
                        self.$name = Some(value.clone());
                    }
                )*
            }

            /// Returns true if no field is set.
            pub fn is_empty(&self) -> bool {
                true $( && self.$name.is_none() )*
            }
        }

        impl Settings {
            /// Overwrite every field set in `patch`.
            pub fn apply(&mut self, patch: &SettingsPatch) {
                $(
                    if let Some(value) = &patch.$name {
                        self.$name = value.clone();
                    }
                )*
            }
        }
    };
}

settings! {
    /// Template wrapping inline content, e.g. `"_{}_"`.
    template: String = String::from("{}"),
    /// Upper-case the content.
    capitalized: bool = false,
    /// Outer margin in lines (top/bottom) and columns (left/right).
    margin: Sides<usize> = Sides::all(0),
    /// Space between the border and the content.
    padding: Sides<usize> = Sides::all(0),
    /// Border strings.  Left/right are added to every line; each character
    /// of top/bottom becomes a full-width row.
    border: Sides<String> = Sides::all(String::new()),
    /// Template applied to every line of a block, e.g. `"> {}"`.
    line_template: String = String::from("{}"),
    /// Extra indent for the first wrapped line.
    initial_indent: usize = 0,
    /// Extra indent for the other wrapped lines.
    subsequent_indent: usize = 0,
    /// Paragraph alignment.
    justification: Justification = Justification::Left,
    /// Two spaces after sentence ends when wrapping.
    fix_sentence_endings: bool = true,
    /// Split words longer than the line.
    break_long_words: bool = true,
    /// Allow line breaks after hyphens.
    break_on_hyphens: bool = true,
    /// Leave a paragraph alone if its only child is `code` or `pre`.
    skip_for_code_or_pre: bool = true,
    /// Number of `spread_char`s put between letters of a header.
    spread: usize = 0,
    /// The string used for letter spreading.
    spread_char: String = String::from(" "),
    /// Centre headers.
    centered: bool = false,
    /// Underline headers.
    underlined: bool = false,
    /// The underline character.
    underline_char: char = '=',
    /// Underline the full width rather than just the text.
    underline_full: bool = false,
    /// Indent for preformatted lines.
    indent: usize = 0,
    /// Inline form: code spans, and links/images placed inline.
    inline_template: String = String::from("{}"),
    /// Block form of code.
    block_template: String = String::from("{}"),
    /// Link/image form when there is a title.
    titled_template: String = String::from("{}"),
    /// Link/image form when the target is extracted elsewhere.
    reference_template: String = String::from("{}"),
    /// Extracted link line in a gophermap.
    gophermap_template: String = String::from("{}"),
    /// Truncate extracted link descriptions to this many characters.
    max_link_description: Option<usize> = None,
    /// First ordinal of an ordered list.
    start_index: i64 = 1,
    /// Ordinal increment of an ordered list.
    step: i64 = 1,
    /// Character repeated for horizontal rules.
    rule_char: char = '-',
    /// Colours and effects for the ANSI escape renderer.
    ansi: AnsiStyle = AnsiStyle::default(),
}

/// The available renderer behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// Drop the element and everything inside it.
    None,
    /// Inline template around the content.
    Inline,
    /// A generic block with margin, padding and border.
    Block,
    /// A header, optionally centred, spread and underlined.
    Header,
    /// A header with `#`s either side according to its level.
    MarkdownHeader,
    /// Wrapped and justified text.
    Paragraph,
    /// Code spans and code blocks.
    Code,
    /// Preformatted text.
    Pre,
    /// The in-text part of a link.
    Link,
    /// The in-text part of an image.
    Image,
    /// A link target extracted to a footer or the end of a block.
    ExtractedLink,
    /// An image target extracted to a footer or the end of a block.
    ExtractedImage,
    /// `_emphasis_`.
    Emphasis,
    /// `**strong**`.
    Strong,
    /// `_underline_`.
    Underline,
    /// `~~strikethrough~~`.
    Strikethrough,
    /// A hard line break.
    Break,
    /// A rule across the block.
    HorizontalRule,
    /// A quotation with a prefix on every line.
    BlockQuote,
    /// A list container.
    List,
    /// A bulleted list item.
    ListItem,
    /// A numbered list item.
    OrderedListItem,
    /// A definition list container.
    DefinitionList,
    /// A definition term.
    DefinitionTerm,
    /// A definition.
    DefinitionItem,
    /// Inline ANSI terminal styling.
    AnsiEscape,
}

impl RendererKind {
    /// Whether elements with this renderer form blocks.
    pub fn is_block(self) -> bool {
        use RendererKind::*;
        match self {
            Block | Header | MarkdownHeader | Paragraph | Pre | ExtractedLink | ExtractedImage
            | HorizontalRule | BlockQuote | List | ListItem | OrderedListItem | DefinitionList
            | DefinitionTerm | DefinitionItem => true,
            None | Inline | Code | Link | Image | Emphasis | Strong | Underline
            | Strikethrough | Break | AnsiEscape => false,
        }
    }

    /// The settings this renderer starts from before any overrides.
    pub fn default_settings(self) -> Settings {
        use RendererKind::*;
        let vertical = Sides::new(1, 0, 1, 0);
        let mut s = Settings::default();
        match self {
            None | Inline | Block | Break | AnsiEscape => {}
            List | DefinitionList => s.margin = vertical,
            Emphasis | Underline => s.template = "_{}_".into(),
            Strong => s.template = "**{}**".into(),
            Strikethrough => s.template = "~~{}~~".into(),
            Header | MarkdownHeader => s.margin = vertical,
            Paragraph => s.margin = vertical,
            Code => {
                s.inline_template = "`{}`".into();
                s.block_template = "```\n{}\n```\n".into();
            }
            Pre => {
                s.margin = vertical;
                s.indent = 4;
            }
            Link => {
                s.inline_template = "[{content}]({href})".into();
                s.titled_template = "[{content}]({href} \"{title}\")".into();
                s.reference_template = "[{content}][{link_reference}]".into();
            }
            Image => {
                s.inline_template = "![{title}]({href})".into();
                s.titled_template = "![{title}]({href})".into();
                s.reference_template = "[{title}][{link_reference}]".into();
            }
            ExtractedLink | ExtractedImage => {
                s.template = "[{link_reference}] {description}: {href}".into();
                s.titled_template = "[{link_reference}] {description}: {href} \"{title}\"".into();
                s.gophermap_template =
                    "{type}[{link_reference}] {description}\t{selector}\t{host}\t{port}\n".into();
            }
            HorizontalRule => s.margin = vertical,
            BlockQuote => {
                s.line_template = "> {}".into();
                s.margin = vertical;
            }
            ListItem => s.line_template = "* {}".into(),
            OrderedListItem => s.line_template = "{0}. {1}".into(),
            DefinitionTerm => s.margin = Sides::new(1, 0, 0, 0),
            DefinitionItem => s.line_template = ": {}".into(),
        }
        s
    }
}
