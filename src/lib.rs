//! Render HTML as plain text or as a Gopher menu.
//!
//! Each element is matched against a table of CSS selectors which decides
//! how it is rendered: wrapped paragraphs, centred and underlined headers,
//! lists, quotations, preformatted text and so on.  Links and images can
//! be shown inline, after the block containing them, or as numbered
//! references at the end of the document.  In gophermap output the
//! references become menu lines which a Gopher client can follow.
//!
//! # Examples
//!
//! ```rust
//! # use gopher_render::from_read;
//! let html = b"
//!        <ul>
//!          <li>Item one</li>
//!          <li>Item two</li>
//!          <li>Item three</li>
//!        </ul>";
//! assert_eq!(from_read(&html[..], 20).unwrap(),
//!            "
//! * Item one
//! * Item two
//! * Item three
//! ");
//! ```
//!
//! Rendering for a Gopher server:
//!
//! ```rust
//! let converter = gopher_render::config::gophermap("gopher.example.org", 70)
//!     .build()
//!     .unwrap();
//! let menu = converter.convert(r#"<p>See <a href="/notes.txt">my notes</a>.</p>"#);
//! assert_eq!(menu, "
//! See my notes.
//!
//! 0[1] my notes\t/notes.txt\tgopher.example.org\t70
//! ");
//! ```
//!
//! The `gopher_render` demo program converts a file or stdin:
//!
//! ```sh
//! $ cargo run --example gopher_render -- --gophermap example.org page.html
//! [...]
//! ```

#![deny(missing_docs)]

#[macro_use]
mod macros;

pub mod ansi_colours;
mod builder;
mod css;
mod dom;
pub mod gopher;
pub mod render;

use std::io;

pub use builder::DocumentBuilder;
use render::layout::Sides;
use render::registry::RendererMap;
use render::RenderOptions;

/// Errors from configuring or running a conversion.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Gophermap output needs every link and image extracted, since a menu
    /// line can't sit in the middle of text.
    #[error("Links and images can't be placed inline in a gophermap")]
    InlineLinksInGophermap,
    /// Gophermap output needs a host for relative links.
    #[error("A gophermap needs a host name")]
    MissingGopherHost,
    /// A renderer was registered with a selector which doesn't parse.
    #[error("Invalid selector {selector:?}: {message}")]
    InvalidSelector {
        /// The selector text.
        selector: String,
        /// What was wrong with it.
        message: String,
    },
    /// The output width leaves no room for any text.
    #[error("Output width too narrow")]
    TooNarrow,
    /// Reading the input failed.
    #[error("Failed to read input: {0}")]
    IoError(#[from] io::Error),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of output produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text.
    Text,
    /// A gophermap: text with menu lines for the extracted links.
    Gophermap,
}

/// Where a link or image target is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// In the text, where the element appears.
    Inline,
    /// Numbered, at the end of the document.
    Footer,
    /// Numbered, after the innermost block containing the element.
    AfterBlock,
}

pub mod config {
    //! Configure a conversion with a [`Config`], created by [`text`] or
    //! [`gophermap`].

    use crate::gopher::DEFAULT_GOPHER_PORT;
    use crate::render::layout::{LayoutBox, Sides};
    use crate::render::registry::{RendererMap, RendererSpec};
    use crate::{Converter, Error, OutputFormat, Placement, Result};

    /// The default output width.
    pub const DEFAULT_WIDTH: usize = 67;

    /// Conversion settings, finished with [`Config::build`].
    #[derive(Debug, Clone)]
    pub struct Config {
        format: OutputFormat,
        host: String,
        port: u16,
        width: usize,
        margin: Sides<usize>,
        padding: Sides<usize>,
        border: Sides<String>,
        renderers: Vec<(String, RendererSpec)>,
        extracted_renderers: Vec<(String, RendererSpec)>,
        link_placement: Placement,
        image_placement: Placement,
        optimise: bool,
    }

    fn new(format: OutputFormat, host: String, port: u16) -> Config {
        Config {
            format,
            host,
            port,
            width: DEFAULT_WIDTH,
            margin: Sides::all(0),
            padding: Sides::all(0),
            border: Sides::all(String::new()),
            renderers: Vec::new(),
            extracted_renderers: Vec::new(),
            link_placement: Placement::Footer,
            image_placement: Placement::Footer,
            optimise: true,
        }
    }

    /// Plain text output.
    pub fn text() -> Config {
        new(OutputFormat::Text, String::new(), DEFAULT_GOPHER_PORT)
    }

    /// Gophermap output; relative links point at `host`:`port`.
    pub fn gophermap(host: impl Into<String>, port: u16) -> Config {
        new(OutputFormat::Gophermap, host.into(), port)
    }

    impl Config {
        /// Set the output width in columns.
        pub fn width(mut self, width: usize) -> Self {
            self.width = width;
            self
        }

        /// Put a margin, padding and border around the whole document.
        pub fn document_box(
            mut self,
            margin: impl Into<Sides<usize>>,
            padding: impl Into<Sides<usize>>,
            border: impl Into<Sides<String>>,
        ) -> Self {
            self.margin = margin.into();
            self.padding = padding.into();
            self.border = border.into();
            self
        }

        /// Render elements matching `selector` with `spec`.  Rules added
        /// here take precedence over built-in rules of equal specificity.
        pub fn renderer(mut self, selector: &str, spec: impl Into<RendererSpec>) -> Self {
            self.renderers.push((selector.to_string(), spec.into()));
            self
        }

        /// Render the extracted form of links matching `selector` with
        /// `spec`.
        pub fn extracted_link_renderer(mut self, selector: &str, spec: impl Into<RendererSpec>) -> Self {
            self.extracted_renderers
                .push((selector.to_string(), spec.into()));
            self
        }

        /// Where to show link targets.
        pub fn link_placement(mut self, placement: Placement) -> Self {
            self.link_placement = placement;
            self
        }

        /// Where to show image sources.
        pub fn image_placement(mut self, placement: Placement) -> Self {
            self.image_placement = placement;
            self
        }

        /// Strip trailing whitespace from every output line.
        pub fn optimise(mut self, optimise: bool) -> Self {
            self.optimise = optimise;
            self
        }

        /// The port for relative links in a gophermap.
        pub fn gopher_port(mut self, port: u16) -> Self {
            self.port = port;
            self
        }

        /// Check the settings and compile the renderer tables.
        pub fn build(self) -> Result<Converter> {
            let root = LayoutBox::root(
                self.width,
                self.margin.clone(),
                self.padding.clone(),
                self.border.widths(),
            );
            if root.inner_width() == 0 {
                return Err(Error::TooNarrow);
            }
            if self.format == OutputFormat::Gophermap {
                if self.link_placement == Placement::Inline
                    || self.image_placement == Placement::Inline
                {
                    return Err(Error::InlineLinksInGophermap);
                }
                if self.host.trim().is_empty() {
                    return Err(Error::MissingGopherHost);
                }
            }

            let mut renderers = match self.format {
                OutputFormat::Text => RendererMap::text_defaults()?,
                OutputFormat::Gophermap => RendererMap::gophermap_defaults()?,
            };
            for (selector, spec) in self.renderers {
                renderers.insert(&selector, spec)?;
            }
            let mut extracted_renderers = RendererMap::extracted_defaults()?;
            for (selector, spec) in self.extracted_renderers {
                extracted_renderers.insert(&selector, spec)?;
            }

            Ok(Converter {
                format: self.format,
                host: self.host,
                port: self.port,
                width: self.width,
                margin: self.margin,
                padding: self.padding,
                border: self.border,
                link_placement: self.link_placement,
                image_placement: self.image_placement,
                optimise: self.optimise,
                renderers,
                extracted_renderers,
            })
        }

        /// Build, then convert HTML from `input`.
        pub fn string_from_read(self, input: impl std::io::Read) -> Result<String> {
            self.build()?.string_from_read(input)
        }
    }
}

/// A checked, reusable conversion setup.  Each conversion has its own
/// state, so one converter can be shared between threads.
#[derive(Debug, Clone)]
pub struct Converter {
    format: OutputFormat,
    host: String,
    port: u16,
    width: usize,
    margin: Sides<usize>,
    padding: Sides<usize>,
    border: Sides<String>,
    link_placement: Placement,
    image_placement: Placement,
    optimise: bool,
    renderers: RendererMap,
    extracted_renderers: RendererMap,
}

impl Converter {
    /// The output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// The output width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Convert an HTML string.
    pub fn convert(&self, html: &str) -> String {
        builder::build_html(self, html).finish()
    }

    /// Read HTML from `input` and convert it.  Invalid UTF-8 is replaced.
    pub fn string_from_read(&self, mut input: impl io::Read) -> Result<String> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        Ok(self.convert(&String::from_utf8_lossy(&bytes)))
    }

    /// A builder for feeding markup events directly.
    pub fn builder(&self) -> DocumentBuilder<'_> {
        DocumentBuilder::new(self)
    }

    /// Convert Markdown, via HTML.
    #[cfg(feature = "markdown")]
    pub fn convert_markdown(&self, markdown: &str) -> String {
        use pulldown_cmark::{html, Options, Parser};

        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let mut markup = String::new();
        html::push_html(&mut markup, Parser::new_ext(markdown, options));
        self.convert(&markup)
    }

    pub(crate) fn render_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            margin: self.margin.clone(),
            padding: self.padding.clone(),
            border: self.border.clone(),
            format: self.format,
            optimise: self.optimise,
        }
    }
}

/// Reads HTML from `input` and returns plain text wrapped to `width`
/// columns.
pub fn from_read<R>(input: R, width: usize) -> Result<String>
where
    R: io::Read,
{
    config::text().width(width).string_from_read(input)
}

/// Combines the results of a node's children into the node's result.
type ResultReducer<'a, C, R> = dyn Fn(&mut C, Vec<R>) -> Option<R> + 'a;

/// The result of visiting one node.
pub(crate) enum TreeMapResult<'a, C, N, R> {
    /// A completed result.
    Finished(R),
    /// The result is made by `cons` from the results of `children`.
    PendingChildren {
        children: Vec<N>,
        cons: Box<ResultReducer<'a, C, R>>,
    },
    /// Nothing to show for this node.
    Nothing,
}

/// Visit a tree depth-first without recursion, combining results on the
/// way back up.
pub(crate) fn tree_map_reduce<'a, C, N, R, M>(context: &mut C, top: N, mut process_node: M) -> Option<R>
where
    M: for<'c> FnMut(&'c mut C, N) -> TreeMapResult<'a, C, N, R>,
{
    struct PendingNode<'a, C, R, N> {
        construct: Box<ResultReducer<'a, C, R>>,
        children: Vec<R>,
        to_process: std::vec::IntoIter<N>,
    }

    let mut pending_stack = vec![PendingNode {
        // Just passes on the single top result.
        construct: Box::new(|_, mut cs| cs.pop()),
        children: Vec::new(),
        to_process: vec![top].into_iter(),
    }];
    loop {
        let Some(pending) = pending_stack.last_mut() else {
            break None;
        };
        if let Some(node) = pending.to_process.next() {
            match process_node(context, node) {
                TreeMapResult::Finished(result) => {
                    if let Some(pending) = pending_stack.last_mut() {
                        pending.children.push(result);
                    }
                }
                TreeMapResult::PendingChildren { children, cons } => {
                    pending_stack.push(PendingNode {
                        construct: cons,
                        children: Vec::new(),
                        to_process: children.into_iter(),
                    });
                }
                TreeMapResult::Nothing => {}
            }
        } else {
            let Some(completed) = pending_stack.pop() else {
                break None;
            };
            let reduced = (completed.construct)(context, completed.children);
            match (reduced, pending_stack.last_mut()) {
                (Some(result), Some(parent)) => parent.children.push(result),
                (Some(result), None) => break Some(result),
                (None, None) => break None,
                (None, Some(_)) => {}
            }
        }
    }
}
