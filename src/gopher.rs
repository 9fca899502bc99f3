//! Gopher menu item descriptors for extracted links.
//!
//! Every `a`/`img` element gets a [`GopherLink`] computed from its target
//! when the tree is built.  Absolute web URLs are wrapped using the `URL:`
//! selector convention, `gopher://` URLs are taken apart, and relative
//! paths are assumed to live on the configured server, with the item type
//! guessed from the file extension.

use std::fmt;

use url::{ParseError, Url};

/// The port assumed for `gopher://` URLs which don't name one.
pub const DEFAULT_GOPHER_PORT: u16 = 70;

/// A Gopher item type, written as the first character of a menu line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// `0`: a plain text file.
    TextFile,
    /// `1`: another menu.
    Menu,
    /// `9`: a binary file.
    Binary,
    /// `g`: a GIF image.
    Gif,
    /// `I`: any other image.
    Image,
    /// `h`: an HTML page, or a web link using a `URL:` selector.
    Html,
    /// Any other type character, as found in a `gopher://` URL.
    Other(char),
}

impl ItemType {
    /// The single character used in menu lines.
    pub fn as_char(self) -> char {
        match self {
            ItemType::TextFile => '0',
            ItemType::Menu => '1',
            ItemType::Binary => '9',
            ItemType::Gif => 'g',
            ItemType::Image => 'I',
            ItemType::Html => 'h',
            ItemType::Other(c) => c,
        }
    }

    fn from_char(c: char) -> ItemType {
        match c {
            '0' => ItemType::TextFile,
            '1' => ItemType::Menu,
            '9' => ItemType::Binary,
            'g' => ItemType::Gif,
            'I' => ItemType::Image,
            'h' => ItemType::Html,
            other => ItemType::Other(other),
        }
    }

    /// Guess the item type of a path from its extension.
    pub fn from_path(path: &str) -> ItemType {
        let path = path
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        let last = path.rsplit('/').next().unwrap_or_default();
        let ext = match last.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
            _ => return ItemType::Menu,
        };
        match ext.as_str() {
            "html" | "htm" | "xhtml" => ItemType::Html,
            "gif" => ItemType::Gif,
            "png" | "jpg" | "jpeg" | "bmp" | "webp" | "svg" | "ico" | "tif" | "tiff" => {
                ItemType::Image
            }
            "txt" | "text" | "md" | "markdown" | "rst" | "csv" | "tsv" | "log" => {
                ItemType::TextFile
            }
            _ => ItemType::Binary,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Where a link points, in Gopher terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GopherLink {
    /// The menu item type.
    pub item_type: ItemType,
    /// The selector string sent to the server.
    pub selector: String,
    /// The server hosting the item.
    pub host: String,
    /// The server's port.
    pub port: u16,
}

impl GopherLink {
    /// Classify `href`, using `host`/`port` for anything not on an explicit
    /// Gopher server.
    pub fn classify(href: &str, host: &str, port: u16) -> GopherLink {
        match Url::parse(href) {
            Ok(url) if url.scheme() == "gopher" => match url.host_str() {
                Some(gopher_host) => {
                    let path = url.path();
                    let path = path.strip_prefix('/').unwrap_or(path);
                    let mut chars = path.chars();
                    let (item_type, selector) = match chars.next() {
                        Some(c) => (ItemType::from_char(c), chars.as_str().to_string()),
                        None => (ItemType::Menu, String::new()),
                    };
                    GopherLink {
                        item_type,
                        selector,
                        host: gopher_host.to_string(),
                        port: url.port().unwrap_or(DEFAULT_GOPHER_PORT),
                    }
                }
                None => GopherLink::web(href, host, port),
            },
            Ok(_) => GopherLink::web(href, host, port),
            Err(ParseError::RelativeUrlWithoutBase) if !href.is_empty() => GopherLink {
                item_type: ItemType::from_path(href),
                selector: href.to_string(),
                host: host.to_string(),
                port,
            },
            Err(_) => GopherLink::web(href, host, port),
        }
    }

    fn web(href: &str, host: &str, port: u16) -> GopherLink {
        GopherLink {
            item_type: ItemType::Html,
            selector: format!("URL:{}", href),
            host: host.to_string(),
            port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GopherLink, ItemType};

    #[test]
    fn test_relative_paths() {
        let link = GopherLink::classify("relative/path.txt", "my.gopher.com", 70);
        assert_eq!(
            link,
            GopherLink {
                item_type: ItemType::TextFile,
                selector: "relative/path.txt".into(),
                host: "my.gopher.com".into(),
                port: 70,
            }
        );
        let link = GopherLink::classify("/phlog/", "example.org", 7070);
        assert_eq!(link.item_type, ItemType::Menu);
        assert_eq!(link.port, 7070);
        assert_eq!(
            GopherLink::classify("/pics/cat.GIF", "h", 70).item_type,
            ItemType::Gif
        );
        assert_eq!(
            GopherLink::classify("img/logo.png?v=2", "h", 70).item_type,
            ItemType::Image
        );
        assert_eq!(
            GopherLink::classify("about.html#team", "h", 70).item_type,
            ItemType::Html
        );
        assert_eq!(
            GopherLink::classify("files/archive.tar.gz", "h", 70).item_type,
            ItemType::Binary
        );
        assert_eq!(
            GopherLink::classify(".profile", "h", 70).item_type,
            ItemType::Menu
        );
    }

    #[test]
    fn test_web_links() {
        let link = GopherLink::classify("https://example.com/a.txt", "my.gopher.com", 70);
        assert_eq!(link.item_type, ItemType::Html);
        assert_eq!(link.selector, "URL:https://example.com/a.txt");
        assert_eq!(link.host, "my.gopher.com");

        let link = GopherLink::classify("mailto:someone@example.com", "g", 71);
        assert_eq!(link.item_type, ItemType::Html);
        assert_eq!(link.selector, "URL:mailto:someone@example.com");
        assert_eq!(link.port, 71);

        let link = GopherLink::classify("", "g", 70);
        assert_eq!(link.item_type, ItemType::Html);
        assert_eq!(link.selector, "URL:");
    }

    #[test]
    fn test_gopher_urls() {
        let link = GopherLink::classify("gopher://floodgap.com:7070/0/gopher/proxy.txt", "me", 70);
        assert_eq!(
            link,
            GopherLink {
                item_type: ItemType::TextFile,
                selector: "/gopher/proxy.txt".into(),
                host: "floodgap.com".into(),
                port: 7070,
            }
        );
        let link = GopherLink::classify("gopher://sdf.org/", "me", 70);
        assert_eq!(link.item_type, ItemType::Menu);
        assert_eq!(link.selector, "");
        assert_eq!(link.port, 70);
        assert_eq!(ItemType::Other('7').to_string(), "7");
    }
}
