//! ANSI terminal styling for the escape-code renderer.
//!
//! An [`AnsiStyle`] describes colours, a font and a set of effects; it
//! wraps text in the SGR sequences which switch them on and back off.
//!
//! ```
//! use gopher_render::ansi_colours::{AnsiColour, AnsiStyle, Effect};
//!
//! let style = AnsiStyle::default()
//!     .effect(Effect::Bold)
//!     .foreground("red".parse::<AnsiColour>().unwrap());
//! assert_eq!(style.wrap("hi"), "\x1b[1m\x1b[31mhi\x1b[22m\x1b[39m");
//! ```

use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{alpha1, digit1},
    combinator::{all_consuming, map_res, recognize},
    multi::many1,
    sequence::preceded,
    IResult, Parser,
};

const ESCAPE_FORMAT_START: &str = "\x1b[";
const BACKGROUND_OFFSET: u8 = 10;
const FONT_OFFSET: u8 = 10;

fn sgr(code: impl std::fmt::Display) -> String {
    format!("{}{}m", ESCAPE_FORMAT_START, code)
}

const NAMED_COLOURS: &[(&str, u8)] = &[
    ("black", 30),
    ("red", 31),
    ("green", 32),
    ("yellow", 33),
    ("blue", 34),
    ("magenta", 35),
    ("cyan", 36),
    ("white", 37),
    ("bright_black", 90),
    ("bright_red", 91),
    ("bright_green", 92),
    ("bright_yellow", 93),
    ("bright_blue", 94),
    ("bright_magenta", 95),
    ("bright_cyan", 96),
    ("bright_white", 97),
];

/// A terminal colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiColour {
    /// One of the sixteen named colours, stored as its foreground code.
    Named(u8),
    /// An index into the 256-colour palette.
    Palette(u8),
    /// A 24-bit colour.
    Rgb(u8, u8, u8),
}

impl AnsiColour {
    /// Look up a named colour such as `"bright_blue"`.
    pub fn named(name: &str) -> Option<AnsiColour> {
        NAMED_COLOURS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, code)| AnsiColour::Named(*code))
    }

    fn parameters(self, background: bool) -> String {
        let control = if background { 48 } else { 38 };
        match self {
            AnsiColour::Named(code) => {
                let offset = if background { BACKGROUND_OFFSET } else { 0 };
                format!("{}", code + offset)
            }
            AnsiColour::Palette(n) => format!("{};5;{}", control, n),
            AnsiColour::Rgb(r, g, b) => format!("{};2;{};{};{}", control, r, g, b),
        }
    }
}

fn hex_digit(text: &str) -> IResult<&str, &str> {
    take_while_m_n(1, 1, |c: char| c.is_ascii_hexdigit()).parse(text)
}

fn hex_pair(text: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |s: &str| u8::from_str_radix(s, 16),
    )
    .parse(text)
}

fn parse_rgb(text: &str) -> IResult<&str, AnsiColour> {
    alt((
        all_consuming(preceded(tag("#"), (hex_pair, hex_pair, hex_pair)))
            .map(|(r, g, b)| AnsiColour::Rgb(r, g, b)),
        all_consuming(map_res(
            preceded(tag("#"), (hex_digit, hex_digit, hex_digit)),
            |(r, g, b): (&str, &str, &str)| -> Result<AnsiColour, std::num::ParseIntError> {
                let double = |d: &str| u8::from_str_radix(&d.repeat(2), 16);
                Ok(AnsiColour::Rgb(double(r)?, double(g)?, double(b)?))
            },
        )),
    ))
    .parse(text)
}

fn parse_palette(text: &str) -> IResult<&str, AnsiColour> {
    all_consuming(map_res(digit1, |s: &str| s.parse::<u8>().map(AnsiColour::Palette)))
        .parse(text)
}

fn parse_name(text: &str) -> IResult<&str, &str> {
    all_consuming(recognize(many1(alt((alpha1, tag("_")))))).parse(text)
}

impl FromStr for AnsiColour {
    type Err = String;

    /// Parse a colour name, a palette index (`"208"`), or an HTML-style
    /// `#rgb`/`#rrggbb` colour.
    fn from_str(s: &str) -> Result<AnsiColour, String> {
        let s = s.trim();
        if let Ok((_, colour)) = parse_rgb(s) {
            return Ok(colour);
        }
        if let Ok((_, colour)) = parse_palette(s) {
            return Ok(colour);
        }
        if let Ok((_, name)) = parse_name(s) {
            if let Some(colour) = AnsiColour::named(&name.to_ascii_lowercase()) {
                return Ok(colour);
            }
        }
        Err(format!("unknown colour {:?}", s))
    }
}

/// A text effect with its own on/off codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Bold or increased intensity.
    Bold,
    /// Decreased intensity.
    Faint,
    /// Italic.
    Italic,
    /// Blackletter.
    Fraktur,
    /// Underline.
    Underline,
    /// Slow blink.
    SlowBlink,
    /// Rapid blink.
    RapidBlink,
    /// Swap foreground and background.
    Invert,
    /// Hidden text.
    Conceal,
    /// Strike-through.
    CrossedOut,
    /// Framed.
    Framed,
    /// Encircled.
    Encircled,
    /// Overlined.
    Overlined,
}

// In output order.
const EFFECTS: &[(Effect, u8, u8)] = &[
    (Effect::Bold, 1, 22),
    (Effect::Faint, 2, 22),
    (Effect::Italic, 3, 23),
    (Effect::Fraktur, 20, 23),
    (Effect::Underline, 4, 24),
    (Effect::SlowBlink, 5, 25),
    (Effect::RapidBlink, 6, 25),
    (Effect::Invert, 7, 27),
    (Effect::Conceal, 8, 28),
    (Effect::CrossedOut, 9, 29),
    (Effect::Framed, 51, 54),
    (Effect::Encircled, 52, 54),
    (Effect::Overlined, 53, 55),
];

/// Colours, font and effects applied by the ANSI escape renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnsiStyle {
    /// Text colour.
    pub foreground: Option<AnsiColour>,
    /// Background colour.
    pub background: Option<AnsiColour>,
    /// Alternative font, 1 to 9.
    pub font: Option<u8>,
    /// Effects to enable.
    pub effects: Vec<Effect>,
    /// Finish with a single full reset instead of undoing each part.
    pub normalise: bool,
}

impl AnsiStyle {
    /// Set the foreground colour.
    pub fn foreground(mut self, colour: AnsiColour) -> Self {
        self.foreground = Some(colour);
        self
    }

    /// Set the background colour.
    pub fn background(mut self, colour: AnsiColour) -> Self {
        self.background = Some(colour);
        self
    }

    /// Select an alternative font.
    pub fn font(mut self, font: u8) -> Self {
        self.font = Some(font);
        self
    }

    /// Enable an effect.
    pub fn effect(mut self, effect: Effect) -> Self {
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
        self
    }

    /// Use a single reset at the end.
    pub fn normalise(mut self, normalise: bool) -> Self {
        self.normalise = normalise;
        self
    }

    /// Surround `text` with the escape sequences for this style.
    pub fn wrap(&self, text: &str) -> String {
        let mut enable = String::new();
        let mut disable = String::new();
        for &(effect, on, off) in EFFECTS {
            if self.effects.contains(&effect) {
                enable.push_str(&sgr(on));
                if !self.normalise {
                    disable.push_str(&sgr(off));
                }
            }
        }
        if let Some(font) = self.font {
            enable.push_str(&sgr(font.saturating_add(FONT_OFFSET)));
            if !self.normalise {
                disable.push_str(&sgr(FONT_OFFSET));
            }
        }
        if let Some(colour) = self.foreground {
            enable.push_str(&sgr(colour.parameters(false)));
            if !self.normalise {
                disable.push_str(&sgr(39));
            }
        }
        if let Some(colour) = self.background {
            enable.push_str(&sgr(colour.parameters(true)));
            if !self.normalise {
                disable.push_str(&sgr(49));
            }
        }
        if self.normalise {
            disable.push_str(&sgr(0));
        }
        format!("{}{}{}", enable, text, disable)
    }
}
