//! Text helpers shared by the renderers: width measurement which ignores
//! ANSI escape sequences, word wrapping, justification and templates.

use std::fmt::Write;

use unicode_width::UnicodeWidthChar;

use crate::render::settings::Justification;

/// Marks the start of a gophermap menu line in rendered output.
pub(crate) const MENU_START: char = '\u{E000}';
/// Marks the end of a gophermap menu line in rendered output.
pub(crate) const MENU_END: char = '\u{E001}';

/// Split `text` into runs of ordinary text and `ESC [ ... m` sequences.
/// The boolean is true for escape sequences.
fn segments(text: &str) -> impl Iterator<Item = (bool, &str)> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        if let Some(len) = escape_len(rest) {
            let (esc, tail) = rest.split_at(len);
            rest = tail;
            return Some((true, esc));
        }
        let mut end = rest.len();
        for (idx, _) in rest.match_indices('\x1b').filter(|&(idx, _)| idx > 0) {
            if escape_len(&rest[idx..]).is_some() {
                end = idx;
                break;
            }
        }
        let (plain, tail) = rest.split_at(end);
        rest = tail;
        Some((false, plain))
    })
}

/// If `text` starts with an SGR escape sequence, return its length.
fn escape_len(text: &str) -> Option<usize> {
    let body = text.strip_prefix("\x1b[")?;
    let params = body
        .bytes()
        .take_while(|b| b.is_ascii_digit() || *b == b';')
        .count();
    if body[params..].starts_with('m') {
        Some(2 + params + 1)
    } else {
        None
    }
}

/// The number of terminal columns taken by `text`.
pub fn visible_width(text: &str) -> usize {
    segments(text)
        .filter(|(esc, _)| !esc)
        .flat_map(|(_, s)| s.chars())
        .filter(|&c| c != MENU_START && c != MENU_END)
        .map(|c| c.width().unwrap_or(0))
        .sum()
}

/// Upper-case `text`, leaving escape sequences alone.
pub fn capitalize(text: &str) -> String {
    segments(text)
        .map(|(esc, s)| if esc { s.to_string() } else { s.to_uppercase() })
        .collect()
}

/// Put `count` copies of `spread_char` between every character.
pub fn spread(text: &str, spread_char: &str, count: usize) -> String {
    let sep = spread_char.repeat(count);
    let mut units: Vec<&str> = Vec::new();
    for (esc, s) in segments(text) {
        if esc {
            units.push(s);
        } else {
            units.extend(s.char_indices().map(|(i, c)| &s[i..i + c.len_utf8()]));
        }
    }
    units.join(&sep)
}

/// Centre `text` in `width` columns, matching the usual string-centring
/// rule: an odd leftover column goes right unless both the leftover and the
/// width are odd.
pub fn center(text: &str, width: usize) -> String {
    let len = visible_width(text);
    if width == 0 || len >= width {
        return text.to_string();
    }
    let marg = width - len;
    let left = marg / 2 + (marg & width & 1);
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(marg - left))
}

/// Right-align `text` in `width` columns.
pub fn right(text: &str, width: usize) -> String {
    let len = visible_width(text);
    if width == 0 || len >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat(width - len), text)
}

/// A field reference inside a `{}`-style template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field<'t> {
    Index(usize),
    Name(&'t str),
}

/// Expand `template`, asking `lookup` for the value of each field.  `{}`
/// fields are numbered automatically, `{{` and `}}` are literal braces, and
/// fields `lookup` doesn't know about are left in place.
pub(crate) fn format_with<'t, F>(template: &'t str, mut lookup: F) -> String
where
    F: FnMut(Field<'t>) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut auto = 0;
    let mut rest = template;
    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }
        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            rest = "";
            break;
        };
        let name = &tail[1..close];
        let field = if name.is_empty() {
            auto += 1;
            Some(Field::Index(auto - 1))
        } else if let Ok(idx) = name.parse::<usize>() {
            Some(Field::Index(idx))
        } else if name.chars().all(|c| c == '_' || c.is_alphanumeric()) {
            Some(Field::Name(name))
        } else {
            None
        };
        match field.and_then(&mut lookup) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Expand a template with positional and named values.
pub fn format_template(template: &str, positional: &[&str], named: &[(&str, &str)]) -> String {
    format_with(template, |field| match field {
        Field::Index(idx) => positional.get(idx).map(|s| s.to_string()),
        Field::Name(name) => named
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string()),
    })
}

/// The width of the literal text in a line template.
pub fn template_width(template: &str) -> usize {
    visible_width(&format_with(template, |_| Some(String::new())))
}

/// Options for [`wrap`].
#[derive(Debug, Clone)]
pub struct WrapOptions {
    /// Maximum line width, including indents.
    pub width: usize,
    /// Prefix for the first line.
    pub initial_indent: String,
    /// Prefix for the other lines.
    pub subsequent_indent: String,
    /// Use two spaces after a sentence-ending full stop, `!` or `?`.
    pub fix_sentence_endings: bool,
    /// Split words which are longer than the line.
    pub break_long_words: bool,
    /// Allow breaks after hyphens in compound words.
    pub break_on_hyphens: bool,
}

impl WrapOptions {
    /// Default options for `width` columns.
    pub fn new(width: usize) -> WrapOptions {
        WrapOptions {
            width,
            initial_indent: String::new(),
            subsequent_indent: String::new(),
            fix_sentence_endings: false,
            break_long_words: true,
            break_on_hyphens: true,
        }
    }
}

fn munge_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut col = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let n = 8 - col % 8;
                out.extend(std::iter::repeat(' ').take(n));
                col += n;
            }
            '\n' | '\r' | '\x0b' | '\x0c' => {
                out.push(' ');
                col = 0;
            }
            c => {
                out.push(c);
                col += 1;
            }
        }
    }
    out
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// Split into alternating whitespace and word chunks.  Hyphenated words
/// are split after a hyphen which has two letters before it and a letter
/// after.
fn split_chunks(text: &str, break_on_hyphens: bool) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut in_space = None;
    for c in text.chars() {
        let space = is_space(c);
        if in_space != Some(space) && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        in_space = Some(space);
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    if !break_on_hyphens {
        return chunks;
    }
    let mut result = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;
        for i in 2..chars.len().saturating_sub(1) {
            if chars[i] == '-'
                && chars[i - 1].is_alphabetic()
                && chars[i - 2].is_alphabetic()
                && chars[i + 1].is_alphabetic()
            {
                result.push(chars[start..=i].iter().collect());
                start = i + 1;
            }
        }
        result.push(chars[start..].iter().collect());
    }
    result
}

fn ends_sentence(chunk: &str) -> bool {
    let mut chars = chunk.chars().rev().peekable();
    if matches!(chars.peek(), Some('"') | Some('\'')) {
        chars.next();
    }
    matches!(chars.next(), Some('.') | Some('!') | Some('?'))
        && chars.next().map(|c| c.is_ascii_lowercase()).unwrap_or(false)
}

/// Take the prefix of `chunk` which fits in `columns`, at least one char.
fn split_at_width(chunk: &str, columns: usize) -> (String, String) {
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in chunk.char_indices() {
        let w = c.width().unwrap_or(0);
        if end > 0 && used + w > columns {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }
    (chunk[..end].to_string(), chunk[end..].to_string())
}

fn handle_long_word(
    chunks: &mut Vec<String>,
    cur_line: &mut Vec<String>,
    cur_len: usize,
    width: usize,
    opts: &WrapOptions,
) {
    let space_left = if width < 1 { 1 } else { width.saturating_sub(cur_len).max(1) };
    if opts.break_long_words {
        let Some(chunk) = chunks.pop() else {
            return;
        };
        let mut end_cols = space_left;
        if opts.break_on_hyphens && visible_width(&chunk) > space_left {
            let prefix: String = chunk.chars().take(space_left).collect();
            if let Some(hyphen) = prefix.rfind('-') {
                if hyphen > 0 && prefix[..hyphen].chars().any(|c| c != '-') {
                    end_cols = visible_width(&prefix[..=hyphen]);
                }
            }
        }
        let (head, tail) = split_at_width(&chunk, end_cols);
        cur_line.push(head);
        if !tail.is_empty() {
            chunks.push(tail);
        }
    } else if cur_line.is_empty() {
        if let Some(chunk) = chunks.pop() {
            cur_line.push(chunk);
        }
    }
}

/// Wrap `text` into lines no wider than `opts.width` where possible.
pub fn wrap(text: &str, opts: &WrapOptions) -> Vec<String> {
    let width = opts.width.max(1);
    let mut chunks = split_chunks(&munge_whitespace(text), opts.break_on_hyphens);
    if opts.fix_sentence_endings {
        for i in 0..chunks.len().saturating_sub(1) {
            if chunks[i + 1] == " " && ends_sentence(&chunks[i]) {
                chunks[i + 1] = "  ".into();
            }
        }
    }
    chunks.reverse();

    let mut lines: Vec<String> = Vec::new();
    while !chunks.is_empty() {
        let mut cur_line: Vec<String> = Vec::new();
        let mut cur_len = 0;
        let indent = if lines.is_empty() {
            &opts.initial_indent
        } else {
            &opts.subsequent_indent
        };
        let line_width = width.saturating_sub(visible_width(indent));

        if !lines.is_empty() && chunks.last().map(|c| c.trim().is_empty()).unwrap_or(false) {
            chunks.pop();
        }

        while let Some(chunk) = chunks.last() {
            let l = visible_width(chunk);
            if cur_len + l <= line_width {
                cur_len += l;
                cur_line.extend(chunks.pop());
            } else {
                break;
            }
        }

        if chunks
            .last()
            .map(|c| visible_width(c) > line_width)
            .unwrap_or(false)
        {
            handle_long_word(&mut chunks, &mut cur_line, cur_len, line_width, opts);
        }

        if cur_line.last().map(|c| c.trim().is_empty()).unwrap_or(false) {
            cur_line.pop();
        }

        if !cur_line.is_empty() {
            let mut line = indent.clone();
            for chunk in &cur_line {
                line.push_str(chunk);
            }
            lines.push(line);
        }
    }
    lines
}

fn full_justify_line(line: &str, width: usize) -> String {
    let orig_len = visible_width(line);
    if orig_len >= width {
        return line.to_string();
    }
    let stripped = line.trim_start_matches(' ');
    let indent = &line[..line.len() - stripped.len()];
    let words: Vec<&str> = stripped.trim_end_matches(' ').split(' ').collect();
    let gaps = words.len() - 1;
    if gaps == 0 {
        return line.to_string();
    }
    let padding = width - orig_len;
    let (n, r) = (padding / gaps, padding % gaps);
    let narrow = " ".repeat(n + 1);
    let mut out = String::from(indent);
    if r == 0 {
        out.push_str(&words.join(&narrow));
    } else {
        let wide = " ".repeat(n + 2);
        let _ = write!(
            out,
            "{}{}{}",
            words[..r].join(&wide),
            wide,
            words[r..].join(&narrow)
        );
    }
    out
}

/// Wrap and align `text` to `width` columns.
pub fn justify(text: &str, mode: Justification, opts: &WrapOptions) -> String {
    let width = opts.width;
    let lines = match mode {
        Justification::None => return text.to_string(),
        _ => wrap(text, opts),
    };
    let aligned: Vec<String> = match mode {
        Justification::Full => {
            let last = lines.len().saturating_sub(1);
            lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    if i < last {
                        full_justify_line(line, width)
                    } else {
                        line.clone()
                    }
                })
                .collect()
        }
        Justification::Right => lines.iter().map(|l| right(l, width)).collect(),
        Justification::Center => lines.iter().map(|l| center(l, width)).collect(),
        Justification::Left | Justification::None => lines,
    };
    aligned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(width: usize) -> WrapOptions {
        WrapOptions::new(width)
    }

    #[test]
    fn test_visible_width_ignores_escapes() {
        assert_eq!(visible_width("hello"), 5);
        assert_eq!(visible_width("\x1b[1;31mhello\x1b[0m"), 5);
        assert_eq!(visible_width("\x1b[x"), 2);
        assert_eq!(visible_width("日本"), 4);
        assert_eq!(visible_width("\u{E000}abc\u{E001}"), 3);
    }

    #[test]
    fn test_capitalize_and_spread() {
        assert_eq!(capitalize("ab\x1b[1mcd\x1b[22m"), "AB\x1b[1mCD\x1b[22m");
        assert_eq!(spread("abc", " ", 1), "a b c");
        assert_eq!(spread("ab", "-", 2), "a--b");
        assert_eq!(spread("\x1b[1mab", " ", 1), "\x1b[1m a b");
    }

    #[test]
    fn test_center() {
        assert_eq!(center("Seventh", 67), format!("{}Seventh{}", " ".repeat(30), " ".repeat(30)));
        assert_eq!(center("ab", 5), "  ab ");
        assert_eq!(center("abc", 6), " abc  ");
        assert_eq!(center("abc", 2), "abc");
        assert_eq!(right("ab", 4), "  ab");
    }

    #[test]
    fn test_templates() {
        assert_eq!(format_template("_{}_", &["x"], &[]), "_x_");
        assert_eq!(format_template("{0}. {1}", &["3", "{}"], &[]), "3. {}");
        assert_eq!(
            format_template("[{content}]({href})", &[], &[("content", "a"), ("href", "b")]),
            "[a](b)"
        );
        assert_eq!(format_template("{{}} {missing}", &[], &[]), "{} {missing}");
        assert_eq!(format_template("{", &[], &[]), "{");
        assert_eq!(template_width("> {}"), 2);
        assert_eq!(template_width("{0}. {1}"), 2);
        assert_eq!(template_width("{}"), 0);
    }

    #[test]
    fn test_wrap_basic() {
        assert_eq!(
            wrap("The quick brown fox jumps", &opts(10)),
            vec!["The quick", "brown fox", "jumps"]
        );
        assert!(wrap("", &opts(10)).is_empty());
        assert!(wrap("   ", &opts(10)).is_empty());
    }

    #[test]
    fn test_wrap_long_words_and_hyphens() {
        assert_eq!(wrap("abcdefghij", &opts(4)), vec!["abcd", "efgh", "ij"]);
        assert_eq!(
            wrap("a well-known fact", &opts(8)),
            vec!["a well-", "known", "fact"]
        );
        let mut no_break = opts(4);
        no_break.break_long_words = false;
        assert_eq!(wrap("abcdefghij xy", &no_break), vec!["abcdefghij", "xy"]);
    }

    #[test]
    fn test_wrap_indents_and_sentences() {
        let mut o = opts(12);
        o.initial_indent = "  ".into();
        o.subsequent_indent = " ".into();
        assert_eq!(wrap("one two three four", &o), vec!["  one two", " three four"]);

        let mut o = opts(40);
        o.fix_sentence_endings = true;
        assert_eq!(wrap("It ended. Then Mr. X came.", &o), vec!["It ended.  Then Mr.  X came."]);
        assert_eq!(wrap("Version 2. Next", &o), vec!["Version 2. Next"]);
    }

    #[test]
    fn test_full_justify() {
        let text = "aa bb cc dd ee ff gg";
        let out = justify(text, Justification::Full, &opts(10));
        assert_eq!(out, "aa  bb  cc\ndd  ee  ff\ngg");
        let out = justify("a bb cc ddddd", Justification::Full, &opts(8));
        assert_eq!(out, "a  bb cc\nddddd");
        for line in justify(text, Justification::Full, &opts(9)).lines().rev().skip(1) {
            assert_eq!(line.len(), 9);
        }
    }

    #[test]
    fn test_other_justifications() {
        assert_eq!(justify("ab cd", Justification::Right, &opts(4)), "  ab\n  cd");
        assert_eq!(justify("ab cd", Justification::Center, &opts(4)), " ab \n cd ");
        assert_eq!(justify("ab cd", Justification::Center, &opts(5)), "ab cd");
        assert_eq!(justify("ab    cd", Justification::None, &opts(2)), "ab    cd");
        assert_eq!(justify("ab cd", Justification::Left, &opts(80)), "ab cd");
    }
}
