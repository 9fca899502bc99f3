//! Parsing for the subset of CSS selector syntax used in renderer maps.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, not, opt, peek, recognize, value},
    error::ErrorKind,
    multi::{many0, many1, separated_list1},
    sequence::{delimited, preceded},
    IResult, Parser,
};

use super::{AttrOperator, Selector, SelectorComponent, SelectorList};

fn skip_optional_whitespace(text: &str) -> IResult<&str, ()> {
    map(multispace0, |_| ()).parse(text)
}

fn nmstart_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic() || !c.is_ascii()
}

fn nmchar_char(c: char) -> bool {
    c == '_' || c == '-' || c.is_ascii_alphanumeric() || !c.is_ascii()
}

fn parse_ident(text: &str) -> IResult<&str, String> {
    map(
        recognize((
            opt(char('-')),
            take_while1(nmstart_char),
            take_while(nmchar_char),
        )),
        String::from,
    )
    .parse(text)
}

fn parse_string(text: &str) -> IResult<&str, String> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
    ))
    .map(String::from)
    .parse(text)
}

fn parse_type_selector(text: &str) -> IResult<&str, SelectorComponent> {
    alt((
        map(parse_ident, |name| {
            SelectorComponent::Element(name.to_ascii_lowercase())
        }),
        value(SelectorComponent::Star, char('*')),
    ))
    .parse(text)
}

/// `ns|E`, `*|E` or `|E`.  Namespaces aren't tracked, so these never match.
fn parse_namespaced(text: &str) -> IResult<&str, SelectorComponent> {
    map(
        recognize((
            opt(alt((recognize(parse_ident), tag("*")))),
            char('|'),
            not(char('|')),
            alt((recognize(parse_ident), tag("*"))),
        )),
        |s: &str| SelectorComponent::Unsupported(s.into()),
    )
    .parse(text)
}

fn parse_hash(text: &str) -> IResult<&str, SelectorComponent> {
    map(preceded(char('#'), parse_ident), SelectorComponent::Id).parse(text)
}

fn parse_class(text: &str) -> IResult<&str, SelectorComponent> {
    map(preceded(char('.'), parse_ident), SelectorComponent::Class).parse(text)
}

fn parse_attr_operator(text: &str) -> IResult<&str, AttrOperator> {
    alt((
        value(AttrOperator::Includes, tag("~=")),
        value(AttrOperator::DashMatch, tag("|=")),
        value(AttrOperator::Prefix, tag("^=")),
        value(AttrOperator::Suffix, tag("$=")),
        value(AttrOperator::Substring, tag("*=")),
        value(AttrOperator::Equals, tag("=")),
    ))
    .parse(text)
}

fn parse_attrib(text: &str) -> IResult<&str, SelectorComponent> {
    let (rest, (_, _, name, _, op_value, _, _)) = (
        char('['),
        skip_optional_whitespace,
        parse_ident,
        skip_optional_whitespace,
        opt((
            parse_attr_operator,
            skip_optional_whitespace,
            alt((parse_string, parse_ident)),
            skip_optional_whitespace,
        )),
        opt(preceded(
            alt((char('i'), char('s'), char('I'), char('S'))),
            skip_optional_whitespace,
        )),
        char(']'),
    )
        .parse(text)?;
    let name = name.to_ascii_lowercase();
    let attr = match op_value {
        Some((op, _, value, _)) => SelectorComponent::Attr { name, op, value },
        None => SelectorComponent::Attr {
            name,
            op: AttrOperator::Exists,
            value: String::new(),
        },
    };
    Ok((rest, attr))
}

fn parse_positive_integer(text: &str) -> IResult<&str, usize> {
    map_res(digit1, |digits: &str| digits.parse::<usize>()).parse(text)
}

fn parse_negation(text: &str) -> IResult<&str, SelectorComponent> {
    map(
        delimited(
            (tag(":not("), skip_optional_whitespace),
            parse_compound,
            (skip_optional_whitespace, char(')')),
        ),
        SelectorComponent::Not,
    )
    .parse(text)
}

fn parse_nth(text: &str) -> IResult<&str, SelectorComponent> {
    let (rest, (name, _, _, n, _, _)) = (
        alt((tag(":nth-last-child"), tag(":nth-child"))),
        char('('),
        skip_optional_whitespace,
        parse_positive_integer,
        skip_optional_whitespace,
        char(')'),
    )
        .parse(text)?;
    let comp = if name == ":nth-child" {
        SelectorComponent::NthChild(n)
    } else {
        SelectorComponent::NthLastChild(n)
    };
    Ok((rest, comp))
}

/// Skip a balanced parenthesised argument list.
fn parse_function_args(text: &str) -> IResult<&str, &str> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Err(nom::Err::Error(nom::error::Error::new(text, ErrorKind::Char)));
                }
                depth -= 1;
                if depth == 0 {
                    return Ok((&text[idx + 1..], &text[..idx + 1]));
                }
            }
            _ if depth == 0 => {
                return Err(nom::Err::Error(nom::error::Error::new(text, ErrorKind::Char)));
            }
            _ => (),
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(text, ErrorKind::Eof)))
}

fn parse_pseudo(text: &str) -> IResult<&str, SelectorComponent> {
    let (rest, (colons, name, args)) = (
        alt((tag("::"), tag(":"))),
        parse_ident,
        opt(parse_function_args),
    )
        .parse(text)?;
    let comp = match (colons, name.to_ascii_lowercase().as_str(), args) {
        (":", "first-child", None) => SelectorComponent::FirstChild,
        (":", "last-child", None) => SelectorComponent::LastChild,
        _ => SelectorComponent::Unsupported(format!(
            "{}{}{}",
            colons,
            name,
            args.unwrap_or("")
        )),
    };
    Ok((rest, comp))
}

fn parse_simple_selector_component(text: &str) -> IResult<&str, SelectorComponent> {
    alt((
        parse_hash,
        parse_class,
        parse_attrib,
        parse_negation,
        parse_nth,
        parse_pseudo,
    ))
    .parse(text)
}

pub(crate) fn parse_compound(text: &str) -> IResult<&str, Vec<SelectorComponent>> {
    alt((
        map(
            (
                alt((parse_namespaced, parse_type_selector)),
                many0(parse_simple_selector_component),
            ),
            |(first, extras)| {
                let mut result = vec![first];
                result.extend(extras);
                result
            },
        ),
        many1(parse_simple_selector_component),
    ))
    .parse(text)
}

fn parse_combinator(text: &str) -> IResult<&str, SelectorComponent> {
    alt((
        delimited(
            skip_optional_whitespace,
            alt((
                value(SelectorComponent::CombColumn, tag("||")),
                value(SelectorComponent::CombChild, char('>')),
                value(SelectorComponent::CombAdjacentSibling, char('+')),
                value(SelectorComponent::CombGeneralSibling, char('~')),
            )),
            skip_optional_whitespace,
        ),
        value(
            SelectorComponent::CombDescendant,
            (multispace1, peek(not(alt((char(','), char(')')))))),
        ),
    ))
    .parse(text)
}

/// Parse one complex selector, e.g. `div.note > p:first-child`.
pub(crate) fn parse_selector(text: &str) -> IResult<&str, Selector> {
    let (rest, (first, more)) =
        (parse_compound, many0((parse_combinator, parse_compound))).parse(text)?;

    // Store right-to-left so matching starts at the subject element.
    let mut components = Vec::new();
    let mut compounds = vec![(None, first)];
    compounds.extend(more.into_iter().map(|(comb, comp)| (Some(comb), comp)));
    for (comb, compound) in compounds.into_iter().rev() {
        components.extend(compound);
        if let Some(comb) = comb {
            components.push(comb);
        }
    }
    Ok((rest, Selector::new(components)))
}

fn parse_selector_list_inner(text: &str) -> IResult<&str, Vec<Selector>> {
    delimited(
        skip_optional_whitespace,
        separated_list1(
            (skip_optional_whitespace, char(','), skip_optional_whitespace),
            parse_selector,
        ),
        skip_optional_whitespace,
    )
    .parse(text)
}

/// Parse a full comma-separated selector list; trailing garbage is an error.
pub(crate) fn parse_selector_list(text: &str) -> Result<SelectorList, String> {
    match all_consuming(parse_selector_list_inner).parse(text) {
        Ok((_, selectors)) => Ok(SelectorList { selectors }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = text.len() - e.input.len();
            Err(format!("unexpected input at offset {}: {:?}", offset, e.input))
        }
        Err(nom::Err::Incomplete(_)) => Err("incomplete selector".into()),
    }
}
