//! CSS selector subset parser and matcher
//!
//! Parses selector lists into a small AST and matches them against
//! [`Document`] elements.
//!
//! # Error Handling
//!
//! Parsing uses nom's context-based error capture. A failed parse yields a
//! [`SelectorError`] carrying the column, the offending fragment and the
//! context stack, so callers can decide whether to report or recover.
//!
//! # Supported Syntax
//!
//! - Type and universal selectors: `input`, `*`
//! - ID and class selectors: `#email`, `.field`
//! - Attribute selectors: `[name]`, `[type=text]`, `[type="text"]`, `[type='text']`
//! - Attribute operators: `~=`, `|=`, `^=`, `$=`, `*=`
//! - Negation: `:not(selector-list)`
//! - Combinators: descendant (`form input`) and child (`form > input`)
//! - Selector lists: `input, textarea`
//!
//! Other pseudo-classes, pseudo-elements and the sibling combinators are
//! rejected.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, cut, map, opt},
    error::{context, ErrorKind, ParseError as NomParseError, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
    Finish, IResult,
};
use smallvec::SmallVec;
use thiserror::Error;

use crate::document::{Document, NodeId};

/// Custom parser result type using VerboseError for better diagnostics
type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Error produced when a selector string is not valid syntax
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid selector `{selector}` at column {column}: {message}")]
pub struct SelectorError {
    /// The full selector string that failed to parse
    pub selector: String,
    /// Human-readable error message with context
    pub message: String,
    /// Column number (1-indexed)
    pub column: usize,
    /// The input fragment where parsing failed
    pub fragment: String,
    /// Context stack from nom's VerboseError, innermost first
    pub contexts: Vec<String>,
}

impl SelectorError {
    fn from_verbose(input: &str, err: VerboseError<&str>) -> Self {
        let fragment = err.errors.first().map(|(frag, _)| *frag).unwrap_or(input);
        let offset = input.len().saturating_sub(fragment.len());
        let column = input[..offset].chars().count() + 1;

        let contexts = err
            .errors
            .iter()
            .filter_map(|(_, kind)| match kind {
                VerboseErrorKind::Context(ctx) => Some((*ctx).to_string()),
                _ => None,
            })
            .collect::<Vec<_>>();

        let message = match err.errors.first().map(|(_, kind)| kind) {
            Some(VerboseErrorKind::Char(c)) => format!("expected '{}'", c),
            Some(VerboseErrorKind::Nom(ErrorKind::Eof)) => "unexpected trailing input".to_string(),
            Some(VerboseErrorKind::Nom(kind)) => match contexts.first() {
                Some(ctx) => format!("expected {}", ctx),
                None => format!("parse error ({:?})", kind),
            },
            Some(VerboseErrorKind::Context(ctx)) => format!("expected {}", ctx),
            None => "parse error".to_string(),
        };

        Self {
            selector: input.to_string(),
            message,
            column,
            fragment: fragment.chars().take(30).collect(),
            contexts,
        }
    }
}

/// A comma-separated list of complex selectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: SmallVec<[ComplexSelector; 2]>,
}

/// Compound selectors joined by combinators, stored left to right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    compounds: SmallVec<[CompoundSelector; 2]>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: SmallVec<[Combinator; 1]>,
}

/// Relationship between two adjacent compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
}

/// A sequence of simple selectors that all apply to one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    parts: SmallVec<[SimpleSelector; 2]>,
}

/// A single selector component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    /// Tag name, stored lowercase
    Type(String),
    Id(String),
    Class(String),
    Attribute {
        /// Attribute name, stored lowercase
        name: String,
        test: AttributeTest,
    },
    /// `:not(..)`, matches when none of the inner selectors do
    Not(Box<SelectorList>),
}

/// How an attribute selector compares the attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeTest {
    /// `[name]`
    Exists,
    /// `[name=value]`
    Equals(String),
    /// `[name~=value]`, one of the whitespace-separated words
    Includes(String),
    /// `[name|=value]`, exactly `value` or starting with `value-`
    DashMatch(String),
    /// `[name^=value]`
    Prefix(String),
    /// `[name$=value]`
    Suffix(String),
    /// `[name*=value]`
    Substring(String),
}

impl AttributeTest {
    fn new(operator: &str, value: &str) -> Self {
        let value = value.to_string();
        match operator {
            "~=" => AttributeTest::Includes(value),
            "|=" => AttributeTest::DashMatch(value),
            "^=" => AttributeTest::Prefix(value),
            "$=" => AttributeTest::Suffix(value),
            "*=" => AttributeTest::Substring(value),
            _ => AttributeTest::Equals(value),
        }
    }

    /// Whether an attribute with value `actual` passes
    ///
    /// Empty operands never match for the word and substring operators.
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            AttributeTest::Exists => true,
            AttributeTest::Equals(expected) => actual == expected.as_str(),
            AttributeTest::Includes(word) => {
                !word.is_empty()
                    && !word.contains(char::is_whitespace)
                    && actual.split_ascii_whitespace().any(|w| w == word.as_str())
            }
            AttributeTest::DashMatch(expected) => {
                actual == expected.as_str()
                    || actual
                        .strip_prefix(expected.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeTest::Prefix(prefix) => {
                !prefix.is_empty() && actual.starts_with(prefix.as_str())
            }
            AttributeTest::Suffix(suffix) => {
                !suffix.is_empty() && actual.ends_with(suffix.as_str())
            }
            AttributeTest::Substring(part) => !part.is_empty() && actual.contains(part.as_str()),
        }
    }
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        match all_consuming(selector_list)(input).finish() {
            Ok((_, list)) => Ok(list),
            Err(err) => {
                tracing::trace!("selector parse failed for {:?}: {:?}", input, err);
                Err(SelectorError::from_verbose(input, err))
            }
        }
    }

    /// The complex selectors in this list
    pub fn selectors(&self) -> &[ComplexSelector] {
        &self.selectors
    }

    /// Whether any selector in the list matches `node`
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.selectors.iter().any(|sel| sel.matches(doc, node))
    }
}

impl ComplexSelector {
    /// The compound selectors, left to right
    pub fn compounds(&self) -> &[CompoundSelector] {
        &self.compounds
    }

    /// The combinators between compounds, left to right
    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    /// Match right-to-left: the subject is the last compound
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(subject) = self.compounds.last() else {
            return false;
        };
        subject.matches(doc, node) && self.matches_ancestry(doc, node, self.compounds.len() - 1)
    }

    /// `node` matched `compounds[index]`; check everything to its left
    fn matches_ancestry(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        if index == 0 {
            return true;
        }
        let wanted = &self.compounds[index - 1];
        match self.combinators[index - 1] {
            Combinator::Child => doc.parent(node).is_some_and(|parent| {
                wanted.matches(doc, parent) && self.matches_ancestry(doc, parent, index - 1)
            }),
            Combinator::Descendant => {
                let mut current = doc.parent(node);
                while let Some(ancestor) = current {
                    if wanted.matches(doc, ancestor)
                        && self.matches_ancestry(doc, ancestor, index - 1)
                    {
                        return true;
                    }
                    current = doc.parent(ancestor);
                }
                false
            }
        }
    }
}

impl CompoundSelector {
    pub fn parts(&self) -> &[SimpleSelector] {
        &self.parts
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };
        self.parts.iter().all(|part| match part {
            SimpleSelector::Universal => true,
            SimpleSelector::Type(tag) => element.tag_name() == tag.as_str(),
            SimpleSelector::Id(id) => element.id() == Some(id.as_str()),
            SimpleSelector::Class(class) => element.has_class(class),
            SimpleSelector::Attribute { name, test } => element
                .attribute(name)
                .is_some_and(|actual| test.matches(actual)),
            SimpleSelector::Not(inner) => !inner.matches(doc, node),
        })
    }
}

// ============================================================================
// Nom Parsers with VerboseError for diagnostics
// ============================================================================

/// Parse an identifier (alphanumeric, hyphen, underscore)
fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

/// Parse a type selector: `input`
fn type_selector(input: &str) -> ParseResult<SimpleSelector> {
    map(identifier, |tag: &str| {
        SimpleSelector::Type(tag.to_ascii_lowercase())
    })(input)
}

/// Parse an ID selector: `#identifier`
fn id_selector(input: &str) -> ParseResult<SimpleSelector> {
    context(
        "ID selector",
        map(preceded(char('#'), cut(identifier)), |id: &str| {
            SimpleSelector::Id(id.to_string())
        }),
    )(input)
}

/// Parse a class selector: `.identifier`
fn class_selector(input: &str) -> ParseResult<SimpleSelector> {
    context(
        "class selector",
        map(preceded(char('.'), cut(identifier)), |class: &str| {
            SimpleSelector::Class(class.to_string())
        }),
    )(input)
}

/// Parse a quoted or bare attribute value
fn attribute_value(input: &str) -> ParseResult<&str> {
    context(
        "attribute value",
        alt((
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
            identifier,
        )),
    )(input)
}

/// Parse an attribute operator: `=`, `~=`, `|=`, `^=`, `$=` or `*=`
fn attribute_operator(input: &str) -> ParseResult<&str> {
    context(
        "attribute operator",
        alt((tag("="), tag("~="), tag("|="), tag("^="), tag("$="), tag("*="))),
    )(input)
}

/// Parse an attribute selector: `[name]` or `[name<op>value]`
fn attribute_selector(input: &str) -> ParseResult<SimpleSelector> {
    context(
        "attribute selector",
        preceded(char('['), cut(attribute_body)),
    )(input)
}

/// Parse the inside of an attribute selector, through the closing bracket
fn attribute_body(input: &str) -> ParseResult<SimpleSelector> {
    let (input, _) = multispace0(input)?;
    let (input, name) = context("attribute name", identifier)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, operand) = opt(pair(
        attribute_operator,
        preceded(multispace0, attribute_value),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = context("closing bracket", char(']'))(input)?;

    let test = match operand {
        Some((operator, value)) => AttributeTest::new(operator, value),
        None => AttributeTest::Exists,
    };
    Ok((
        input,
        SimpleSelector::Attribute {
            name: name.to_ascii_lowercase(),
            test,
        },
    ))
}

/// Parse a pseudo-class; only `:not(selector-list)` is supported
fn pseudo_class(input: &str) -> ParseResult<SimpleSelector> {
    let (rest, _) = char(':')(input)?;
    let (rest, name) = cut(context("pseudo-class name", identifier))(rest)?;
    if !name.eq_ignore_ascii_case("not") {
        return Err(nom::Err::Failure(VerboseError {
            errors: vec![
                (input, VerboseErrorKind::Nom(ErrorKind::Tag)),
                (input, VerboseErrorKind::Context("supported pseudo-class")),
            ],
        }));
    }
    let (rest, inner) = context(
        "negation",
        cut(delimited(char('('), selector_list, char(')'))),
    )(rest)?;
    Ok((rest, SimpleSelector::Not(Box::new(inner))))
}

/// Parse a compound selector: `input.field[type=text]`
fn compound_selector(input: &str) -> ParseResult<CompoundSelector> {
    context("compound selector", compound_parts)(input)
}

fn compound_parts(start: &str) -> ParseResult<CompoundSelector> {
    let (input, head) = opt(alt((
        map(char('*'), |_| SimpleSelector::Universal),
        type_selector,
    )))(start)?;
    let (input, rest) = many0(alt((
        id_selector,
        class_selector,
        attribute_selector,
        pseudo_class,
    )))(input)?;

    let mut parts: SmallVec<[SimpleSelector; 2]> = head.into_iter().collect();
    parts.extend(rest);
    if parts.is_empty() {
        return Err(nom::Err::Error(VerboseError::from_error_kind(
            start,
            ErrorKind::Verify,
        )));
    }
    Ok((input, CompoundSelector { parts }))
}

/// Parse a complex selector: compounds joined by ` ` or `>`
fn complex_selector(input: &str) -> ParseResult<ComplexSelector> {
    let (mut input, first) = compound_selector(input)?;
    let mut compounds: SmallVec<[CompoundSelector; 2]> = SmallVec::new();
    let mut combinators: SmallVec<[Combinator; 1]> = SmallVec::new();
    compounds.push(first);

    loop {
        let (after_ws, _) = multispace0(input)?;

        if let Ok((rest, _)) = char::<&str, VerboseError<&str>>('>')(after_ws) {
            let (rest, _) = multispace0(rest)?;
            let (rest, compound) =
                context("selector after '>'", cut(compound_selector))(rest)?;
            combinators.push(Combinator::Child);
            compounds.push(compound);
            input = rest;
            continue;
        }

        if after_ws.len() == input.len() {
            break;
        }
        match compound_selector(after_ws) {
            Ok((rest, compound)) => {
                combinators.push(Combinator::Descendant);
                compounds.push(compound);
                input = rest;
            }
            Err(nom::Err::Error(_)) => break,
            Err(err) => return Err(err),
        }
    }

    Ok((
        input,
        ComplexSelector {
            compounds,
            combinators,
        },
    ))
}

/// Parse a selector list: `a, b > c`
fn selector_list(input: &str) -> ParseResult<SelectorList> {
    let (input, _) = multispace0(input)?;
    let (input, selectors) = separated_list1(
        delimited(multispace0, char(','), multispace0),
        complex_selector,
    )(input)?;
    let (input, _) = multispace0(input)?;
    Ok((
        input,
        SelectorList {
            selectors: selectors.into_iter().collect(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with_fields() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let form = doc.create_element("form");
        doc.add_class(form, "login");
        let input = doc.create_element("input");
        doc.set_attribute(input, "type", "text");
        doc.set_id(input, "user");
        let area = doc.create_element("textarea");
        doc.add_class(area, "notes");
        doc.append_child(root, form);
        doc.append_child(form, input);
        doc.append_child(form, area);
        (doc, form, input, area)
    }

    #[test]
    fn test_parse_default_list() {
        let list = SelectorList::parse("input, textarea").unwrap();
        assert_eq!(list.selectors().len(), 2);
        assert_eq!(
            list.selectors()[0].compounds()[0].parts(),
            &[SimpleSelector::Type("input".to_string())]
        );
    }

    #[test]
    fn test_parse_compound_and_combinators() {
        let list = SelectorList::parse("form.login > input[type=\"text\"]#user  .x").unwrap();
        let complex = &list.selectors()[0];
        assert_eq!(complex.compounds().len(), 3);
        assert_eq!(
            complex.combinators(),
            &[Combinator::Child, Combinator::Descendant]
        );
        assert_eq!(complex.compounds()[1].parts().len(), 3);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(SelectorList::parse("  input ,\n textarea  ").is_ok());
    }

    #[test]
    fn test_unbalanced_bracket_is_error() {
        let err = SelectorList::parse("input[type=text").unwrap_err();
        assert_eq!(err.selector, "input[type=text");
        assert!(err.column > 1);
        assert!(err.contexts.iter().any(|c| c == "attribute selector"));
    }

    #[test]
    fn test_invalid_inputs() {
        for input in ["", "   ", "input,", ">input", "input >", "#", ".", "a:hover", "a + b", "[=x]"] {
            assert!(SelectorList::parse(input).is_err(), "expected error for {:?}", input);
        }
    }

    #[test]
    fn test_error_column_points_at_fragment() {
        let err = SelectorList::parse("input:focus").unwrap_err();
        assert_eq!(err.column, 6);
        assert!(err.fragment.starts_with(":focus"));
    }

    #[test]
    fn test_match_type_and_list() {
        let (doc, form, input, area) = form_with_fields();
        let list = SelectorList::parse("input, textarea").unwrap();
        assert!(list.matches(&doc, input));
        assert!(list.matches(&doc, area));
        assert!(!list.matches(&doc, form));
    }

    #[test]
    fn test_match_type_is_case_insensitive() {
        let (doc, _, input, _) = form_with_fields();
        assert!(SelectorList::parse("INPUT").unwrap().matches(&doc, input));
    }

    #[test]
    fn test_match_id_class_attribute() {
        let (doc, _, input, area) = form_with_fields();
        assert!(SelectorList::parse("#user").unwrap().matches(&doc, input));
        assert!(SelectorList::parse(".notes").unwrap().matches(&doc, area));
        assert!(SelectorList::parse("[type]").unwrap().matches(&doc, input));
        assert!(SelectorList::parse("[type='text']").unwrap().matches(&doc, input));
        assert!(!SelectorList::parse("[type=password]").unwrap().matches(&doc, input));
        assert!(!SelectorList::parse("[type]").unwrap().matches(&doc, area));
    }

    #[test]
    fn test_unsupported_pseudo_class_error() {
        let err = SelectorList::parse("input:focus").unwrap_err();
        assert_eq!(err.message, "expected supported pseudo-class");
        assert!(SelectorList::parse("input:not()").is_err());
        assert!(SelectorList::parse("input:not(a").is_err());
    }

    #[test]
    fn test_match_attribute_operators() {
        let mut doc = Document::new();
        let root = doc.root();
        let input = doc.create_element("input");
        doc.set_attribute(input, "name", "user-email");
        doc.set_attribute(input, "data-tags", "primary  login");
        doc.append_child(root, input);

        let hit = |sel: &str| SelectorList::parse(sel).unwrap().matches(&doc, input);
        assert!(hit("[name^=user]"));
        assert!(hit("[name$='email']"));
        assert!(hit("[name*=r-e]"));
        assert!(hit("[name|=user]"));
        assert!(hit("[data-tags~=login]"));
        assert!(!hit("[name|=use]"));
        assert!(!hit("[data-tags~=log]"));
        assert!(!hit("[name^='']"));
        assert!(!hit("[missing^=u]"));
    }

    #[test]
    fn test_match_negation() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = doc.create_element("form");
        let hidden = doc.create_element("input");
        doc.set_attribute(hidden, "type", "hidden");
        let text = doc.create_element("input");
        doc.append_child(root, form);
        doc.append_child(form, hidden);
        doc.append_child(form, text);

        let list = SelectorList::parse("input:not([type=hidden])").unwrap();
        assert!(!list.matches(&doc, hidden));
        assert!(list.matches(&doc, text));
        assert_eq!(doc.query_selector(form, "input:NOT([type=hidden], .x)"), Ok(Some(text)));
        assert!(!SelectorList::parse(":not(form) > input").unwrap().matches(&doc, text));
    }

    #[test]
    fn test_match_combinators() {
        let (mut doc, form, input, _) = form_with_fields();
        let wrapper = doc.create_element("div");
        let nested = doc.create_element("input");
        doc.append_child(form, wrapper);
        doc.append_child(wrapper, nested);

        let child = SelectorList::parse("form > input").unwrap();
        assert!(child.matches(&doc, input));
        assert!(!child.matches(&doc, nested));

        let descendant = SelectorList::parse(".login input").unwrap();
        assert!(descendant.matches(&doc, input));
        assert!(descendant.matches(&doc, nested));

        let chained = SelectorList::parse("form div > input").unwrap();
        assert!(chained.matches(&doc, nested));
        assert!(!chained.matches(&doc, input));
    }
}
