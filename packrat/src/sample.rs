//! # Sample tokenizer
//!
//! A small grammar splitting a chat message into identifiers and `{keyword}`s, separated by spacing.
//! It is built as plain data, the way any grammar is handed to the [runtime](crate::runtime).
//!
//! ```text
//! Sample "sample"         = vs:(Identifier / Keyword / Spacing)*
//! Keyword "keyword"       = "{" Spacing+ v:Identifier "}"
//!                         / "{" v:Identifier Spacing+ "}"
//!                         / "{" Spacing+ v:Identifier Spacing+ "}"
//!                         / "{" v:Identifier "}"
//! Punct "punct"           = [^a-zA-Z0-9{} ]+
//! Identifier "identifier" = Punct / [^{} \t\r\n]+
//! Spacing "spacing"       = Space+ / _+
//! Space "Space"           = " "
//! _ "whitespace"          = [\t\r\n]
//! ```

use crate::grammar::{ActionResult, CharClass, Expr, Grammar, Rule};
use crate::runtime::{parse, Current, Diagnostic, Diagnostics, Setting, Value};
use lazy_static::lazy_static;

/// Token extracted from a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Was the token wrapped in braces?
    pub is_keyword: bool,

    /// Token's text
    pub value: String,
}

impl Token {
    pub fn identifier(value: impl Into<String>) -> Self {
        Self {
            is_keyword: false,
            value: value.into(),
        }
    }

    pub fn keyword(value: impl Into<String>) -> Self {
        Self {
            is_keyword: true,
            value: value.into(),
        }
    }
}

lazy_static! {
    static ref SAMPLE_GRAMMAR: Grammar<Token> = sample_grammar();
}

/// Get the (shared) sample grammar
pub fn grammar() -> &'static Grammar<Token> {
    &SAMPLE_GRAMMAR
}

/// Build the sample grammar
pub fn sample_grammar() -> Grammar<Token> {
    Grammar::new(vec![
        Rule::new(
            "Sample",
            Expr::action(
                Expr::label(
                    "vs",
                    Expr::zero_or_more(Expr::choice(vec![
                        Expr::rule("Identifier"),
                        Expr::rule("Keyword"),
                        Expr::rule("Spacing"),
                    ])),
                ),
                on_sample,
            ),
        )
        .with_display_name("\"sample\""),
        Rule::new(
            "Keyword",
            Expr::choice(vec![
                keyword(vec![
                    Expr::lit("{"),
                    Expr::one_or_more(Expr::rule("Spacing")),
                    Expr::label("v", Expr::rule("Identifier")),
                    Expr::lit("}"),
                ]),
                keyword(vec![
                    Expr::lit("{"),
                    Expr::label("v", Expr::rule("Identifier")),
                    Expr::one_or_more(Expr::rule("Spacing")),
                    Expr::lit("}"),
                ]),
                keyword(vec![
                    Expr::lit("{"),
                    Expr::one_or_more(Expr::rule("Spacing")),
                    Expr::label("v", Expr::rule("Identifier")),
                    Expr::one_or_more(Expr::rule("Spacing")),
                    Expr::lit("}"),
                ]),
                keyword(vec![
                    Expr::lit("{"),
                    Expr::label("v", Expr::rule("Identifier")),
                    Expr::lit("}"),
                ]),
            ]),
        )
        .with_display_name("\"keyword\""),
        Rule::new(
            "Punct",
            Expr::action(
                Expr::one_or_more(Expr::class(
                    CharClass::new()
                        .chars("{} ")
                        .range('a', 'z')
                        .range('A', 'Z')
                        .range('0', '9')
                        .inverted()
                        .with_display("[^a-zA-Z0-9{} ]"),
                )),
                on_text,
            ),
        )
        .with_display_name("\"punct\""),
        Rule::new(
            "Identifier",
            Expr::choice(vec![
                Expr::rule("Punct"),
                Expr::action(
                    Expr::one_or_more(Expr::class(CharClass::new().chars("{} \t\r\n").inverted())),
                    on_text,
                ),
            ]),
        )
        .with_display_name("\"identifier\""),
        Rule::new(
            "Spacing",
            Expr::choice(vec![
                Expr::one_or_more(Expr::rule("Space")),
                Expr::one_or_more(Expr::rule("_")),
            ]),
        )
        .with_display_name("\"spacing\""),
        Rule::new("Space", Expr::lit(" ")).with_display_name("\"Space\""),
        Rule::new("_", Expr::class(CharClass::new().chars("\t\r\n"))).with_display_name("\"whitespace\""),
    ])
}

/// A brace-delimited keyword variant, producing a keyword token from the `v` label
fn keyword(exprs: Vec<Expr<Token>>) -> Expr<Token> {
    Expr::action(Expr::seq(exprs), on_keyword)
}

/// Keep the tokens of a sample, dropping spacing
fn on_sample<'i>(c: &mut Current<'_, 'i, Token>) -> ActionResult<'i, Token> {
    let values = c.label("vs").and_then(Value::as_list).unwrap_or_default();

    if values.is_empty() {
        return Err("empty sample".into());
    }

    Ok(Value::List(
        values
            .iter()
            .filter(|value| matches!(value, Value::Node(_)))
            .cloned()
            .collect(),
    ))
}

fn on_keyword<'i>(c: &mut Current<'_, 'i, Token>) -> ActionResult<'i, Token> {
    match c.label("v").and_then(Value::as_node) {
        Some(token) => Ok(Value::Node(Token::keyword(token.value.clone()))),
        None => Err("keyword without identifier".into()),
    }
}

fn on_text<'i>(c: &mut Current<'_, 'i, Token>) -> ActionResult<'i, Token> {
    Ok(Value::Node(Token::identifier(String::from_utf8_lossy(c.text))))
}

/// Extract the tokens of a sample
///
/// Diagnostics are prefixed with the sample's name (`sample#<id>`) only.
pub fn parse_sample(sample_id: usize, sample: &[u8]) -> Result<Vec<Token>, Diagnostics> {
    parse_sample_with(sample_id, sample, vec![])
}

/// Same as [`parse_sample`], with custom settings
pub fn parse_sample_with(
    sample_id: usize,
    sample: &[u8],
    settings: impl IntoIterator<Item = Setting>,
) -> Result<Vec<Token>, Diagnostics> {
    let name = format!("sample#{}", sample_id);
    let parsed = parse(grammar(), &name, sample, settings);

    if !parsed.diagnostics.is_empty() {
        let mut diagnostics = Diagnostics::new();

        for diagnostic in parsed.diagnostics {
            diagnostics.push(Diagnostic {
                prefix: name.clone(),
                ..diagnostic
            });
        }

        return Err(diagnostics);
    }

    Ok(parsed
        .value
        .and_then(Value::into_list)
        .unwrap_or_default()
        .into_iter()
        .filter_map(Value::into_node)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_keywords_and_identifiers() {
        assert_eq!(
            parse_sample(1, b"{ hello } world").unwrap(),
            vec![Token::keyword("hello"), Token::identifier("world")]
        );
    }

    #[test]
    fn punctuation_is_an_identifier() {
        assert_eq!(
            parse_sample(2, b"?! ok").unwrap(),
            vec![Token::identifier("?!"), Token::identifier("ok")]
        );
    }

    #[test]
    fn empty_samples_are_rejected() {
        let err = parse_sample(3, b"").unwrap_err();
        assert_eq!(err.to_string(), "sample#3: empty sample");
    }
}
