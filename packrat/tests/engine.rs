//! Behavior of the packrat engine on small hand-built grammars

use packrat::grammar::{CharClass, Expr, Grammar, Rule};
use packrat::runtime::{parse, Current, ErrorKind, Setting, Value};
use rstest::rstest;
use std::panic::{self, AssertUnwindSafe};

fn single(expr: Expr<()>) -> Grammar<()> {
    Grammar::new(vec![Rule::new("main", expr)])
}

fn digits() -> CharClass {
    CharClass::new().range('0', '9')
}

#[test]
fn ordered_choice_keeps_the_first_match() {
    let grammar = single(Expr::choice(vec![Expr::lit("a"), Expr::lit("ab")]));

    let parsed = parse(&grammar, "input", b"ab", vec![]);
    assert_eq!(parsed.value, Some(Value::text(b"a")));
    assert!(parsed.diagnostics.is_empty());

    // The shorter alternative wins even if it prevents reaching the end of the input
    let grammar = single(Expr::seq(vec![
        Expr::choice(vec![Expr::lit("a"), Expr::lit("ab")]),
        Expr::eof(),
    ]));

    let parsed = parse(&grammar, "input", b"ab", vec![]);
    assert_eq!(parsed.value, None);
    assert_eq!(
        parsed.diagnostics.to_string(),
        "input:1:2 (1): no match found, expected: EOF"
    );
}

#[test]
fn lookaheads_consume_nothing() {
    let grammar = single(Expr::seq(vec![
        Expr::and(Expr::lit("ab")),
        Expr::lit("a"),
        Expr::not(Expr::lit("x")),
        Expr::lit("b"),
    ]));

    let parsed = parse(&grammar, "input", b"ab", vec![]);

    assert_eq!(
        parsed.value,
        Some(Value::List(vec![
            Value::Nil,
            Value::text(b"a"),
            Value::Nil,
            Value::text(b"b"),
        ]))
    );
}

#[rstest]
#[case::zero_or_more_empty(Expr::zero_or_more(Expr::lit("a")), b"", Some(Value::List(vec![])))]
#[case::zero_or_more_many(
    Expr::zero_or_more(Expr::lit("a")),
    b"aab",
    Some(Value::List(vec![Value::text(b"a"), Value::text(b"a")]))
)]
#[case::one_or_more_single(Expr::one_or_more(Expr::lit("a")), b"a", Some(Value::List(vec![Value::text(b"a")])))]
#[case::optional_missing(Expr::opt(Expr::lit("a")), b"b", None)]
#[case::optional_present(Expr::opt(Expr::lit("a")), b"a", Some(Value::text(b"a")))]
fn repetitions(#[case] expr: Expr<()>, #[case] input: &[u8], #[case] expected: Option<Value<'static, ()>>) {
    let grammar = single(expr);
    let parsed = parse(&grammar, "input", input, vec![]);

    assert_eq!(parsed.value, expected);
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn one_or_more_requires_a_match() {
    let grammar = single(Expr::one_or_more(Expr::lit("a")));
    let parsed = parse(&grammar, "input", b"", vec![]);

    assert_eq!(parsed.value, None);
    assert_eq!(
        parsed.diagnostics.to_string(),
        "input:1:1 (0): no match found, expected: \"a\""
    );
}

#[test]
fn empty_iterations_end_repetitions() {
    let grammar = single(Expr::zero_or_more(Expr::opt(Expr::lit("a"))));
    let parsed = parse(&grammar, "input", b"b", vec![]);

    assert_eq!(parsed.value, Some(Value::List(vec![Value::Nil])));
}

#[test]
fn lists_every_expectation() {
    let grammar = single(Expr::choice(vec![
        Expr::lit("b"),
        Expr::class(digits()),
        Expr::lit("a"),
    ]));

    let parsed = parse(&grammar, "input", b"x", vec![]);

    insta::assert_snapshot!(parsed.diagnostics.to_string(), @r###"input:1:1 (0): no match found, expected: "a", "b", or [0-9]"###);
}

#[test]
fn reports_the_farthest_failure() {
    let grammar = single(Expr::choice(vec![
        Expr::seq(vec![Expr::lit("a\n"), Expr::lit("b")]),
        Expr::lit("c"),
    ]));

    let parsed = parse(&grammar, "input", b"a\nc", vec![]);

    assert_eq!(parsed.diagnostics.len(), 1);

    let diagnostic = parsed.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind(), ErrorKind::Syntactic);
    assert_eq!(diagnostic.pos.line, 2);
    assert_eq!(diagnostic.pos.offset, 2);
    assert_eq!(
        diagnostic.to_string(),
        "input:2:1 (2): no match found, expected: \"b\""
    );
}

#[test]
fn case_insensitive_literals() {
    let grammar = single(Expr::lit_i("SELECT"));

    let parsed = parse(&grammar, "input", b"SeLeCt", vec![]);
    assert_eq!(parsed.value, Some(Value::text(b"SeLeCt")));

    let parsed = parse(&grammar, "input", b"selcet", vec![]);
    assert_eq!(
        parsed.diagnostics.to_string(),
        "input:1:1 (0): no match found, expected: \"select\"i"
    );
}

#[test]
fn inverted_classes_never_match_the_end() {
    let grammar = single(Expr::class(CharClass::new().chars("a").inverted()));

    let parsed = parse(&grammar, "input", b"b", vec![]);
    assert_eq!(parsed.value, Some(Value::text(b"b")));

    let parsed = parse(&grammar, "input", b"", vec![]);
    assert_eq!(
        parsed.diagnostics.to_string(),
        "input:1:1 (0): no match found, expected: [^a]"
    );
}

#[test]
fn undefined_rules_are_rejected_upfront() {
    let grammar: Grammar<()> = Grammar::new(vec![
        Rule::new("main", Expr::seq(vec![Expr::lit("a"), Expr::rule("Missing")])),
    ]);

    let parsed = parse(&grammar, "input", b"a", vec![]);

    assert_eq!(parsed.value, None);
    assert_eq!(parsed.expressions, 0);
    assert!(parsed.diagnostics.has_kind(ErrorKind::Structural));
    assert_eq!(
        parsed.diagnostics.to_string(),
        "input:1:0 (0): undefined rule: Missing"
    );
}

#[test]
fn empty_grammars_are_rejected() {
    let grammar: Grammar<()> = Grammar::new(vec![]);
    let parsed = parse(&grammar, "", b"", vec![]);

    assert_eq!(parsed.diagnostics.to_string(), "1:0 (0): grammar has no rule");
}

#[test]
fn expressions_ceiling_aborts_the_parse() {
    let grammar = single(Expr::one_or_more(Expr::lit("a")));

    let unbounded = parse(&grammar, "input", b"aaaa", vec![]);
    assert!(unbounded.is_clean());

    let max = unbounded.expressions;

    let bounded = parse(&grammar, "input", b"aaaa", vec![Setting::MaxExpressions(Some(max))]);
    assert!(bounded.is_clean());

    let exhausted = parse(&grammar, "input", b"aaaa", vec![Setting::MaxExpressions(Some(max - 1))]);
    assert_eq!(exhausted.value, None);
    assert_eq!(exhausted.diagnostics.len(), 1);
    assert!(exhausted.diagnostics.has_kind(ErrorKind::ResourceExhausted));
    assert!(exhausted
        .diagnostics
        .to_string()
        .ends_with("max number of expressions parsed"));
}

#[test]
fn action_errors_keep_the_match() {
    let grammar = single(Expr::seq(vec![
        Expr::action(Expr::lit("a"), |_| Err("bad a".into())),
        Expr::lit("b"),
    ]));

    let parsed = parse(&grammar, "input", b"ab", vec![]);

    assert_eq!(
        parsed.value,
        Some(Value::List(vec![Value::Nil, Value::text(b"b")]))
    );
    assert_eq!(parsed.diagnostics.to_string(), "input:1:1 (0): rule main: bad a");
    assert!(parsed.diagnostics.has_kind(ErrorKind::Semantic));
}

#[test]
fn actions_see_labels_and_text() {
    let grammar: Grammar<String> = Grammar::new(vec![Rule::new(
        "pair",
        Expr::action(
            Expr::seq(vec![
                Expr::label("left", Expr::class(digits())),
                Expr::lit("-"),
                Expr::label("right", Expr::class(digits())),
            ]),
            |c| {
                let left = c.label("left").and_then(Value::as_str).unwrap_or("?");
                let right = c.label("right").and_then(Value::as_str).unwrap_or("?");

                Ok(Value::Node(format!("{}{} ({:?})", right, left, c.text_str())))
            },
        ),
    )]);

    let parsed = parse(&grammar, "input", b"1-2", vec![]);

    assert_eq!(
        parsed.value,
        Some(Value::Node("21 (Some(\"1-2\"))".to_string()))
    );
}

#[test]
fn labels_are_scoped_to_their_alternative() {
    let grammar: Grammar<String> = Grammar::new(vec![Rule::new(
        "main",
        Expr::action(
            Expr::choice(vec![
                Expr::seq(vec![Expr::label("x", Expr::lit("a")), Expr::lit("!")]),
                Expr::lit("a?"),
            ]),
            |c| Ok(Value::Node(c.label_names().collect::<Vec<_>>().join(","))),
        ),
    )]);

    let parsed = parse(&grammar, "input", b"a?", vec![]);
    assert_eq!(parsed.value, Some(Value::Node(String::new())));
}

#[test]
fn predicates_read_the_global_store() {
    let grammar = single(Expr::seq(vec![
        Expr::and_code(|c| Ok(c.store.get::<bool>("enabled").copied().unwrap_or(false))),
        Expr::lit("x"),
    ]));

    let parsed = parse(&grammar, "input", b"x", vec![Setting::global("enabled", true)]);
    assert!(parsed.is_clean());

    let parsed = parse(&grammar, "input", b"x", vec![]);
    assert_eq!(parsed.value, None);
    assert!(parsed.diagnostics.has_kind(ErrorKind::Syntactic));
}

#[rstest]
#[case::and_code(Expr::and_code(|_| Err("cannot decide".into())))]
#[case::not_code(Expr::not_code(|_| Err("cannot decide".into())))]
fn failing_predicates_report_and_keep_the_match(#[case] predicate: Expr<()>) {
    let grammar = single(Expr::seq(vec![predicate, Expr::lit("x")]));

    let parsed = parse(&grammar, "input", b"x", vec![]);

    assert_eq!(
        parsed.value,
        Some(Value::List(vec![Value::Nil, Value::text(b"x")]))
    );
    assert_eq!(
        parsed.diagnostics.to_string(),
        "input:1:1 (0): rule main: cannot decide"
    );
}

#[test]
fn actions_share_the_global_store() {
    fn count(c: &Current<'_, '_, usize>) -> usize {
        c.store.get::<usize>("count").copied().unwrap_or(0)
    }

    let grammar: Grammar<usize> = Grammar::new(vec![Rule::new(
        "main",
        Expr::action(
            Expr::seq(vec![
                Expr::zero_or_more(Expr::action(Expr::any(), |c| {
                    let seen = count(c);
                    c.store.insert("count", seen + 1);
                    Ok(Value::Nil)
                })),
                Expr::eof(),
            ]),
            |c| Ok(Value::Node(count(c))),
        ),
    )]);

    let parsed = parse(&grammar, "input", b"abc", vec![Setting::global("count", 10usize)]);
    assert_eq!(parsed.value, Some(Value::Node(13)));
}

#[test]
fn invalid_encoding_is_reported() {
    let grammar = single(Expr::one_or_more(Expr::any()));
    let parsed = parse(&grammar, "input", b"a\xffb", vec![]);

    assert_eq!(
        parsed.value,
        Some(Value::List(vec![
            Value::text(b"a"),
            Value::text(b"\xff"),
            Value::text(b"b"),
        ]))
    );
    assert!(parsed.diagnostics.has_kind(ErrorKind::Encoding));
    assert_eq!(parsed.diagnostics.len(), 1);
}

#[test]
fn invalid_bytes_are_reported_once() {
    let grammar: Grammar<()> = Grammar::new(vec![
        Rule::new(
            "Start",
            Expr::choice(vec![
                Expr::seq(vec![Expr::rule("A"), Expr::lit("x")]),
                Expr::zero_or_more(Expr::any()),
            ]),
        ),
        Rule::new("A", Expr::seq(vec![Expr::any(), Expr::any()])),
    ]);

    for settings in [vec![], vec![Setting::Memoize(true)]] {
        let parsed = parse(&grammar, "in", b"a\xff", settings);

        assert_eq!(
            parsed.value,
            Some(Value::List(vec![Value::text(b"a"), Value::text(b"\xff")]))
        );
        assert_eq!(parsed.diagnostics.to_string(), "in:1:2 (1): rule A: invalid encoding");
    }
}

#[test]
fn inverted_classes_consume_invalid_bytes() {
    let grammar = single(Expr::one_or_more(Expr::class(CharClass::new().chars("a").inverted())));
    let parsed = parse(&grammar, "input", b"\xffb", vec![]);

    assert_eq!(
        parsed.value,
        Some(Value::List(vec![Value::text(b"\xff"), Value::text(b"b")]))
    );
    assert_eq!(parsed.diagnostics.to_string(), "input:1:1 (0): invalid encoding");
}

#[test]
fn panics_become_diagnostics() {
    let grammar = single(Expr::action(Expr::lit("a"), |_| panic!("boom")));

    let parsed = parse(&grammar, "input", b"a", vec![]);

    assert_eq!(parsed.value, None);
    assert_eq!(parsed.diagnostics.len(), 1);

    let diagnostic = parsed.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind(), ErrorKind::Fault);
    assert_eq!(diagnostic.message(), "boom");
}

#[test]
fn panics_propagate_without_recovery() {
    let grammar = single(Expr::action(Expr::lit("a"), |_| panic!("boom")));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        parse(&grammar, "input", b"a", vec![Setting::Recover(false)])
    }));

    assert!(result.is_err());
}

#[rstest]
#[case(b"ab")]
#[case(b"aab")]
#[case(b"b")]
#[case(b"")]
fn memoization_is_transparent(#[case] input: &[u8]) {
    let grammar: Grammar<()> = Grammar::new(vec![
        Rule::new(
            "main",
            Expr::choice(vec![
                Expr::seq(vec![Expr::rule("as"), Expr::lit("c")]),
                Expr::seq(vec![Expr::rule("as"), Expr::lit("b")]),
            ]),
        ),
        Rule::new("as", Expr::zero_or_more(Expr::lit("a"))),
    ]);

    let plain = parse(&grammar, "input", input, vec![]);
    let memoized = parse(&grammar, "input", input, vec![Setting::Memoize(true)]);

    assert_eq!(plain.value, memoized.value);
    assert_eq!(plain.diagnostics, memoized.diagnostics);
    assert!(memoized.expressions <= plain.expressions);
}

#[test]
fn memoization_keeps_failures_seen_outside_lookaheads() {
    let grammar: Grammar<()> = Grammar::new(vec![
        Rule::new(
            "Start",
            Expr::choice(vec![
                Expr::seq(vec![Expr::not(Expr::rule("R")), Expr::lit("x")]),
                Expr::seq(vec![Expr::rule("R"), Expr::lit("y")]),
            ]),
        ),
        Rule::new("R", Expr::lit("ab")),
    ]);

    for settings in [vec![], vec![Setting::Memoize(true)]] {
        let parsed = parse(&grammar, "input", b"ac", settings);

        assert_eq!(
            parsed.diagnostics.to_string(),
            "input:1:1 (0): no match found, expected: \"ab\" or \"x\""
        );
    }
}

#[test]
fn memoized_actions_see_their_own_labels() {
    let grammar: Grammar<()> = Grammar::new(vec![
        Rule::new(
            "Start",
            Expr::choice(vec![
                Expr::seq(vec![Expr::rule("R"), Expr::lit("!")]),
                Expr::seq(vec![Expr::lit("a"), Expr::rule("R")]),
            ]),
        ),
        Rule::new(
            "R",
            Expr::seq(vec![
                Expr::label("x", Expr::one_or_more(Expr::lit("a"))),
                Expr::action(Expr::lit("b"), |c| Ok(c.label("x").cloned().unwrap_or_default())),
            ]),
        ),
    ]);

    let a = || Value::List(vec![Value::text(b"a")]);
    let expected = Value::List(vec![Value::text(b"a"), Value::List(vec![a(), a()])]);

    let plain = parse(&grammar, "input", b"aab", vec![]);
    let memoized = parse(&grammar, "input", b"aab", vec![Setting::Memoize(true)]);

    assert_eq!(plain.value, Some(expected));
    assert_eq!(plain.value, memoized.value);
    assert!(memoized.diagnostics.is_empty());
}

#[test]
fn tracing_does_not_change_the_outcome() {
    let _ = env_logger::builder().is_test(true).try_init();

    let grammar = single(Expr::seq(vec![Expr::lit("a"), Expr::not(Expr::any())]));

    let quiet = parse(&grammar, "input", b"ab", vec![]);
    let traced = parse(&grammar, "input", b"ab", vec![Setting::Debug(true)]);

    assert_eq!(quiet, traced);
}
