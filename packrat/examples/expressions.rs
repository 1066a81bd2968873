//! Evaluate arithmetic expressions given as arguments, showing how values flow from labels to actions

use packrat::grammar::{CharClass, Expr, Grammar, Rule};
use packrat::runtime::{parse, Current, Value};
use std::env;

type Res<'i> = packrat::grammar::ActionResult<'i, i64>;

fn number<'i>(c: &mut Current<'_, 'i, i64>) -> Res<'i> {
    Ok(Value::Node(c.text_str().unwrap_or_default().parse()?))
}

/// Fold `head (op tail)*` from the left
fn fold<'i>(c: &mut Current<'_, 'i, i64>) -> Res<'i> {
    let mut acc = c.label("head").and_then(Value::as_node).copied().unwrap_or_default();

    for pair in c.label("tail").and_then(Value::as_list).unwrap_or_default() {
        let (op, rhs) = match pair.as_list() {
            Some([op, rhs]) => (op.as_str(), rhs.as_node().copied().unwrap_or_default()),
            _ => return Err("malformed operation".into()),
        };

        acc = match op {
            Some("+") => acc + rhs,
            Some("-") => acc - rhs,
            Some("*") => acc * rhs,
            Some("/") if rhs == 0 => return Err("division by zero".into()),
            Some("/") => acc / rhs,
            _ => return Err("unknown operator".into()),
        };
    }

    Ok(Value::Node(acc))
}

fn grammar() -> Grammar<i64> {
    let binary = |operand: &str, ops: &str| {
        Expr::action(
            Expr::seq(vec![
                Expr::label("head", Expr::rule(operand)),
                Expr::label(
                    "tail",
                    Expr::zero_or_more(Expr::seq(vec![
                        Expr::class(CharClass::new().chars(ops)),
                        Expr::rule(operand),
                    ])),
                ),
            ]),
            fold,
        )
    };

    Grammar::new(vec![
        Rule::new(
            "Expr",
            Expr::action(
                Expr::seq(vec![Expr::label("sum", Expr::rule("Sum")), Expr::eof()]),
                |c| Ok(c.label("sum").cloned().unwrap_or_default()),
            ),
        ),
        Rule::new("Sum", binary("Product", "+-")),
        Rule::new("Product", binary("Term", "*/")),
        Rule::new(
            "Term",
            Expr::choice(vec![
                Expr::action(
                    Expr::seq(vec![Expr::lit("("), Expr::label("sum", Expr::rule("Sum")), Expr::lit(")")]),
                    |c| Ok(c.label("sum").cloned().unwrap_or_default()),
                ),
                Expr::rule("Number"),
            ]),
        ),
        Rule::new(
            "Number",
            Expr::action(
                Expr::one_or_more(Expr::class(CharClass::new().range('0', '9'))),
                number,
            ),
        )
        .with_display_name("\"number\""),
    ])
}

fn main() {
    let grammar = grammar();

    for arg in env::args().skip(1) {
        let parsed = parse(&grammar, "argument", arg.as_bytes(), vec![]);

        match parsed.into_result() {
            Ok(Value::Node(value)) => println!("{} = {}", arg, value),
            Ok(_) => println!("{} = ?", arg),
            Err(diagnostics) => eprintln!("{}", diagnostics),
        }
    }
}
