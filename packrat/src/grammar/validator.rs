use super::{Expr, Grammar};
use crate::runtime::ParseError;
use std::collections::HashSet;

/// Validate a grammar before running it
///
/// Checks the grammar has at least one rule, and that every rule reference has a name and points to a declared rule.
/// The first problem found is returned.
pub fn validate_grammar<T>(grammar: &Grammar<T>) -> Result<(), ParseError> {
    if grammar.rules().is_empty() {
        return Err(ParseError::NoRule);
    }

    // List declared rules
    let declared: HashSet<&str> = grammar.rules().iter().map(|rule| rule.name()).collect();

    // Validate each rule one by one
    for rule in grammar.rules() {
        validate_expr_recursive(&declared, rule.expr())?;
    }

    Ok(())
}

/// Validate an [`Expr`] recursively
fn validate_expr_recursive<T>(declared: &HashSet<&str>, expr: &Expr<T>) -> Result<(), ParseError> {
    match expr {
        // Matchers and predicates don't need any validation
        Expr::Literal { .. } | Expr::CharClass(_) | Expr::Any | Expr::AndCode(_) | Expr::NotCode(_) => Ok(()),

        // For references, ensure the target exists
        Expr::RuleRef(name) if name.is_empty() => Err(ParseError::MissingRuleName),
        Expr::RuleRef(name) if declared.contains(name.as_str()) => Ok(()),
        Expr::RuleRef(name) => Err(ParseError::UndefinedRule(name.clone())),

        // Develop sequences and choices
        Expr::Sequence(exprs) | Expr::Choice(exprs) => {
            for expr in exprs {
                validate_expr_recursive(declared, expr)?;
            }

            Ok(())
        }

        // Develop wrappers
        Expr::ZeroOrMore(expr)
        | Expr::OneOrMore(expr)
        | Expr::ZeroOrOne(expr)
        | Expr::And(expr)
        | Expr::Not(expr)
        | Expr::Labeled { expr, .. }
        | Expr::Action { expr, .. } => validate_expr_recursive(declared, expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;

    #[test]
    fn rejects_empty_grammars() {
        let grammar: Grammar<()> = Grammar::new(vec![]);
        assert_eq!(validate_grammar(&grammar), Err(ParseError::NoRule));
    }

    #[test]
    fn rejects_undefined_rules() {
        let grammar: Grammar<()> = Grammar::new(vec![
            Rule::new("main", Expr::seq(vec![Expr::rule("word"), Expr::opt(Expr::rule("Missing"))])),
            Rule::new("word", Expr::one_or_more(Expr::any())),
        ]);

        assert_eq!(
            validate_grammar(&grammar),
            Err(ParseError::UndefinedRule("Missing".to_string()))
        );
    }

    #[test]
    fn rejects_nameless_references() {
        let grammar: Grammar<()> = Grammar::new(vec![Rule::new("main", Expr::not(Expr::rule("")))]);
        assert_eq!(validate_grammar(&grammar), Err(ParseError::MissingRuleName));
    }

    #[test]
    fn accepts_recursive_grammars() {
        let grammar: Grammar<()> = Grammar::new(vec![Rule::new(
            "parens",
            Expr::opt(Expr::seq(vec![Expr::lit("("), Expr::rule("parens"), Expr::lit(")")])),
        )]);

        assert_eq!(validate_grammar(&grammar), Ok(()));
    }
}
