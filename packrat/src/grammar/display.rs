//! Rendering of grammars in PEG notation
//!
//! Useful to inspect a grammar built as data. Actions and predicates are rendered as opaque code blocks.

use super::{Expr, Grammar, Rule};
use std::fmt;

impl<T> fmt::Display for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, rule) in self.rules().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            write!(f, "{}", rule)?;
        }

        Ok(())
    }
}

impl<T> fmt::Display for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.display_name().is_empty() {
            write!(f, "{} = {}", self.name(), self.expr())
        } else {
            write!(f, "{} {} = {}", self.name(), self.display_name(), self.expr())
        }
    }
}

impl<T> fmt::Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal { text, ignore_case } => {
                write!(f, "{:?}{}", text, if *ignore_case { "i" } else { "" })
            }
            Expr::CharClass(class) => write!(f, "{}", class.display()),
            Expr::Any => write!(f, "."),
            Expr::Sequence(exprs) => {
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }

                    // Unions need to be grouped to keep their precedence
                    if matches!(expr, Expr::Choice(_) | Expr::Action { .. }) {
                        write!(f, "({})", expr)?;
                    } else {
                        write!(f, "{}", expr)?;
                    }
                }

                Ok(())
            }
            Expr::Choice(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " / ")?;
                    }

                    write!(f, "{}", alternative)?;
                }

                Ok(())
            }
            Expr::ZeroOrMore(expr) => write!(f, "{}*", Atom(expr)),
            Expr::OneOrMore(expr) => write!(f, "{}+", Atom(expr)),
            Expr::ZeroOrOne(expr) => write!(f, "{}?", Atom(expr)),
            Expr::And(expr) => write!(f, "&{}", Atom(expr)),
            Expr::Not(expr) => write!(f, "!{}", Atom(expr)),
            Expr::Labeled { label, expr } => write!(f, "{}:{}", label, Atom(expr)),
            Expr::RuleRef(name) => write!(f, "{}", name),
            Expr::Action { expr, .. } => write!(f, "{} {{ … }}", expr),
            Expr::AndCode(_) => write!(f, "&{{ … }}"),
            Expr::NotCode(_) => write!(f, "!{{ … }}"),
        }
    }
}

/// Expression rendered as a single term, grouped if necessary
struct Atom<'a, T>(&'a Expr<T>);

impl<'a, T> fmt::Display for Atom<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Expr::Sequence(_) | Expr::Choice(_) | Expr::Labeled { .. } | Expr::Action { .. } => {
                write!(f, "({})", self.0)
            }
            _ => write!(f, "{}", self.0),
        }
    }
}
