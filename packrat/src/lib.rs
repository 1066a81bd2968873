//! # Packrat
//!
//! Packrat is a small PEG execution engine. Grammars are not written as text: they are built as [data](`grammar`)
//! (rules made of expressions, with semantic actions as plain closures) and then [run](`runtime::parse`) against inputs.
//!
//! Evaluations can be memoized by input offset and grammar node (see [`Setting::Memoize`](`runtime::Setting::Memoize`)),
//! which gives linear-time parsing at the cost of memory. Memoization is disabled by default.
//! Failures are tracked at the farthest offset reached, to report what the grammar expected there.
//!
//! Matched text is never copied: values borrow from the input until they are explicitly [detached](`runtime::Value::into_owned`).
//!
//! ## Usage
//!
//! ```rust
//! use packrat::grammar::{CharClass, Expr, Grammar, Rule};
//! use packrat::runtime::{parse, Value};
//!
//! // 1. Define the grammar
//! let grammar: Grammar<u64> = Grammar::new(vec![
//!     Rule::new(
//!         "number",
//!         Expr::action(
//!             Expr::seq(vec![Expr::one_or_more(Expr::class(CharClass::new().range('0', '9'))), Expr::eof()]),
//!             |c| Ok(Value::Node(c.text_str().unwrap_or("0").parse::<u64>()?)),
//!         ),
//!     )
//!     .with_display_name("\"number\""),
//! ]);
//!
//! // 2. Run it
//! let parsed = parse(&grammar, "input", b"1234", vec![]);
//! assert_eq!(parsed.value, Some(Value::Node(1234)));
//!
//! // 3. Or look at what went wrong
//! let parsed = parse(&grammar, "input", b"12a", vec![]);
//! assert_eq!(
//!     parsed.diagnostics.to_string(),
//!     "input:1:3 (2): no match found, expected: [0-9] or EOF"
//! );
//! ```

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]

pub mod grammar;
pub mod runtime;
pub mod sample;
