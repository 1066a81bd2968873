//! # Runtime engine
//!
//! This module contains the packrat [parser](executor::Parser) running [grammars](crate::grammar::Grammar) against
//! byte inputs, along with the values it produces and the diagnostics it reports.

mod cursor;
mod data;
mod errors;
mod executor;
mod memo;
mod options;
mod readers;
mod tracker;
mod vstack;

pub use cursor::*;
pub use data::*;
pub use errors::*;
pub use executor::*;
pub use memo::*;
pub use options::*;
pub use readers::*;
pub use tracker::*;
pub use vstack::*;
