/*!
 * Sampling Selector
 * Token table and runtime enablement decisions
 */

mod engine;
mod token;

pub use engine::SelectorEngine;
pub use token::{Token, TokenParseError};

pub(crate) use token::full_match_regex;
