//! The `pest` grammar for machine descriptions. The derived `Rule` enum names the grammar
//! rules and is kept apart from the machine model's own `Rule`.

use pest_derive::Parser;

/// Derives a `pest::Parser` for the description grammar defined in `grammar.pest`.
#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct DescriptionParser;
