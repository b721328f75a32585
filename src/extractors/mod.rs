//! HTML extraction modules
//!
//! `css_extractor` holds element-level selector helpers; `schema_extractor`
//! turns a whole document into records.

mod css_extractor;
mod schema_extractor;

pub use css_extractor::*;
pub use schema_extractor::*;
