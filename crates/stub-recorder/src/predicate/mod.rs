//! Predicate library for matching recorded requests.
//!
//! Predicates are small tagged values rather than closures, so they can be
//! evaluated, compared, described in failure messages and loaded from
//! configuration files.
//!
//! # Module Structure
//!
//! - `request` - The `RequestPredicate` enum and its constructors
//! - `evaluate` - Conjunctive evaluation against one request or a whole log

mod evaluate;
mod request;

pub use evaluate::{evaluate, find_in, unmatched_in};
pub use request::RequestPredicate;
