//! # Papers
//!
//! Discovery of recent arXiv papers and the keyword filter applied to them.
//!
//! - [`PaperSource`] is the discovery interface the rest of the workspace
//!   depends on; [`ArxivClient`] implements it over the arXiv Atom API.
//! - [`keyword_filter`] keeps papers whose title or abstract contains a
//!   phrase.
//! - [`category`] holds the category table offered to users.

pub mod arxiv;
pub mod category;
pub mod error;
pub mod filter;
pub mod model;
pub mod source;

pub use arxiv::{ArxivClient, DEFAULT_ARXIV_URL, parse_atom_feed, retain_recent};
pub use category::{ARXIV_CATEGORIES, Category, DEFAULT_CATEGORIES, find_category};
pub use error::{PaperError, Result};
pub use filter::keyword_filter;
pub use model::PaperRecord;
pub use source::PaperSource;
