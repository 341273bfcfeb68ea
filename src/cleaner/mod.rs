//! Cleaner module
//!
//! Parse the raw blob into records and drop the inactive ones.
//!
//! A record is dropped when its `active` field is falsy (`false`, `null`,
//! zero, or an empty string, array or object). Records without `active`
//! are kept, in their original order.

mod filter;

pub use filter::{clean_data, filter_active, CleanOutput, Cleaner};
