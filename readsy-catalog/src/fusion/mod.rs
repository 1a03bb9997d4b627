//! Fusion: source records → canonical record → catalog identity
//!
//! - [`merger`]: field-level merge of the OpenLibrary and Google records
//! - [`identity_resolver`]: author resolution and duplicate/translation checks

pub mod identity_resolver;
pub mod merger;

pub use identity_resolver::{IdentityResolver, Resolution};
pub use merger::{merge, normalize};
