// crates/gateflag-expr-dsl/src/lib.rs
// ============================================================================
// Module: Gateflag Expression DSL
// Description: Public API surface for the textual expression authoring
//              language.
// Purpose: Let operators write `property("plan") == "pro" && property("age")
//          >= 21` instead of building `Expression` trees by hand.
// Dependencies: crate::dsl
// ============================================================================

//! ## Overview
//! This crate turns a small infix DSL into a [`gateflag_core::Expression`]
//! tree. It has no runtime dependency on an adapter or a feature; it is a
//! pure text-to-tree compiler, consulted by admin tooling that wants to
//! accept rule text from a human.

pub mod dsl;

pub use dsl::parse;
pub use dsl::DslError;
