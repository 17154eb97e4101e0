//! Health assistant glue.
//!
//! This crate builds prompts for the nutrition assistant, hands them to a
//! [`CompletionSource`], and turns meal plan replies into
//! [`healthroute_core::models::WeekPlan`]s.

pub mod assistant;
pub mod completion;
pub mod prompts;

pub use assistant::*;
pub use completion::*;
pub use prompts::*;
