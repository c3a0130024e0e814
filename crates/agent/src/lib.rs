//! Advisor runtime and optional prose personalization.
//!
//! The rule-based report from `garden_core` is always produced first. A
//! generative provider may then rewrite the summary, the mid-report quote, and
//! point reasoning; it never changes actions, sections, or tags, and any failure
//! leaves the rule report as it was.
//!
//! # Key Types
//!
//! - `AdvisorRuntime` - request in, assembled report out (see `runtime`)
//! - `PersonalizationProvider` - pluggable text generator (`gemini`, or disabled)
//! - `ProseGuard` - rejects prose naming items the player did not pick

pub mod gemini;
pub mod guardrails;
pub mod llm;
pub mod personalize;
pub mod prompt;
pub mod runtime;
