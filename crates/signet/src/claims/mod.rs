//! Registered-claim handling: generation at signing time, validation at
//! check time.
//!
//! Both sides are driven by the same [`ClaimsConfig`](crate::ClaimsConfig):
//! a claim the policy enables is stamped into every issued token and is
//! mandatory in every checked one.

mod checker;
mod generator;

pub use checker::ClaimsChecker;
pub use generator::ClaimsGenerator;
