//! Domain layer for the ABCI application.

pub mod commit_state;
pub mod errors;
pub mod policy;
pub mod verdict;

pub use commit_state::CommitState;
pub use errors::RejectReason;
pub use policy::QuotaPolicy;
pub use verdict::Verdict;
