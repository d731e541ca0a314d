//! Outcome of `check_tx` / `deliver_tx`.

use super::errors::RejectReason;

/// Accept or reject, as reported to the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Transaction is valid; `hint` goes into the response data.
    Accept {
        /// Order ID for orders, a short description otherwise.
        hint: String,
    },
    /// Transaction is invalid.
    Reject(RejectReason),
}

impl Verdict {
    /// Accept with a hint.
    pub fn accept(hint: impl Into<String>) -> Self {
        Verdict::Accept { hint: hint.into() }
    }

    /// Response code; 0 on accept.
    pub fn code(&self) -> u32 {
        match self {
            Verdict::Accept { .. } => 0,
            Verdict::Reject(reason) => reason.code(),
        }
    }

    /// Whether the transaction was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accept { .. })
    }

    /// Rejection reason, if any.
    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Verdict::Accept { .. } => None,
            Verdict::Reject(reason) => Some(reason),
        }
    }

    /// Response log line.
    pub fn log(&self) -> String {
        match self {
            Verdict::Accept { hint } => hint.clone(),
            Verdict::Reject(reason) => reason.to_string(),
        }
    }
}

impl From<Result<String, RejectReason>> for Verdict {
    fn from(result: Result<String, RejectReason>) -> Self {
        match result {
            Ok(hint) => Verdict::Accept { hint },
            Err(reason) => Verdict::Reject(reason),
        }
    }
}
