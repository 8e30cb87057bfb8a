//! Commands returned by the transition function
//!
//! A command describes at most one remote call. The runner performs it and
//! turns the result into a [`Msg`](super::Msg).

use crate::api::{AuthToken, ReferenceSource, Target, TargetScope};

use super::types::ValidatedBatch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<R> {
    /// Nothing to do
    None,
    ListTargets {
        scope: TargetScope,
        course_id: u64,
    },
    CreateTarget {
        course_id: u64,
        name: String,
        auth: AuthToken,
    },
    FetchReference {
        source: ReferenceSource,
        target: Target,
    },
    Submit {
        batch: ValidatedBatch<R>,
        auth: AuthToken,
    },
}

impl<R> Command<R> {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
