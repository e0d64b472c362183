//! Best-of-N reduction.

use super::EncodedResult;

/// A running minimum over encoded results.
///
/// Empty means no candidate has been seen, which is distinct from holding a
/// zero-length candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BestResult(Option<EncodedResult>);

impl BestResult {
    pub fn new() -> Self {
        Self(None)
    }

    /// Keep `candidate` if it is strictly better than the current best.
    ///
    /// Returns whether the candidate was kept.
    pub fn offer(&mut self, candidate: EncodedResult) -> bool {
        match &self.0 {
            Some(current) if !candidate.beats(current) => false,
            _ => {
                self.0 = Some(candidate);
                true
            }
        }
    }

    /// Fold another running minimum into this one.
    pub fn merge(&mut self, other: BestResult) {
        if let Some(candidate) = other.0 {
            self.offer(candidate);
        }
    }

    pub fn get(&self) -> Option<&EncodedResult> {
        self.0.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn into_inner(self) -> Option<EncodedResult> {
        self.0
    }
}

/// Merge per-worker bests in the order given.
pub fn reduce<I>(bests: I) -> Option<EncodedResult>
where
    I: IntoIterator<Item = BestResult>,
{
    bests
        .into_iter()
        .fold(BestResult::new(), |mut acc, best| {
            acc.merge(best);
            acc
        })
        .into_inner()
}
