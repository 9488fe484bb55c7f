use super::domain::ScoredVoucher;

/// Running maximum over the scored vouchers of one run.
///
/// Owned by the single consumer draining the result channel, so offers are
/// applied strictly one at a time without a lock. Only a strictly greater
/// discount replaces the current best; on a tie the earlier delivery stays.
#[derive(Debug, Default)]
pub struct RunningBest {
    best: Option<ScoredVoucher>,
    offered: usize,
}

impl RunningBest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `candidate` became the new best.
    pub fn offer(&mut self, candidate: ScoredVoucher) -> bool {
        self.offered += 1;
        let replaces = match &self.best {
            Some(current) => candidate.discount > current.discount,
            None => true,
        };
        if replaces {
            self.best = Some(candidate);
        }
        replaces
    }

    pub fn current(&self) -> Option<&ScoredVoucher> {
        self.best.as_ref()
    }

    pub fn offered(&self) -> usize {
        self.offered
    }

    /// `None` when nothing was ever offered.
    pub fn finish(self) -> Option<ScoredVoucher> {
        self.best
    }
}
