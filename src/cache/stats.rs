use serde::Serialize;
use std::ops::AddAssign;

use crate::error::InvariantViolation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HitCounters {
    requests: u64,
    private_hits: u64,
    shared_hits: u64,
    backing_hits: u64,
}

impl HitCounters {
    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn private_hits(&self) -> u64 {
        self.private_hits
    }

    pub fn shared_hits(&self) -> u64 {
        self.shared_hits
    }

    pub fn backing_hits(&self) -> u64 {
        self.backing_hits
    }

    pub fn record_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    pub fn record_private_hit(&mut self) {
        self.private_hits = self.private_hits.saturating_add(1);
    }

    pub fn record_shared_hit(&mut self) {
        self.shared_hits = self.shared_hits.saturating_add(1);
    }

    pub fn record_backing_hit(&mut self) {
        self.backing_hits = self.backing_hits.saturating_add(1);
    }

    /// Every request is serviced by exactly one level.
    pub fn check_conservation(&self) -> Result<(), InvariantViolation> {
        let serviced = self.private_hits + self.shared_hits + self.backing_hits;
        if serviced != self.requests {
            return Err(InvariantViolation::HitConservation {
                requests: self.requests,
                private: self.private_hits,
                shared: self.shared_hits,
                backing: self.backing_hits,
            });
        }
        Ok(())
    }

    /// Fractions of requests serviced per level; all zero when nothing was requested.
    pub fn rates(&self) -> HitRates {
        if self.requests == 0 {
            return HitRates::default();
        }
        let total = self.requests as f64;
        HitRates {
            private: self.private_hits as f64 / total,
            shared: self.shared_hits as f64 / total,
            backing: self.backing_hits as f64 / total,
        }
    }
}

impl AddAssign<&HitCounters> for HitCounters {
    fn add_assign(&mut self, other: &HitCounters) {
        self.requests = self.requests.saturating_add(other.requests);
        self.private_hits = self.private_hits.saturating_add(other.private_hits);
        self.shared_hits = self.shared_hits.saturating_add(other.shared_hits);
        self.backing_hits = self.backing_hits.saturating_add(other.backing_hits);
    }
}

impl AddAssign<HitCounters> for HitCounters {
    fn add_assign(&mut self, other: HitCounters) {
        *self += &other;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HitRates {
    pub private: f64,
    pub shared: f64,
    pub backing: f64,
}

impl HitRates {
    pub fn sum(&self) -> f64 {
        self.private + self.shared + self.backing
    }

    /// Share of requests that never reached backing memory.
    pub fn on_chip(&self) -> f64 {
        self.private + self.shared
    }
}
