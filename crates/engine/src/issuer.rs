//! Applies expansion decisions through the host.
//!
//! One expansion at a time: while a previous expansion is settling, new
//! requests are dropped rather than queued.

use std::time::{Duration, Instant};

use gridext_config::ExpansionConfig;
use gridext_core::{EdgeProbe, History, Mutation};

use crate::decision::{decide, ExpansionDecision};
use crate::host::HostGridFacade;

#[derive(Debug)]
pub struct MutationIssuer {
    settle_delay: Duration,
    in_flight_until: Option<Instant>,
}

impl MutationIssuer {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay, in_flight_until: None }
    }

    pub fn is_in_flight(&self, now: Instant) -> bool {
        matches!(self.in_flight_until, Some(deadline) if now < deadline)
    }

    /// Clear the in-flight flag once the settle delay has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.in_flight_until {
            if now >= deadline {
                self.in_flight_until = None;
            }
        }
    }

    pub fn reset(&mut self) {
        self.in_flight_until = None;
    }

    /// Evaluate `probe` against the active sheet and grow it if needed.
    ///
    /// Returns the decision that was issued, if any.
    pub fn check_and_expand(
        &mut self,
        host: &mut dyn HostGridFacade,
        probe: EdgeProbe,
        config: &ExpansionConfig,
        now: Instant,
    ) -> Option<ExpansionDecision> {
        self.tick(now);
        if self.in_flight_until.is_some() {
            log::debug!("expansion in flight, dropping probe {:?}", probe);
            return None;
        }

        let sheet = host.active_sheet()?;
        let bounds = host.bounds(&sheet)?;
        let decision = decide(probe, bounds, config);
        if decision.is_noop() {
            return None;
        }

        self.in_flight_until = Some(now + self.settle_delay);

        if let Some(row_count) = decision.new_row_count.filter(|&n| n > bounds.row_count) {
            let mutation = Mutation::SetRowCount { sheet: sheet.clone(), row_count };
            match host.execute(mutation, History::Untracked) {
                Ok(()) => log::info!("expanded {} rows {} -> {}", sheet.sheet_id, bounds.row_count, row_count),
                Err(e) => log::warn!("row expansion on {} failed: {}", sheet.sheet_id, e),
            }
        }
        if let Some(column_count) = decision.new_column_count.filter(|&n| n > bounds.column_count) {
            let mutation = Mutation::SetColumnCount { sheet: sheet.clone(), column_count };
            match host.execute(mutation, History::Untracked) {
                Ok(()) => log::info!(
                    "expanded {} columns {} -> {}",
                    sheet.sheet_id,
                    bounds.column_count,
                    column_count
                ),
                Err(e) => log::warn!("column expansion on {} failed: {}", sheet.sheet_id, e),
            }
        }

        Some(decision)
    }
}
