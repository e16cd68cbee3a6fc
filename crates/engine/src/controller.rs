//! Auto-expansion controller.
//!
//! Owns the three listener registrations, the scroll debouncer and the
//! mutation issuer. The host calls [`AutoExpansionController::pump`] once
//! per loop turn; all timers are deadlines checked there against the
//! injected clock.

use std::rc::Rc;
use std::time::Instant;

use gridext_config::ExpansionConfig;
use gridext_core::EdgeProbe;

use crate::adapters::{edit_probe, scroll_probe, selection_probe};
use crate::clock::Clock;
use crate::debounce::Debouncer;
use crate::events::{HostEvent, ScrollMetrics, Subscription, Topic};
use crate::host::{HostGridFacade, ViewportProvider};
use crate::issuer::MutationIssuer;

#[derive(Debug)]
enum ScrollAttachment {
    Off,
    Waiting { attempt: u32, next_try: Instant },
    Attached(Subscription),
    GaveUp,
}

/// Counters from one [`pump`](AutoExpansionController::pump) call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub events: usize,
    pub expansions: usize,
}

pub struct AutoExpansionController {
    config: ExpansionConfig,
    clock: Rc<dyn Clock>,
    viewport: Option<Box<dyn ViewportProvider>>,
    selection: Option<Subscription>,
    edits: Option<Subscription>,
    scroll: ScrollAttachment,
    debouncer: Debouncer<ScrollMetrics>,
    issuer: MutationIssuer,
    started: bool,
}

impl AutoExpansionController {
    pub fn new(config: ExpansionConfig, clock: Rc<dyn Clock>) -> Self {
        let debouncer = Debouncer::new(config.scroll_debounce());
        let issuer = MutationIssuer::new(config.settle_delay());
        Self {
            config,
            clock,
            viewport: None,
            selection: None,
            edits: None,
            scroll: ScrollAttachment::Off,
            debouncer,
            issuer,
            started: false,
        }
    }

    pub fn with_viewport(mut self, provider: Box<dyn ViewportProvider>) -> Self {
        self.viewport = Some(provider);
        self
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Register listeners for every enabled source.
    pub fn start(&mut self, host: &mut dyn HostGridFacade) {
        if self.started {
            return;
        }
        self.started = true;

        if !self.config.enabled {
            log::info!("auto-expansion disabled");
            return;
        }
        if self.config.enable_navigation_expansion {
            self.selection = Some(host.subscribe(Topic::Selection));
        }
        if self.config.enable_data_fill_expansion {
            self.edits = Some(host.subscribe(Topic::Mutation));
        }
        if self.config.enable_scroll_expansion {
            self.scroll = ScrollAttachment::Waiting { attempt: 0, next_try: self.clock.now() };
            self.try_attach_viewport(self.clock.now());
        }
        log::debug!("auto-expansion started with {} listener(s)", self.subscription_count());
    }

    /// Release every listener and pending timer.
    pub fn dispose(&mut self) {
        self.selection = None;
        self.edits = None;
        self.scroll = ScrollAttachment::Off;
        self.debouncer.clear();
        self.issuer.reset();
        self.started = false;
    }

    /// Swap in a new configuration, re-registering listeners if running.
    pub fn reconfigure(&mut self, config: ExpansionConfig, host: &mut dyn HostGridFacade) {
        let was_started = self.started;
        self.dispose();
        self.debouncer = Debouncer::new(config.scroll_debounce());
        self.issuer = MutationIssuer::new(config.settle_delay());
        self.config = config;
        if was_started {
            self.start(host);
        }
    }

    pub fn subscription_count(&self) -> usize {
        let scroll = matches!(self.scroll, ScrollAttachment::Attached(_)) as usize;
        self.selection.is_some() as usize + self.edits.is_some() as usize + scroll
    }

    pub fn is_viewport_attached(&self) -> bool {
        matches!(self.scroll, ScrollAttachment::Attached(_))
    }

    /// Drain pending events and fire due timers.
    pub fn pump(&mut self, host: &mut dyn HostGridFacade) -> PumpReport {
        let mut report = PumpReport::default();
        if !self.started {
            return report;
        }
        let now = self.clock.now();
        self.issuer.tick(now);
        self.try_attach_viewport(now);

        let selection_events = self.selection.as_ref().map(Subscription::poll).unwrap_or_default();
        for event in selection_events {
            report.events += 1;
            let HostEvent::SelectionChanged(e) = event else { continue };
            if host.active_sheet().as_ref() != Some(&e.sheet) {
                log::debug!("ignoring selection on inactive sheet {}", e.sheet.sheet_id);
                continue;
            }
            if let Some(probe) = selection_probe(&e.selection) {
                report.expansions += self.check(host, probe, now) as usize;
            }
        }

        let edit_events = self.edits.as_ref().map(Subscription::poll).unwrap_or_default();
        for event in edit_events {
            report.events += 1;
            let HostEvent::MutationExecuted(e) = event else { continue };
            let Some(probe) = edit_probe(&e.mutation) else {
                log::debug!("ignoring {}", e.mutation.kind());
                continue;
            };
            if host.active_sheet().as_ref() != Some(e.mutation.sheet()) {
                log::debug!("ignoring write to inactive sheet {}", e.mutation.sheet().sheet_id);
                continue;
            }
            report.expansions += self.check(host, probe, now) as usize;
        }

        if let ScrollAttachment::Attached(sub) = &self.scroll {
            for event in sub.poll() {
                report.events += 1;
                if let HostEvent::Scrolled(metrics) = event {
                    self.debouncer.push(metrics, now);
                }
            }
        }
        if let Some(metrics) = self.debouncer.poll(now) {
            let probe = host
                .active_sheet()
                .and_then(|sheet| host.bounds(&sheet))
                .and_then(|bounds| scroll_probe(&metrics, bounds, self.config.scroll_edge_margin_px));
            if let Some(probe) = probe {
                report.expansions += self.check(host, probe, now) as usize;
            }
        }

        report
    }

    fn check(&mut self, host: &mut dyn HostGridFacade, probe: EdgeProbe, now: Instant) -> bool {
        self.issuer.check_and_expand(host, probe, &self.config, now).is_some()
    }

    fn try_attach_viewport(&mut self, now: Instant) {
        let ScrollAttachment::Waiting { attempt, next_try } = self.scroll else {
            return;
        };
        if now < next_try {
            return;
        }

        let attached = self.viewport.as_mut().and_then(|p| p.attach());
        if let Some(sub) = attached {
            log::debug!("viewport attached after {} retries", attempt);
            self.scroll = ScrollAttachment::Attached(sub);
            return;
        }

        let retry = self.config.viewport_retry;
        let attempt = attempt + 1;
        if attempt > retry.max_attempts {
            log::warn!(
                "viewport not available after {} attempts, scroll expansion disabled",
                retry.max_attempts
            );
            self.scroll = ScrollAttachment::GaveUp;
        } else {
            self.scroll = ScrollAttachment::Waiting { attempt, next_try: now + retry.delay_for(attempt) };
        }
    }
}

impl Drop for AutoExpansionController {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory::MemoryHost;
    use gridext_core::{CellData, CellRange, CellValueMap, History, Mutation, MutationKind};

    fn controller(config: ExpansionConfig, clock: &ManualClock) -> AutoExpansionController {
        AutoExpansionController::new(config, Rc::new(clock.clone()))
    }

    fn bounds(host: &MemoryHost) -> (usize, usize) {
        let sheet = host.active_sheet().unwrap();
        let b = host.bounds(&sheet).unwrap();
        (b.row_count, b.column_count)
    }

    #[test]
    fn test_disabled_registers_nothing() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 10, 10);
        let config = ExpansionConfig { enabled: false, ..Default::default() };
        let mut ctl = controller(config, &clock).with_viewport(Box::new(host.viewport()));
        host.mount_viewport();

        ctl.start(&mut host);
        assert_eq!(ctl.subscription_count(), 0);
        assert_eq!(host.listener_count(), 0);

        host.select(CellRange::single(9, 9));
        ctl.pump(&mut host);
        assert!(host.executed().is_empty());
    }

    #[test]
    fn test_navigation_expands_near_edge() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 100, 26);
        let mut ctl = controller(ExpansionConfig::default(), &clock);
        ctl.start(&mut host);

        host.select(CellRange::single(10, 0));
        assert_eq!(ctl.pump(&mut host).expansions, 0);

        host.select(CellRange::single(96, 0));
        let report = ctl.pump(&mut host);
        assert_eq!(report.expansions, 1);
        assert_eq!(bounds(&host), (200, 26));
        assert!(host.executed().iter().all(|(_, h)| *h == History::Untracked));
    }

    #[test]
    fn test_selection_on_inactive_sheet_is_ignored() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 100, 26);
        host.add_sheet("sheet-02", "Notes", gridext_core::GridBounds::new(10, 5));
        let mut ctl = controller(ExpansionConfig::default(), &clock);
        ctl.start(&mut host);

        host.select(CellRange::single(99, 0));
        host.set_active_sheet("sheet-02").unwrap();
        let report = ctl.pump(&mut host);
        assert_eq!(report.events, 1);
        assert_eq!(report.expansions, 0);
        assert!(host.executed().is_empty());
        assert_eq!(bounds(&host), (10, 5));

        host.select(CellRange::single(9, 0));
        assert_eq!(ctl.pump(&mut host).expansions, 1);
        assert_eq!(bounds(&host), (110, 15));
    }

    #[test]
    fn test_burst_within_settle_delay_expands_once() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 100, 26);
        let mut ctl = controller(ExpansionConfig::default(), &clock);
        ctl.start(&mut host);

        host.select(CellRange::single(99, 0));
        host.select(CellRange::single(199, 0));
        ctl.pump(&mut host);
        assert_eq!(bounds(&host).0, 200);

        clock.advance_ms(100);
        host.select(CellRange::single(199, 0));
        ctl.pump(&mut host);
        assert_eq!(bounds(&host).0, 300);
    }

    #[test]
    fn test_data_fill_expands_from_written_extent() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 20, 5);
        let config = ExpansionConfig { enable_navigation_expansion: false, ..Default::default() };
        let mut ctl = controller(config, &clock);
        ctl.start(&mut host);
        assert_eq!(ctl.subscription_count(), 1);

        let sheet = host.active_sheet().unwrap();
        let mut cells = CellValueMap::new();
        cells.set(16, 0, CellData::text("x"));
        let undo = Mutation::SetRangeValues { sheet: sheet.clone(), cells: CellValueMap::new() };
        host.execute(Mutation::SetRangeValues { sheet, cells }, History::Tracked { undo }).unwrap();

        ctl.pump(&mut host);
        assert_eq!(bounds(&host), (120, 15));
    }

    #[test]
    fn test_scroll_attach_retries_then_debounces() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 1000, 26);
        let mut ctl = controller(ExpansionConfig::default(), &clock).with_viewport(Box::new(host.viewport()));
        ctl.start(&mut host);
        assert!(!ctl.is_viewport_attached());

        host.mount_viewport();
        clock.advance_ms(50);
        ctl.pump(&mut host);
        assert!(!ctl.is_viewport_attached());

        clock.advance_ms(50);
        ctl.pump(&mut host);
        assert!(ctl.is_viewport_attached());

        let near_bottom = ScrollMetrics {
            scroll_top: 19_950.0,
            viewport_height: 800.0,
            viewport_width: 1200.0,
            content_height: 20_800.0,
            content_width: 2_600.0,
            ..Default::default()
        };
        for _ in 0..5 {
            host.scroll(near_bottom);
            ctl.pump(&mut host);
            clock.advance_ms(20);
        }
        assert!(host.executed().is_empty());

        clock.advance_ms(200);
        let report = ctl.pump(&mut host);
        assert_eq!(report.expansions, 1);
        assert_eq!(bounds(&host), (1100, 26));
    }

    #[test]
    fn test_scroll_attach_gives_up() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 10, 10);
        let mut config = ExpansionConfig::default();
        config.viewport_retry.max_attempts = 2;
        let mut ctl = controller(config, &clock).with_viewport(Box::new(host.viewport()));
        ctl.start(&mut host);

        for _ in 0..10 {
            clock.advance_ms(2_000);
            ctl.pump(&mut host);
        }
        host.mount_viewport();
        clock.advance_ms(2_000);
        ctl.pump(&mut host);
        assert!(!ctl.is_viewport_attached());
    }

    #[test]
    fn test_dispose_releases_everything() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 10, 10);
        host.mount_viewport();
        let mut ctl = controller(ExpansionConfig::default(), &clock).with_viewport(Box::new(host.viewport()));
        ctl.start(&mut host);
        assert_eq!(ctl.subscription_count(), 3);
        assert_eq!(host.listener_count(), 3);

        ctl.dispose();
        assert_eq!(host.listener_count(), 0);

        host.select(CellRange::single(9, 9));
        ctl.pump(&mut host);
        assert!(host.executed().is_empty());
    }

    #[test]
    fn test_drop_disposes() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 10, 10);
        {
            let mut ctl = controller(ExpansionConfig::default(), &clock);
            ctl.start(&mut host);
            assert_eq!(host.listener_count(), 2);
        }
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_reconfigure_replaces_listeners() {
        let clock = ManualClock::new();
        let mut host = MemoryHost::new("book", 100, 26);
        let mut ctl = controller(ExpansionConfig::default(), &clock);
        ctl.start(&mut host);

        let config = ExpansionConfig { rows_to_add: 7, enable_data_fill_expansion: false, ..Default::default() };
        ctl.reconfigure(config, &mut host);
        assert_eq!(host.listener_count(), 1);

        host.select(CellRange::single(99, 0));
        ctl.pump(&mut host);
        assert_eq!(bounds(&host).0, 107);
        assert!(host.executed().iter().all(|(m, _)| m.kind() == MutationKind::SetRowCount));
    }
}
