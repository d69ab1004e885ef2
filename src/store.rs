use crate::error::ParseFailure;
use crate::pricing::{CostCalculator, PricingTable};
use crate::types::{CostBreakdown, DedupKey, ProjectName, SessionId, UsageEvent};
use chrono::{DateTime, Local, Utc};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// An admitted event together with its eagerly computed cost. `cost` is
/// `None` when the model has no pricing entry; the tokens still count
/// toward aggregates, the cost is never estimated.
#[derive(Debug, Clone)]
pub struct PricedEvent {
    pub event: UsageEvent,
    pub cost: Option<CostBreakdown>,
}

/// Immutable view of the store's contents, ordered by timestamp
/// ascending. Readers hold it through an `Arc` and are unaffected by
/// later reloads.
#[derive(Debug, Default)]
pub struct Snapshot {
    entries: Vec<PricedEvent>,
}

impl Snapshot {
    pub fn all(&self) -> &[PricedEvent] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events matching a composed predicate, still in timestamp order.
    pub fn select<'a>(
        &'a self,
        filter: &'a EventFilter,
    ) -> impl Iterator<Item = &'a PricedEvent> + 'a {
        self.entries.iter().filter(move |p| filter.matches(&p.event))
    }

    /// The `n` most recent events, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &PricedEvent> {
        self.entries.iter().rev().take(n)
    }
}

/// Outcome of one reload: what was admitted, what was dropped, and the
/// parse failures for diagnostics. A reload never aborts on bad records.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub admitted: usize,
    pub duplicates: usize,
    pub unpriced: usize,
    pub failures: Vec<ParseFailure>,
}

impl LoadReport {
    pub fn rejected(&self) -> usize {
        self.failures.len()
    }
}

/// Composable event predicate. The command surface's filters (today-only,
/// by session, by project) all map onto this; the range bounds treat
/// `until` as exclusive.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    session: Option<SessionId>,
    project: Option<ProjectName>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(mut self, id: impl Into<SessionId>) -> Self {
        self.session = Some(id.into());
        self
    }

    pub fn project(mut self, name: impl Into<ProjectName>) -> Self {
        self.project = Some(name.into());
        self
    }

    pub fn since(mut self, instant: DateTime<Utc>) -> Self {
        self.since = Some(instant);
        self
    }

    pub fn until(mut self, instant: DateTime<Utc>) -> Self {
        self.until = Some(instant);
        self
    }

    /// Restrict to events on or after local midnight.
    pub fn today(self) -> Self {
        let today_start = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .unwrap()
            .with_timezone(&Utc);
        self.since(today_start)
    }

    pub fn matches(&self, event: &UsageEvent) -> bool {
        if let Some(session) = &self.session
            && event.session != *session
        {
            return false;
        }
        if let Some(project) = &self.project
            && event.project.as_ref() != Some(project)
        {
            return false;
        }
        if let Some(since) = self.since
            && event.timestamp < since
        {
            return false;
        }
        if let Some(until) = self.until
            && event.timestamp >= until
        {
            return false;
        }
        true
    }
}

/// Owns the deduplicated event collection. The single writer replaces the
/// whole set atomically via `reload`; any number of readers query the
/// published snapshot concurrently.
pub struct EventStore {
    calculator: CostCalculator<PricingTable>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl EventStore {
    pub fn new(pricing: PricingTable) -> Self {
        Self {
            calculator: CostCalculator::new(pricing),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// The currently published snapshot. Cheap to call on every refresh
    /// tick.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().unwrap().clone()
    }

    /// Replace the entire held set from freshly parsed records. The new
    /// collection is built completely (dedup, eager pricing, timestamp
    /// sort) before the single publish; in-flight readers keep observing
    /// the prior snapshot. Same input records, same resulting snapshot.
    pub fn reload<I>(&self, records: I) -> LoadReport
    where
        I: IntoIterator<Item = Result<UsageEvent, ParseFailure>>,
    {
        let mut report = LoadReport::default();
        let mut seen: HashSet<DedupKey> = HashSet::new();
        let mut entries = Vec::new();

        for record in records {
            match record {
                Err(failure) => report.failures.push(failure),
                Ok(event) => {
                    if !seen.insert(event.dedup_key()) {
                        report.duplicates += 1;
                        continue;
                    }
                    let cost = match self.calculator.cost_of(&event) {
                        Ok(breakdown) => Some(breakdown),
                        Err(_) => {
                            report.unpriced += 1;
                            None
                        }
                    };
                    entries.push(PricedEvent { event, cost });
                }
            }
        }

        entries.sort_by_key(|p| p.event.timestamp);
        report.admitted = entries.len();

        *self.snapshot.write().unwrap() = Arc::new(Snapshot { entries });
        report
    }
}
