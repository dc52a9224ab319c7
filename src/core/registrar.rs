//! Turns events into queue entries: one sample job per event, one entry per
//! poll instant.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::scheduler::SchedulerHandle;
use super::{
    DelayQueue, Event, EventId, PollSeries, Priority, SampleJob, SampleSink, SampleSource,
    SchedulerError,
};
use crate::util::clock::Clock;

/// Per-event registration plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPlan {
    /// Event planned.
    pub event: EventId,
    /// First poll instant.
    pub first: NaiveDateTime,
    /// Last poll instant, equal to the event start.
    pub last: NaiveDateTime,
    /// Number of entries.
    pub entries: usize,
}

/// What a registration pass put into the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Events registered.
    pub events: usize,
    /// Queue entries created across all events.
    pub entries: usize,
    /// Earliest instant registered.
    pub first_instant: Option<NaiveDateTime>,
    /// Latest instant registered.
    pub last_instant: Option<NaiveDateTime>,
}

impl RegistrationReport {
    fn absorb(&mut self, plan: &EventPlan) {
        self.events += 1;
        self.entries += plan.entries;
        self.first_instant = Some(self.first_instant.map_or(plan.first, |f| f.min(plan.first)));
        self.last_instant = Some(self.last_instant.map_or(plan.last, |l| l.max(plan.last)));
    }
}

/// Registers sampling jobs for events against a scheduler.
pub struct EventRegistrar {
    series: PollSeries,
    priority: Priority,
    source: Arc<dyn SampleSource>,
    sink: Arc<dyn SampleSink>,
    clock: Arc<dyn Clock>,
}

impl EventRegistrar {
    /// Create a registrar sampling through `source` into `sink`.
    pub fn new(
        series: PollSeries,
        source: Arc<dyn SampleSource>,
        sink: Arc<dyn SampleSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            series,
            priority: Priority::DEFAULT,
            source,
            sink,
            clock,
        }
    }

    /// Use `priority` for every entry registered from now on.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Series applied to each event.
    #[must_use]
    pub const fn series(&self) -> &PollSeries {
        &self.series
    }

    /// Plan for `event` without touching any queue.
    #[must_use]
    pub fn plan(&self, event: &Event) -> EventPlan {
        plan_for(event, &self.series.generate(event.start_time))
    }

    /// Register one entry per poll instant of `event`, all sharing a single job.
    ///
    /// # Errors
    ///
    /// Propagates [`SchedulerError::QueueFull`]; entries registered before the
    /// failure stay queued.
    pub fn register_event<Q: DelayQueue>(
        &self,
        handle: &SchedulerHandle<Q>,
        event: Event,
    ) -> Result<EventPlan, SchedulerError> {
        let instants = self.series.generate(event.start_time);
        let plan = plan_for(&event, &instants);

        let job = Arc::new(SampleJob::new(
            event,
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            Arc::clone(&self.clock),
        ));
        for at in instants {
            handle.register(at, self.priority, job.clone())?;
        }

        debug!(
            event = %plan.event,
            entries = plan.entries,
            first = %plan.first,
            last = %plan.last,
            "event registered"
        );
        Ok(plan)
    }

    /// Register every event in `events`.
    ///
    /// # Errors
    ///
    /// Stops at the first [`SchedulerError`].
    pub fn register_all<Q, I>(
        &self,
        handle: &SchedulerHandle<Q>,
        events: I,
    ) -> Result<RegistrationReport, SchedulerError>
    where
        Q: DelayQueue,
        I: IntoIterator<Item = Event>,
    {
        let mut report = RegistrationReport::default();
        for event in events {
            let plan = self.register_event(handle, event)?;
            report.absorb(&plan);
        }
        info!(
            events = report.events,
            entries = report.entries,
            window_minutes = self.series.window_minutes(),
            step_minutes = self.series.step_minutes(),
            "events registered"
        );
        Ok(report)
    }
}

fn plan_for(event: &Event, instants: &[NaiveDateTime]) -> EventPlan {
    EventPlan {
        event: event.id.clone(),
        first: instants.first().copied().unwrap_or(event.start_time),
        last: instants.last().copied().unwrap_or(event.start_time),
        entries: instants.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduler::{DispatchLimits, Scheduler};
    use crate::core::{JobError, SampleRecord};
    use crate::infra::queue::InMemoryDelayQueue;
    use crate::runtime::TokioSpawner;
    use crate::util::clock::VirtualClock;
    use crate::util::stamp::parse_minute_stamp;
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl SampleSource for Silent {
        async fn fetch_current_samples(&self, _event: &Event) -> Result<Vec<(String, String)>, JobError> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl SampleSink for Silent {
        async fn append_records(&self, _event: &EventId, _records: &[SampleRecord]) -> Result<(), JobError> {
            Ok(())
        }
    }

    fn registrar(clock: Arc<dyn Clock>) -> EventRegistrar {
        EventRegistrar::new(PollSeries::default(), Arc::new(Silent), Arc::new(Silent), clock)
    }

    fn event(number: &str, stamp: &str) -> Event {
        Event::new(EventId::new("Sapporo", number), parse_minute_stamp(stamp).unwrap())
    }

    #[tokio::test]
    async fn test_register_all_counts_entries() {
        let clock = Arc::new(VirtualClock::starting_at(parse_minute_stamp("202203040000").unwrap()));
        let scheduler = Scheduler::new(
            InMemoryDelayQueue::new(1000),
            clock.clone(),
            TokioSpawner::current(),
            DispatchLimits::default(),
        );
        let handle = scheduler.handle();

        let report = registrar(clock)
            .register_all(
                &handle,
                vec![event("1", "202203041000"), event("2", "202203041005")],
            )
            .unwrap();

        assert_eq!(report.events, 2);
        assert_eq!(report.entries, 194);
        assert_eq!(handle.pending(), 194);
        assert_eq!(report.first_instant, Some(parse_minute_stamp("202203040200").unwrap()));
        assert_eq!(report.last_instant, Some(parse_minute_stamp("202203041005").unwrap()));
    }

    #[tokio::test]
    async fn test_queue_full_propagates() {
        let clock = Arc::new(VirtualClock::starting_at(parse_minute_stamp("202203040000").unwrap()));
        let scheduler = Scheduler::new(
            InMemoryDelayQueue::new(50),
            clock.clone(),
            TokioSpawner::current(),
            DispatchLimits::default(),
        );

        let result = registrar(clock).register_event(&scheduler.handle(), event("1", "202203041000"));
        assert!(matches!(result, Err(SchedulerError::QueueFull(_))));
    }

    #[test]
    fn test_plan_matches_series() {
        let clock = Arc::new(VirtualClock::starting_at(parse_minute_stamp("202203040000").unwrap()));
        let plan = registrar(clock).plan(&event("3", "202203041550"));

        assert_eq!(plan.entries, 97);
        assert_eq!(plan.first, parse_minute_stamp("202203040750").unwrap());
        assert_eq!(plan.last, parse_minute_stamp("202203041550").unwrap());
    }
}
