use crate::record::EventRecord;
use std::collections::VecDeque;

/// An ordered run of records that evicts its oldest entries once it holds
/// more than `max_size`.
#[derive(Debug, Clone)]
pub struct BoundedLog {
    events: VecDeque<EventRecord>,
    max_size: usize,
}

impl BoundedLog {
    pub fn new(max_size: usize) -> Self {
        Self {
            events: VecDeque::new(),
            max_size,
        }
    }

    /// Adopt a previously stored sequence. A stored log longer than
    /// `max_size` keeps only its newest entries.
    pub fn from_vec(events: Vec<EventRecord>, max_size: usize) -> Self {
        let mut log = Self {
            events: VecDeque::from(events),
            max_size,
        };
        log.evict();
        log
    }

    /// Append a record, returning how many old records were evicted
    pub fn log_event(&mut self, record: EventRecord) -> usize {
        self.events.push_back(record);
        self.evict()
    }

    fn evict(&mut self) -> usize {
        let excess = self.events.len().saturating_sub(self.max_size);
        self.events.drain(..excess);
        excess
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_vec(self) -> Vec<EventRecord> {
        self.events.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EventContext, EventType};

    fn record(n: usize) -> EventRecord {
        EventRecord::new(
            "https://example.com/",
            "Example",
            EventType::Click,
            EventContext::described(format!("Clicked on \"{}\"", n)),
        )
    }

    #[test]
    fn test_event_log_capacity() {
        let mut log = BoundedLog::new(2);
        assert_eq!(log.log_event(record(1)), 0);
        assert_eq!(log.log_event(record(2)), 0);
        assert_eq!(log.log_event(record(3)), 1);

        let events = log.into_vec();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].natural_description(), "Clicked on \"2\"");
        assert_eq!(events[1].natural_description(), "Clicked on \"3\"");
    }

    #[test]
    fn test_from_vec_trims_oversized_history() {
        let stored: Vec<_> = (0..5).map(record).collect();
        let log = BoundedLog::from_vec(stored, 3);
        assert_eq!(log.len(), 3);
        assert_eq!(log.into_vec()[0].natural_description(), "Clicked on \"2\"");
    }
}
