use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ScrapingStats {
    pub run_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub terms_total: usize,
    pub terms_processed: usize,
    pub found: usize,
    pub not_found: usize,
    pub related_recorded: usize,
    pub related_skipped_known: usize,
    pub card_failures: usize,
    pub unavailable_fields: usize,
    pub localities_swept: usize,
    pub sink_failures: usize,
    pub stopped_early: bool,
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<ScrapingStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ScrapingStats {
                run_id: Uuid::now_v7(),
                start_time: Utc::now(),
                end_time: None,
                terms_total: 0,
                terms_processed: 0,
                found: 0,
                not_found: 0,
                related_recorded: 0,
                related_skipped_known: 0,
                card_failures: 0,
                unavailable_fields: 0,
                localities_swept: 0,
                sink_failures: 0,
                stopped_early: false,
            })),
        }
    }

    pub fn start(&self, terms_total: usize) {
        let mut stats = self.stats.write();
        stats.start_time = Utc::now();
        stats.terms_total = terms_total;
    }

    pub fn record_primary(&self, found: bool) {
        let mut stats = self.stats.write();
        stats.terms_processed += 1;
        if found {
            stats.found += 1;
        } else {
            stats.not_found += 1;
        }
    }

    pub fn record_related(&self, count: usize) {
        self.stats.write().related_recorded += count;
    }

    pub fn record_known_skip(&self) {
        self.stats.write().related_skipped_known += 1;
    }

    pub fn record_card_failure(&self) {
        self.stats.write().card_failures += 1;
    }

    pub fn record_unavailable_field(&self) {
        self.stats.write().unavailable_fields += 1;
    }

    pub fn record_locality_sweep(&self) {
        self.stats.write().localities_swept += 1;
    }

    pub fn record_sink_failure(&self) {
        self.stats.write().sink_failures += 1;
    }

    pub fn finish(&self, stopped_early: bool) {
        let mut stats = self.stats.write();
        stats.end_time = Some(Utc::now());
        stats.stopped_early = stopped_early;
    }

    pub fn get_stats(&self) -> ScrapingStats {
        self.stats.read().clone()
    }

    pub fn elapsed(&self) -> Duration {
        let stats = self.stats.read();
        stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time)
    }

    pub fn print_summary(&self) {
        let duration = self.elapsed();
        let stats = self.stats.read();

        println!("\nScraping Statistics ({}):", stats.run_id);
        println!("===================");
        println!("Duration: {} seconds", duration.num_seconds());
        println!(
            "Terms Processed: {} of {}{}",
            stats.terms_processed,
            stats.terms_total,
            if stats.stopped_early { " (stopped)" } else { "" }
        );
        println!("Found: {}", stats.found);
        println!("Not Found: {}", stats.not_found);
        println!("Related Recorded: {}", stats.related_recorded);
        println!("Related Skipped (input terms): {}", stats.related_skipped_known);

        if stats.localities_swept > 0 {
            println!("Localities Swept: {}", stats.localities_swept);
        }
        if stats.card_failures > 0 || stats.unavailable_fields > 0 || stats.sink_failures > 0 {
            println!("\nFailures:");
            println!("  Cards skipped: {}", stats.card_failures);
            println!("  Unreadable fields: {}", stats.unavailable_fields);
            println!("  Spreadsheet writes: {}", stats.sink_failures);
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let tracker = StatsTracker::new();
        tracker.start(3);
        tracker.record_primary(true);
        tracker.record_primary(false);
        tracker.record_related(2);
        tracker.record_known_skip();
        tracker.finish(true);

        let stats = tracker.get_stats();
        assert_eq!(stats.terms_total, 3);
        assert_eq!(stats.terms_processed, 2);
        assert_eq!(stats.found, 1);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.related_recorded, 2);
        assert_eq!(stats.related_skipped_known, 1);
        assert!(stats.stopped_early);
        assert!(stats.end_time.is_some());
    }
}
