//! Running hit counters and the statistics derived from them.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::country::CountryResolver;
use crate::metrics::{DISTINCT_IPS, HITS_TOTAL};
use crate::models::{StatsSnapshot, UNKNOWN_COUNTRY, VisitEvent};

// Per-identifier counter, `seq` records first-seen order for tie-breaks
struct HitCount {
    hits: u64,
    seq: u64,
}

/// Counters plus raw figures, before any country resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficTally {
    pub total: u64,
    pub rps: u64,
    pub ip_count: usize,
    pub most_request: Option<String>,
    pub most_frequent: Option<String>,
}

pub struct TrafficAggregator {
    total: AtomicU64,
    counters: DashMap<String, HitCount>,
    next_seq: AtomicU64,
    events: RwLock<Vec<VisitEvent>>,
    reset_interval_secs: u64,
}

impl TrafficAggregator {
    /// `events` is the visit log loaded at startup. It only feeds the
    /// log-based figure; counters always start from zero.
    pub fn new(events: Vec<VisitEvent>, reset_interval_secs: u64) -> Self {
        Self {
            total: AtomicU64::new(0),
            counters: DashMap::new(),
            next_seq: AtomicU64::new(0),
            events: RwLock::new(events),
            reset_interval_secs: reset_interval_secs.max(1),
        }
    }

    /// Bumps the identifier's counter and returns the new value.
    pub fn count_request(&self, identifier: &str) -> u64 {
        let mut entry = self
            .counters
            .entry(identifier.to_string())
            .or_insert_with(|| HitCount {
                hits: 0,
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            });
        entry.hits += 1;
        let hits = entry.hits;
        drop(entry);
        DISTINCT_IPS.set(self.counters.len() as i64);
        hits
    }

    pub fn hits_for(&self, identifier: &str) -> u64 {
        self.counters.get(identifier).map(|c| c.hits).unwrap_or(0)
    }

    /// Appends the accepted hit to the log and bumps the global total.
    pub fn record_hit(&self, identifier: &str, timestamp: DateTime<Utc>) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(VisitEvent::new(identifier, timestamp));
        self.total.fetch_add(1, Ordering::Relaxed);
        HITS_TOTAL.inc();
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn events(&self) -> Vec<VisitEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn tally(&self) -> TrafficTally {
        let total = self.total();
        TrafficTally {
            total,
            rps: total / self.reset_interval_secs,
            ip_count: self.counters.len(),
            most_request: self.most_requested(),
            most_frequent: self.most_frequent_in_log(),
        }
    }

    pub async fn compute_stats(&self, resolver: &CountryResolver) -> StatsSnapshot {
        let tally = self.tally();

        let most_country = match &tally.most_request {
            Some(ip) => resolver.resolve(ip).await,
            None => UNKNOWN_COUNTRY.to_string(),
        };
        let whois_most_frequent = match &tally.most_frequent {
            Some(ip) => resolver.resolve(ip).await,
            None => UNKNOWN_COUNTRY.to_string(),
        };

        StatsSnapshot {
            total: tally.total,
            rps: tally.rps,
            ip_count: tally.ip_count,
            most_country,
            most_request_identifier: tally.most_request.unwrap_or_default(),
            most_frequent_identifier: tally.most_frequent.unwrap_or_default(),
            whois_most_frequent_identifier: whois_most_frequent,
        }
    }

    // highest live counter, first-seen wins ties
    fn most_requested(&self) -> Option<String> {
        let mut best: Option<(u64, u64, String)> = None;
        for entry in self.counters.iter() {
            let (hits, seq) = (entry.hits, entry.seq);
            let better = match &best {
                None => true,
                Some((best_hits, best_seq, _)) => {
                    hits > *best_hits || (hits == *best_hits && seq < *best_seq)
                }
            };
            if better {
                best = Some((hits, seq, entry.key().clone()));
            }
        }
        best.map(|(_, _, ip)| ip)
    }

    // replay of the visit log, earliest first appearance wins ties
    fn most_frequent_in_log(&self) -> Option<String> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        let mut counts: HashMap<&str, (u64, usize)> = HashMap::new();
        for (idx, event) in events.iter().enumerate() {
            counts.entry(event.identifier.as_str()).or_insert((0, idx)).0 += 1;
        }

        counts
            .into_iter()
            .max_by(|(_, (a_hits, a_first)), (_, (b_hits, b_first))| {
                a_hits.cmp(b_hits).then(b_first.cmp(a_first))
            })
            .map(|(ip, _)| ip.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(traffic: &TrafficAggregator, ip: &str) {
        traffic.count_request(ip);
        traffic.record_hit(ip, Utc::now());
    }

    #[test]
    fn three_from_a_one_from_b() {
        let traffic = TrafficAggregator::new(Vec::new(), 180);
        for ip in ["a", "b", "a", "a"] {
            accept(&traffic, ip);
        }

        let tally = traffic.tally();
        assert_eq!(tally.total, 4);
        assert_eq!(tally.ip_count, 2);
        assert_eq!(tally.most_request.as_deref(), Some("a"));
        assert_eq!(tally.most_frequent.as_deref(), Some("a"));
        assert_eq!(traffic.hits_for("a"), 3);
        assert_eq!(traffic.hits_for("b"), 1);
    }

    #[test]
    fn counters_track_every_hit() {
        let traffic = TrafficAggregator::new(Vec::new(), 180);
        for n in 1..=25 {
            assert_eq!(traffic.count_request("x"), n);
        }
        assert_eq!(traffic.hits_for("x"), 25);
        assert_eq!(traffic.hits_for("nobody"), 0);
    }

    #[test]
    fn rps_is_total_over_interval() {
        let traffic = TrafficAggregator::new(Vec::new(), 180);
        for _ in 0..179 {
            accept(&traffic, "x");
        }
        assert_eq!(traffic.tally().rps, 0);
        for _ in 0..200 {
            accept(&traffic, "x");
        }
        assert_eq!(traffic.tally().total, 379);
        assert_eq!(traffic.tally().rps, 2);
    }

    #[test]
    fn ties_go_to_first_seen() {
        let traffic = TrafficAggregator::new(Vec::new(), 180);
        for ip in ["b", "a", "c", "a", "b"] {
            accept(&traffic, ip);
        }
        let tally = traffic.tally();
        assert_eq!(tally.most_request.as_deref(), Some("b"));
        assert_eq!(tally.most_frequent.as_deref(), Some("b"));
    }

    #[test]
    fn loaded_log_feeds_only_the_log_figure() {
        let loaded = vec![
            VisitEvent::new("old", Utc::now()),
            VisitEvent::new("old", Utc::now()),
            VisitEvent::new("old", Utc::now()),
        ];
        let traffic = TrafficAggregator::new(loaded, 180);
        accept(&traffic, "new");

        let tally = traffic.tally();
        assert_eq!(tally.total, 1);
        assert_eq!(tally.ip_count, 1);
        assert_eq!(tally.most_request.as_deref(), Some("new"));
        assert_eq!(tally.most_frequent.as_deref(), Some("old"));
        assert_eq!(traffic.events().len(), 4);
    }

    #[test]
    fn empty_aggregator_has_no_leaders() {
        let traffic = TrafficAggregator::new(Vec::new(), 180);
        let tally = traffic.tally();
        assert_eq!(tally.total, 0);
        assert_eq!(tally.most_request, None);
        assert_eq!(tally.most_frequent, None);
    }

    #[test]
    fn events_keep_arrival_order() {
        let traffic = TrafficAggregator::new(Vec::new(), 180);
        for ip in ["c", "a", "b"] {
            accept(&traffic, ip);
        }
        let order: Vec<_> = traffic.events().into_iter().map(|e| e.identifier).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }
}
