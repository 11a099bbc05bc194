/// Endpoint registry
///
/// Entries are never removed; `is_active` gates selection. Only the health
/// monitor records results, everyone else reads snapshots.
use super::types::EndpointDescriptor;
use crate::config::EndpointConfig;
use parking_lot::RwLock;
use std::cmp::Ordering;

pub struct EndpointRegistry {
    entries: RwLock<Vec<EndpointDescriptor>>,
}

/// Priority ascending, then latency ascending, then success rate descending
fn preference(a: &EndpointDescriptor, b: &EndpointDescriptor) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then(a.last_latency_ms.cmp(&b.last_latency_ms))
        .then(b.success_rate.cmp(&a.success_rate))
}

impl EndpointRegistry {
    pub fn new(entries: Vec<EndpointDescriptor>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn from_config(endpoints: &[EndpointConfig]) -> Self {
        Self::new(endpoints.iter().map(EndpointDescriptor::from).collect())
    }

    /// Persisted entries keep their health; configured endpoints missing from
    /// the database are appended
    pub fn from_persisted(persisted: Vec<EndpointDescriptor>, configured: &[EndpointConfig]) -> Self {
        let mut entries = persisted;
        for config in configured {
            if !entries.iter().any(|e| e.name == config.name) {
                entries.push(EndpointDescriptor::from(config));
            }
        }
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn get(&self, name: &str) -> Option<EndpointDescriptor> {
        self.entries.read().iter().find(|e| e.name == name).cloned()
    }

    /// Registration order copy, used for persistence
    pub fn snapshot(&self) -> Vec<EndpointDescriptor> {
        self.entries.read().clone()
    }

    pub fn list_by_priority(&self) -> Vec<EndpointDescriptor> {
        let mut entries = self.snapshot();
        entries.sort_by(preference);
        entries
    }

    /// Record a probe outcome, returns false for unknown names
    pub fn record_result(&self, name: &str, healthy: bool, latency_ms: u64) -> bool {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.record_result(healthy, latency_ms);
                true
            }
            None => false,
        }
    }

    /// Active endpoints other than `exclude`, best first
    ///
    /// With nothing active the single most preferred tier entry is returned
    /// regardless of health, so the caller always has something to try.
    pub fn failover_candidates(&self, exclude: Option<&str>) -> Vec<EndpointDescriptor> {
        let ordered = self.list_by_priority();

        let active: Vec<EndpointDescriptor> = ordered
            .iter()
            .filter(|e| e.is_active && Some(e.name.as_str()) != exclude)
            .cloned()
            .collect();
        if !active.is_empty() {
            return active;
        }

        ordered
            .iter()
            .find(|e| Some(e.name.as_str()) != exclude)
            .or_else(|| ordered.first())
            .cloned()
            .into_iter()
            .collect()
    }

    /// Best endpoint to start with
    pub fn best(&self) -> Option<EndpointDescriptor> {
        self.failover_candidates(None).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(name: &str, priority: i32) -> EndpointDescriptor {
        EndpointDescriptor::new(name, &format!("https://{}", name), "", priority)
    }

    #[test]
    fn ordering_priority_then_latency_then_success() {
        let mut slow = endpoint("slow", 1);
        slow.last_latency_ms = 300;
        let mut fast = endpoint("fast", 1);
        fast.last_latency_ms = 50;
        let mut flaky = endpoint("flaky", 1);
        flaky.last_latency_ms = 50;
        flaky.success_rate = 60;
        let backup = endpoint("backup", 2);

        let registry = EndpointRegistry::new(vec![backup, slow, flaky, fast]);
        let names: Vec<String> = registry
            .list_by_priority()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["fast", "flaky", "slow", "backup"]);
    }

    #[test]
    fn record_result_updates_named_entry() {
        let registry = EndpointRegistry::new(vec![endpoint("a", 1), endpoint("b", 1)]);
        assert!(registry.record_result("a", false, 3000));
        assert!(!registry.record_result("missing", true, 1));

        let a = registry.get("a").unwrap();
        assert!(!a.is_active);
        assert_eq!(a.success_rate, 95);
        assert!(registry.get("b").unwrap().is_active);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn failover_skips_inactive_and_excluded() {
        // priorities [1,1,2] with the first inactive
        let registry = EndpointRegistry::new(vec![
            endpoint("first", 1),
            endpoint("second", 1),
            endpoint("third", 2),
        ]);
        registry.record_result("first", false, 3000);
        registry.record_result("second", true, 100);
        registry.record_result("third", true, 100);

        let candidates = registry.failover_candidates(Some("first"));
        assert_eq!(candidates[0].name, "second");
        assert_eq!(candidates.len(), 2);

        let candidates = registry.failover_candidates(Some("second"));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "third");
    }

    #[test]
    fn failover_with_nothing_active_returns_single_preferred_entry() {
        let registry = EndpointRegistry::new(vec![
            endpoint("tier2", 2),
            endpoint("tier1", 1),
            endpoint("tier3", 3),
        ]);
        for name in ["tier1", "tier2", "tier3"] {
            registry.record_result(name, false, 3000);
        }

        let candidates = registry.failover_candidates(None);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "tier1");

        let candidates = registry.failover_candidates(Some("tier1"));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "tier2");
    }

    #[test]
    fn persisted_entries_are_merged_with_config() {
        let mut persisted = endpoint("Ankr", 2);
        persisted.success_rate = 40;
        let configured = vec![
            EndpointConfig {
                name: "Ankr".to_string(),
                http_url: "https://rpc.ankr.com/solana".to_string(),
                ws_url: String::new(),
                priority: 2,
            },
            EndpointConfig {
                name: "New".to_string(),
                http_url: "https://new.example".to_string(),
                ws_url: String::new(),
                priority: 1,
            },
        ];

        let registry = EndpointRegistry::from_persisted(vec![persisted], &configured);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Ankr").unwrap().success_rate, 40);
        assert_eq!(registry.best().unwrap().name, "New");
    }
}
