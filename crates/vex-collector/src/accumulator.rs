//! Cycle-scoped sample accumulator.
//!
//! Created fresh for every scrape cycle and handed to the fan-out by
//! reference, so two cycles never share one. The lock is only taken to
//! append a finished batch, never across a fetch.

use std::sync::Arc;

use tokio::sync::Mutex;

use vex_core::Sample;

#[derive(Debug, Clone, Default)]
pub struct SampleAccumulator {
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl SampleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one task's samples.
    pub async fn extend(&self, batch: Vec<Sample>) {
        if batch.is_empty() {
            return;
        }
        self.samples.lock().await.extend(batch);
    }

    pub async fn len(&self) -> usize {
        self.samples.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.samples.lock().await.is_empty()
    }

    /// Take every collected sample, leaving the accumulator empty.
    pub async fn drain(&self) -> Vec<Sample> {
        std::mem::take(&mut *self.samples.lock().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vex_core::MetricName;

    fn availability(site: &str) -> Sample {
        Sample::new(MetricName::SitesAvailabilityPercent, 100.0, ["acme", site]).unwrap()
    }

    #[tokio::test]
    async fn drain_empties_the_accumulator() {
        let acc = SampleAccumulator::new();
        acc.extend(vec![availability("NYC"), availability("SFO")]).await;
        assert_eq!(acc.len().await, 2);

        let drained = acc.drain().await;
        assert_eq!(drained.len(), 2);
        assert!(acc.is_empty().await);
        assert!(acc.drain().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let acc = SampleAccumulator::new();
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..64 {
            let acc = acc.clone();
            tasks.spawn(async move {
                acc.extend(vec![availability(&format!("site-{i}")); 3]).await;
            });
        }
        while tasks.join_next().await.is_some() {}

        assert_eq!(acc.len().await, 64 * 3);
    }

    #[tokio::test]
    async fn separate_accumulators_are_isolated() {
        let first = SampleAccumulator::new();
        let second = SampleAccumulator::new();
        first.extend(vec![availability("NYC")]).await;

        assert_eq!(first.len().await, 1);
        assert!(second.is_empty().await);
    }
}
