// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Latency accumulator shared by server-wide and per-connection statistics.

/// Point-in-time latency figures in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencySnapshot {
    pub count: u64,
    pub min: u64,
    pub avg: u64,
    pub max: u64,
}

/// Running min/avg/max over latency samples.
///
/// Not synchronized on its own; owners keep it behind the same lock as the
/// counters reported alongside it so resets are never observed half-done.
#[derive(Debug, Clone)]
pub struct LatencyStats {
    count: u64,
    total: u64,
    min: u64,
    max: u64,
}

impl LatencyStats {
    pub const fn new() -> Self {
        Self {
            count: 0,
            total: 0,
            min: u64::MAX,
            max: 0,
        }
    }

    pub fn add(&mut self, latency_ms: u64) {
        self.count += 1;
        self.total = self.total.saturating_add(latency_ms);
        self.min = self.min.min(latency_ms);
        self.max = self.max.max(latency_ms);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Min reads as 0 while no sample has been recorded.
    pub fn snapshot(&self) -> LatencySnapshot {
        if self.count == 0 {
            return LatencySnapshot::default();
        }
        LatencySnapshot {
            count: self.count,
            min: self.min,
            avg: self.total / self.count,
            max: self.max,
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_is_zero() {
        let stats = LatencyStats::new();
        assert_eq!(stats.snapshot(), LatencySnapshot::default());
    }

    #[test]
    fn test_min_avg_max() {
        let mut stats = LatencyStats::new();
        for latency in [4, 10, 1] {
            stats.add(latency);
        }
        let snap = stats.snapshot();
        assert_eq!(snap.count, 3);
        assert_eq!(snap.min, 1);
        assert_eq!(snap.avg, 5);
        assert_eq!(snap.max, 10);
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut stats = LatencyStats::new();
        stats.add(7);
        stats.reset();
        assert_eq!(stats.snapshot(), LatencySnapshot::default());
        stats.add(3);
        assert_eq!(stats.snapshot().min, 3);
    }
}
