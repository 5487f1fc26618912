//! Starvation-driven growth policy

/// Decides when a starved pool grows and by how much.
///
/// A miss on acquire bumps the pool's starvation counter. Once the counter
/// reaches half the pool size (rounded up) the pool grows multiplicatively,
/// by at least one slot, never below `min_size` and never above `max_size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthPolicy {
    /// Growth factor in percent (130 = grow by 30%)
    percent: usize,
    min_size: usize,
    max_size: usize,
}

impl GrowthPolicy {
    /// Create a new growth policy
    pub fn new(factor: f64, min_size: usize, max_size: usize) -> Self {
        Self {
            percent: (factor.max(1.0) * 100.0).round() as usize,
            min_size,
            max_size,
        }
    }

    /// Number of consecutive misses that earns a permanent capacity increase
    pub fn starvation_threshold(&self, pool_size: usize) -> usize {
        pool_size.div_ceil(2)
    }

    /// Whether the given miss count warrants growing a pool of `pool_size`
    pub fn should_grow(&self, starvation: usize, pool_size: usize) -> bool {
        starvation >= self.starvation_threshold(pool_size)
    }

    /// Size to grow to, or `None` when the pool is already at its ceiling
    pub fn next_size(&self, current: usize) -> Option<usize> {
        if current >= self.max_size {
            return None;
        }
        let scaled = (current * self.percent).div_ceil(100);
        Some(
            scaled
                .max(current + 1)
                .max(self.min_size)
                .min(self.max_size),
        )
    }
}
