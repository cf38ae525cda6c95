//! Fixed-capacity sample history with on-demand statistics
//!
//! `SeriesBuffer` keeps the most recent samples of a single series in a ring.
//! Every query works on the current contents only and reports `None` instead
//! of failing when it has nothing meaningful to say.

use std::time::Duration;

/// Direction of a series over its retained window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Single-character arrow used by the dashboard
    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "→",
        }
    }
}

/// Ring buffer of `f64` samples, oldest overwritten first
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    data: Vec<f64>,
    /// Next write position
    head: usize,
    len: usize,
}

impl SeriesBuffer {
    /// Create an empty buffer holding at most `capacity` samples
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a sample, overwriting the oldest one when full
    ///
    /// Values are stored verbatim, NaN and infinities included.
    pub fn push(&mut self, value: f64) {
        let capacity = self.capacity();
        self.data[self.head] = value;
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    /// Iterate over retained samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).map(move |i| self.data[(start + i) % capacity])
    }

    /// Copy of the retained samples, oldest first
    pub fn values(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Most recently pushed sample
    pub fn latest(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let capacity = self.capacity();
        Some(self.data[(self.head + capacity - 1) % capacity])
    }

    fn oldest(&self) -> Option<f64> {
        self.iter().next()
    }

    pub fn min(&self) -> Option<f64> {
        let mut iter = self.iter();
        let first = iter.next()?;
        Some(iter.fold(first, |min, v| if v < min { v } else { min }))
    }

    pub fn max(&self) -> Option<f64> {
        let mut iter = self.iter();
        let first = iter.next()?;
        Some(iter.fold(first, |max, v| if v > max { v } else { max }))
    }

    /// Arithmetic mean
    pub fn avg(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.iter().sum::<f64>() / self.len as f64)
    }

    /// Middle value, or the mean of the two middle values for even counts
    pub fn median(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let sorted = self.sorted();
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            Some(sorted[mid])
        } else {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        }
    }

    /// Percentile by linear interpolation between order statistics
    ///
    /// # Arguments
    /// * `p` - Percentile in `[0, 100]`; `0` is the minimum and `100` the maximum
    ///
    /// # Returns
    /// `None` if `p` is out of range or the buffer is empty
    ///
    /// # Algorithm
    /// 1. Sort samples ascending
    /// 2. Fractional rank `r = p / 100 * (n - 1)`
    /// 3. Interpolate between `sorted[floor(r)]` and `sorted[ceil(r)]`
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if !(0.0..=100.0).contains(&p) || self.is_empty() {
            return None;
        }
        let sorted = self.sorted();
        let rank = p / 100.0 * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let frac = rank - lo as f64;
        Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
    }

    /// Population standard deviation (divides by `n`)
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.avg()?;
        let variance = self
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / self.len as f64;
        Some(variance.sqrt())
    }

    /// Coefficient of variation, `std_dev / avg`
    ///
    /// Absent when the mean is exactly zero.
    pub fn cv(&self) -> Option<f64> {
        let mean = self.avg()?;
        if mean == 0.0 {
            return None;
        }
        Some(self.std_dev()? / mean)
    }

    /// Compare the mean of the first and last few samples
    ///
    /// The window is `min(3, n / 2)` samples on each side. A change must
    /// exceed `max(5% of the first mean, 0.01)` to count as a move.
    pub fn trend(&self) -> Trend {
        if self.len < 2 {
            return Trend::Flat;
        }
        let values = self.values();
        let n = values.len();
        let window = (n / 2).clamp(1, 3);

        let first = mean(&values[..window]);
        let last = mean(&values[n - window..]);
        let threshold = (first * 0.05).max(0.01);
        let delta = last - first;

        if delta > threshold {
            Trend::Up
        } else if delta < -threshold {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    /// Average change per second across the window
    ///
    /// Samples are assumed to be `interval` apart; real sample timestamps
    /// are not tracked.
    pub fn rate(&self, interval: Duration) -> Option<f64> {
        if self.len < 2 || interval.is_zero() {
            return None;
        }
        let span = (self.len - 1) as f64 * interval.as_secs_f64();
        Some((self.latest()? - self.oldest()?) / span)
    }

    fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.values();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
