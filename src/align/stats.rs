use std::fmt;

/// Number of histogram bins; larger offsets land in the last bin
pub const HISTOGRAM_BINS: usize = 100;

/// Traceback statistics accumulated by one aligner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentStats {
    max_offset_histogram: [u64; HISTOGRAM_BINS],
    offset_too_big: u64,
}

impl Default for AlignmentStats {
    fn default() -> Self {
        Self {
            max_offset_histogram: [0; HISTOGRAM_BINS],
            offset_too_big: 0,
        }
    }
}

impl AlignmentStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the largest diagonal offset seen along an accepted traceback
    pub fn record_offset(&mut self, max_offset: usize) {
        self.max_offset_histogram[max_offset.min(HISTOGRAM_BINS - 1)] += 1;
    }

    /// Records a traceback rejected for drifting beyond the band
    pub fn record_offset_too_big(&mut self) {
        self.offset_too_big += 1;
    }

    /// Number of accepted tracebacks whose largest offset was `offset`
    #[must_use]
    pub fn offset_count(&self, offset: usize) -> u64 {
        self.max_offset_histogram
            .get(offset)
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn offset_too_big(&self) -> u64 {
        self.offset_too_big
    }

    /// Total number of tracebacks recorded
    #[must_use]
    pub fn total(&self) -> u64 {
        self.max_offset_histogram.iter().sum::<u64>() + self.offset_too_big
    }

    /// Adds the counts of another set of statistics
    pub fn merge(&mut self, other: &Self) {
        self.max_offset_histogram
            .iter_mut()
            .zip(other.max_offset_histogram.iter())
            .for_each(|(a, b)| *a += b);
        self.offset_too_big += other.offset_too_big;
    }
}

impl fmt::Display for AlignmentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Maximum offset Histogram")?;
        for (offset, count) in self.max_offset_histogram.iter().enumerate().rev() {
            if *count > 0 {
                writeln!(f, "{offset} = {count}")?;
            }
        }
        write!(f, "Exceeded maxShift offset: {}", self.offset_too_big)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut stats = AlignmentStats::new();
        stats.record_offset(4);
        stats.record_offset(0);
        stats.record_offset(4);
        stats.record_offset(1);
        stats.record_offset_too_big();
        assert_eq!(
            stats.to_string(),
            "Maximum offset Histogram\n4 = 2\n1 = 1\n0 = 1\nExceeded maxShift offset: 1"
        );
    }

    #[test]
    fn test_saturating_bin() {
        let mut stats = AlignmentStats::new();
        stats.record_offset(99);
        stats.record_offset(250);
        assert_eq!(stats.offset_count(99), 2);
        assert_eq!(stats.offset_count(250), 0);
    }

    #[test]
    fn test_merge() {
        let mut a = AlignmentStats::new();
        a.record_offset(2);
        let mut b = AlignmentStats::new();
        b.record_offset(2);
        b.record_offset(7);
        b.record_offset_too_big();
        a.merge(&b);
        assert_eq!(a.offset_count(2), 2);
        assert_eq!(a.offset_count(7), 1);
        assert_eq!(a.offset_too_big(), 1);
        assert_eq!(a.total(), 4);
    }
}
