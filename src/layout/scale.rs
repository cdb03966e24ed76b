//! Invertible linear scales between an index domain and a pixel range.

/// A linear mapping from `domain` onto `range`.
///
/// Either interval may be given in descending order; the mapping sends
/// `domain.0` to `range.0` and `domain.1` to `range.1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Map a domain value to the range.
    ///
    /// A degenerate domain maps everything to `range.0`.
    pub fn apply(&self, value: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span == 0.0 {
            return self.range.0;
        }
        self.range.0 + (value - self.domain.0) * (self.range.1 - self.range.0) / span
    }

    /// Map a range value back to the domain.
    ///
    /// Returns `None` when the range is degenerate (zero pixels wide), since
    /// no domain value can be recovered from it.
    pub fn invert(&self, pixel: f64) -> Option<f64> {
        let span = self.range.1 - self.range.0;
        if span == 0.0 {
            return None;
        }
        // Multiply before dividing so tile-aligned pixels invert to exact integers
        Some(self.domain.0 + (pixel - self.range.0) * (self.domain.1 - self.domain.0) / span)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_invert() {
        let scale = LinearScale::new((0.0, 4.0), (0.0, 100.0));
        assert_eq!(scale.apply(1.0), 25.0);
        assert_eq!(scale.invert(50.0), Some(2.0));
    }

    #[test]
    fn test_descending_domain() {
        // Both intervals descending: still maps 0 to 0 and n to h
        let scale = LinearScale::new((3.0, 0.0), (30.0, 0.0));
        assert_eq!(scale.apply(0.0), 0.0);
        assert_eq!(scale.apply(3.0), 30.0);
        assert_eq!(scale.invert(15.0), Some(1.5));
    }

    #[test]
    fn test_degenerate() {
        let scale = LinearScale::new((0.0, 0.0), (0.0, 0.0));
        assert_eq!(scale.invert(5.0), None);
        assert_eq!(scale.apply(5.0), 0.0);
    }
}
