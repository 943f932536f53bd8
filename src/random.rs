/// A source of uniform random numbers used to seed and respawn particles
pub trait RandomSource {
    /// A uniform value in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// A uniform value in `[min, max)`
    fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_unit() * (max - min)
    }
}

impl RandomSource for fastrand::Rng {
    fn next_unit(&mut self) -> f64 {
        self.f64()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Replays a fixed list of values, wrapping around when exhausted
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    /// Values outside `[0, 1)` are clamped into it; an empty list always yields 0.
    pub fn new(values: Vec<f64>) -> Self {
        let values = values.into_iter().map(|v| v.clamp(0.0, 1.0 - f64::EPSILON)).collect();
        Self { values, cursor: 0 }
    }

    /// How many values have been drawn so far
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_wraps() {
        let mut source = SequenceSource::new(vec![0.1, 0.2]);
        let drawn: Vec<_> = (0..5).map(|_| source.next_unit()).collect();
        assert_eq!(drawn, vec![0.1, 0.2, 0.1, 0.2, 0.1]);
        assert_eq!(source.drawn(), 5);
    }

    #[test]
    fn range_maps_unit_interval() {
        let mut source = SequenceSource::new(vec![0.0, 0.5]);
        assert_eq!(source.range(50.0, 150.0), 50.0);
        assert_eq!(source.range(50.0, 150.0), 100.0);
    }

    #[test]
    fn seeded_rng_is_in_unit_interval() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..1000 {
            let value = rng.next_unit();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn empty_sequence_yields_zero() {
        let mut source = SequenceSource::new(Vec::new());
        assert_eq!(source.next_unit(), 0.0);
    }
}
