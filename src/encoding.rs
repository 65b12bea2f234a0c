//! High/low float splitting for precise rendering of large coordinates.
//!
//! A world-scale `f64` coordinate loses centimetres when cast to `f32`. Each
//! coordinate is split into a `high` part, a multiple of 65536, and a `low`
//! remainder. Both fit in `f32` without meaningful loss, and a shader can
//! subtract the eye position's high and low parts separately before adding
//! them back together.

const SPLIT: f64 = 65536.0;

/// One coordinate split into single-precision parts.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EncodedCoordinate {
    pub high: f32,
    pub low: f32,
}

impl EncodedCoordinate {
    pub fn encode(value: f64) -> Self {
        let high = if value >= 0.0 {
            libm::floor(value / SPLIT) * SPLIT
        } else {
            -libm::floor(-value / SPLIT) * SPLIT
        };
        EncodedCoordinate {
            high: high as f32,
            low: (value - high) as f32,
        }
    }

    pub fn decode(self) -> f64 {
        self.high as f64 + self.low as f64
    }
}

/// Encode every value of `values` into the matching slots of `high` and `low`.
///
/// All three slices must have the same length.
pub fn encode_into(values: &[f64], high: &mut [f32], low: &mut [f32]) {
    debug_assert_eq!(values.len(), high.len());
    debug_assert_eq!(values.len(), low.len());
    for ((value, h), l) in values.iter().zip(high.iter_mut()).zip(low.iter_mut()) {
        let encoded = EncodedCoordinate::encode(*value);
        *h = encoded.high;
        *l = encoded.low;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_have_no_high_part() {
        let e = EncodedCoordinate::encode(1234.5);
        assert_eq!(e.high, 0.0);
        assert_eq!(e.low, 1234.5);
    }

    #[test]
    fn high_part_is_a_multiple_of_the_split() {
        let e = EncodedCoordinate::encode(6_378_137.25);
        assert_eq!(e.high, 6_356_992.0);
        assert_eq!(e.low, 21_145.25);
        assert_eq!(e.decode(), 6_378_137.25);
    }

    #[test]
    fn negative_values_keep_their_sign() {
        let e = EncodedCoordinate::encode(-100_000.0);
        assert_eq!(e.high, -65_536.0);
        assert_eq!(e.low, -34_464.0);
    }

    #[test]
    fn zero_encodes_to_zero() {
        let e = EncodedCoordinate::encode(0.0);
        assert_eq!(e.decode(), 0.0);
        let e = EncodedCoordinate::encode(-0.0);
        assert_eq!(e.decode(), 0.0);
    }

    #[test]
    fn encode_into_fills_slices() {
        let values = [70_000.0, -5.0];
        let mut high = [0.0f32; 2];
        let mut low = [0.0f32; 2];
        encode_into(&values, &mut high, &mut low);
        assert_eq!(high, [65_536.0, 0.0]);
        assert_eq!(low, [4_464.0, -5.0]);
    }
}
