use drape::encoding::encode_into;
use drape::EncodedCoordinate;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// high + low reconstructs the input to single-precision accuracy.
    #[test]
    fn round_trip_within_f32_precision(value in -1.0e8f64..1.0e8) {
        let decoded = EncodedCoordinate::encode(value).decode();
        let tolerance = value.abs().max(1.0) * f32::EPSILON as f64;
        prop_assert!((decoded - value).abs() <= tolerance, "{} decoded as {}", value, decoded);
    }

    /// Both halves share the sign of the input.
    #[test]
    fn parts_share_sign(value in -1.0e8f64..1.0e8) {
        let e = EncodedCoordinate::encode(value);
        if value < 0.0 {
            prop_assert!(e.high <= 0.0 && e.low <= 0.0);
        } else {
            prop_assert!(e.high >= 0.0 && e.low >= 0.0);
        }
    }

    /// The high part carries no bits below 2^16.
    #[test]
    fn high_is_multiple_of_split(value in -1.0e8f64..1.0e8) {
        let high = EncodedCoordinate::encode(value).high as f64;
        prop_assert_eq!(high % 65536.0, 0.0);
    }
}

#[test]
fn earth_scale_coordinate_keeps_centimetres() {
    let value = -4_510_023.123_456;
    let decoded = EncodedCoordinate::encode(value).decode();
    assert!((decoded - value).abs() < 1e-2);
    // A plain cast loses far more.
    assert!(((value as f32) as f64 - value).abs() > 0.1);
}

#[test]
fn slice_encoding_matches_single_values() {
    let values = [0.0, -0.0, 1.5, -70_000.25, 6_378_137.0, -6_378_137.0];
    let mut high = [0.0f32; 6];
    let mut low = [0.0f32; 6];
    encode_into(&values, &mut high, &mut low);
    for (i, value) in values.iter().enumerate() {
        assert_eq!(EncodedCoordinate::encode(*value), EncodedCoordinate { high: high[i], low: low[i] });
    }
}
