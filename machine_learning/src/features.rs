use serde::{Deserialize, Serialize};

/// The amount of input features every model is trained and scored with.
pub const NUM_FEATURES: usize = 4;

/// The canonical feature names, in the column order used for training and scoring.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "distance",
    "elevation_gain",
    "vehicle_efficiency",
    "battery_capacity",
];

/// The inputs describing a single route segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Distance in kilometers.
    pub distance: f64,
    /// Elevation gain in meters, negative when going downhill.
    pub elevation_gain: f64,
    /// Vehicle efficiency rating in kWh/km.
    pub vehicle_efficiency: f64,
    /// Battery capacity in kWh.
    pub battery_capacity: f64,
}

impl FeatureVector {
    /// Creates a new `FeatureVector`.
    pub fn new(
        distance: f64,
        elevation_gain: f64,
        vehicle_efficiency: f64,
        battery_capacity: f64,
    ) -> Self {
        Self {
            distance,
            elevation_gain,
            vehicle_efficiency,
            battery_capacity,
        }
    }

    /// Returns the features as a row following the `FEATURE_NAMES` order.
    pub fn to_row(&self) -> [f64; NUM_FEATURES] {
        [
            self.distance,
            self.elevation_gain,
            self.vehicle_efficiency,
            self.battery_capacity,
        ]
    }

    /// Checks the physical constraints of the segment.
    ///
    /// # Returns
    /// The reason of the first violated constraint, if any.
    pub fn validate(&self) -> Result<(), &'static str> {
        // negated comparisons so that NaN is rejected as well
        if !(self.distance > 0.0) {
            return Err("Distance must be positive");
        }

        if !(self.battery_capacity > 0.0) {
            return Err("Battery capacity must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_follows_feature_names_order() {
        let features = FeatureVector::new(50.0, 100.0, 0.2, 60.0);
        assert_eq!(features.to_row(), [50.0, 100.0, 0.2, 60.0]);
    }

    #[test]
    fn validate_rejects_non_positive_distance() {
        for distance in [0.0, -1.0, f64::NAN] {
            let features = FeatureVector::new(distance, 0.0, 0.2, 60.0);
            assert_eq!(features.validate(), Err("Distance must be positive"));
        }
    }

    #[test]
    fn validate_rejects_non_positive_battery() {
        for battery in [0.0, -60.0] {
            let features = FeatureVector::new(10.0, 0.0, 0.2, battery);
            assert_eq!(features.validate(), Err("Battery capacity must be positive"));
        }
    }

    #[test]
    fn validate_checks_distance_first() {
        let features = FeatureVector::new(0.0, 0.0, 0.2, 0.0);
        assert_eq!(features.validate(), Err("Distance must be positive"));
    }

    #[test]
    fn validate_accepts_downhill_segments() {
        let features = FeatureVector::new(10.0, -100.0, 0.0, 40.0);
        assert!(features.validate().is_ok());
    }
}
