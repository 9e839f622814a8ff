use crate::model::Sensor;

/// Latest authoritative sensor snapshot. Replaced wholesale on each
/// `sensor_update` message or periodic fetch; no partial mutation.
#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: Vec<Sensor>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, sensors: Vec<Sensor>) {
        self.sensors = sensors;
    }

    /// Fail-safe empty state used when a fetch fails.
    pub fn clear(&mut self) {
        self.sensors.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn snapshot(&self) -> Vec<Sensor> {
        self.sensors.clone()
    }

    /// Arithmetic mean of all sensor positions, for the "center map"
    /// request. `None` when the registry is empty.
    pub fn center(&self) -> Option<(f64, f64)> {
        if self.sensors.is_empty() {
            return None;
        }
        let count = self.sensors.len() as f64;
        let lat = self.sensors.iter().map(|sensor| sensor.lat).sum::<f64>() / count;
        let lon = self.sensors.iter().map(|sensor| sensor.lon).sum::<f64>() / count;
        Some((lat, lon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_arithmetic_mean() {
        let mut registry = SensorRegistry::new();
        registry.replace(vec![Sensor::new(1, 10.0, 20.0), Sensor::new(2, 30.0, 40.0)]);

        assert_eq!(registry.center(), Some((20.0, 30.0)));
    }

    #[test]
    fn center_of_empty_registry_is_none() {
        let registry = SensorRegistry::new();
        assert_eq!(registry.center(), None);
    }

    #[test]
    fn replace_is_wholesale() {
        let mut registry = SensorRegistry::new();
        registry.replace(vec![Sensor::new(1, 10.0, 20.0)]);
        registry.replace(vec![Sensor::new(2, 30.0, 40.0)]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()[0].mic_id, 2);
    }
}
