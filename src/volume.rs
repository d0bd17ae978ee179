use crate::storage::KeyValueStore;

/// Storage key of the last used volume.
pub const VOLUME_KEY: &str = "doas_v";

/// Default change per volume button press.
pub const DEFAULT_STEP: f32 = 0.1;

/// Output volume in `[0, 1]`, kept at two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume(f32);

impl Volume {
    pub const MIN: Volume = Volume(0.0);
    pub const MAX: Volume = Volume(1.0);

    pub fn new(level: f32) -> Self {
        if !level.is_finite() {
            return Volume::MAX;
        }
        Volume(round2(level.clamp(0.0, 1.0)))
    }

    pub fn level(&self) -> f32 {
        self.0
    }

    pub fn up(self, step: f32) -> Self {
        Volume::new(self.0 + step)
    }

    pub fn down(self, step: f32) -> Self {
        Volume::new(self.0 - step)
    }

    /// Number of lit segments on the ten-segment volume meter.
    pub fn meter_segments(&self) -> usize {
        (self.0 * 10.0 - 1e-4).ceil().max(0.0) as usize
    }

    /// Stored form, e.g. `"0.50"`.
    pub fn to_storage(&self) -> String {
        format!("{:.2}", self.0)
    }

    pub fn from_storage(s: &str) -> Result<Self, String> {
        s.trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Volume::new)
            .ok_or_else(|| format!("Invalid stored volume '{}'", s))
    }

    /// Last volume saved in `store`, if any and readable.
    pub fn load(store: &KeyValueStore) -> Option<Self> {
        store.get(VOLUME_KEY).and_then(|s| Volume::from_storage(s).ok())
    }

    pub fn save(&self, store: &mut KeyValueStore) -> Result<(), String> {
        store.set(VOLUME_KEY, self.to_storage())
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume::MAX
    }
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_clamps_at_zero() {
        let mut v = Volume::new(0.05);
        for _ in 0..5 {
            v = v.down(DEFAULT_STEP);
            assert!(v.level() >= 0.0);
        }
        assert_eq!(v.level(), 0.0);
    }

    #[test]
    fn increment_clamps_at_one() {
        let mut v = Volume::new(0.95);
        for _ in 0..5 {
            v = v.up(DEFAULT_STEP);
            assert!(v.level() <= 1.0);
        }
        assert_eq!(v.level(), 1.0);
    }

    #[test]
    fn steps_do_not_drift() {
        let mut v = Volume::MIN;
        for _ in 0..3 {
            v = v.up(DEFAULT_STEP);
        }
        assert_eq!(v.to_storage(), "0.30");
        assert_eq!(v.meter_segments(), 3);
    }

    #[test]
    fn meter_rounds_partial_segments_up() {
        assert_eq!(Volume::new(0.0).meter_segments(), 0);
        assert_eq!(Volume::new(0.05).meter_segments(), 1);
        assert_eq!(Volume::new(1.0).meter_segments(), 10);
    }

    #[test]
    fn storage_format() {
        assert_eq!(Volume::new(0.5).to_storage(), "0.50");
        assert_eq!(Volume::from_storage("0.75").unwrap().level(), 0.75);
        assert_eq!(Volume::from_storage("7").unwrap().level(), 1.0);
        assert!(Volume::from_storage("loud").is_err());
        assert!(Volume::from_storage("NaN").is_err());
    }

    #[test]
    fn load_and_save_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = KeyValueStore::open(&dir.path().join("storage.json"));
        assert!(Volume::load(&store).is_none());
        Volume::new(0.4).save(&mut store).unwrap();
        assert_eq!(Volume::load(&store), Some(Volume::new(0.4)));
    }
}
