use tzf_rs::DefaultFinder;

/// Used when a coordinate falls outside every known zone (open ocean, poles).
pub const FALLBACK_TIMEZONE: &str = "GMT";

/// Offline coordinate to IANA zone lookup.
///
/// Building the finder loads the boundary data, so create one per process
/// and share it.
pub struct TimezoneLookup {
    finder: DefaultFinder,
}

impl TimezoneLookup {
    pub fn new() -> Self {
        Self {
            finder: DefaultFinder::new(),
        }
    }

    pub fn zone_for(&self, lat: f64, lng: f64) -> String {
        match self.finder.get_tz_name(lng, lat) {
            "" => FALLBACK_TIMEZONE.to_string(),
            name => name.to_string(),
        }
    }
}

impl Default for TimezoneLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denver_zone() {
        let lookup = TimezoneLookup::new();
        assert_eq!(lookup.zone_for(39.74, -104.99), "America/Denver");
    }

    #[test]
    fn test_new_york_zone() {
        let lookup = TimezoneLookup::new();
        assert_eq!(lookup.zone_for(40.71, -74.0), "America/New_York");
    }
}
