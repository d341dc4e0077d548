use log::*;

/// Add/remove CPU levels, rescaled once for sources that report CPU as a fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub add_level: f64,
    pub remove_level: f64,
    calibrated: bool,
}

impl Thresholds {
    pub fn new(add_level: f64, remove_level: f64) -> Self {
        Self {
            add_level,
            remove_level,
            calibrated: false,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Decide the CPU unit from the busiest process of the first batch.
    ///
    /// A value of 1 or less means the source reports fractions, so both
    /// levels are divided by 100. Only the first call has any effect; it
    /// returns true if the levels were rescaled.
    ///
    /// Note that a quiet machine whose busiest process sits at or below 1%
    /// is indistinguishable from a fractional source here.
    pub fn calibrate(&mut self, first_cpu: f64) -> bool {
        if self.calibrated {
            return false;
        }
        self.calibrated = true;
        let already_fractional = self.add_level < 1.0 && self.remove_level < 1.0;
        if first_cpu <= 1.0 && !already_fractional {
            self.add_level /= 100.0;
            self.remove_level /= 100.0;
            info!(
                target: "Watch",
                "CPU reported as a fraction, thresholds now add={} remove={}",
                self.add_level, self.remove_level
            );
            return true;
        }
        debug!(target: "Watch", "CPU reported as a percentage");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_source_keeps_levels() {
        let mut t = Thresholds::new(50.0, 25.0);
        assert!(!t.calibrate(97.0));
        assert!(t.is_calibrated());
        assert_eq!((t.add_level, t.remove_level), (50.0, 25.0));
    }

    #[test]
    fn fractional_source_rescales_levels() {
        let mut t = Thresholds::new(50.0, 25.0);
        assert!(t.calibrate(0.88));
        assert_eq!((t.add_level, t.remove_level), (0.5, 0.25));
    }

    #[test]
    fn exactly_one_counts_as_fraction() {
        let mut t = Thresholds::new(50.0, 25.0);
        assert!(t.calibrate(1.0));
        assert_eq!(t.add_level, 0.5);
    }

    #[test]
    fn calibration_happens_once() {
        let mut t = Thresholds::new(50.0, 25.0);
        t.calibrate(80.0);
        assert!(!t.calibrate(0.3));
        assert_eq!((t.add_level, t.remove_level), (50.0, 25.0));

        let mut t = Thresholds::new(50.0, 25.0);
        t.calibrate(0.3);
        assert!(!t.calibrate(0.3));
        assert_eq!((t.add_level, t.remove_level), (0.5, 0.25));
    }

    #[test]
    fn fractional_levels_are_not_rescaled_again() {
        let mut t = Thresholds::new(0.5, 0.25);
        assert!(!t.calibrate(0.9));
        assert_eq!((t.add_level, t.remove_level), (0.5, 0.25));
    }

    // Known weakness: an idle percentage-reporting host looks fractional.
    #[test]
    fn idle_percentage_host_is_misread_as_fractional() {
        let mut t = Thresholds::new(50.0, 25.0);
        assert!(t.calibrate(0.7));
        assert_eq!(t.add_level, 0.5);
    }
}
