use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Dawn,
    Day,
    Dusk,
    Night,
}

impl TimeOfDay {
    /// Phase for a position in the day, where 0.0 is midnight.
    ///
    /// Night [0.0, 0.2), Dawn [0.2, 0.3), Day [0.3, 0.7), Dusk [0.7, 0.8), Night [0.8, 1.0).
    pub fn from_fraction(fraction: f32) -> TimeOfDay {
        let f = fraction.rem_euclid(1.0);
        if f < 0.2 {
            TimeOfDay::Night
        } else if f < 0.3 {
            TimeOfDay::Dawn
        } else if f < 0.7 {
            TimeOfDay::Day
        } else if f < 0.8 {
            TimeOfDay::Dusk
        } else {
            TimeOfDay::Night
        }
    }

    pub fn next(self) -> TimeOfDay {
        match self {
            TimeOfDay::Dawn => TimeOfDay::Day,
            TimeOfDay::Day => TimeOfDay::Dusk,
            TimeOfDay::Dusk => TimeOfDay::Night,
            TimeOfDay::Night => TimeOfDay::Dawn,
        }
    }

    /// Darkness of the lighting overlay, 0.0 (none) to 1.0 (opaque).
    pub fn overlay_alpha(self) -> f32 {
        match self {
            TimeOfDay::Day => 0.0,
            TimeOfDay::Dawn | TimeOfDay::Dusk => 0.3,
            TimeOfDay::Night => 0.6,
        }
    }

    pub fn ambient_track(self) -> &'static str {
        match self {
            TimeOfDay::Dawn => "birdsong",
            TimeOfDay::Day => "daytime",
            TimeOfDay::Dusk => "crickets",
            TimeOfDay::Night => "night_wind",
        }
    }
}

/// In-game time of day, advancing continuously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayClock {
    /// Seconds elapsed since day 0 midnight.
    pub elapsed: f64,
    pub day_length: f64,
}

impl DayClock {
    pub fn new(day_length: f32, start_fraction: f32) -> Self {
        let day_length = day_length.max(f32::EPSILON) as f64;
        Self {
            elapsed: day_length * start_fraction.clamp(0.0, 1.0) as f64,
            day_length,
        }
    }

    /// Position in the current day, 0.0 = midnight.
    pub fn fraction(&self) -> f32 {
        (self.elapsed.rem_euclid(self.day_length) / self.day_length) as f32
    }

    /// Seconds into the current day.
    pub fn day_time(&self) -> f64 {
        self.elapsed.rem_euclid(self.day_length)
    }

    pub fn day(&self) -> u64 {
        (self.elapsed / self.day_length).floor() as u64
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_fraction(self.fraction())
    }

    /// Advance by `dt` seconds. Returns the phase transitions crossed, in order.
    pub fn advance(&mut self, dt: f32) -> Vec<(TimeOfDay, TimeOfDay)> {
        if dt <= 0.0 {
            return Vec::new();
        }
        let mut transitions = Vec::new();
        let mut current = self.time_of_day();
        let target = self.elapsed + dt as f64;

        // Walk phase boundaries so a long step still reports every transition.
        loop {
            let (boundary, phase) = self.next_boundary();
            if boundary > target {
                break;
            }
            self.elapsed = boundary;
            if phase != current {
                transitions.push((current, phase));
                current = phase;
            }
        }
        self.elapsed = target;
        transitions
    }

    /// Continuous light level, 1.0 at noon and 0.0 at midnight.
    pub fn light_level(&self) -> f32 {
        let angle = self.fraction() as f64 * std::f64::consts::TAU;
        (0.5 - 0.5 * angle.cos()) as f32
    }

    /// Time of the next phase boundary after `elapsed`, and the phase it starts.
    fn next_boundary(&self) -> (f64, TimeOfDay) {
        const BOUNDARIES: [(f64, TimeOfDay); 5] = [
            (0.2, TimeOfDay::Dawn),
            (0.3, TimeOfDay::Day),
            (0.7, TimeOfDay::Dusk),
            (0.8, TimeOfDay::Night),
            (1.0, TimeOfDay::Night),
        ];
        let day_start = (self.elapsed / self.day_length).floor() * self.day_length;
        BOUNDARIES
            .iter()
            .map(|&(b, phase)| (day_start + b * self.day_length, phase))
            .find(|&(t, _)| t > self.elapsed + 1e-9)
            .unwrap_or((day_start + 1.2 * self.day_length, TimeOfDay::Dawn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_maps_to_phases() {
        assert_eq!(TimeOfDay::from_fraction(0.0), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_fraction(0.25), TimeOfDay::Dawn);
        assert_eq!(TimeOfDay::from_fraction(0.5), TimeOfDay::Day);
        assert_eq!(TimeOfDay::from_fraction(0.75), TimeOfDay::Dusk);
        assert_eq!(TimeOfDay::from_fraction(0.9), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_fraction(1.25), TimeOfDay::Dawn);
    }

    #[test]
    fn phases_cycle() {
        let mut phase = TimeOfDay::Dawn;
        for _ in 0..4 {
            phase = phase.next();
        }
        assert_eq!(phase, TimeOfDay::Dawn);
    }

    #[test]
    fn clock_starts_at_fraction() {
        let clock = DayClock::new(100.0, 0.3);
        assert_eq!(clock.time_of_day(), TimeOfDay::Day);
        assert!((clock.day_time() - 30.0).abs() < 1e-9);
        assert_eq!(clock.day(), 0);
    }

    #[test]
    fn advance_reports_transition() {
        let mut clock = DayClock::new(100.0, 0.65);
        assert!(clock.advance(1.0).is_empty());
        let transitions = clock.advance(5.0);
        assert_eq!(transitions, vec![(TimeOfDay::Day, TimeOfDay::Dusk)]);
    }

    #[test]
    fn long_step_reports_every_transition() {
        let mut clock = DayClock::new(100.0, 0.65);
        let transitions = clock.advance(100.0);
        assert_eq!(
            transitions,
            vec![
                (TimeOfDay::Day, TimeOfDay::Dusk),
                (TimeOfDay::Dusk, TimeOfDay::Night),
                (TimeOfDay::Night, TimeOfDay::Dawn),
                (TimeOfDay::Dawn, TimeOfDay::Day),
            ]
        );
        assert_eq!(clock.day(), 1);
        assert!((clock.fraction() - 0.65).abs() < 1e-5);
    }

    #[test]
    fn midnight_is_not_a_transition() {
        let mut clock = DayClock::new(100.0, 0.85);
        let transitions = clock.advance(10.0);
        assert!(transitions.is_empty());
        assert_eq!(clock.day(), 1);
    }

    #[test]
    fn light_peaks_at_noon() {
        let noon = DayClock::new(100.0, 0.5);
        let midnight = DayClock::new(100.0, 0.0);
        assert!((noon.light_level() - 1.0).abs() < 1e-6);
        assert!(midnight.light_level().abs() < 1e-6);
    }

    #[test]
    fn overlay_darkest_at_night() {
        assert!(TimeOfDay::Night.overlay_alpha() > TimeOfDay::Dusk.overlay_alpha());
        assert_eq!(TimeOfDay::Day.overlay_alpha(), 0.0);
    }
}
