//! Radius pulse, beat pulse and depth pulse waveforms
//!
//! All three are pure functions of an accumulated time value and the level or
//! style parameters, so restarting a run (time back to zero) restarts them too.

use crate::consts::BEAT_PULSE_DECAY;
use crate::data::LevelData;

/// Parameters of the plain radius pulse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseParams {
    pub min: f32,
    pub max: f32,
    /// Growth per second
    pub speed: f32,
    /// Shrink per second
    pub speed_r: f32,
    /// Extra hold at the top of the cycle
    pub delay_max: f32,
    /// Hold at both ends of the cycle
    pub delay_half_max: f32,
}

impl PulseParams {
    pub fn from_level(level: &LevelData) -> Self {
        Self {
            min: level.pulse_min,
            max: level.pulse_max,
            speed: level.pulse_speed,
            speed_r: level.pulse_speed_r,
            delay_max: level.pulse_delay_max,
            delay_half_max: level.pulse_delay_half_max,
        }
    }

    /// Pulse value `t` seconds into the run.
    ///
    /// One cycle: rise min -> max, hold `max(delay_max, delay_half_max)`,
    /// fall max -> min, hold `delay_half_max`.
    pub fn value_at(&self, t: f32) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 || self.speed <= 0.0 || self.speed_r <= 0.0 || !t.is_finite() {
            return self.min;
        }

        let rise = span / self.speed;
        let hold_top = self.delay_max.max(self.delay_half_max).max(0.0);
        let fall = span / self.speed_r;
        let hold_bottom = self.delay_half_max.max(0.0);
        let period = rise + hold_top + fall + hold_bottom;

        let mut phase = t.max(0.0) % period;
        if phase < rise {
            return self.min + phase * self.speed;
        }
        phase -= rise;
        if phase < hold_top {
            return self.max;
        }
        phase -= hold_top;
        if phase < fall {
            return self.max - phase * self.speed_r;
        }
        self.min
    }
}

/// Beat pulse `t` seconds into the run: jumps to `max` at every beat and
/// decays linearly until the next one.
pub fn beat_pulse_at(t: f32, max: f32, period: f32) -> f32 {
    if max <= 0.0 || period <= 0.0 || !t.is_finite() {
        return 0.0;
    }
    let phase = t.max(0.0) % period;
    (max - BEAT_PULSE_DECAY * phase).max(0.0)
}

/// Center radius from the pulse state
pub fn radius(radius_min: f32, pulse: f32, pulse_min: f32, beat_pulse: f32) -> f32 {
    let ratio = if pulse_min > 0.0 { pulse / pulse_min } else { 1.0 };
    radius_min * ratio + beat_pulse
}

/// Depth pulse: triangle wave between `min` and `max`, starting at `min`
pub fn depth_pulse_at(t: f32, min: f32, max: f32, speed: f32) -> f32 {
    let span = max - min;
    if span <= 0.0 || speed <= 0.0 || !t.is_finite() {
        return max.max(min);
    }
    let travel = (t.max(0.0) * speed) % (2.0 * span);
    if travel <= span {
        min + travel
    } else {
        max - (travel - span)
    }
}
