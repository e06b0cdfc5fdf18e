//! Music track metadata

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicData {
    pub id: String,
    pub file_name: String,
    pub name: String,
    pub album: String,
    pub author: String,
    /// Start offsets (seconds) the track may be started from
    pub segments: Vec<f32>,
    /// Tempo; when present it drives the beat pulse period
    pub bpm: Option<f32>,
}

impl MusicData {
    /// Offset used on a first play
    pub fn first_segment(&self) -> f32 {
        self.segments.first().copied().unwrap_or(0.0)
    }

    /// Random offset used on restarts
    pub fn random_segment(&self, rng: &mut impl Rng) -> f32 {
        if self.segments.is_empty() {
            return 0.0;
        }
        self.segments[rng.random_range(0..self.segments.len())]
    }

    /// Seconds between beats, if the track declares a usable tempo
    pub fn beat_period(&self) -> Option<f32> {
        self.bpm
            .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
            .map(|bpm| 60.0 / bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_segments() {
        let music = MusicData {
            segments: vec![4.0, 20.0, 31.5],
            ..Default::default()
        };
        assert_eq!(music.first_segment(), 4.0);

        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..20 {
            assert!(music.segments.contains(&music.random_segment(&mut rng)));
        }
        assert_eq!(MusicData::default().random_segment(&mut rng), 0.0);
    }

    #[test]
    fn test_beat_period() {
        let music = MusicData {
            bpm: Some(120.0),
            ..Default::default()
        };
        assert_eq!(music.beat_period(), Some(0.5));
        assert_eq!(
            MusicData {
                bpm: Some(0.0),
                ..Default::default()
            }
            .beat_period(),
            None
        );
    }
}
