//! Ambient zone tones.
//!
//! Each zone has a quiet oscillator tone. [`AmbientMixer`] tracks which tones
//! are sounding and how loud, with a linear fade in and out on every zone
//! change. The host turns voices into actual audio and asks the mixer for
//! their gain each frame.

use crate::zone::Emotion;
use std::f32::consts::TAU;
use tracing::debug;

/// Length of every fade, in seconds.
pub const FADE_SECONDS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    /// Sample at `phase` cycles. Output is in `-1..=1`.
    pub fn sample(&self, phase: f32) -> f32 {
        let p = phase.rem_euclid(1.0);
        match self {
            Waveform::Sine => (p * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * p - 1.0,
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// A zone's tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency: f32,
    pub waveform: Waveform,
    /// Peak gain once faded in.
    pub volume: f32,
}

impl ToneSpec {
    pub fn for_zone(emotion: Emotion) -> Self {
        let (frequency, waveform, volume) = match emotion {
            Emotion::Joy => (440.0, Waveform::Sine, 0.10),
            Emotion::Sadness => (220.0, Waveform::Triangle, 0.08),
            Emotion::Anger => (880.0, Waveform::Sawtooth, 0.12),
            Emotion::Fear => (110.0, Waveform::Square, 0.06),
            Emotion::Love => (523.0, Waveform::Sine, 0.09),
            Emotion::Surprise => (660.0, Waveform::Triangle, 0.11),
            Emotion::Peace => (330.0, Waveform::Sine, 0.07),
            Emotion::Nostalgia => (294.0, Waveform::Triangle, 0.08),
        };
        Self {
            frequency,
            waveform,
            volume,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u64);

/// A tone that is fading in, sounding, or fading out.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub id: VoiceId,
    pub emotion: Emotion,
    pub tone: ToneSpec,
    started_at: f64,
    /// When the fade-out began and the fade level at that moment.
    stopping: Option<(f64, f32)>,
}

impl Voice {
    fn fade_in_level(&self, now: f64) -> f32 {
        ((now - self.started_at) / FADE_SECONDS).clamp(0.0, 1.0) as f32
    }

    /// Fade level in `0..=1`.
    pub fn level(&self, now: f64) -> f32 {
        match self.stopping {
            None => self.fade_in_level(now),
            Some((since, from)) => {
                let progress = ((now - since) / FADE_SECONDS).clamp(0.0, 1.0) as f32;
                from * (1.0 - progress)
            }
        }
    }

    pub fn gain(&self, now: f64) -> f32 {
        self.tone.volume * self.level(now)
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.is_some()
    }

    pub fn is_finished(&self, now: f64) -> bool {
        matches!(self.stopping, Some((since, _)) if now - since >= FADE_SECONDS)
    }
}

/// Tracks the zone tones. Times are seconds on any monotonic clock.
#[derive(Debug, Clone, Default)]
pub struct AmbientMixer {
    voices: Vec<Voice>,
    active: Option<Emotion>,
    next_id: u64,
}

impl AmbientMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fade out the current tone and fade in the zone's tone.
    ///
    /// Returns the new voice, or `None` when the zone is already playing.
    pub fn set_zone(&mut self, emotion: Emotion, now: f64) -> Option<VoiceId> {
        if self.active == Some(emotion) {
            return None;
        }
        self.fade_out_all(now);

        let id = VoiceId(self.next_id);
        self.next_id += 1;
        self.voices.push(Voice {
            id,
            emotion,
            tone: ToneSpec::for_zone(emotion),
            started_at: now,
            stopping: None,
        });
        self.active = Some(emotion);
        debug!(zone = %emotion, "ambient tone started");
        Some(id)
    }

    /// Fade out everything.
    pub fn stop(&mut self, now: f64) {
        self.fade_out_all(now);
        self.active = None;
    }

    fn fade_out_all(&mut self, now: f64) {
        for voice in self.voices.iter_mut().filter(|v| v.stopping.is_none()) {
            voice.stopping = Some((now, voice.fade_in_level(now)));
        }
    }

    pub fn active_zone(&self) -> Option<Emotion> {
        self.active
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id == id)
    }

    /// Current gain of a voice. Unknown voices are silent.
    pub fn gain(&self, id: VoiceId, now: f64) -> f32 {
        self.voice(id).map_or(0.0, |v| v.gain(now))
    }

    /// Drop voices whose fade-out has completed and return their ids.
    pub fn prune(&mut self, now: f64) -> Vec<VoiceId> {
        let (finished, live): (Vec<_>, Vec<_>) =
            self.voices.drain(..).partition(|v| v.is_finished(now));
        self.voices = live;
        finished.into_iter().map(|v| v.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_zone_table() {
        let joy = ToneSpec::for_zone(Emotion::Joy);
        assert_eq!((joy.frequency, joy.waveform), (440.0, Waveform::Sine));
        let fear = ToneSpec::for_zone(Emotion::Fear);
        assert_eq!((fear.frequency, fear.waveform, fear.volume), (110.0, Waveform::Square, 0.06));
        for emotion in Emotion::ALL {
            let tone = ToneSpec::for_zone(emotion);
            assert!(tone.volume > 0.0 && tone.volume <= 0.12);
        }
    }

    #[test]
    fn test_waveforms() {
        assert!(close(Waveform::Sine.sample(0.25), 1.0));
        assert!(close(Waveform::Triangle.sample(0.0), -1.0));
        assert!(close(Waveform::Triangle.sample(0.5), 1.0));
        assert!(close(Waveform::Sawtooth.sample(0.75), 0.5));
        assert_eq!(Waveform::Square.sample(0.25), 1.0);
        assert_eq!(Waveform::Square.sample(1.75), -1.0);
        for w in [Waveform::Sine, Waveform::Triangle, Waveform::Sawtooth, Waveform::Square] {
            for i in 0..100 {
                let s = w.sample(i as f32 * 0.037);
                assert!((-1.0..=1.0).contains(&s));
            }
        }
    }

    #[test]
    fn test_fade_in() {
        let mut mixer = AmbientMixer::new();
        let id = mixer.set_zone(Emotion::Joy, 10.0).unwrap();
        assert_eq!(mixer.gain(id, 10.0), 0.0);
        assert!(close(mixer.gain(id, 10.25), 0.05));
        assert!(close(mixer.gain(id, 11.0), 0.10));
    }

    #[test]
    fn test_same_zone_is_noop() {
        let mut mixer = AmbientMixer::new();
        mixer.set_zone(Emotion::Peace, 0.0);
        assert_eq!(mixer.set_zone(Emotion::Peace, 1.0), None);
        assert_eq!(mixer.voices().len(), 1);
    }

    #[test]
    fn test_cross_fade_and_prune() {
        let mut mixer = AmbientMixer::new();
        let joy = mixer.set_zone(Emotion::Joy, 0.0).unwrap();
        let anger = mixer.set_zone(Emotion::Anger, 2.0).unwrap();
        assert_eq!(mixer.active_zone(), Some(Emotion::Anger));

        // Halfway through the cross-fade both are sounding
        assert!(close(mixer.gain(joy, 2.25), 0.05));
        assert!(close(mixer.gain(anger, 2.25), 0.06));

        assert!(mixer.prune(2.4).is_empty());
        assert_eq!(mixer.prune(2.5), vec![joy]);
        assert_eq!(mixer.gain(joy, 2.5), 0.0);
        assert_eq!(mixer.voices().len(), 1);
    }

    #[test]
    fn test_fade_out_starts_from_current_level() {
        let mut mixer = AmbientMixer::new();
        let joy = mixer.set_zone(Emotion::Joy, 0.0).unwrap();
        // Interrupted at half volume
        mixer.set_zone(Emotion::Love, 0.25);
        assert!(close(mixer.gain(joy, 0.25), 0.05));
        assert!(close(mixer.gain(joy, 0.5), 0.025));
    }

    #[test]
    fn test_stop_fades_everything() {
        let mut mixer = AmbientMixer::new();
        mixer.set_zone(Emotion::Joy, 0.0);
        mixer.set_zone(Emotion::Fear, 1.0);
        mixer.stop(3.0);
        assert_eq!(mixer.active_zone(), None);
        assert!(mixer.voices().iter().all(Voice::is_stopping));
        mixer.prune(3.5);
        assert!(mixer.voices().is_empty());
    }
}
