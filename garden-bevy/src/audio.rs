//! Zone tones.
//!
//! Each voice in the core mixer is played as an endless synthesized
//! waveform; its sink volume follows the mixer's fade curve every frame.

use bevy::audio::{AddAudioSource, AudioPlayer, AudioSinkPlayback, Decodable, Source, Volume};
use bevy::prelude::*;
use bevy::utils::HashMap;
use garden_core::{ToneSpec, VoiceId, Waveform};
use std::time::Duration;
use tracing::debug;

use crate::state::Garden;

const SAMPLE_RATE: u32 = 44_100;

/// An endless oscillator.
#[derive(Asset, TypePath, Debug, Clone, Copy)]
pub struct ToneAudio {
    pub frequency: f32,
    pub waveform: Waveform,
}

impl From<ToneSpec> for ToneAudio {
    fn from(spec: ToneSpec) -> Self {
        Self {
            frequency: spec.frequency,
            waveform: spec.waveform,
        }
    }
}

pub struct ToneDecoder {
    tone: ToneAudio,
    phase: f32,
    step: f32,
}

impl ToneDecoder {
    fn new(tone: ToneAudio) -> Self {
        Self {
            tone,
            phase: 0.0,
            step: tone.frequency / SAMPLE_RATE as f32,
        }
    }
}

impl Iterator for ToneDecoder {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.tone.waveform.sample(self.phase);
        self.phase = (self.phase + self.step).fract();
        Some(sample)
    }
}

impl Source for ToneDecoder {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl Decodable for ToneAudio {
    type DecoderItem = <ToneDecoder as Iterator>::Item;
    type Decoder = ToneDecoder;

    fn decoder(&self) -> Self::Decoder {
        ToneDecoder::new(*self)
    }
}

/// Audio entities for the mixer's voices.
#[derive(Resource, Default)]
pub struct VoiceEntities(HashMap<VoiceId, Entity>);

/// Marks an entity playing a mixer voice.
#[derive(Component)]
pub struct ZoneVoice(pub VoiceId);

pub struct AmbientAudioPlugin;

impl Plugin for AmbientAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_audio_source::<ToneAudio>()
            .init_resource::<VoiceEntities>()
            .add_systems(Update, sync_voices);
    }
}

/// Spawn new voices, follow fades, despawn voices the mixer has let go.
fn sync_voices(
    mut commands: Commands,
    mut tones: ResMut<Assets<ToneAudio>>,
    mut entities: ResMut<VoiceEntities>,
    garden: Res<Garden>,
    sinks: Query<(&ZoneVoice, &AudioSink)>,
    time: Res<Time>,
) {
    let mixer = garden.session.mixer();
    let now = time.elapsed_secs_f64();

    for voice in mixer.voices() {
        if entities.0.contains_key(&voice.id) {
            continue;
        }
        debug!(zone = %voice.emotion, frequency = voice.tone.frequency, "tone started");
        let handle = tones.add(ToneAudio::from(voice.tone));
        let entity = commands
            .spawn((
                AudioPlayer::<ToneAudio>(handle),
                PlaybackSettings::DESPAWN.with_volume(Volume::new(0.0)),
                ZoneVoice(voice.id),
            ))
            .id();
        entities.0.insert(voice.id, entity);
    }

    for (voice, sink) in &sinks {
        sink.set_volume(mixer.gain(voice.0, now));
    }

    entities.0.retain(|id, entity| {
        if mixer.voice(*id).is_some() {
            return true;
        }
        if let Ok((_, sink)) = sinks.get(*entity) {
            sink.stop();
        }
        commands.entity(*entity).despawn();
        false
    });
}
