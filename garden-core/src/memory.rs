//! Memory records and the form data they are planted from.

use crate::zone::Emotion;
use chrono::{DateTime, Local, NaiveDate, Utc};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lowest and highest intensity a memory can carry.
pub const INTENSITY_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Errors from creating or updating memories.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Memory {0} is missing")]
    MissingField(&'static str),

    #[error("No memory with id {0}")]
    UnknownMemory(MemoryId),

    #[error("The garden has been closed")]
    GardenClosed,
}

/// Identifier of a memory, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(u64);

impl MemoryId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point on the garden floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPosition {
    pub x: f32,
    pub z: f32,
}

impl GroundPosition {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Lift to 3D at height `y`.
    pub fn to_vec3(self, y: f32) -> Vec3 {
        Vec3::new(self.x, y, self.z)
    }

    /// Drop the height of a 3D point.
    pub fn from_vec3(v: Vec3) -> Self {
        Self { x: v.x, z: v.z }
    }
}

/// A journal entry planted in the garden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: MemoryId,
    pub title: String,
    pub description: String,
    pub emotion: Emotion,
    pub date: NaiveDate,
    pub intensity: u8,
    pub created_at: DateTime<Utc>,
    pub position: Option<GroundPosition>,
}

impl Memory {
    /// One-line summary used in prompts: `id: title - description`.
    pub fn prompt_line(&self) -> String {
        format!("{}: {} - {}", self.id, self.title, self.description)
    }
}

/// Form data for a new memory, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDraft {
    pub title: String,
    pub description: String,
    /// Emotion key; unrecognised keys become peace.
    pub emotion: String,
    pub date: NaiveDate,
    pub intensity: i32,
    /// Optional explicit placement; only x and z are kept.
    pub location: Option<Vec3>,
}

impl Default for MemoryDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            emotion: Emotion::Joy.key().to_string(),
            date: Local::now().date_naive(),
            intensity: 5,
            location: None,
        }
    }
}

impl MemoryDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = emotion.into();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn with_intensity(mut self, intensity: i32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_location(mut self, location: Vec3) -> Self {
        self.location = Some(location);
        self
    }

    /// The emotion this draft will be planted under.
    pub fn resolved_emotion(&self) -> Emotion {
        Emotion::from_key_or_default(&self.emotion)
    }

    /// Check required fields and normalise the rest into a [`Memory`].
    pub fn into_memory(
        self,
        id: MemoryId,
        created_at: DateTime<Utc>,
    ) -> Result<Memory, MemoryError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(MemoryError::MissingField("title"));
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(MemoryError::MissingField("description"));
        }

        let intensity = self.intensity.clamp(
            *INTENSITY_RANGE.start() as i32,
            *INTENSITY_RANGE.end() as i32,
        ) as u8;

        Ok(Memory {
            id,
            title: title.to_string(),
            description: description.to_string(),
            emotion: self.resolved_emotion(),
            date: self.date,
            intensity,
            created_at,
            position: self.location.map(GroundPosition::from_vec3),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant(draft: MemoryDraft) -> Result<Memory, MemoryError> {
        draft.into_memory(MemoryId::new(1), Utc::now())
    }

    #[test]
    fn test_requires_title_and_description() {
        assert_eq!(
            plant(MemoryDraft::new("  ", "something")),
            Err(MemoryError::MissingField("title"))
        );
        assert_eq!(
            plant(MemoryDraft::new("Beach", "")),
            Err(MemoryError::MissingField("description"))
        );
    }

    #[test]
    fn test_intensity_is_clamped() {
        let high = plant(MemoryDraft::new("a", "b").with_intensity(42)).unwrap();
        assert_eq!(high.intensity, 10);
        let low = plant(MemoryDraft::new("a", "b").with_intensity(-3)).unwrap();
        assert_eq!(low.intensity, 1);
    }

    #[test]
    fn test_unknown_emotion_becomes_peace() {
        let memory = plant(MemoryDraft::new("a", "b").with_emotion("default")).unwrap();
        assert_eq!(memory.emotion, Emotion::Peace);
    }

    #[test]
    fn test_location_keeps_ground_coordinates() {
        let memory =
            plant(MemoryDraft::new("a", "b").with_location(Vec3::new(3.0, 9.0, -4.0))).unwrap();
        assert_eq!(memory.position, Some(GroundPosition::new(3.0, -4.0)));
    }

    #[test]
    fn test_serializes_with_emotion_key() {
        let memory = plant(MemoryDraft::new("a", "b").with_emotion("Love")).unwrap();
        let json = serde_json::to_value(&memory).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["emotion"], "love");
        let back: Memory = serde_json::from_value(json).unwrap();
        assert_eq!(back, memory);
    }

    #[test]
    fn test_prompt_line() {
        let memory = plant(MemoryDraft::new(" Picnic ", "Sun and bread")).unwrap();
        assert_eq!(memory.prompt_line(), "1: Picnic - Sun and bread");
    }
}
