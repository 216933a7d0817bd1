//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Engine configuration.
///
/// All fields have defaults, so a JSON document only needs the keys it
/// overrides:
///
/// ```rust,ignore
/// let settings = EngineSettings::from_json_str(r#"{ "fps": 60 }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Simulation steps per second.
    pub fps: u32,
    /// Upper bound on the wall-clock delta fed to the step accumulator, in
    /// seconds.
    pub max_frame_delta: f32,
    /// RGBA clear color.
    pub background_color: [f32; 4],
    pub ambient_color: [f32; 3],
    pub camera_fov_degrees: f32,
    pub camera_near: f32,
    pub camera_far: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            max_frame_delta: 1.0,
            background_color: [0.0, 0.0, 0.0, 1.0],
            ambient_color: [0.1, 0.1, 0.1],
            camera_fov_degrees: 60.0,
            camera_near: 1.0,
            camera_far: 2000.0,
        }
    }
}

impl EngineSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Length of one simulation step in seconds.
    #[must_use]
    pub fn step_seconds(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }
}
