//! Engine Core Module
//!
//! This module contains [`Engine`], the fixed-step driver that owns the scene,
//! the GPU backend and the input/sound services.
//!
//! # Frame model
//!
//! Each display frame:
//!
//! 1. The wall-clock delta is clamped to `max_frame_delta` (1 s by default) and
//!    added to an accumulator.
//! 2. While the accumulator exceeds the fixed step, one simulation step runs
//!    and the step is subtracted. Zero or more steps may run.
//! 3. Exactly one render follows, however many steps ran.
//!
//! # Example
//!
//! ```rust,ignore
//! use arbor::{Engine, EngineSettings, RecordingBackend};
//!
//! let mut engine = Engine::new(RecordingBackend::new(), EngineSettings::default())?;
//! engine.start();
//! engine.advance(1.0 / 60.0)?;
//! ```

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use glam::Vec4;

use crate::assets::importer::{GltfImporter, ImportedModel};
use crate::assets::texture_loader::{TextureLoadEvent, TextureLoader};
use crate::errors::Result;
use crate::render::backend::{GpuBackend, ProgramHandle, ProgramKind};
use crate::scene::Scene;
use crate::services::input::Input;
use crate::services::sound::SoundService;
use crate::settings::EngineSettings;
use crate::utils::{FpsCounter, Timer};

/// Per-step data handed to components, animation predicates and actions.
pub struct UpdateContext<'a> {
    /// Length of this simulation step in seconds.
    pub delta_seconds: f32,
    pub input: &'a Input,
    pub sound: Option<&'a mut dyn SoundService>,
}

impl<'a> UpdateContext<'a> {
    #[must_use]
    pub fn new(delta_seconds: f32, input: &'a Input) -> Self {
        Self {
            delta_seconds,
            input,
            sound: None,
        }
    }

    #[must_use]
    pub fn with_sound(mut self, sound: &'a mut dyn SoundService) -> Self {
        self.sound = Some(sound);
        self
    }
}

/// Source of display-refresh signals for [`Engine::run`].
pub trait DisplaySync {
    /// Blocks until the next frame should be produced and returns its
    /// timestamp, or `None` when the display has closed.
    fn next_frame(&mut self) -> Option<Instant>;
}

/// Cancels a running [`Engine::run`] loop from inside a component or callback.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.set(true);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

/// Built-in programs created at engine construction.
#[derive(Debug, Clone, Copy)]
pub struct Programs {
    pub standard: ProgramHandle,
    pub skybox: ProgramHandle,
}

/// The fixed-step engine loop.
///
/// A new engine is paused: frames render but no simulation step runs until
/// [`Engine::start`].
pub struct Engine<G: GpuBackend> {
    pub scene: Scene,
    pub input: Input,
    pub textures: TextureLoader,
    pub programs: Programs,

    gpu: G,
    sound: Option<Box<dyn SoundService>>,
    settings: EngineSettings,

    step: f32,
    accumulator: f32,
    paused: bool,
    stop: StopHandle,
    viewport: (u32, u32),

    fps_counter: FpsCounter,
    fps_updated: Option<Box<dyn FnMut(u32)>>,
    texture_events: Vec<TextureLoadEvent>,
}

impl<G: GpuBackend> Engine<G> {
    /// Creates the engine and its built-in programs.
    ///
    /// Program creation failures are fatal and returned before any frame runs.
    pub fn new(mut gpu: G, settings: EngineSettings) -> Result<Self> {
        let programs = Programs {
            standard: gpu.create_program(ProgramKind::Standard)?,
            skybox: gpu.create_program(ProgramKind::Skybox)?,
        };
        let textures = TextureLoader::new()?;

        log::info!("Engine initialised at {} steps per second", settings.fps);

        Ok(Self {
            scene: Scene::from_settings(&settings),
            input: Input::new(),
            textures,
            programs,
            gpu,
            sound: None,
            step: settings.step_seconds(),
            settings,
            accumulator: 0.0,
            paused: true,
            stop: StopHandle::default(),
            viewport: (1, 1),
            fps_counter: FpsCounter::new(),
            fps_updated: None,
            texture_events: Vec::new(),
        })
    }

    // ========================================================================
    // Accessors & configuration
    // ========================================================================

    #[must_use]
    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_sound_service(&mut self, sound: Box<dyn SoundService>) {
        self.sound = Some(sound);
    }

    /// Decodes and registers a sound effect. Without a sound service this is a
    /// no-op.
    pub fn load_sound_effect(&mut self, name: &str, bytes: Vec<u8>) -> Result<()> {
        match self.sound.as_deref_mut() {
            Some(sound) => sound.load_effect(name, bytes),
            None => {
                log::warn!("No sound service installed, skipping effect '{name}'");
                Ok(())
            }
        }
    }

    /// Sets the number of simulation steps per second.
    pub fn set_fps(&mut self, fps: u32) {
        self.settings.fps = fps.max(1);
        self.step = self.settings.step_seconds();
    }

    /// Length of one simulation step in seconds.
    #[must_use]
    pub fn step_seconds(&self) -> f32 {
        self.step
    }

    pub fn set_fps_callback(&mut self, callback: impl FnMut(u32) + 'static) {
        self.fps_updated = Some(Box::new(callback));
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    pub fn start(&mut self) {
        self.paused = false;
        self.accumulator = 0.0;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Texture load results delivered since the last call.
    pub fn take_texture_events(&mut self) -> Vec<TextureLoadEvent> {
        std::mem::take(&mut self.texture_events)
    }

    /// Imports a `.gltf` or `.glb` file into the scene graph using the
    /// standard program. The returned root is not yet attached to a layer.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<ImportedModel> {
        GltfImporter::new(&mut self.gpu, &mut self.textures, self.programs.standard)
            .import_file(&mut self.scene.graph, path.as_ref())
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Runs one simulation step of `delta` seconds.
    ///
    /// Does nothing while paused. Key-press state is cleared afterwards.
    pub fn update(&mut self, delta: f32) -> Result<()> {
        if self.paused {
            return Ok(());
        }

        let sound: Option<&mut dyn SoundService> = match &mut self.sound {
            Some(sound) => Some(sound.as_mut()),
            None => None,
        };
        let mut ctx = UpdateContext {
            delta_seconds: delta,
            input: &self.input,
            sound,
        };
        let result = self.scene.update(&mut ctx);

        self.input.clear_press_state();

        if let Err(err) = &result {
            log::error!("Simulation step failed: {err}");
        }
        result
    }

    /// Uploads finished textures, clears the frame and draws the scene.
    pub fn render(&mut self) {
        self.texture_events.extend(self.textures.poll(&mut self.gpu));

        let [r, g, b, _] = self.settings.background_color;
        let (width, height) = self.viewport;

        self.gpu.set_depth_test(true);
        self.gpu.set_viewport(width, height);
        self.gpu.clear(Some(Vec4::new(r, g, b, 1.0)), true);

        self.scene.render(&mut self.gpu, width, height);
    }

    /// Feeds one display frame of `wall_delta` seconds through the fixed-step
    /// accumulator and renders once. Returns the number of steps run.
    pub fn advance(&mut self, wall_delta: f32) -> Result<usize> {
        let delta = wall_delta.clamp(0.0, self.settings.max_frame_delta);

        let mut steps = 0;
        if !self.paused {
            self.accumulator += delta;
            while self.accumulator > self.step {
                self.accumulator -= self.step;
                self.update(self.step)?;
                steps += 1;
            }
        }

        self.render();

        if let Some(fps) = self.fps_counter.update(delta)
            && let Some(callback) = &mut self.fps_updated
        {
            callback(fps);
        }

        Ok(steps)
    }

    /// Drives frames from `display` until it closes or the stop handle fires.
    ///
    /// Any step error ends the loop and is returned.
    pub fn run(&mut self, display: &mut dyn DisplaySync) -> Result<()> {
        let mut timer = Timer::new();

        while !self.stop.is_stopped() {
            let Some(now) = display.next_frame() else {
                break;
            };
            timer.tick_at(now);
            self.advance(timer.dt_seconds())?;
        }

        self.stop.0.set(false);
        Ok(())
    }
}
