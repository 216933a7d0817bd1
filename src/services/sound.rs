//! Sound service interface and the sound-effect component.

use std::cell::Cell;
use std::rc::Rc;

use crate::engine::UpdateContext;
use crate::errors::Result;
use crate::scene::NodeHandle;
use crate::scene::component::Component;
use crate::scene::graph::SceneGraph;

pub type SoundCallback = Box<dyn FnOnce()>;

/// Audio playback backend.
///
/// Completion callbacks must be invoked on the thread that drives the engine.
pub trait SoundService {
    /// Decodes and stores an effect under `name`.
    fn load_effect(&mut self, name: &str, bytes: Vec<u8>) -> Result<()>;

    /// Starts playing `name`. `on_complete` runs once playback ends.
    fn play(&mut self, name: &str, on_complete: Option<SoundCallback>);
}

/// Plays one sound effect through the context's sound service.
///
/// With `auto_start` the effect starts on the component's first update,
/// otherwise after [`SoundComponent::start`]. With `auto_remove` the owning
/// node is detached from its parent once playback finishes.
#[derive(Debug)]
pub struct SoundComponent {
    pub resource: String,
    pub auto_start: bool,
    pub auto_remove: bool,
    should_start: bool,
    started: bool,
    finished: Rc<Cell<bool>>,
}

impl SoundComponent {
    pub const TAG: &'static str = "SoundComponent";

    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            auto_start: true,
            auto_remove: true,
            should_start: false,
            started: false,
            finished: Rc::new(Cell::new(false)),
        }
    }

    /// Requests playback on the next update.
    pub fn start(&mut self) {
        self.should_start = true;
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }
}

impl Component for SoundComponent {
    fn update(
        &mut self,
        ctx: &mut UpdateContext<'_>,
        graph: &mut SceneGraph,
        node: NodeHandle,
    ) -> Result<()> {
        if !self.started && (self.auto_start || self.should_start) {
            let Some(sound) = ctx.sound.as_deref_mut() else {
                return Ok(());
            };
            self.started = true;
            let finished = Rc::clone(&self.finished);
            sound.play(&self.resource, Some(Box::new(move || finished.set(true))));
        }

        if self.auto_remove && self.finished.get() && graph.parent(node).is_some() {
            graph.remove_from_parent(node);
        }

        Ok(())
    }

    fn tag(&self) -> Option<&str> {
        Some(Self::TAG)
    }
}
