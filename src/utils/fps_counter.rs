/// Counts rendered frames and reports once per accumulated second.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frame_count: u32,
    accumulated_time: f32,
    pub current_fps: u32,
}

impl FpsCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame that took `delta` seconds.
    ///
    /// Returns the frame count of the window that just closed, once more than
    /// a second has accumulated.
    pub fn update(&mut self, delta: f32) -> Option<u32> {
        self.frame_count += 1;
        self.accumulated_time += delta;

        if self.accumulated_time > 1.0 {
            self.current_fps = self.frame_count;

            self.accumulated_time -= 1.0;
            self.frame_count = 0;

            return Some(self.current_fps);
        }

        None
    }
}
