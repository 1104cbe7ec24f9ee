use std::time::{Duration, Instant};
use winit::window::Window;

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_report_time: Instant,
    frame_count: u32,
    /// Capped frame time for rate-based input such as held keys.
    pub frame_dt: f32,
    /// Real elapsed time, so scripted transitions finish on the wall clock.
    pub wall_dt: f32,
    fps: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_frame_time: None,
            last_report_time: Instant::now(),
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            wall_dt: 1.0 / 60.0,
            fps: 0.0,
            base_title,
        }
    }

    #[cfg(test)]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Sample wall-clock frame time. `frame_dt` is clamped so a long stall
    /// (window drag, debugger) never turns into a quarter second or more of
    /// held-key motion; `wall_dt` is left unclamped.
    pub fn update(&mut self, now: Instant) -> bool {
        let dt_duration = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_millis(16),
        };
        self.last_frame_time = Some(now);
        self.wall_dt = dt_duration.as_secs_f32();
        self.frame_dt = self.wall_dt.clamp(0.0, 0.25);

        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_report_time);
        if elapsed.as_secs_f32() >= 0.5 {
            self.fps = self.frame_count as f32 / elapsed.as_secs_f32();
            self.frame_count = 0;
            self.last_report_time = now;
            return true;
        }
        false
    }

    pub fn report(&self, window: &Window, status: &str) {
        window.set_title(&format!(
            "{} - {:.1} fps ({:.2} ms) - {}",
            self.base_title,
            self.fps,
            self.frame_dt * 1000.0,
            status
        ));
    }
}
