//! # Performance Metrics
//!
//! Frame time tracking for the viewer: a ring buffer of recent frame times,
//! averaged FPS, and a compact ImGui overlay.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Averaged frame statistics over the sample window.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceMetrics {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
}

pub struct PerformanceMonitor {
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    frame_start: Option<Instant>,
    current_metrics: PerformanceMetrics,
    last_update: Instant,
    update_interval: Duration,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            // ~2 seconds of samples at 60fps.
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
            frame_start: None,
            current_metrics: PerformanceMetrics::default(),
            last_update: Instant::now(),
            update_interval: Duration::from_millis(100),
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Records the frame time and refreshes the averaged metrics at the
    /// update interval.
    pub fn end_frame(&mut self) {
        if let Some(start) = self.frame_start.take() {
            self.add_frame_time(start.elapsed());

            if self.last_update.elapsed() >= self.update_interval {
                self.update_metrics();
                self.last_update = Instant::now();
            }
        }
    }

    fn add_frame_time(&mut self, frame_time: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
    }

    fn update_metrics(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total_time: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total_time / self.frame_times.len() as u32;
        let avg_frame_time_ms = avg_frame_time.as_secs_f32() * 1000.0;

        self.current_metrics.frame_time_ms = avg_frame_time_ms;
        self.current_metrics.fps = if avg_frame_time_ms > 0.0 {
            1000.0 / avg_frame_time_ms
        } else {
            0.0
        };

        if let (Some(min_time), Some(max_time)) =
            (self.frame_times.iter().min(), self.frame_times.iter().max())
        {
            self.current_metrics.min_frame_time_ms = min_time.as_secs_f32() * 1000.0;
            self.current_metrics.max_frame_time_ms = max_time.as_secs_f32() * 1000.0;
        }
    }

    pub fn get_metrics(&self) -> &PerformanceMetrics {
        &self.current_metrics
    }

    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.current_metrics = PerformanceMetrics::default();
        self.frame_start = None;
        self.last_update = Instant::now();
    }

    /// Compact FPS overlay in the top-right corner.
    pub fn render_overlay(&self, ui: &imgui::Ui) {
        let display_size = ui.io().display_size;
        let metrics = &self.current_metrics;

        ui.window("FPS")
            .size([120.0, 60.0], imgui::Condition::Always)
            .position([display_size[0] - 130.0, 10.0], imgui::Condition::Always)
            .no_decoration()
            .no_inputs()
            .bg_alpha(0.3)
            .build(|| {
                ui.text(format!("FPS: {:.0}", metrics.fps));
                ui.text(format!("{:.1}ms", metrics.frame_time_ms));
            });
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_caps_samples() {
        let mut monitor = PerformanceMonitor::new();
        for _ in 0..300 {
            monitor.add_frame_time(Duration::from_millis(16));
        }
        assert_eq!(monitor.frame_times.len(), monitor.max_samples);
    }

    #[test]
    fn test_metrics_from_uniform_frames() {
        let mut monitor = PerformanceMonitor::new();
        for _ in 0..10 {
            monitor.add_frame_time(Duration::from_millis(20));
        }
        monitor.update_metrics();

        let metrics = monitor.get_metrics();
        assert!((metrics.frame_time_ms - 20.0).abs() < 0.1);
        assert!((metrics.fps - 50.0).abs() < 0.5);
        assert!((metrics.min_frame_time_ms - 20.0).abs() < 0.1);
        assert!((metrics.max_frame_time_ms - 20.0).abs() < 0.1);
    }
}
