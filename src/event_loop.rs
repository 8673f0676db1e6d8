//! The capture-zoom-display loop.
//!
//! Each iteration drains pending control events, pulls one frame, crops and
//! resizes it, shows it and polls the window's keyboard. Frame read failures
//! are retried after a short pause; too many in a row end the loop.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::camera::{CameraError, FrameSource};
use crate::control::{ControlAction, ControlEvent, InputSource};
use crate::display::{DisplayError, FrameSink};
use crate::magnify::magnify;
use crate::zoom::ZoomState;

/// Timing and failure policy for the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    /// Output width in pixels
    pub display_width: u32,
    /// Pause at the end of every iteration
    pub frame_interval: Duration,
    /// Pause before retrying a failed frame read
    pub retry_delay: Duration,
    /// Consecutive read failures before giving up (0 = never)
    pub max_consecutive_failures: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            display_width: 640,
            frame_interval: Duration::from_millis(10),
            retry_delay: Duration::from_millis(100),
            max_consecutive_failures: 50,
        }
    }
}

/// Lifecycle of a loop: `Idle → Running → Released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Released,
}

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("Camera stopped delivering frames after {failures} attempts: {last}")]
    CameraLost { failures: u32, last: CameraError },

    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub iterations: u64,
    pub frames_shown: u64,
    pub frames_skipped: u64,
    pub read_failures: u64,
    pub final_zoom: f64,
}

/// Owns the camera and the window for the duration of a run.
pub struct Magnifier<S: FrameSource, D: FrameSink> {
    source: Option<S>,
    sink: Option<D>,
    events: Receiver<ControlEvent>,
    zoom: ZoomState,
    settings: LoopSettings,
    on_wake: Box<dyn FnMut()>,
    state: LoopState,
    running: bool,
    consecutive_failures: u32,
    summary: RunSummary,
}

impl<S: FrameSource, D: FrameSink> Magnifier<S, D> {
    pub fn new(
        source: S,
        sink: D,
        events: Receiver<ControlEvent>,
        zoom: ZoomState,
        settings: LoopSettings,
    ) -> Self {
        Self {
            source: Some(source),
            sink: Some(sink),
            events,
            zoom,
            settings,
            on_wake: Box::new(|| {}),
            state: LoopState::Idle,
            running: false,
            consecutive_failures: 0,
            summary: RunSummary::default(),
        }
    }

    /// Hook invoked on every `Wake` action.
    pub fn with_wake_handler(mut self, on_wake: impl FnMut() + 'static) -> Self {
        self.on_wake = Box::new(on_wake);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    /// Run until quit, then release the camera and the window.
    pub fn run(mut self) -> Result<RunSummary, LoopError> {
        self.state = LoopState::Running;
        self.running = true;
        log::info!(
            "Loop started: width {}, zoom {:.2}x",
            self.settings.display_width,
            self.zoom.factor()
        );

        let result = self.run_iterations();
        self.release();

        self.summary.final_zoom = self.zoom.factor();
        log::info!(
            "Loop ended after {} iterations ({} shown, {} skipped, {} read failures)",
            self.summary.iterations,
            self.summary.frames_shown,
            self.summary.frames_skipped,
            self.summary.read_failures
        );
        result.map(|()| self.summary.clone())
    }

    fn run_iterations(&mut self) -> Result<(), LoopError> {
        loop {
            self.drain_events();
            if !self.running {
                return Ok(());
            }
            self.summary.iterations += 1;
            self.step()?;
        }
    }

    fn step(&mut self) -> Result<(), LoopError> {
        let Some(source) = self.source.as_mut() else {
            self.running = false;
            return Ok(());
        };

        let frame = match source.acquire() {
            Ok(frame) => {
                self.consecutive_failures = 0;
                frame
            }
            Err(e) => {
                self.consecutive_failures += 1;
                self.summary.read_failures += 1;
                let limit = self.settings.max_consecutive_failures;
                if limit > 0 && self.consecutive_failures >= limit {
                    return Err(LoopError::CameraLost {
                        failures: self.consecutive_failures,
                        last: e,
                    });
                }
                log::warn!(
                    "Frame read failed ({}/{}): {}",
                    self.consecutive_failures,
                    limit,
                    e
                );
                // the window must stay responsive while the camera is down
                self.poll_window();
                if self.running {
                    thread::sleep(self.settings.retry_delay);
                }
                return Ok(());
            }
        };

        let (width, height) = (frame.width, frame.height);
        match magnify(frame, self.zoom.factor(), self.settings.display_width) {
            Some(output) => {
                if let Some(sink) = self.sink.as_mut() {
                    sink.show(&output)?;
                }
                self.summary.frames_shown += 1;
            }
            None => {
                log::debug!(
                    "Skipping {}x{} frame at zoom {:.2}x: degenerate geometry",
                    width,
                    height,
                    self.zoom.factor()
                );
                self.summary.frames_skipped += 1;
            }
        }

        self.poll_window();
        thread::sleep(self.settings.frame_interval);
        Ok(())
    }

    /// Apply keys pressed in the window and notice when it was closed.
    fn poll_window(&mut self) {
        let Some(sink) = self.sink.as_mut() else {
            self.running = false;
            return;
        };
        let actions = sink.poll_actions();
        let window_open = sink.is_open();
        for action in actions {
            self.apply(ControlEvent::new(action, InputSource::Keyboard));
        }
        if !window_open {
            log::info!("Display window closed");
            self.running = false;
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                // every sender dropped: no surface can ask to quit anymore,
                // the window and Ctrl+C still can
                Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn apply(&mut self, event: ControlEvent) {
        match event.action {
            ControlAction::ZoomIn => {
                self.zoom.zoom_in(event.source);
            }
            ControlAction::ZoomOut => {
                self.zoom.zoom_out(event.source);
            }
            ControlAction::Quit => {
                log::info!("Quit requested ({})", event.source);
                self.running = false;
            }
            ControlAction::Wake => {
                log::info!("Wake requested ({})", event.source);
                (self.on_wake)();
            }
        }
    }

    /// Stop the camera, then destroy the window. Runs at most once.
    fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
            log::debug!("Camera released ({})", source.backend());
        }
        if let Some(mut sink) = self.sink.take() {
            sink.close();
        }
        self.running = false;
        self.state = LoopState::Released;
    }
}

impl<S: FrameSource, D: FrameSink> Drop for Magnifier<S, D> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Backend, Frame};
    use std::sync::mpsc;

    struct StaticSource;

    impl FrameSource for StaticSource {
        fn backend(&self) -> Backend {
            Backend::Usb
        }
        fn acquire(&mut self) -> Result<Frame, CameraError> {
            Ok(Frame::from_rgb(vec![0; 8 * 4 * 3], 8, 4).unwrap())
        }
        fn release(&mut self) {}
    }

    struct NullSink;

    impl FrameSink for NullSink {
        fn show(&mut self, _frame: &Frame) -> Result<(), DisplayError> {
            Ok(())
        }
        fn poll_actions(&mut self) -> Vec<ControlAction> {
            Vec::new()
        }
        fn is_open(&self) -> bool {
            true
        }
        fn close(&mut self) {}
    }

    fn quick_settings() -> LoopSettings {
        LoopSettings {
            display_width: 4,
            frame_interval: Duration::ZERO,
            retry_delay: Duration::ZERO,
            max_consecutive_failures: 3,
        }
    }

    #[test]
    fn test_new_loop_is_idle() {
        let (_tx, rx) = mpsc::channel();
        let magnifier = Magnifier::new(
            StaticSource,
            NullSink,
            rx,
            ZoomState::default(),
            quick_settings(),
        );
        assert_eq!(magnifier.state(), LoopState::Idle);
        assert_eq!(magnifier.zoom().factor(), 1.0);
    }

    #[test]
    fn test_queued_quit_exits_before_first_frame() {
        let (tx, rx) = mpsc::channel();
        tx.send(ControlEvent::new(ControlAction::Quit, InputSource::Signal))
            .unwrap();
        let summary = Magnifier::new(
            StaticSource,
            NullSink,
            rx,
            ZoomState::default(),
            quick_settings(),
        )
        .run()
        .unwrap();
        assert_eq!(summary.iterations, 0);
        assert_eq!(summary.frames_shown, 0);
    }

    #[test]
    fn test_events_before_quit_are_applied() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            tx.send(ControlEvent::new(ControlAction::ZoomIn, InputSource::Gpio(17)))
                .unwrap();
        }
        tx.send(ControlEvent::new(ControlAction::Quit, InputSource::Gpio(22)))
            .unwrap();
        let summary = Magnifier::new(
            StaticSource,
            NullSink,
            rx,
            ZoomState::new(1.0, 0.1, None),
            quick_settings(),
        )
        .run()
        .unwrap();
        assert!((summary.final_zoom - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_wake_handler_runs() {
        use std::cell::Cell;
        use std::rc::Rc;

        let woke = Rc::new(Cell::new(0));
        let counter = Rc::clone(&woke);
        let (tx, rx) = mpsc::channel();
        tx.send(ControlEvent::new(ControlAction::Wake, InputSource::Gpio(23)))
            .unwrap();
        tx.send(ControlEvent::new(ControlAction::Quit, InputSource::Keyboard))
            .unwrap();
        Magnifier::new(
            StaticSource,
            NullSink,
            rx,
            ZoomState::default(),
            quick_settings(),
        )
        .with_wake_handler(move || counter.set(counter.get() + 1))
        .run()
        .unwrap();
        assert_eq!(woke.get(), 1);
    }
}
