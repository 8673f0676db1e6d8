//! Output window.

use minifb::{KeyRepeat, Window, WindowOptions};

use crate::camera::Frame;
use crate::control::{action_for_key, ControlAction};

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("Display window error: {0}")]
    Window(String),
}

/// Where processed frames go.
pub trait FrameSink {
    /// Present one frame, resizing the output to the frame's size.
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Actions requested from the window since the last poll. Never blocks.
    fn poll_actions(&mut self) -> Vec<ControlAction>;

    /// False once the user has closed the window.
    fn is_open(&self) -> bool;

    /// Destroy the window. Safe to call twice.
    fn close(&mut self);
}

/// Pack RGB8 pixels into minifb's `0RGB` words.
pub fn pack_rgb(data: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        data.chunks_exact(3)
            .map(|px| ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32),
    );
}

/// A minifb window sized to the most recent frame.
pub struct WindowSink {
    title: String,
    borderless: bool,
    window: Option<Window>,
    size: (usize, usize),
    buffer: Vec<u32>,
    /// A frame was presented since the last poll, so events are current
    presented: bool,
    closed: bool,
}

impl std::fmt::Debug for WindowSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowSink")
            .field("title", &self.title)
            .field("size", &self.size)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl WindowSink {
    /// The window is created lazily on the first frame.
    pub fn new(title: impl Into<String>, borderless: bool) -> Self {
        Self {
            title: title.into(),
            borderless,
            window: None,
            size: (0, 0),
            buffer: Vec::new(),
            presented: false,
            closed: false,
        }
    }

    fn ensure_window(&mut self, width: usize, height: usize) -> Result<&mut Window, DisplayError> {
        if self.window.is_none() || self.size != (width, height) {
            if self.window.is_some() {
                log::debug!("Resizing window to {}x{}", width, height);
            }
            // old window goes first so only one is ever on screen
            self.window = None;
            let options = WindowOptions {
                borderless: self.borderless,
                ..WindowOptions::default()
            };
            let window = Window::new(&self.title, width, height, options)
                .map_err(|e| DisplayError::Window(e.to_string()))?;
            self.size = (width, height);
            self.window = Some(window);
        }
        self.window
            .as_mut()
            .ok_or_else(|| DisplayError::Window("window missing".to_string()))
    }
}

impl FrameSink for WindowSink {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        if self.closed {
            return Err(DisplayError::Window("window already closed".to_string()));
        }
        let (width, height) = (frame.width as usize, frame.height as usize);

        let mut buffer = std::mem::take(&mut self.buffer);
        pack_rgb(&frame.data, &mut buffer);
        let result = self
            .ensure_window(width, height)
            .and_then(|window| {
                window
                    .update_with_buffer(&buffer, width, height)
                    .map_err(|e| DisplayError::Window(e.to_string()))
            });
        self.buffer = buffer;
        self.presented = result.is_ok();
        result
    }

    fn poll_actions(&mut self) -> Vec<ControlAction> {
        let presented = std::mem::replace(&mut self.presented, false);
        let Some(window) = self.window.as_mut() else {
            return Vec::new();
        };
        if !presented {
            // no frame this iteration: pump events without redrawing
            window.update();
        }
        window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(action_for_key)
            .collect()
    }

    fn is_open(&self) -> bool {
        match self.window.as_ref() {
            Some(window) => window.is_open(),
            None => !self.closed,
        }
    }

    fn close(&mut self) {
        if self.window.take().is_some() {
            log::debug!("Display window destroyed");
        }
        self.closed = true;
    }
}

impl Drop for WindowSink {
    fn drop(&mut self) {
        self.close();
    }
}
