//! Development-mode setup window: one on-screen button per preset width.

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use super::{ControlError, ControlSurface, EventSender};

const BACKGROUND: u32 = 0x0020_2020;
const BUTTON: u32 = 0x0040_5060;
const BUTTON_HOVER: u32 = 0x0050_7890;
const LABEL: u32 = 0x00f0_f0f0;

/// 3x5 bitmap digits, one row per byte, high bit on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Geometry of the button column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupLayout {
    pub width: u32,
    pub button_height: u32,
    pub gap: u32,
    pub margin: u32,
    pub count: u32,
}

impl SetupLayout {
    pub fn new(count: usize) -> Self {
        Self {
            width: 360,
            button_height: 72,
            gap: 12,
            margin: 16,
            count: count as u32,
        }
    }

    /// Window height for `count` buttons.
    pub fn height(&self) -> u32 {
        let buttons = self.count * self.button_height + self.count.saturating_sub(1) * self.gap;
        buttons + 2 * self.margin
    }

    /// `(x, y, width, height)` of button `index`.
    pub fn button_rect(&self, index: u32) -> (u32, u32, u32, u32) {
        let y = self.margin + index * (self.button_height + self.gap);
        (
            self.margin,
            y,
            self.width - 2 * self.margin,
            self.button_height,
        )
    }

    /// Button under the point, if any. Gaps and margins hit nothing.
    pub fn button_at(&self, x: u32, y: u32) -> Option<usize> {
        (0..self.count)
            .find(|&i| {
                let (bx, by, bw, bh) = self.button_rect(i);
                x >= bx && x < bx + bw && y >= by && y < by + bh
            })
            .map(|i| i as usize)
    }

    /// Draw the buttons with their width labels into a 0RGB buffer.
    pub fn render(&self, presets: &[u32], hovered: Option<usize>) -> Vec<u32> {
        let (w, h) = (self.width as usize, self.height() as usize);
        let mut buffer = vec![BACKGROUND; w * h];

        for (i, preset) in presets.iter().enumerate().take(self.count as usize) {
            let (bx, by, bw, bh) = self.button_rect(i as u32);
            let color = if hovered == Some(i) { BUTTON_HOVER } else { BUTTON };
            fill_rect(&mut buffer, w, bx, by, bw, bh, color);

            let label = preset.to_string();
            let scale = 6;
            let label_w = label.len() as u32 * 4 * scale - scale;
            let lx = bx + bw.saturating_sub(label_w) / 2;
            let ly = by + bh.saturating_sub(5 * scale) / 2;
            draw_text(&mut buffer, w, lx, ly, &label, scale);
        }

        buffer
    }
}

fn fill_rect(buffer: &mut [u32], stride: usize, x: u32, y: u32, w: u32, h: u32, color: u32) {
    for row in y..y + h {
        let start = row as usize * stride + x as usize;
        if let Some(line) = buffer.get_mut(start..start + w as usize) {
            line.fill(color);
        }
    }
}

fn draw_text(buffer: &mut [u32], stride: usize, x: u32, y: u32, text: &str, scale: u32) {
    for (n, digit) in text.chars().filter_map(|c| c.to_digit(10)).enumerate() {
        let gx = x + n as u32 * 4 * scale;
        for (row, bits) in DIGITS[digit as usize].iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) != 0 {
                    fill_rect(
                        buffer,
                        stride,
                        gx + col * scale,
                        y + row as u32 * scale,
                        scale,
                        scale,
                        LABEL,
                    );
                }
            }
        }
    }
}

/// Digit keys pick presets: `1` is the first button.
fn preset_for_key(key: Key) -> Option<usize> {
    let index = match key {
        Key::Key1 | Key::NumPad1 => 0,
        Key::Key2 | Key::NumPad2 => 1,
        Key::Key3 | Key::NumPad3 => 2,
        Key::Key4 | Key::NumPad4 => 3,
        Key::Key5 | Key::NumPad5 => 4,
        Key::Key6 | Key::NumPad6 => 5,
        Key::Key7 | Key::NumPad7 => 6,
        Key::Key8 | Key::NumPad8 => 7,
        Key::Key9 | Key::NumPad9 => 8,
        _ => return None,
    };
    Some(index)
}

/// On-screen width picker. Zoom and quit then come from the display
/// window's keyboard shortcuts, so there is nothing to bind.
#[derive(Debug, Clone)]
pub struct SetupSurface {
    presets: Vec<u32>,
    title: String,
}

impl SetupSurface {
    pub fn new(presets: Vec<u32>, title: impl Into<String>) -> Self {
        Self {
            presets,
            title: title.into(),
        }
    }

    pub fn presets(&self) -> &[u32] {
        &self.presets
    }
}

impl ControlSurface for SetupSurface {
    fn name(&self) -> &'static str {
        "on-screen buttons"
    }

    fn select_display_width(&mut self, _configured: u32) -> Result<Option<u32>, ControlError> {
        if self.presets.is_empty() {
            return Err(ControlError::NoPresets);
        }
        if self.presets.contains(&0) {
            return Err(ControlError::ZeroPreset);
        }

        let layout = SetupLayout::new(self.presets.len());
        let title = format!("{} - choose display width", self.title);
        let mut window = Window::new(
            &title,
            layout.width as usize,
            layout.height() as usize,
            WindowOptions::default(),
        )
        .map_err(|e| ControlError::Window(e.to_string()))?;
        window.set_target_fps(30);

        while window.is_open() {
            let hovered = window
                .get_mouse_pos(MouseMode::Discard)
                .and_then(|(x, y)| layout.button_at(x as u32, y as u32));

            let mut chosen = None;
            if window.get_mouse_down(MouseButton::Left) {
                chosen = hovered;
            }
            for key in window.get_keys_pressed(KeyRepeat::No) {
                if key == Key::Escape {
                    log::info!("Setup window dismissed");
                    return Ok(None);
                }
                if let Some(i) = preset_for_key(key).filter(|&i| i < self.presets.len()) {
                    chosen = Some(i);
                }
            }

            if let Some(i) = chosen {
                let width = self.presets[i];
                log::info!("Display width {} selected", width);
                return Ok(Some(width));
            }

            let buffer = layout.render(&self.presets, hovered);
            window
                .update_with_buffer(&buffer, layout.width as usize, layout.height() as usize)
                .map_err(|e| ControlError::Window(e.to_string()))?;
        }

        log::info!("Setup window closed");
        Ok(None)
    }

    fn bind(&mut self, _events: EventSender) -> Result<(), ControlError> {
        Ok(())
    }
}
