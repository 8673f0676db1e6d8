//! Keyboard shortcuts inside the display window.

use minifb::Key;

use super::ControlAction;

/// Map a key press to an action. Letter and symbol variants both work.
pub fn action_for_key(key: Key) -> Option<ControlAction> {
    match key {
        Key::Q | Key::Escape => Some(ControlAction::Quit),
        Key::I | Key::Equal | Key::NumPadPlus | Key::Up => Some(ControlAction::ZoomIn),
        Key::O | Key::Minus | Key::NumPadMinus | Key::Down => Some(ControlAction::ZoomOut),
        Key::W => Some(ControlAction::Wake),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        assert_eq!(action_for_key(Key::Q), Some(ControlAction::Quit));
        assert_eq!(action_for_key(Key::Escape), Some(ControlAction::Quit));
    }

    #[test]
    fn test_zoom_keys() {
        for key in [Key::I, Key::Equal, Key::NumPadPlus, Key::Up] {
            assert_eq!(action_for_key(key), Some(ControlAction::ZoomIn));
        }
        for key in [Key::O, Key::Minus, Key::NumPadMinus, Key::Down] {
            assert_eq!(action_for_key(key), Some(ControlAction::ZoomOut));
        }
    }

    #[test]
    fn test_wake_key() {
        assert_eq!(action_for_key(Key::W), Some(ControlAction::Wake));
    }

    #[test]
    fn test_unmapped_keys() {
        for key in [Key::Space, Key::A, Key::Enter, Key::Key1] {
            assert_eq!(action_for_key(key), None);
        }
    }
}
