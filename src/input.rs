//! Keyboard and mouse state.
//!
//! [`Input`] turns winit's event stream into per-frame queries: what is held,
//! what went down or up since the last frame, where the cursor is and how far
//! the mouse moved. Apps feed it from `window_event` and `device_event` and
//! call [`Input::begin_frame`] after consuming a frame's edges.
//!
//! ```ignore
//! if input.key_pressed(KeyCode::Key2) {
//!     field.set_mode(Precipitation::Snow);
//! }
//! let look = input.mouse_motion();
//! camera.look(look.x, look.y);
//! ```

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{DeviceEvent, ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// The tracked button for a winit button. Back, forward and other extra
    /// buttons are not tracked.
    pub fn from_winit(button: WinitMouseButton) -> Option<Self> {
        match button {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Keys the scenes react to. Everything else maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    W,
    A,
    S,
    D,
    P,
    Key1,
    Key2,
    Key3,
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
    Other(u32),
}

impl KeyCode {
    /// Digit value for the number-row keys.
    pub fn digit(self) -> Option<u8> {
        match self {
            KeyCode::Key1 => Some(1),
            KeyCode::Key2 => Some(2),
            KeyCode::Key3 => Some(3),
            _ => None,
        }
    }
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::KeyW => KeyCode::W,
            WinitKeyCode::KeyA => KeyCode::A,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyD => KeyCode::D,
            WinitKeyCode::KeyP => KeyCode::P,
            WinitKeyCode::Digit1 | WinitKeyCode::Numpad1 => KeyCode::Key1,
            WinitKeyCode::Digit2 | WinitKeyCode::Numpad2 => KeyCode::Key2,
            WinitKeyCode::Digit3 | WinitKeyCode::Numpad3 => KeyCode::Key3,
            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::ArrowLeft => KeyCode::Left,
            WinitKeyCode::ArrowRight => KeyCode::Right,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Map a cursor position in pixels onto `[min, max]` on both axes, with Y
/// pointing up. `(0, 0)` maps to `(min, max)`.
///
/// With `min = -1, max = 1` this is the NDC conversion. A zero-sized window
/// maps everything to the centre of the range.
pub fn cursor_in_range(position: Vec2, window_size: (u32, u32), min: f32, max: f32) -> Vec2 {
    let (w, h) = window_size;
    if w == 0 || h == 0 {
        return Vec2::splat((min + max) / 2.0);
    }
    let span = max - min;
    Vec2::new(
        min + position.x / w as f32 * span,
        max - position.y / h as f32 * span,
    )
}

/// Input state tracking for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    /// Key-down edges in event order.
    keys_pressed: Vec<KeyCode>,
    keys_released: HashSet<KeyCode>,

    mouse_held: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,
    mouse_released: HashSet<MouseButton>,

    mouse_position: Vec2,
    mouse_ndc: Vec2,
    /// Raw device motion accumulated since `begin_frame`.
    mouse_motion: Vec2,

    window_size: (u32, u32),
}

impl Input {
    pub fn new() -> Self {
        Self {
            window_size: (800, 600),
            ..Default::default()
        }
    }

    /// Key went down since the last frame. Auto-repeat does not count.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Keys that went down since the last frame, in the order they went
    /// down.
    pub fn pressed_keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys_pressed.iter().copied()
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_released.contains(&button)
    }

    /// Cursor position in window pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Cursor position in normalized device coordinates, Y up.
    pub fn mouse_ndc(&self) -> Vec2 {
        self.mouse_ndc
    }

    /// Raw mouse motion since the last frame, in device units. Unlike the
    /// cursor this keeps reporting while the cursor is grabbed.
    pub fn mouse_motion(&self) -> Vec2 {
        self.mouse_motion
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Clear per-frame edges and motion.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_pressed.clear();
        self.mouse_released.clear();
        self.mouse_motion = Vec2::ZERO;
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.mouse_ndc = cursor_in_range(self.mouse_position, self.window_size, -1.0, 1.0);
    }

    pub(crate) fn press_key(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.push(key);
        }
    }

    pub(crate) fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
        self.keys_released.insert(key);
    }

    pub(crate) fn press_button(&mut self, button: MouseButton) {
        self.mouse_pressed.insert(button);
        self.mouse_held.insert(button);
    }

    pub(crate) fn release_button(&mut self, button: MouseButton) {
        self.mouse_held.remove(&button);
        self.mouse_released.insert(button);
    }

    pub(crate) fn move_cursor(&mut self, position: Vec2) {
        self.mouse_position = position;
        self.mouse_ndc = cursor_in_range(position, self.window_size, -1.0, 1.0);
    }

    pub(crate) fn add_motion(&mut self, delta: Vec2) {
        self.mouse_motion += delta;
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let key = KeyCode::from(code);
                    match event.state {
                        ElementState::Pressed => self.press_key(key),
                        ElementState::Released => self.release_key(key),
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => self.mouse_input(*state, *button),
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::Resized(size) => self.set_window_size(size.width, size.height),
            _ => {}
        }
    }

    pub(crate) fn mouse_input(&mut self, state: ElementState, button: WinitMouseButton) {
        let Some(button) = MouseButton::from_winit(button) else {
            return;
        };
        match state {
            ElementState::Pressed => self.press_button(button),
            ElementState::Released => self.release_button(button),
        }
    }

    /// Process a winit device event.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.add_motion(Vec2::new(delta.0 as f32, delta.1 as f32));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = Input::new();
        assert!(!input.key_held(KeyCode::Space));

        input.press_key(KeyCode::Space);
        assert!(input.key_held(KeyCode::Space));
        assert!(input.key_pressed(KeyCode::Space));

        input.begin_frame();
        assert!(input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));

        // held key repeating does not re-trigger
        input.press_key(KeyCode::Space);
        assert!(!input.key_pressed(KeyCode::Space));

        input.release_key(KeyCode::Space);
        assert!(input.key_released(KeyCode::Space));
        assert!(!input.key_held(KeyCode::Space));
    }

    #[test]
    fn test_mouse_buttons() {
        let mut input = Input::new();
        input.press_button(MouseButton::Left);
        assert!(input.mouse_pressed(MouseButton::Left));
        input.begin_frame();
        assert!(input.mouse_held(MouseButton::Left));
        input.release_button(MouseButton::Left);
        assert!(input.mouse_released(MouseButton::Left));
        assert!(!input.mouse_held(MouseButton::Left));
    }

    #[test]
    fn test_mouse_ndc() {
        let mut input = Input::new();
        input.set_window_size(800, 600);

        input.move_cursor(Vec2::new(400.0, 300.0));
        assert!(input.mouse_ndc().length() < 1e-6);

        input.move_cursor(Vec2::new(0.0, 0.0));
        assert_eq!(input.mouse_ndc(), Vec2::new(-1.0, 1.0));
        input.move_cursor(Vec2::new(800.0, 600.0));
        assert_eq!(input.mouse_ndc(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_cursor_in_custom_range() {
        let p = cursor_in_range(Vec2::new(200.0, 150.0), (400, 300), -3.0, 3.0);
        assert!(p.length() < 1e-6);
        let corner = cursor_in_range(Vec2::new(400.0, 0.0), (400, 300), 0.0, 10.0);
        assert_eq!(corner, Vec2::new(10.0, 10.0));
        assert_eq!(cursor_in_range(Vec2::ONE, (0, 0), -1.0, 1.0), Vec2::ZERO);
    }

    #[test]
    fn test_motion_accumulates_until_frame() {
        let mut input = Input::new();
        input.handle_device_event(&DeviceEvent::MouseMotion { delta: (3.0, -1.0) });
        input.handle_device_event(&DeviceEvent::MouseMotion { delta: (2.0, 4.0) });
        assert_eq!(input.mouse_motion(), Vec2::new(5.0, 3.0));
        input.begin_frame();
        assert_eq!(input.mouse_motion(), Vec2::ZERO);
    }

    #[test]
    fn test_digits() {
        assert_eq!(KeyCode::from(WinitKeyCode::Digit2).digit(), Some(2));
        assert_eq!(KeyCode::from(WinitKeyCode::Numpad3), KeyCode::Key3);
        assert_eq!(KeyCode::W.digit(), None);
    }

    #[test]
    fn test_extra_buttons_are_ignored() {
        let mut input = Input::new();
        input.mouse_input(ElementState::Pressed, WinitMouseButton::Left);
        input.begin_frame();

        input.mouse_input(ElementState::Pressed, WinitMouseButton::Back);
        input.mouse_input(ElementState::Pressed, WinitMouseButton::Other(7));
        assert!(!input.mouse_pressed(MouseButton::Left));

        input.mouse_input(ElementState::Released, WinitMouseButton::Forward);
        input.mouse_input(ElementState::Released, WinitMouseButton::Back);
        assert!(input.mouse_held(MouseButton::Left));
        assert!(!input.mouse_released(MouseButton::Left));

        assert_eq!(MouseButton::from_winit(WinitMouseButton::Middle), Some(MouseButton::Middle));
        assert_eq!(MouseButton::from_winit(WinitMouseButton::Back), None);
    }

    #[test]
    fn test_pressed_keys_keep_event_order() {
        let mut input = Input::new();
        input.press_key(KeyCode::Key3);
        input.press_key(KeyCode::W);
        input.press_key(KeyCode::Key1);
        // repeat of a held key is not a new edge
        input.press_key(KeyCode::Key3);
        assert_eq!(
            input.pressed_keys().collect::<Vec<_>>(),
            vec![KeyCode::Key3, KeyCode::W, KeyCode::Key1]
        );
        assert!(input.key_pressed(KeyCode::W));
        input.begin_frame();
        assert_eq!(input.pressed_keys().count(), 0);
    }
}
