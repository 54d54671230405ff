// Typeswitch Switcher
// Buffers typed keys and retypes them under the next layout on demand

mod classify;

pub use classify::{classify, ActiveKeySet, KeyClass};

use crate::config::{Config, LayoutShortcut};
use crate::input::RawKeyEvent;
use crate::output::{KeyEmitter, KeyEmulator, UInputError};
use crate::state::EventBuffer;
use crate::{Action, Key};

/// The buffering state machine.
///
/// Owns the event buffer, the count of characters those events put on
/// screen, and the emulator that deletes and retypes them.
///
/// Per event:
/// - trackable key: buffered; a release adds one character, except
///   BACKSPACE (removes one, never below zero) and the shift keys (no change)
/// - trigger key release: delete, switch layout, retype
/// - anything else: forget everything buffered
pub struct Switcher<E: KeyEmitter> {
    emulator: KeyEmulator<E>,
    active_keys: ActiveKeySet,
    trigger_key: Key,
    layout_shortcut: LayoutShortcut,
    clear_after_retype: bool,
    buffer: EventBuffer,
    char_count: usize,
}

impl<E: KeyEmitter> Switcher<E> {
    pub fn new(config: &Config, emitter: E) -> Self {
        Self {
            emulator: KeyEmulator::new(emitter, config.emulation_delay),
            active_keys: ActiveKeySet::default(),
            trigger_key: config.trigger_key,
            layout_shortcut: config.layout_shortcut.clone(),
            clear_after_retype: config.clear_after_retype,
            buffer: EventBuffer::new(config.buffer_capacity),
            char_count: 0,
        }
    }

    /// Replace the set of tracked keys
    pub fn with_active_keys(mut self, active_keys: ActiveKeySet) -> Self {
        self.active_keys = active_keys;
        self
    }

    pub fn classify(&self, key: Key) -> KeyClass {
        classify(key, &self.active_keys, self.trigger_key)
    }

    /// Process one physical key event.
    ///
    /// Only fails when the virtual device rejects a write during a retype;
    /// that error must end the process.
    pub fn handle(&mut self, event: RawKeyEvent) -> Result<KeyClass, UInputError> {
        let class = self.classify(event.key);
        match class {
            KeyClass::Trackable => self.track(event),
            KeyClass::Trigger => {
                if event.action.is_released() {
                    log::info!("Switch key released");
                    self.switch_and_retype()?;
                }
            }
            KeyClass::Reset => self.clear(),
        }
        Ok(class)
    }

    fn track(&mut self, event: RawKeyEvent) {
        if self.buffer.push(event).is_some() {
            log::trace!("Buffer full, oldest event evicted");
        }

        if event.action == Action::Release {
            if event.key == Key::BACKSPACE {
                self.char_count = self.char_count.saturating_sub(1);
            } else if !event.key.is_shift() {
                self.char_count += 1;
            }
        }

        log::debug!("{} characters in buffer", self.char_count);
    }

    /// Forget all buffered events
    pub fn clear(&mut self) {
        if self.buffer.is_empty() && self.char_count == 0 {
            return;
        }
        self.buffer.clear();
        self.char_count = 0;
        log::info!("Buffer cleared");
    }

    /// Delete the counted characters, switch layout and retype the buffer.
    ///
    /// Steps run strictly in order and each finishes its last sync before
    /// the next starts.
    pub fn switch_and_retype(&mut self) -> Result<(), UInputError> {
        self.emulator.tap(&[Key::BACKSPACE], self.char_count)?;
        self.emulator.tap(&self.layout_shortcut, 1)?;
        let replayed = self.emulator.replay(&self.buffer)?;

        log::debug!(
            "Retyped {} event(s) after deleting {} character(s)",
            replayed,
            self.char_count
        );

        if self.clear_after_retype {
            self.clear();
        }
        Ok(())
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    pub fn trigger_key(&self) -> Key {
        self.trigger_key
    }

    pub fn layout_shortcut(&self) -> &[Key] {
        &self.layout_shortcut
    }

    pub fn emulator(&self) -> &KeyEmulator<E> {
        &self.emulator
    }

    pub fn emulator_mut(&mut self) -> &mut KeyEmulator<E> {
        &mut self.emulator
    }

    /// Give back the emitter, e.g. to close the virtual device
    pub fn into_emitter(self) -> E {
        self.emulator.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingEmitter;
    use std::time::Duration;

    fn switcher() -> Switcher<RecordingEmitter> {
        let config = Config {
            emulation_delay: Duration::ZERO,
            ..Config::default()
        };
        Switcher::new(&config, RecordingEmitter::new())
    }

    fn type_key(s: &mut Switcher<RecordingEmitter>, key: Key) {
        s.handle(RawKeyEvent::press(key)).unwrap();
        s.handle(RawKeyEvent::release(key)).unwrap();
    }

    #[test]
    fn test_release_counts_characters() {
        let mut s = switcher();
        type_key(&mut s, Key::A);
        type_key(&mut s, Key::from(48)); // B
        assert_eq!(s.char_count(), 2);
        assert_eq!(s.buffer().len(), 4);
    }

    #[test]
    fn test_press_and_repeat_do_not_count() {
        let mut s = switcher();
        s.handle(RawKeyEvent::press(Key::A)).unwrap();
        s.handle(RawKeyEvent::repeat(Key::A)).unwrap();
        s.handle(RawKeyEvent::repeat(Key::A)).unwrap();
        assert_eq!(s.char_count(), 0);
        assert_eq!(s.buffer().len(), 3);
    }

    #[test]
    fn test_backspace_release_decrements() {
        let mut s = switcher();
        type_key(&mut s, Key::A);
        type_key(&mut s, Key::A);
        type_key(&mut s, Key::BACKSPACE);
        assert_eq!(s.char_count(), 1);
        // Backspace events are buffered too
        assert_eq!(s.buffer().len(), 6);
    }

    #[test]
    fn test_backspace_floors_at_zero() {
        let mut s = switcher();
        type_key(&mut s, Key::A);
        for _ in 0..5 {
            type_key(&mut s, Key::BACKSPACE);
        }
        assert_eq!(s.char_count(), 0);
    }

    #[test]
    fn test_shift_release_is_buffered_not_counted() {
        let mut s = switcher();
        type_key(&mut s, Key::LEFT_SHIFT);
        type_key(&mut s, Key::RIGHT_SHIFT);
        assert_eq!(s.char_count(), 0);
        assert_eq!(s.buffer().len(), 4);
    }

    #[test]
    fn test_foreign_key_resets() {
        let mut s = switcher();
        type_key(&mut s, Key::A);
        let class = s.handle(RawKeyEvent::press(Key::BTN_LEFT)).unwrap();
        assert_eq!(class, KeyClass::Reset);
        assert!(s.buffer().is_empty());
        assert_eq!(s.char_count(), 0);
    }

    #[test]
    fn test_trigger_press_is_ignored() {
        let mut s = switcher();
        type_key(&mut s, Key::A);
        let class = s.handle(RawKeyEvent::press(Key::PAUSE)).unwrap();
        assert_eq!(class, KeyClass::Trigger);
        assert!(s.emulator().emitter().ops().is_empty());
        assert_eq!(s.char_count(), 1);
    }

    #[test]
    fn test_trigger_release_retypes_and_keeps_buffer() {
        let mut s = switcher();
        type_key(&mut s, Key::A);
        s.handle(RawKeyEvent::release(Key::PAUSE)).unwrap();

        let ops = s.emulator().emitter().key_ops();
        assert_eq!(
            ops,
            vec![
                (Key::BACKSPACE, Action::Press),
                (Key::BACKSPACE, Action::Release),
                (Key::LEFT_ALT, Action::Press),
                (Key::LEFT_SHIFT, Action::Press),
                (Key::LEFT_ALT, Action::Release),
                (Key::LEFT_SHIFT, Action::Release),
                (Key::A, Action::Press),
                (Key::A, Action::Release),
            ]
        );
        assert_eq!(s.char_count(), 1);
        assert_eq!(s.buffer().len(), 2);
    }

    #[test]
    fn test_clear_after_retype_option() {
        let config = Config {
            emulation_delay: Duration::ZERO,
            clear_after_retype: true,
            ..Config::default()
        };
        let mut s = Switcher::new(&config, RecordingEmitter::new());
        type_key(&mut s, Key::A);
        s.switch_and_retype().unwrap();
        assert!(s.buffer().is_empty());
        assert_eq!(s.char_count(), 0);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut s = switcher();
        type_key(&mut s, Key::A);
        s.clear();
        s.clear();
        assert!(s.buffer().is_empty());
        assert_eq!(s.char_count(), 0);
    }

    #[test]
    fn test_write_failure_propagates() {
        let config = Config {
            emulation_delay: Duration::ZERO,
            ..Config::default()
        };
        let mut s = Switcher::new(&config, RecordingEmitter::failing_after(0));
        type_key(&mut s, Key::A);
        let result = s.handle(RawKeyEvent::release(Key::PAUSE));
        assert!(matches!(result, Err(UInputError::WriteError(_))));
    }

    #[test]
    fn test_custom_active_keys() {
        let only_a: ActiveKeySet = [Key::A].into_iter().collect();
        let mut s = switcher().with_active_keys(only_a);
        type_key(&mut s, Key::A);
        assert_eq!(s.char_count(), 1);
        type_key(&mut s, Key::from(48));
        assert_eq!(s.char_count(), 0);
    }
}
