// Typeswitch Key Emulation
// Timed chord taps and verbatim replay through a KeyEmitter

use std::time::Duration;

use super::{KeyEmitter, UInputError};
use crate::input::RawKeyEvent;
use crate::{Action, Key};

/// Default pause before every emitted group.
pub const DEFAULT_EMULATION_DELAY: Duration = Duration::from_millis(10);

/// Emits synthetic key input with a fixed inter-event delay.
///
/// Every primitive blocks until its last `sync()` has returned. Any write
/// error is returned immediately; nothing already emitted is rolled back.
pub struct KeyEmulator<E: KeyEmitter> {
    emitter: E,
    delay: Duration,
}

impl<E: KeyEmitter> KeyEmulator<E> {
    /// A zero `delay` disables sleeping entirely.
    pub fn new(emitter: E, delay: Duration) -> Self {
        Self { emitter, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut E {
        &mut self.emitter
    }

    pub fn into_inner(self) -> E {
        self.emitter
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }

    /// Press and release `keys` simultaneously, `repeat` times.
    ///
    /// Each repetition: pause, press every key, sync, pause, release every
    /// key, sync. Keys are pressed and released in the given order.
    pub fn tap(&mut self, keys: &[Key], repeat: usize) -> Result<(), UInputError> {
        if keys.is_empty() {
            return Ok(());
        }

        for _ in 0..repeat {
            self.pause();
            for key in keys {
                self.emitter.write_key(*key, Action::Press)?;
            }
            self.emitter.sync()?;

            self.pause();
            for key in keys {
                self.emitter.write_key(*key, Action::Release)?;
            }
            self.emitter.sync()?;

            log::debug!("{:?} tapped", keys.iter().map(|k| k.name()).collect::<Vec<_>>());
        }
        Ok(())
    }

    /// Re-emit buffered events exactly as they were read.
    ///
    /// Returns the number of events emitted.
    pub fn replay<'a, I>(&mut self, events: I) -> Result<usize, UInputError>
    where
        I: IntoIterator<Item = &'a RawKeyEvent>,
    {
        let mut emitted = 0;
        for event in events {
            self.pause();
            self.emitter.write_key(event.key, event.action)?;
            self.emitter.sync()?;
            log::debug!("Emulated: {} {}", event.key, event.action);
            emitted += 1;
        }
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{EmittedOp, RecordingEmitter};
    use std::time::Instant;

    fn emulator() -> KeyEmulator<RecordingEmitter> {
        KeyEmulator::new(RecordingEmitter::new(), Duration::ZERO)
    }

    #[test]
    fn test_tap_single_key() {
        let mut emu = emulator();
        emu.tap(&[Key::BACKSPACE], 1).unwrap();

        assert_eq!(
            emu.emitter().ops(),
            &[
                EmittedOp::Key(Key::BACKSPACE, Action::Press),
                EmittedOp::Sync,
                EmittedOp::Key(Key::BACKSPACE, Action::Release),
                EmittedOp::Sync,
            ]
        );
    }

    #[test]
    fn test_tap_chord_presses_all_before_sync() {
        let mut emu = emulator();
        emu.tap(&[Key::LEFT_ALT, Key::LEFT_SHIFT], 1).unwrap();

        assert_eq!(
            emu.emitter().ops(),
            &[
                EmittedOp::Key(Key::LEFT_ALT, Action::Press),
                EmittedOp::Key(Key::LEFT_SHIFT, Action::Press),
                EmittedOp::Sync,
                EmittedOp::Key(Key::LEFT_ALT, Action::Release),
                EmittedOp::Key(Key::LEFT_SHIFT, Action::Release),
                EmittedOp::Sync,
            ]
        );
    }

    #[test]
    fn test_tap_repeat() {
        let mut emu = emulator();
        emu.tap(&[Key::BACKSPACE], 3).unwrap();
        assert_eq!(emu.emitter().key_ops().len(), 6);
        assert_eq!(emu.emitter().sync_count(), 6);
    }

    #[test]
    fn test_tap_zero_repeat_or_no_keys_emits_nothing() {
        let mut emu = emulator();
        emu.tap(&[Key::BACKSPACE], 0).unwrap();
        emu.tap(&[], 5).unwrap();
        assert!(emu.emitter().ops().is_empty());
    }

    #[test]
    fn test_replay_is_verbatim() {
        let events = [
            RawKeyEvent::press(Key::A),
            RawKeyEvent::repeat(Key::A),
            RawKeyEvent::release(Key::A),
        ];
        let mut emu = emulator();
        let emitted = emu.replay(&events).unwrap();

        assert_eq!(emitted, 3);
        assert_eq!(
            emu.emitter().ops(),
            &[
                EmittedOp::Key(Key::A, Action::Press),
                EmittedOp::Sync,
                EmittedOp::Key(Key::A, Action::Repeat),
                EmittedOp::Sync,
                EmittedOp::Key(Key::A, Action::Release),
                EmittedOp::Sync,
            ]
        );
    }

    #[test]
    fn test_write_failure_stops_emission() {
        let mut emu = KeyEmulator::new(RecordingEmitter::failing_after(2), Duration::ZERO);
        let result = emu.tap(&[Key::BACKSPACE], 4);
        assert!(matches!(result, Err(UInputError::WriteError(_))));
        assert_eq!(emu.emitter().ops().len(), 2);
    }

    #[test]
    fn test_delay_is_applied() {
        let mut emu = KeyEmulator::new(RecordingEmitter::new(), Duration::from_millis(5));
        let start = Instant::now();
        emu.tap(&[Key::A], 2).unwrap();
        // Two pauses per repetition
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(emu.delay(), Duration::from_millis(5));
    }
}
