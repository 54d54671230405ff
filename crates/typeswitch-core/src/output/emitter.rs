// Typeswitch Output Sink
// Raw key writes plus explicit synchronization

use super::UInputError;
use crate::{Action, Key};

/// Something that accepts raw `EV_KEY` writes, grouped by `sync`.
///
/// Writes may be queued; nothing is guaranteed to reach the kernel before
/// the following `sync()` returns.
pub trait KeyEmitter {
    /// Queue one `(EV_KEY, code, value)` triple
    fn write_key(&mut self, key: Key, action: Action) -> Result<(), UInputError>;

    /// Flush queued writes as one group terminated by `SYN_REPORT`
    fn sync(&mut self) -> Result<(), UInputError>;
}

/// One operation seen by a [`RecordingEmitter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmittedOp {
    Key(Key, Action),
    Sync,
}

/// In-memory emitter that records every operation.
///
/// Lets the switcher run without `/dev/uinput`. Can be told to start failing
/// after a number of operations to exercise the write-failure path.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    ops: Vec<EmittedOp>,
    fail_after: Option<usize>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An emitter whose operations fail once `ops` operations have succeeded
    pub fn failing_after(ops: usize) -> Self {
        Self {
            ops: Vec::new(),
            fail_after: Some(ops),
        }
    }

    pub fn ops(&self) -> &[EmittedOp] {
        &self.ops
    }

    /// Only the key writes, syncs stripped
    pub fn key_ops(&self) -> Vec<(Key, Action)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                EmittedOp::Key(key, action) => Some((*key, *action)),
                EmittedOp::Sync => None,
            })
            .collect()
    }

    pub fn sync_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == EmittedOp::Sync).count()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    fn record(&mut self, op: EmittedOp) -> Result<(), UInputError> {
        if let Some(limit) = self.fail_after {
            if self.ops.len() >= limit {
                return Err(UInputError::WriteError(
                    "recording emitter closed".to_string(),
                ));
            }
        }
        self.ops.push(op);
        Ok(())
    }
}

impl KeyEmitter for RecordingEmitter {
    fn write_key(&mut self, key: Key, action: Action) -> Result<(), UInputError> {
        self.record(EmittedOp::Key(key, action))
    }

    fn sync(&mut self) -> Result<(), UInputError> {
        self.record(EmittedOp::Sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_emitter_records_in_order() {
        let mut emitter = RecordingEmitter::new();
        emitter.write_key(Key::A, Action::Press).unwrap();
        emitter.sync().unwrap();
        emitter.write_key(Key::A, Action::Release).unwrap();
        emitter.sync().unwrap();

        assert_eq!(
            emitter.ops(),
            &[
                EmittedOp::Key(Key::A, Action::Press),
                EmittedOp::Sync,
                EmittedOp::Key(Key::A, Action::Release),
                EmittedOp::Sync,
            ]
        );
        assert_eq!(emitter.sync_count(), 2);
        assert_eq!(
            emitter.key_ops(),
            vec![(Key::A, Action::Press), (Key::A, Action::Release)]
        );
    }

    #[test]
    fn test_failing_emitter() {
        let mut emitter = RecordingEmitter::failing_after(1);
        assert!(emitter.write_key(Key::A, Action::Press).is_ok());
        assert!(matches!(emitter.sync(), Err(UInputError::WriteError(_))));
        assert_eq!(emitter.ops().len(), 1);
    }
}
