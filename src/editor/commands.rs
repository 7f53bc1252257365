//! Command Queue
//!
//! Intents recorded while an event is handled and applied later, once per
//! tick, so the selection never changes inside the host's own
//! selection-changed notification.

use std::collections::VecDeque;

use crate::scene::BrickId;

/// Deferred editor intent
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedCommand {
    /// Replace the selection; the focus falls back to the first brick
    ApplySelection { bricks: Vec<BrickId>, focus: Option<BrickId> },
    /// Revert the most recent undo entry
    PerformUndo,
}

/// FIFO of [`QueuedCommand`]s
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<QueuedCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: QueuedCommand) {
        self.pending.push_back(command);
    }

    /// Take every pending command in the order it was pushed.
    pub fn drain(&mut self) -> Vec<QueuedCommand> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
