//! Brake events.
//!
//! Events fire only on *transitions*, never every frame. The train buffers
//! them in a fixed-capacity [`EventBuffer`] until the host drains them with
//! [`Train::drain_events`](crate::train::Train::drain_events). A host that
//! never drains loses the oldest events, not memory.

use std::collections::VecDeque;

use crate::id::CarIndex;

/// Capacity of a train's event buffer unless configured otherwise.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A brake-system event. All events carry the frame they occurred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrakeEvent {
    /// A main car's compressor cut in.
    CompressorStarted { car: CarIndex, frame: u64 },
    /// A main car's compressor cut out at maximum reservoir pressure.
    CompressorStopped { car: CarIndex, frame: u64 },
    /// The coupling between car `coupling` and the car behind it started
    /// leaking because one of them derailed.
    CouplingBreached { coupling: usize, frame: u64 },
}

impl BrakeEvent {
    pub fn frame(&self) -> u64 {
        match *self {
            BrakeEvent::CompressorStarted { frame, .. }
            | BrakeEvent::CompressorStopped { frame, .. }
            | BrakeEvent::CouplingBreached { frame, .. } => frame,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// A bounded FIFO of events. Fixed capacity; when full, the oldest event is
/// dropped.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: VecDeque<BrakeEvent>,
    capacity: usize,
    /// Events discarded because the buffer was full.
    dropped: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: BrakeEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events dropped since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &BrakeEvent> {
        self.events.iter()
    }

    /// Remove and return every stored event, oldest first.
    pub fn drain(&mut self) -> Vec<BrakeEvent> {
        self.events.drain(..).collect()
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
