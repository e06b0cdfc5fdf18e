//! Time-ordered action scheduler
//!
//! A timeline owns a monotonic clock and a queue of actions keyed by offset.
//! `advance` moves the clock forward and pops every entry whose offset has been
//! reached, in ascending offset order with insertion order breaking ties. Popped
//! entries are gone; nothing is ever replayed within a run.
//!
//! The append cursor lets producers build sequences ("spawn, wait 0.5, spawn")
//! without computing absolute offsets themselves.

use std::collections::VecDeque;

use super::events::{LevelEvent, TimedEvent};
use super::message::MessageTimeline;

#[derive(Debug, Clone)]
struct Entry<A> {
    at: f32,
    action: A,
}

#[derive(Debug, Clone)]
pub struct Timeline<A> {
    clock: f32,
    cursor: f32,
    entries: VecDeque<Entry<A>>,
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Timeline<A> {
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            cursor: 0.0,
            entries: VecDeque::new(),
        }
    }

    /// Time elapsed since the last reset
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Offset the next `append` lands on
    pub fn cursor(&self) -> f32 {
        self.cursor.max(self.clock)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// No pending entries and the clock has passed every appended wait
    pub fn is_finished(&self) -> bool {
        self.entries.is_empty() && self.clock >= self.cursor
    }

    /// Schedule an action at an absolute offset. Offsets already in the past
    /// fire on the next `advance`.
    pub fn schedule(&mut self, at: f32, action: A) {
        let at = if at.is_finite() { at } else { self.clock };
        // Insert after every entry with the same offset (FIFO on ties)
        let idx = self.entries.partition_point(|e| e.at <= at);
        self.entries.insert(idx, Entry { at, action });
    }

    /// Schedule an action at the cursor
    pub fn append(&mut self, action: A) {
        let at = self.cursor();
        self.schedule(at, action);
    }

    /// Move the cursor forward
    pub fn wait(&mut self, duration: f32) {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.cursor = self.cursor() + duration;
    }

    /// Advance the clock and pop every due action in order
    pub fn advance(&mut self, dt: f32) -> Vec<A> {
        if dt.is_finite() && dt > 0.0 {
            self.clock += dt;
        }
        let mut due = Vec::new();
        while self.entries.front().is_some_and(|e| e.at <= self.clock) {
            if let Some(entry) = self.entries.pop_front() {
                due.push(entry.action);
            }
        }
        due
    }

    /// Drop pending entries; the clock keeps running
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = self.clock;
    }

    /// Drop pending entries and rewind to zero
    pub fn reset(&mut self) {
        self.entries.clear();
        self.clock = 0.0;
        self.cursor = 0.0;
    }
}

/// Actions on the main gameplay timeline
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineAction {
    /// Spawn a wall; its speed is taken from the effective speed when it fires
    SpawnWall {
        side: i64,
        thickness: f32,
        speed_adj: f32,
    },
    /// Call a script function
    CallScript { function: String },
}

/// The three independently advanced timelines of a run
#[derive(Debug, Clone, Default)]
pub struct Timelines {
    /// Wall spawning, filled by the script's `on_step`
    pub main: Timeline<TimelineAction>,
    /// Level-authored event schedule
    pub events: Timeline<LevelEvent>,
    /// On-screen messages
    pub messages: MessageTimeline,
}

impl Timelines {
    /// Rewind every timeline to zero and repopulate the event schedule
    pub fn reset(&mut self, schedule: &[TimedEvent]) {
        self.main.reset();
        self.events.reset();
        self.messages.reset();
        for event in schedule {
            self.events.schedule(event.time.max(0.0), event.event.clone());
        }
    }
}
