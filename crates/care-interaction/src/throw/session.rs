// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-object manipulation sessions and the slot arena that owns them.

use rustc_hash::{FxHashMap, FxHashSet};

use super::pose::{Pose, PoseSample};
use super::ring::SampleRing;
use crate::ident::{ManipulatorId, ObjectId};

/// State kept while at least one manipulator holds an object.
#[derive(Debug, Clone)]
pub struct ManipulationSession {
    manipulators: FxHashSet<ManipulatorId>,
    pending: Option<(f32, Pose)>,
    samples: SampleRing,
    high_confidence: bool,
}

impl ManipulationSession {
    fn new(window: usize) -> Self {
        Self {
            manipulators: FxHashSet::default(),
            pending: None,
            samples: SampleRing::with_capacity(window),
            high_confidence: true,
        }
    }

    fn reset(&mut self, window: usize) {
        self.manipulators.clear();
        self.pending = None;
        self.samples.reset(window);
        self.high_confidence = true;
    }

    /// Adds `manipulator`; returns false when it was already present.
    pub fn insert(&mut self, manipulator: ManipulatorId) -> bool {
        self.manipulators.insert(manipulator)
    }

    /// Removes `manipulator`; returns false when it was not present.
    pub fn remove(&mut self, manipulator: ManipulatorId) -> bool {
        self.manipulators.remove(&manipulator)
    }

    /// True when `manipulator` holds the object.
    pub fn contains(&self, manipulator: ManipulatorId) -> bool {
        self.manipulators.contains(&manipulator)
    }

    /// Active manipulators (unordered).
    pub fn manipulators(&self) -> impl Iterator<Item = ManipulatorId> + '_ {
        self.manipulators.iter().copied()
    }

    /// Number of active manipulators.
    pub fn manipulator_count(&self) -> usize {
        self.manipulators.len()
    }

    /// Confidence of the most recent frame.
    pub fn is_high_confidence(&self) -> bool {
        self.high_confidence
    }

    /// Recorded history, oldest first.
    pub fn samples(&self) -> &[PoseSample] {
        self.samples.as_slice()
    }

    /// Number of recorded samples.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Frame tick while held: records the previous frame's pose and keeps the
    /// current one pending, because the host has not moved the transform yet.
    pub fn advance(&mut self, now: f32, pose: Pose, confident: bool) {
        if let Some((time, previous)) = self.pending.take() {
            self.push(time, previous, confident);
        }
        self.pending = Some((now, pose));
    }

    /// Release tick: flushes the pending frame, then records `pose` at `now`
    /// directly.
    pub fn capture_final(&mut self, now: f32, pose: Pose, confident: bool) {
        if let Some((time, previous)) = self.pending.take() {
            self.push(time, previous, confident);
        }
        self.push(now, pose, confident);
    }

    fn push(&mut self, time: f32, pose: Pose, confident: bool) -> bool {
        let mut confident = confident;
        if let Some(last) = self.samples.last() {
            if time - last.time <= 0.0 {
                return false;
            }
            if last.pose.position == pose.position {
                // Bit-identical positions on consecutive frames usually mean
                // tracking froze rather than the hand holding still.
                confident = false;
            }
        }
        self.high_confidence = confident;
        self.samples.push(PoseSample {
            time,
            pose,
            high_confidence: confident,
        });
        true
    }
}

/// Generation-checked index of an arena slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    session: ManipulationSession,
    generation: u32,
    live: bool,
}

/// Arena of session slots keyed by object identity.
///
/// Released slots keep their allocations and are reused by the next session.
#[derive(Debug)]
pub struct SessionArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_object: FxHashMap<ObjectId, SessionHandle>,
    window: usize,
}

impl SessionArena {
    /// Arena whose sessions keep `window` samples.
    pub fn new(window: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_object: FxHashMap::default(),
            window,
        }
    }

    /// Existing session for `object`, or a freshly reset one.
    /// The flag is true when the session was created by this call.
    pub fn acquire(&mut self, object: ObjectId) -> (SessionHandle, bool) {
        if let Some(handle) = self.by_object.get(&object) {
            return (*handle, false);
        }
        let handle = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.session.reset(self.window);
            slot.live = true;
            SessionHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                session: ManipulationSession::new(self.window),
                generation: 0,
                live: true,
            });
            SessionHandle {
                index,
                generation: 0,
            }
        };
        self.by_object.insert(object, handle);
        (handle, true)
    }

    /// Handle of the live session for `object`.
    pub fn handle(&self, object: ObjectId) -> Option<SessionHandle> {
        self.by_object.get(&object).copied()
    }

    /// Session behind `handle` if it is still live.
    pub fn get(&self, handle: SessionHandle) -> Option<&ManipulationSession> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.live && slot.generation == handle.generation)
            .map(|slot| &slot.session)
    }

    /// Mutable session behind `handle` if it is still live.
    pub fn get_mut(&mut self, handle: SessionHandle) -> Option<&mut ManipulationSession> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.live && slot.generation == handle.generation)
            .map(|slot| &mut slot.session)
    }

    /// Live session for `object`.
    pub fn session_mut(&mut self, object: ObjectId) -> Option<&mut ManipulationSession> {
        let handle = self.handle(object)?;
        self.get_mut(handle)
    }

    /// Live session for `object`.
    pub fn session(&self, object: ObjectId) -> Option<&ManipulationSession> {
        let handle = self.handle(object)?;
        self.get(handle)
    }

    /// Tears down the session for `object`, returning its slot to the pool.
    pub fn release(&mut self, object: ObjectId) -> bool {
        let Some(handle) = self.by_object.remove(&object) else {
            return false;
        };
        if let Some(slot) = self.slots.get_mut(handle.index as usize) {
            slot.live = false;
            slot.generation = slot.generation.wrapping_add(1);
            slot.session.reset(self.window);
            self.free.push(handle.index);
        }
        true
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.by_object.len()
    }

    /// True when no session is live.
    pub fn is_empty(&self) -> bool {
        self.by_object.is_empty()
    }

    /// Total slots allocated, live or pooled.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_math::Vec3;

    #[test]
    fn advance_records_previous_frame() {
        let mut arena = SessionArena::new(10);
        let (handle, created) = arena.acquire(ObjectId(1));
        assert!(created);
        let session = arena.get_mut(handle).unwrap();
        session.advance(0.0, Pose::at(Vec3::new(0.0, 0.0, 0.0)), true);
        assert_eq!(session.sample_count(), 0);
        session.advance(0.1, Pose::at(Vec3::new(1.0, 0.0, 0.0)), true);
        assert_eq!(session.sample_count(), 1);
        assert_eq!(session.samples()[0].time, 0.0);

        let held = arena.session(ObjectId(1)).unwrap();
        assert_eq!(held.samples().len(), 1);
    }

    #[test]
    fn duplicate_timestamps_are_skipped() {
        let mut arena = SessionArena::new(10);
        let (handle, _) = arena.acquire(ObjectId(1));
        let session = arena.get_mut(handle).unwrap();
        for x in [0.0, 1.0, 2.0] {
            session.advance(0.5, Pose::at(Vec3::new(x, 0.0, 0.0)), true);
        }
        assert_eq!(session.sample_count(), 1);
    }

    #[test]
    fn identical_positions_downgrade_confidence() {
        let mut arena = SessionArena::new(10);
        let (handle, _) = arena.acquire(ObjectId(1));
        let session = arena.get_mut(handle).unwrap();
        let still = Pose::at(Vec3::new(0.2, 0.2, 0.2));
        session.capture_final(0.0, still, true);
        session.capture_final(0.1, still, true);
        assert!(!session.is_high_confidence());
        assert!(!session.samples()[1].high_confidence);
        assert!(session.samples()[0].high_confidence);
    }

    #[test]
    fn released_slot_is_reused_with_new_generation() {
        let mut arena = SessionArena::new(4);
        let (first, _) = arena.acquire(ObjectId(1));
        arena.get_mut(first).unwrap().insert(ManipulatorId(3));
        assert!(arena.release(ObjectId(1)));
        assert!(arena.get(first).is_none());

        let (second, created) = arena.acquire(ObjectId(2));
        assert!(created);
        assert_eq!(arena.slot_count(), 1);
        assert_ne!(first, second);
        assert_eq!(arena.get(second).unwrap().manipulator_count(), 0);
    }
}
