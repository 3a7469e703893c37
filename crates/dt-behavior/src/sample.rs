//! `TestAgent` — a generic concrete [`Agent`] used by tests throughout the
//! workspace and as a minimal example of implementing the trait.

use parking_lot::Mutex;

use dt_agent::AgentUid;
use dt_core::{BoxIndex, Point3};

use crate::{Agent, Behavior, Shape};

/// A bare-bones agent: position, diameter, an arbitrary `i64` payload used by
/// predicate-counting tests, and nothing else.
///
/// Behaviors are cloned via their own `new_copy`/`new_default`; the new UID
/// for a copy or default instance is left as [`AgentUid::INVALID`] — callers
/// (the execution context, at commit time) assign the real one once the
/// generator has issued it.
pub struct TestAgent {
    uid: AgentUid,
    box_idx: BoxIndex,
    position: Point3,
    diameter: f64,
    is_static: bool,
    behaviors: Vec<Box<dyn Behavior>>,
    /// Original-index cursor of the behavior currently executing inside
    /// `run_behaviors`, and whether that slot asked to remove itself. `None`
    /// outside of a `run_behaviors` pass.
    run_behavior_loop_idx: Option<usize>,
    current_behavior_removed: bool,
    lock: Mutex<()>,
    pub data: i64,
}

impl TestAgent {
    pub fn new(uid: AgentUid, position: Point3, diameter: f64) -> Self {
        Self {
            uid,
            box_idx: BoxIndex::INVALID,
            position,
            diameter,
            is_static: false,
            behaviors: Vec::new(),
            run_behavior_loop_idx: None,
            current_behavior_removed: false,
            lock: Mutex::new(()),
            data: 0,
        }
    }

    pub fn with_data(uid: AgentUid, position: Point3, diameter: f64, data: i64) -> Self {
        Self { data, ..Self::new(uid, position, diameter) }
    }
}

impl Agent for TestAgent {
    fn uid(&self) -> AgentUid {
        self.uid
    }

    fn set_uid(&mut self, uid: AgentUid) {
        self.uid = uid;
    }

    fn handle_box_idx(&self) -> BoxIndex {
        self.box_idx
    }

    fn set_box_idx(&mut self, idx: BoxIndex) {
        self.box_idx = idx;
    }

    fn position(&self) -> Point3 {
        self.position
    }

    fn set_position(&mut self, position: Point3) {
        self.position = position;
    }

    fn diameter(&self) -> f64 {
        self.diameter
    }

    fn set_diameter(&mut self, diameter: f64) {
        self.diameter = diameter;
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
    }

    fn behaviors(&self) -> &[Box<dyn Behavior>] {
        &self.behaviors
    }

    fn add_behavior(&mut self, behavior: Box<dyn Behavior>) {
        self.behaviors.push(behavior);
    }

    fn remove_behavior(&mut self, index: usize) -> Option<Box<dyn Behavior>> {
        // While `run_behaviors` is executing, the slot at `run_behavior_loop_idx`
        // has been taken out of `behaviors` to run it (see there), leaving a
        // one-slot hole: every index after it is shifted left by one in the
        // vec this method actually sees.
        match self.run_behavior_loop_idx {
            Some(running) if index == running => {
                self.current_behavior_removed = true;
                None
            }
            Some(running) if index < running => {
                if index >= self.behaviors.len() {
                    return None;
                }
                let removed = self.behaviors.remove(index);
                // A slot ahead of the running one just vanished, so the
                // running behavior's eventual reinsertion point (and any
                // further comparisons against `running` this pass) shift
                // down by one.
                self.run_behavior_loop_idx = Some(running - 1);
                Some(removed)
            }
            Some(_running) => {
                let shifted = index - 1;
                (shifted < self.behaviors.len()).then(|| self.behaviors.remove(shifted))
            }
            None => (index < self.behaviors.len()).then(|| self.behaviors.remove(index)),
        }
    }

    fn run_behaviors(&mut self) {
        let mut i = 0;
        while i < self.behaviors.len() {
            let mut behavior = self.behaviors.remove(i);
            self.run_behavior_loop_idx = Some(i);
            self.current_behavior_removed = false;
            behavior.run(self);
            // `run` may have removed a slot earlier than `i`, decrementing
            // `run_behavior_loop_idx` to carry that shift forward; read it
            // back rather than trusting the original `i`.
            let idx = self.run_behavior_loop_idx.unwrap_or(i);
            if self.current_behavior_removed {
                i = idx;
            } else {
                self.behaviors.insert(idx, behavior);
                i = idx + 1;
            }
        }
        self.run_behavior_loop_idx = None;
    }

    fn lock(&self) -> &Mutex<()> {
        &self.lock
    }

    fn new_default(&self) -> Box<dyn Agent> {
        Box::new(TestAgent::new(AgentUid::INVALID, Point3::ORIGIN, self.diameter))
    }

    fn new_copy(&self) -> Box<dyn Agent> {
        let behaviors = self.behaviors.iter().map(|b| b.new_copy()).collect();
        Box::new(TestAgent {
            uid: AgentUid::INVALID,
            box_idx: self.box_idx,
            position: self.position,
            diameter: self.diameter,
            is_static: self.is_static,
            behaviors,
            run_behavior_loop_idx: None,
            current_behavior_removed: false,
            lock: Mutex::new(()),
            data: self.data,
        })
    }

    fn get_shape(&self) -> Shape {
        Shape::Sphere
    }

    fn calculate_displacement(&self, force: Point3, _squared_radius: f64, dt: f64) -> Point3 {
        force * dt
    }

    fn apply_displacement(&mut self, displacement: Point3) {
        self.position = self.position + displacement;
    }
}
