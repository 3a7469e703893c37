//! `UniformGridEnvironment` — the mandatory reference spatial index.
//!
//! A three-dimensional array of fixed-edge boxes covering the simulation
//! space, padded by one box on every face so the 27-cell Moore neighborhood
//! never needs a bounds check. Each box tracks the iteration it was last
//! touched and the head of a per-box linked list of occupant handles; list
//! successors and cached occupant positions live in parallel slot arrays
//! indexed by handle, written under the same distinct-index-is-safe argument
//! `dt_agent::AgentUidMap` uses: two threads assigning different agents to
//! (possibly the same) boxes never write the same handle's slot.

use std::cell::UnsafeCell;

use parking_lot::Mutex;

use dt_agent::AgentHandle;
use dt_core::{BoxIndex, GridBounds, Point3};

use crate::environment::{AgentSource, LockGuard, Query};
use crate::{Environment, SimulationSpace, SpatialError, SpatialResult};

struct ConcurrentSlots<T> {
    partitions: Vec<Vec<UnsafeCell<T>>>,
}

// SAFETY: callers only ever write a given handle's slot from the one thread
// processing that agent (see module docs); concurrent reads of `positions`
// at query time never race a concurrent writer because queries only run
// between, not during, calls to `update`.
unsafe impl<T: Send> Sync for ConcurrentSlots<T> {}

impl<T: Clone> ConcurrentSlots<T> {
    fn new(partition_lens: &[usize], default: T) -> Self {
        Self {
            partitions: partition_lens
                .iter()
                .map(|&len| vec![UnsafeCell::new(default.clone()); len])
                .collect(),
        }
    }

    fn set(&self, handle: AgentHandle, value: T) {
        unsafe {
            *self.partitions[handle.partition()][handle.slot()].get() = value;
        }
    }
}

impl<T: Copy> ConcurrentSlots<T> {
    fn get(&self, handle: AgentHandle) -> T {
        unsafe { *self.partitions[handle.partition()][handle.slot()].get() }
    }
}

impl<T: Clone> Default for ConcurrentSlots<T> {
    fn default() -> Self {
        Self { partitions: Vec::new() }
    }
}

#[derive(Default)]
struct GridBox {
    timestamp: u64,
    head: AgentHandle,
    len: u32,
}

pub struct UniformGridEnvironment {
    space: SimulationSpace,
    box_edge_override: Option<f64>,
    edge_length: f64,
    origin: Point3,
    dims: [i64; 3],
    bounds: GridBounds,
    boxes: Vec<Mutex<GridBox>>,
    successors: ConcurrentSlots<AgentHandle>,
    positions: ConcurrentSlots<Point3>,
    iteration: u64,
}

impl UniformGridEnvironment {
    pub fn new(space: SimulationSpace, box_edge_override: Option<f64>) -> Self {
        Self {
            space,
            box_edge_override,
            edge_length: 0.0,
            origin: Point3::ORIGIN,
            dims: [0, 0, 0],
            bounds: [0; 6],
            boxes: Vec::new(),
            successors: ConcurrentSlots::default(),
            positions: ConcurrentSlots::default(),
            iteration: 0,
        }
    }

    fn box_coords(&self, p: Point3) -> [i64; 3] {
        let gx = ((p.x - self.origin.x) / self.edge_length).floor() as i64;
        let gy = ((p.y - self.origin.y) / self.edge_length).floor() as i64;
        let gz = ((p.z - self.origin.z) / self.edge_length).floor() as i64;
        [gx.clamp(0, self.dims[0] - 1), gy.clamp(0, self.dims[1] - 1), gz.clamp(0, self.dims[2] - 1)]
    }

    fn flatten(&self, coords: [i64; 3]) -> usize {
        ((coords[2] * self.dims[1] + coords[1]) * self.dims[0] + coords[0]) as usize
    }

    fn unflatten(&self, flat: usize) -> [i64; 3] {
        let flat = flat as i64;
        let x = flat % self.dims[0];
        let rem = flat / self.dims[0];
        let y = rem % self.dims[1];
        let z = rem / self.dims[1];
        [x, y, z]
    }

    fn moore_neighbor_flats(&self, home: [i64; 3]) -> Vec<usize> {
        let mut flats = Vec::with_capacity(27);
        for dz in -1..=1i64 {
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    let bx = home[0] + dx;
                    let by = home[1] + dy;
                    let bz = home[2] + dz;
                    if bx < 0 || by < 0 || bz < 0 || bx >= self.dims[0] || by >= self.dims[1] || bz >= self.dims[2] {
                        continue;
                    }
                    flats.push(self.flatten([bx, by, bz]));
                }
            }
        }
        flats.sort_unstable();
        flats.dedup();
        flats
    }
}

impl Environment for UniformGridEnvironment {
    fn update(&mut self, source: &dyn AgentSource) -> SpatialResult<()> {
        let count = source.agent_count();
        if count == 0 {
            if self.space.is_bounds_fixed() && self.space.is_radius_fixed() {
                return Ok(());
            }
            return Err(SpatialError::Config(
                "cannot update a derived uniform grid with zero agents".to_string(),
            ));
        }

        let samples: Mutex<Vec<(Point3, f64)>> = Mutex::new(Vec::with_capacity(count));
        source.for_each_agent_mut(&|_handle, agent| {
            samples.lock().push((agent.position(), agent.diameter()));
        });
        let samples = samples.into_inner();

        self.space.update(samples.iter().copied())?;

        let largest_diameter = samples.iter().map(|(_, d)| *d).fold(0.0f64, f64::max);
        self.edge_length = match self.box_edge_override {
            Some(over) => over.max(largest_diameter),
            None => largest_diameter,
        };
        if self.edge_length <= 0.0 {
            return Err(SpatialError::Config("box edge length must be positive".to_string()));
        }
        let edge = self.edge_length;

        let raw = self.space.whole_space();
        let padded_min = Point3::new(raw[0] as f64 - edge, raw[2] as f64 - edge, raw[4] as f64 - edge);
        let padded_max = Point3::new(raw[1] as f64 + edge, raw[3] as f64 + edge, raw[5] as f64 + edge);
        let dim_of = |lo: f64, hi: f64| (((hi - lo) / edge).ceil() as i64).max(1);
        let dims =
            [dim_of(padded_min.x, padded_max.x), dim_of(padded_min.y, padded_max.y), dim_of(padded_min.z, padded_max.z)];

        self.origin = padded_min;
        self.dims = dims;
        self.bounds = [
            padded_min.x as i64,
            (padded_min.x + dims[0] as f64 * edge) as i64,
            padded_min.y as i64,
            (padded_min.y + dims[1] as f64 * edge) as i64,
            padded_min.z as i64,
            (padded_min.z + dims[2] as f64 * edge) as i64,
        ];

        let total_boxes = (dims[0] * dims[1] * dims[2]) as usize;
        self.boxes = (0..total_boxes).map(|_| Mutex::new(GridBox::default())).collect();
        self.iteration += 1;

        let partition_lens: Vec<usize> =
            (0..source.num_partitions()).map(|p| source.partition_len(p)).collect();
        self.successors = ConcurrentSlots::new(&partition_lens, AgentHandle::INVALID);
        self.positions = ConcurrentSlots::new(&partition_lens, Point3::ORIGIN);

        let iteration = self.iteration;
        source.for_each_agent_mut(&|handle, agent| {
            let position = agent.position();
            let coords = self.box_coords(position);
            let flat = self.flatten(coords);

            self.positions.set(handle, position);

            let mut grid_box = self.boxes[flat].lock();
            if grid_box.timestamp != iteration {
                grid_box.timestamp = iteration;
                grid_box.head = AgentHandle::INVALID;
                grid_box.len = 0;
            }
            self.successors.set(handle, grid_box.head);
            grid_box.head = handle;
            grid_box.len += 1;
            drop(grid_box);

            agent.set_box_idx(BoxIndex(flat as u32));
        });

        Ok(())
    }

    fn for_each_neighbor(
        &self,
        query: Query,
        squared_radius: f64,
        callback: &mut dyn FnMut(AgentHandle, f64),
    ) {
        let edge_squared = self.edge_length * self.edge_length;
        assert!(
            squared_radius <= edge_squared,
            "neighbor query radius² {squared_radius} exceeds box edge length² {edge_squared}; \
             would need to search beyond the immediate Moore neighborhood"
        );

        let exclude = match &query {
            Query::Agent { handle, .. } => Some(*handle),
            Query::Point(_) => None,
        };
        let qpos = query.position();
        let center = self.box_coords(qpos);

        for dz in -1..=1i64 {
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    let bx = center[0] + dx;
                    let by = center[1] + dy;
                    let bz = center[2] + dz;
                    if bx < 0 || by < 0 || bz < 0 || bx >= self.dims[0] || by >= self.dims[1] || bz >= self.dims[2] {
                        continue;
                    }
                    let flat = self.flatten([bx, by, bz]);
                    let mut cursor = {
                        let grid_box = self.boxes[flat].lock();
                        if grid_box.timestamp != self.iteration {
                            continue;
                        }
                        grid_box.head
                    };
                    while cursor.is_valid() {
                        if Some(cursor) != exclude {
                            let pos = self.positions.get(cursor);
                            let dx2 = (pos.x - qpos.x).powi(2);
                            if dx2 <= squared_radius {
                                let dxy2 = dx2 + (pos.y - qpos.y).powi(2);
                                if dxy2 <= squared_radius {
                                    let d2 = dxy2 + (pos.z - qpos.z).powi(2);
                                    if d2 <= squared_radius {
                                        callback(cursor, d2);
                                    }
                                }
                            }
                        }
                        cursor = self.successors.get(cursor);
                    }
                }
            }
        }
    }

    fn dimensions(&self) -> GridBounds {
        self.bounds
    }

    fn interaction_radius(&self) -> f64 {
        self.space.interaction_radius()
    }

    /// Locks every box covering `home`'s Moore neighborhood, in ascending
    /// box-index order, using the same per-box mutexes `update` takes to
    /// prepend occupants — so the `Automatic` thread-safety mode and a
    /// concurrent `update` can never interleave on one box.
    fn lock_moore_neighborhood<'a>(&'a self, home: BoxIndex) -> Box<dyn LockGuard + 'a> {
        let coords = self.unflatten(home.0 as usize);
        let flats = self.moore_neighbor_flats(coords);
        let guards: Vec<_> = flats.into_iter().map(|flat| self.boxes[flat].lock()).collect();
        Box::new(guards)
    }
}
