//! `SimulationSpace` — the bounding box and interaction radius agents live in.

use dt_core::{GridBounds, Point3};

use crate::{SpatialError, SpatialResult};

/// Either a user-fixed value or one re-derived from live agent state on
/// every [`SimulationSpace::update`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bound<T> {
    Fixed(T),
    Derived(T),
}

impl<T> Bound<T> {
    pub fn is_fixed(&self) -> bool {
        matches!(self, Bound::Fixed(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Bound::Fixed(v) | Bound::Derived(v) => v,
        }
    }
}

/// The axis-aligned bounding box agents live in, plus the interaction radius
/// used for neighbor queries. Either field independently tracks user-fixed
/// or agent-derived state.
pub struct SimulationSpace {
    bounds: Bound<GridBounds>,
    radius: Bound<f64>,
    radius_squared: f64,
}

impl SimulationSpace {
    /// Both bounds and radius fixed by the caller; `update` is then a no-op
    /// that always succeeds, even with zero agents.
    pub fn fixed(bounds: GridBounds, interaction_radius: f64) -> Self {
        Self {
            bounds: Bound::Fixed(bounds),
            radius: Bound::Fixed(interaction_radius),
            radius_squared: interaction_radius * interaction_radius,
        }
    }

    /// Both bounds and radius re-derived from agent state on every `update`.
    /// Calling `update` with zero agents is a configuration error.
    pub fn derived() -> Self {
        Self {
            bounds: Bound::Derived([0; 6]),
            radius: Bound::Derived(0.0),
            radius_squared: 0.0,
        }
    }

    pub fn whole_space(&self) -> GridBounds {
        *self.bounds.value()
    }

    pub fn interaction_radius(&self) -> f64 {
        *self.radius.value()
    }

    pub fn interaction_radius_squared(&self) -> f64 {
        self.radius_squared
    }

    pub fn is_bounds_fixed(&self) -> bool {
        self.bounds.is_fixed()
    }

    pub fn is_radius_fixed(&self) -> bool {
        self.radius.is_fixed()
    }

    /// Recompute any derived field from the positions and diameters of every
    /// live agent. Fatal (a config error, not a panic — the caller can react
    /// by supplying fixed bounds instead) if both fields are derived and no
    /// agents exist: the core cannot guess a volume to cover.
    pub fn update<I>(&mut self, agents: I) -> SpatialResult<()>
    where
        I: IntoIterator<Item = (Point3, f64)>,
    {
        if self.bounds.is_fixed() && self.radius.is_fixed() {
            return Ok(());
        }

        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut largest_diameter = 0.0f64;
        let mut count = 0usize;

        for (position, diameter) in agents {
            min = min.min(position);
            max = max.max(position);
            largest_diameter = largest_diameter.max(diameter);
            count += 1;
        }

        if count == 0 {
            if !self.bounds.is_fixed() || !self.radius.is_fixed() {
                return Err(SpatialError::Config(
                    "cannot derive simulation space or interaction radius with zero agents"
                        .to_string(),
                ));
            }
            return Ok(());
        }

        if let Bound::Derived(_) = self.radius {
            self.radius = Bound::Derived(largest_diameter);
            self.radius_squared = largest_diameter * largest_diameter;
        }

        if let Bound::Derived(_) = self.bounds {
            let bounds: GridBounds = [
                min.x.floor() as i64,
                max.x.ceil() as i64,
                min.y.floor() as i64,
                max.y.ceil() as i64,
                min.z.floor() as i64,
                max.z.ceil() as i64,
            ];
            self.bounds = Bound::Derived(bounds);
        }

        Ok(())
    }
}
