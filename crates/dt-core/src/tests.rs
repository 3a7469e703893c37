//! Unit tests for dt-core primitives.

#[cfg(test)]
mod ids {
    use crate::{BoxIndex, WorkerId};

    #[test]
    fn index_roundtrip() {
        let id = BoxIndex(42);
        assert_eq!(id.index(), 42);
        assert_eq!(BoxIndex::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(BoxIndex(0) < BoxIndex(1));
        assert!(WorkerId(2) > WorkerId(1));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(BoxIndex::INVALID.0, u32::MAX);
        assert_eq!(WorkerId::INVALID.0, u16::MAX);
    }

    #[test]
    fn display() {
        assert_eq!(BoxIndex(7).to_string(), "BoxIndex(7)");
    }
}

#[cfg(test)]
mod point {
    use crate::Point3;

    #[test]
    fn zero_distance() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(p.distance_squared(p), 0.0);
    }

    #[test]
    fn axis_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance_squared(b), 25.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn min_max() {
        let a = Point3::new(1.0, -2.0, 3.0);
        let b = Point3::new(-1.0, 5.0, 0.0);
        assert_eq!(a.min(b), Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(a.max(b), Point3::new(1.0, 5.0, 3.0));
    }

    #[test]
    fn scalar_multiply() {
        let p = Point3::new(1.0, -2.0, 0.5);
        assert_eq!(p * 2.0, Point3::new(2.0, -4.0, 1.0));
    }
}

#[cfg(test)]
mod step {
    use crate::Step;

    #[test]
    fn step_arithmetic() {
        let s = Step(10);
        assert_eq!(s + 5, Step(15));
        assert_eq!(s.offset(3), Step(13));
        assert_eq!(Step(15) - Step(10), 5u64);
    }

    #[test]
    fn fires_on_frequency() {
        assert!(Step(0).fires(2));
        assert!(!Step(1).fires(2));
        assert!(Step(4).fires(2));
        assert!(!Step(4).fires(0));
    }

    #[test]
    fn display() {
        assert_eq!(Step(3).to_string(), "s3");
    }
}

#[cfg(test)]
mod rng {
    use crate::{SimRng, WorkerId, WorkerRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = WorkerRng::new(12345, WorkerId(0));
        let mut r2 = WorkerRng::new(12345, WorkerId(0));
        for _ in 0..100 {
            let a: f32 = r1.random();
            let b: f32 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_workers_differ() {
        let mut r0 = WorkerRng::new(1, WorkerId(0));
        let mut r1 = WorkerRng::new(1, WorkerId(1));
        let a: u64 = r0.random();
        let b: u64 = r1.random();
        assert_ne!(a, b, "seeds for adjacent workers should diverge");
    }

    #[test]
    fn gen_range_in_bounds() {
        let mut rng = WorkerRng::new(0, WorkerId(0));
        for _ in 0..1000 {
            let v = rng.gen_range(0.0f32..1.0);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = WorkerRng::new(0, WorkerId(0));
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }

    #[test]
    fn sim_rng_derives_worker_rngs() {
        let sim_rng = SimRng::new(7);
        let mut a = sim_rng.worker_rng(7, WorkerId(0));
        let mut b = sim_rng.worker_rng(7, WorkerId(0));
        let x: u64 = a.random();
        let y: u64 = b.random();
        assert_eq!(x, y);
    }
}
