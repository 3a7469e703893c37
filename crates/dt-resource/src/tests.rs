//! Unit tests for `ResourceManager`.

use dt_agent::AgentUid;
use dt_behavior::TestAgent;
use dt_core::{Point3, WorkerId};
use dt_spatial::AgentSource;

use crate::ResourceManager;

fn test_agent(diameter: f64) -> Box<dyn dt_behavior::Agent> {
    Box::new(TestAgent::new(AgentUid::INVALID, Point3::ORIGIN, diameter))
}

#[test]
fn add_agent_assigns_a_fresh_uid_and_is_retrievable() {
    let rm = ResourceManager::new(1);
    let uid = rm.add_agent(WorkerId(0), test_agent(1.0));
    assert!(uid.is_valid());
    assert_eq!(rm.agent_count(), 1);
    assert!(rm.get_agent(uid).is_some());
}

#[test]
fn remove_is_deferred_until_end_of_iteration() {
    let rm = ResourceManager::new(1);
    let uid = rm.add_agent(WorkerId(0), test_agent(1.0));
    rm.remove(uid);
    assert_eq!(rm.agent_count(), 1, "agent stays visible until end_of_iteration");
    assert!(rm.get_agent(uid).is_some());

    rm.end_of_iteration();
    assert_eq!(rm.agent_count(), 0);
    assert!(rm.get_agent(uid).is_none());
}

#[test]
fn swap_remove_fixes_up_the_relocated_agents_uid_entry() {
    let rm = ResourceManager::new(1);
    let first = rm.add_agent(WorkerId(0), test_agent(1.0));
    let second = rm.add_agent(WorkerId(0), test_agent(2.0));
    rm.remove(first);
    rm.end_of_iteration();

    assert_eq!(rm.agent_count(), 1);
    assert!(rm.get_agent(first).is_none());
    let relocated = rm.get_agent(second).expect("second agent should still resolve");
    assert_eq!(relocated.diameter(), 2.0);
}

#[test]
fn freed_uid_is_recycled_by_a_later_add_agent() {
    let rm = ResourceManager::new(1);
    let uid = rm.add_agent(WorkerId(0), test_agent(1.0));
    rm.remove(uid);
    rm.end_of_iteration();

    let reissued = rm.add_agent(WorkerId(0), test_agent(1.0));
    assert_eq!(reissued.index(), uid.index());
    assert_eq!(reissued.reused(), uid.reused() + 1);
}

#[test]
fn removing_an_unknown_uid_is_a_harmless_no_op() {
    let rm = ResourceManager::new(1);
    rm.remove(AgentUid::new(999));
    rm.end_of_iteration();
    assert_eq!(rm.agent_count(), 0);
}

#[test]
fn sort_and_balance_numa_preserves_every_agent_under_its_uid() {
    let rm = ResourceManager::new(2);
    let uids: Vec<_> = (0..6).map(|i| rm.add_agent(WorkerId((i % 2) as u16), test_agent(1.0))).collect();

    rm.sort_and_balance_numa();

    assert_eq!(rm.agent_count(), 6);
    for uid in uids {
        assert!(rm.get_agent(uid).is_some());
    }
}

#[test]
fn for_each_agent_parallel_visits_every_agent_exactly_once() {
    let rm = ResourceManager::new(4);
    for i in 0..20 {
        rm.add_agent(WorkerId((i % 4) as u16), test_agent(1.0));
    }

    let seen = std::sync::Mutex::new(Vec::new());
    rm.for_each_agent_parallel(
        &|handle, _agent| seen.lock().unwrap().push(handle),
        None,
    );
    assert_eq!(seen.lock().unwrap().len(), 20);
}

#[test]
fn for_each_agent_parallel_honors_filter() {
    let rm = ResourceManager::new(1);
    rm.add_agent(WorkerId(0), test_agent(1.0));
    rm.add_agent(WorkerId(0), test_agent(5.0));

    let matched = std::sync::Mutex::new(0usize);
    rm.for_each_agent_parallel(
        &|_handle, _agent| *matched.lock().unwrap() += 1,
        Some(&|agent| agent.diameter() > 2.0),
    );
    assert_eq!(*matched.lock().unwrap(), 1);
}

#[test]
fn agent_source_contract_matches_direct_accessors() {
    let rm = ResourceManager::new(2);
    rm.add_agent(WorkerId(0), test_agent(1.0));
    rm.add_agent(WorkerId(1), test_agent(1.0));

    assert_eq!(AgentSource::agent_count(&rm), rm.agent_count());
    assert_eq!(AgentSource::num_partitions(&rm), 2);
    let total: usize = (0..AgentSource::num_partitions(&rm))
        .map(|p| AgentSource::partition_len(&rm, p))
        .sum();
    assert_eq!(total, 2);
}
