//! `dt-agent` — stable agent identity and NUMA-partitioned agent storage.
//!
//! | Module                  | Contents                                         |
//! |--------------------------|--------------------------------------------------|
//! | [`agent_uid`]           | `AgentUid` — stable external identity            |
//! | [`agent_handle`]        | `AgentHandle` — mutable internal locator         |
//! | [`agent_uid_map`]       | `AgentUidMap<V>` — lock-free-on-distinct-keys map |
//! | [`agent_uid_generator`] | `AgentUidGenerator` — normal + defrag UID issuance |
//! | [`agent_vector`]        | `AgentVector<T>` — NUMA-partitioned parallel vector |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to `AgentUid`/`AgentHandle`. |

pub mod agent_handle;
pub mod agent_uid;
pub mod agent_uid_generator;
pub mod agent_uid_map;
pub mod agent_vector;


pub use agent_handle::AgentHandle;
pub use agent_uid::AgentUid;
pub use agent_uid_generator::AgentUidGenerator;
pub use agent_uid_map::AgentUidMap;
pub use agent_vector::AgentVector;
