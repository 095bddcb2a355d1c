/// Leader settings tests
///
/// Reads, leader-only writes and value checks on LeaderSettings.
/// Run with: cargo test --test leader_settings_tests

use relctx::{ContextError, EnvOp, LeaderSettings, MemoryEnvironment, Value};
use std::rc::Rc;

fn environment(is_leader: bool) -> Rc<MemoryEnvironment> {
    Rc::new(
        MemoryEnvironment::new("foo/0")
            .with_leadership(is_leader)
            .with_leader_setting("a_key", "a_value"),
    )
}

#[test]
fn test_get() {
    let env = environment(false);
    let leader = LeaderSettings::new(env.clone());

    assert!(!leader.is_loaded());
    assert_eq!(leader.require("a_key").unwrap(), "a_value");
    assert_eq!(leader.get("a_key").unwrap().as_deref(), Some("a_value"));
    assert_eq!(env.calls(EnvOp::GetLeaderSettings), 1);

    let err = leader.require("missing").unwrap_err();
    assert!(matches!(err, ContextError::NotFound(key) if key == "missing"));
    assert!(!leader.contains_key("missing").unwrap());
}

#[test]
fn test_set_as_leader() {
    let env = environment(true);
    let leader = LeaderSettings::new(env.clone());

    // Updates work
    leader.set("key", "foo").unwrap();
    assert_eq!(env.calls(EnvOp::SetLeaderSettings), 1);
    assert_eq!(env.leader_data().get("key").map(String::as_str), Some("foo"));

    // Deletes work
    leader.delete("key").unwrap();
    assert_eq!(env.calls(EnvOp::SetLeaderSettings), 2);
    assert!(!env.leader_data().contains_key("key"));

    // Owned strings work too
    leader.set("key", String::from("bar")).unwrap();
    assert_eq!(env.leader_data().get("key").map(String::as_str), Some("bar"));

    // Bytes fail, even valid UTF-8
    assert!(leader.set("key", b"baz").unwrap_err().is_invalid_value());

    // Non-strings fail rather than being coerced
    assert!(leader.set("key", Value::Integer(42)).unwrap_err().is_invalid_value());
    assert!(leader.set("key", true).unwrap_err().is_invalid_value());
    assert_eq!(env.calls(EnvOp::SetLeaderSettings), 3);
}

#[test]
fn test_set_not_leader() {
    let env = environment(false);
    let leader = LeaderSettings::new(env.clone());

    let err = leader.set("a_key", "foo").unwrap_err();
    assert!(err.is_permission_denied());
    let err = leader.delete("a_key").unwrap_err();
    assert!(err.is_permission_denied());

    assert_eq!(env.calls(EnvOp::SetLeaderSettings), 0);
    assert_eq!(leader.require("a_key").unwrap(), "a_value");
}

#[test]
fn test_value_checked_before_leadership() {
    let env = environment(false);
    let leader = LeaderSettings::new(env.clone());

    let err = leader.set("a_key", Value::Integer(1)).unwrap_err();
    assert!(err.is_invalid_value());
    assert_eq!(env.calls(EnvOp::IsLeader), 0);
}

#[test]
fn test_leadership_rechecked_on_every_write() {
    let env = environment(true);
    let leader = LeaderSettings::new(env.clone());

    leader.set("k", "1").unwrap();
    env.set_leader(false);
    assert!(leader.set("k", "2").unwrap_err().is_permission_denied());
    env.set_leader(true);
    leader.set("k", "3").unwrap();

    assert_eq!(env.calls(EnvOp::IsLeader), 3);
    assert_eq!(leader.require("k").unwrap(), "3");
}

#[test]
fn test_write_then_read_without_fetch() {
    let env = environment(true);
    let leader = LeaderSettings::new(env.clone());

    leader.set("k", "v").unwrap();
    assert_eq!(leader.require("k").unwrap(), "v");
    assert_eq!(env.calls(EnvOp::GetLeaderSettings), 0);

    // Listing keys needs the full settings, with the write folded in
    assert_eq!(leader.keys().unwrap(), vec!["a_key", "k"]);
    assert_eq!(env.calls(EnvOp::GetLeaderSettings), 1);
}

#[test]
fn test_leadership_query_failure_propagates() {
    let env = environment(true);
    let leader = LeaderSettings::new(env.clone());

    env.fail_next(EnvOp::IsLeader);
    let err = leader.set("k", "v").unwrap_err();
    assert!(err.is_transport());
    assert_eq!(env.calls(EnvOp::SetLeaderSettings), 0);
    assert_eq!(leader.get("k").unwrap(), None);
}
