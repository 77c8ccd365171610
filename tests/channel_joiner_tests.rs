// Channel join polling against a scripted membership

use async_trait::async_trait;
use picom::error::JoinError;
use picom::session::{ChannelJoiner, ChannelMembership, DEFAULT_JOIN_ATTEMPTS};
use picom::voice::ChannelRef;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Confirms the join after `confirm_after` polls; never when `None`
struct ScriptedMembership {
    confirm_after: Option<u32>,
    target: u32,
    joins: AtomicU32,
    polls: AtomicU32,
    fail_request: bool,
}

impl ScriptedMembership {
    fn new(target: u32, confirm_after: Option<u32>) -> Self {
        Self {
            confirm_after,
            target,
            joins: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            fail_request: false,
        }
    }
}

#[async_trait]
impl ChannelMembership for ScriptedMembership {
    async fn request_join(&self, _channel: &ChannelRef) -> anyhow::Result<()> {
        self.joins.fetch_add(1, Ordering::SeqCst);
        if self.fail_request {
            anyhow::bail!("server refused");
        }
        Ok(())
    }

    async fn current_channel_id(&self) -> Option<u32> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.confirm_after {
            Some(after) if polls >= after => Some(self.target),
            _ => Some(0),
        }
    }
}

#[tokio::test]
async fn test_join_confirmed_immediately() {
    let membership = ScriptedMembership::new(7, Some(1));
    let joiner = ChannelJoiner::default();

    let joined = joiner
        .join(&membership, Some(ChannelRef::new(7, "Stage")), "Stage")
        .await
        .unwrap();

    assert_eq!(joined.id, 7);
    assert_eq!(membership.joins.load(Ordering::SeqCst), 1);
    assert_eq!(membership.polls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_join_confirmed_late() {
    let membership = ScriptedMembership::new(7, Some(42));
    let joiner = ChannelJoiner::default();

    let joined = joiner
        .join(&membership, Some(ChannelRef::new(7, "Stage")), "Stage")
        .await
        .unwrap();

    assert_eq!(joined.name, "Stage");
    assert_eq!(membership.polls.load(Ordering::SeqCst), 42);
}

#[tokio::test]
async fn test_join_times_out_after_budget() {
    let membership = ScriptedMembership::new(7, None);
    let joiner = ChannelJoiner::default();

    let err = joiner
        .join(&membership, Some(ChannelRef::new(7, "Stage")), "Stage")
        .await
        .unwrap_err();

    match err {
        JoinError::Timeout { channel, attempts } => {
            assert_eq!(channel, "Stage");
            assert_eq!(attempts, DEFAULT_JOIN_ATTEMPTS);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(membership.polls.load(Ordering::SeqCst), DEFAULT_JOIN_ATTEMPTS);
    assert_eq!(membership.joins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_channel_is_not_found_without_joining() {
    let membership = ScriptedMembership::new(7, Some(1));
    let joiner = ChannelJoiner::default();

    let err = joiner.join(&membership, None, "Nowhere").await.unwrap_err();

    assert!(matches!(err, JoinError::NotFound(ref key) if key == "Nowhere"));
    assert_eq!(membership.joins.load(Ordering::SeqCst), 0);
    assert_eq!(membership.polls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refused_request_is_reported() {
    let mut membership = ScriptedMembership::new(7, Some(1));
    membership.fail_request = true;
    let joiner = ChannelJoiner::new(10, Duration::from_millis(1));

    let err = joiner
        .join(&membership, Some(ChannelRef::new(7, "Stage")), "Stage")
        .await
        .unwrap_err();

    assert!(matches!(err, JoinError::Request { .. }));
    assert_eq!(membership.polls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_custom_budget_with_interval() {
    let membership = ScriptedMembership::new(3, None);
    let joiner = ChannelJoiner::new(5, Duration::from_millis(1));

    let err = joiner
        .join(&membership, Some(ChannelRef::new(3, "Ops")), "3")
        .await
        .unwrap_err();

    assert!(matches!(err, JoinError::Timeout { attempts: 5, .. }));
    assert_eq!(membership.polls.load(Ordering::SeqCst), 5);
}
