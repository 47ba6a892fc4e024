//! Group walk sessions.
//!
//! A walker's scheduled walks that share date, start time and slot form a
//! group walk. Sessions are derived on demand and never stored; member
//! statuses live only for the lifetime of the session value.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::enums::{DogWalkStatus, TimeSlot, WalkStatus};
use crate::models::Walk;

/// Walks sharing a key belong to the same group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKey {
    pub date: NaiveDate,
    pub start_time: String,
    pub time_slot: TimeSlot,
}

impl GroupKey {
    fn of(walk: &Walk) -> Self {
        Self {
            date: walk.date,
            start_time: walk.start_time.clone(),
            time_slot: walk.time_slot,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date, self.start_time, self.time_slot)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub walk_id: String,
    pub dog_id: String,
    pub status: DogWalkStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPhase {
    Gathering,
    Walking,
    Finished,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GroupWalkError {
    #[error("Walk {0} is not part of this group")]
    UnknownMember(String),
    #[error("Cannot change {walk_id} from {from} to {to}")]
    InvalidStatusChange {
        walk_id: String,
        from: DogWalkStatus,
        to: DogWalkStatus,
    },
    #[error("Every dog must be picked up or marked absent before starting")]
    NotReadyToStart,
    #[error("Every dog must be dropped off or marked absent before ending")]
    NotReadyToEnd,
    #[error("Group walk is {0:?}, expected {1:?}")]
    WrongPhase(GroupPhase, GroupPhase),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupWalkSession {
    pub key: GroupKey,
    pub members: Vec<GroupMember>,
    pub phase: GroupPhase,
}

impl GroupWalkSession {
    fn new(key: GroupKey, members: Vec<GroupMember>) -> Self {
        Self {
            key,
            members,
            phase: GroupPhase::Gathering,
        }
    }

    /// Update one dog's status. Setting the current status again is a no-op.
    pub fn set_status(&mut self, walk_id: &str, status: DogWalkStatus) -> Result<(), GroupWalkError> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.walk_id == walk_id)
            .ok_or_else(|| GroupWalkError::UnknownMember(walk_id.to_string()))?;

        if member.status == status {
            return Ok(());
        }
        if !status_change_allowed(member.status, status) {
            return Err(GroupWalkError::InvalidStatusChange {
                walk_id: walk_id.to_string(),
                from: member.status,
                to: status,
            });
        }
        member.status = status;
        Ok(())
    }

    pub fn can_start(&self) -> bool {
        self.phase == GroupPhase::Gathering
            && self
                .members
                .iter()
                .all(|m| matches!(m.status, DogWalkStatus::PickedUp | DogWalkStatus::Absent))
    }

    pub fn can_end(&self) -> bool {
        self.phase == GroupPhase::Walking
            && self
                .members
                .iter()
                .all(|m| matches!(m.status, DogWalkStatus::DroppedOff | DogWalkStatus::Absent))
    }

    pub fn start(&mut self) -> Result<(), GroupWalkError> {
        if self.phase != GroupPhase::Gathering {
            return Err(GroupWalkError::WrongPhase(self.phase, GroupPhase::Gathering));
        }
        if !self.can_start() {
            return Err(GroupWalkError::NotReadyToStart);
        }
        self.phase = GroupPhase::Walking;
        tracing::info!(group = %self.key, members = self.members.len(), "Group walk started");
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), GroupWalkError> {
        if self.phase != GroupPhase::Walking {
            return Err(GroupWalkError::WrongPhase(self.phase, GroupPhase::Walking));
        }
        if !self.can_end() {
            return Err(GroupWalkError::NotReadyToEnd);
        }
        self.phase = GroupPhase::Finished;
        tracing::info!(group = %self.key, "Group walk finished");
        Ok(())
    }
}

fn status_change_allowed(from: DogWalkStatus, to: DogWalkStatus) -> bool {
    use DogWalkStatus::*;
    matches!(
        (from, to),
        (Pending, PickedUp) | (Pending, Absent) | (PickedUp, DroppedOff) | (PickedUp, Absent)
    )
}

/// Group a walker's scheduled walks into sessions of two or more.
///
/// Sessions come back ordered by date then start time; members keep the
/// order of `walks`.
pub fn group_walks(walks: &[Walk], walker_id: &str) -> Vec<GroupWalkSession> {
    let mut groups: BTreeMap<GroupKey, Vec<GroupMember>> = BTreeMap::new();

    for walk in walks
        .iter()
        .filter(|w| w.walker_id == walker_id && w.status == WalkStatus::Scheduled)
    {
        groups.entry(GroupKey::of(walk)).or_default().push(GroupMember {
            walk_id: walk.id.clone(),
            dog_id: walk.dog_id.clone(),
            status: DogWalkStatus::Pending,
        });
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(key, members)| GroupWalkSession::new(key, members))
        .collect()
}
