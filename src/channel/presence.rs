use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct RawPresenceMeta {
    pub phx_ref: Option<String>,
    pub phx_ref_prev: Option<String>,
    #[serde(flatten)]
    pub data: HashMap<String, Value>,
}

/// A user's entries as sent by the server: either Phoenix Presence's
/// `{"metas": [...]}` wrapper or a bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPresenceEntries {
    Wrapped { metas: Vec<RawPresenceMeta> },
    List(Vec<RawPresenceMeta>),
}

impl RawPresenceEntries {
    fn into_metas(self) -> Vec<RawPresenceMeta> {
        match self {
            Self::Wrapped { metas } => metas,
            Self::List(metas) => metas,
        }
    }
}

pub type RawPresenceState = HashMap<String, RawPresenceEntries>;

#[derive(Debug, Clone, Deserialize)]
pub struct RawPresenceDiff {
    #[serde(default)]
    pub joins: RawPresenceState,
    #[serde(default)]
    pub leaves: RawPresenceState,
}

/// Metadata one user publishes about themselves (e.g. `online_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_ref: Option<String>,
    #[serde(flatten)]
    pub data: HashMap<String, Value>,
}

impl PresenceMeta {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Entries carrying server refs are the same entry when the refs match;
    /// entries without refs are compared by content.
    fn same_entry(&self, other: &PresenceMeta) -> bool {
        match (&self.presence_ref, &other.presence_ref) {
            (Some(a), Some(b)) => a == b,
            _ => self.data == other.data,
        }
    }
}

impl From<RawPresenceMeta> for PresenceMeta {
    fn from(raw: RawPresenceMeta) -> Self {
        Self {
            presence_ref: raw.phx_ref,
            data: raw.data,
        }
    }
}

pub type PresenceState = HashMap<String, Vec<PresenceMeta>>;

/// Users that joined or left in one diff, with the metas involved.
#[derive(Debug, Clone, Default)]
pub struct PresenceChanges {
    pub joins: PresenceState,
    pub leaves: PresenceState,
}

/// Running presence state for one topic.
#[derive(Debug, Clone, Default)]
pub struct Presence {
    state: PresenceState,
}

impl Presence {
    pub fn state(&self) -> &PresenceState {
        &self.state
    }

    /// Replaces the running state with a full snapshot.
    pub fn sync_state(&mut self, raw_state: RawPresenceState) -> &PresenceState {
        self.state = Self::transform_state(raw_state);
        &self.state
    }

    /// Applies joins then leaves on top of the running state.
    ///
    /// Users listed with no metas are ignored entirely.
    pub fn sync_diff(&mut self, diff: RawPresenceDiff) -> PresenceChanges {
        let joins = Self::transform_state(diff.joins);
        let leaves = Self::transform_state(diff.leaves);

        for (key, new_metas) in &joins {
            let entry = self.state.entry(key.clone()).or_default();
            entry.retain(|current| !new_metas.iter().any(|meta| meta.same_entry(current)));
            entry.extend(new_metas.iter().cloned());
        }

        for (key, left_metas) in &leaves {
            let Some(current) = self.state.get_mut(key) else {
                continue;
            };
            current.retain(|meta| !left_metas.iter().any(|left| left.same_entry(meta)));
            if current.is_empty() {
                self.state.remove(key);
            }
        }

        PresenceChanges { joins, leaves }
    }

    fn transform_state(raw_state: RawPresenceState) -> PresenceState {
        raw_state
            .into_iter()
            .filter_map(|(key, raw_entries)| {
                let metas: Vec<PresenceMeta> = raw_entries
                    .into_metas()
                    .into_iter()
                    .map(PresenceMeta::from)
                    .collect();
                if metas.is_empty() {
                    None
                } else {
                    Some((key, metas))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diff(value: Value) -> RawPresenceDiff {
        serde_json::from_value(value).unwrap()
    }

    fn state(value: Value) -> RawPresenceState {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_accepts_wrapped_and_bare_entries() {
        let mut presence = Presence::default();
        presence.sync_state(state(json!({
            "u1": {"metas": [{"phx_ref": "a", "online_at": "t1"}]},
            "u2": [{"online_at": "t2"}]
        })));

        let current = presence.state();
        assert_eq!(current.len(), 2);
        assert_eq!(current["u1"][0].presence_ref.as_deref(), Some("a"));
        assert_eq!(current["u1"][0].get("online_at"), Some(&json!("t1")));
        assert_eq!(current["u2"][0].presence_ref, None);
    }

    #[test]
    fn test_diff_join_adds_user() {
        let mut presence = Presence::default();
        let changes = presence.sync_diff(diff(json!({
            "joins": {"u1": [{"online_at": "t1"}]},
            "leaves": {}
        })));

        assert_eq!(changes.joins.len(), 1);
        assert!(changes.leaves.is_empty());
        assert_eq!(changes.joins["u1"][0].get("online_at"), Some(&json!("t1")));
        assert!(presence.state().contains_key("u1"));
    }

    #[test]
    fn test_diff_keeps_users_outside_the_diff() {
        let mut presence = Presence::default();
        presence.sync_state(state(json!({"u1": [{"online_at": "t1"}]})));

        presence.sync_diff(diff(json!({
            "joins": {"u2": [{"online_at": "t2"}]},
            "leaves": {}
        })));

        assert!(presence.state().contains_key("u1"));
        assert!(presence.state().contains_key("u2"));
    }

    #[test]
    fn test_diff_leave_removes_matching_ref() {
        let mut presence = Presence::default();
        presence.sync_state(state(json!({
            "u1": {"metas": [
                {"phx_ref": "a", "device": "phone"},
                {"phx_ref": "b", "device": "laptop"}
            ]}
        })));

        presence.sync_diff(diff(json!({
            "joins": {},
            "leaves": {"u1": {"metas": [{"phx_ref": "a", "device": "phone"}]}}
        })));

        let metas = &presence.state()["u1"];
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].presence_ref.as_deref(), Some("b"));

        presence.sync_diff(diff(json!({
            "leaves": {"u1": {"metas": [{"phx_ref": "b", "device": "laptop"}]}}
        })));
        assert!(presence.state().is_empty());
    }

    #[test]
    fn test_diff_rejoin_replaces_entry() {
        let mut presence = Presence::default();
        presence.sync_diff(diff(json!({"joins": {"u1": [{"online_at": "t1"}]}})));
        presence.sync_diff(diff(json!({"joins": {"u1": [{"online_at": "t1"}]}})));

        assert_eq!(presence.state()["u1"].len(), 1);
    }

    #[test]
    fn test_diff_with_empty_metas_is_ignored() {
        let mut presence = Presence::default();
        let changes = presence.sync_diff(diff(json!({
            "joins": {"u1": []},
            "leaves": {"u2": {"metas": []}}
        })));

        assert!(changes.joins.is_empty());
        assert!(changes.leaves.is_empty());
        assert!(presence.state().is_empty());
    }
}
