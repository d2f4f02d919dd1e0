//! Conflict resolvers (spec §4.3): Last-Write-Wins and recursive
//! structural merge over the JSON-like [`Value`] tree.

use serde_json::{Map, Value as Json};

use crate::oplog::entry::{Op, OplogEntry};
use crate::store::Document;

/// Resolver recursion is bounded by incoming payload depth (spec §9:
/// "Resolver recursion depth is bounded by incoming payload depth;
/// implementations should cap depth defensively").
const MAX_MERGE_DEPTH: usize = 64;

pub struct Resolution {
    pub apply: bool,
    pub merged: Option<Document>,
}

/// `Resolve(local, remote) -> {apply, merged}` for Last-Write-Wins (spec
/// §4.3): apply the remote entry unless a local document exists with a
/// `updated_at` that is not strictly behind it.
pub fn resolve_lww(local: Option<&Document>, remote: &OplogEntry) -> Resolution {
    let Some(local) = local else {
        return Resolution { apply: true, merged: Some(materialize(remote)) };
    };
    if remote.timestamp > local.updated_at {
        Resolution { apply: true, merged: Some(materialize(remote)) }
    } else {
        Resolution { apply: false, merged: None }
    }
}

/// Recursive structural merge (spec §4.3). Deletes always resolve by LWW;
/// Put vs Put against an existing local document merges field-by-field.
pub fn resolve_recursive_merge(local: Option<&Document>, remote: &OplogEntry) -> Resolution {
    let Some(local) = local else {
        return Resolution { apply: true, merged: Some(materialize(remote)) };
    };

    if remote.op == Op::Delete {
        return resolve_lww(Some(local), remote);
    }

    let remote_payload = remote.payload.clone().unwrap_or(Json::Null);
    let remote_wins_ties = remote.timestamp > local.updated_at;
    let merged_content = merge_kind(&local.content, &remote_payload, remote_wins_ties, 0);
    let updated_at = if remote_wins_ties { remote.timestamp.clone() } else { local.updated_at.clone() };

    Resolution {
        apply: true,
        merged: Some(Document {
            collection: local.collection.clone(),
            key: local.key.clone(),
            content: merged_content,
            updated_at,
            is_deleted: false,
        }),
    }
}

fn materialize(entry: &OplogEntry) -> Document {
    Document {
        collection: entry.collection.clone(),
        key: entry.key.clone(),
        content: entry.payload.clone().unwrap_or(Json::Null),
        updated_at: entry.timestamp.clone(),
        is_deleted: entry.op == Op::Delete,
    }
}

/// `remote_wins_ties` carries the document-level LWW decision (spec §4.3:
/// kind mismatches and unequal primitives fall back to whichever side's
/// timestamp made it overall newer) down through the recursion.
fn merge_kind(local: &Json, remote: &Json, remote_wins_ties: bool, depth: usize) -> Json {
    if depth >= MAX_MERGE_DEPTH {
        return if remote_wins_ties { remote.clone() } else { local.clone() };
    }
    match (local, remote) {
        (Json::Object(local_map), Json::Object(remote_map)) => {
            Json::Object(merge_objects(local_map, remote_map, remote_wins_ties, depth))
        }
        (Json::Array(local_arr), Json::Array(remote_arr)) => {
            merge_arrays(local_arr, remote_arr, remote_wins_ties, depth)
        }
        _ if local == remote => local.clone(),
        _ if remote_wins_ties => remote.clone(),
        _ => local.clone(),
    }
}

fn merge_objects(
    local: &Map<String, Json>,
    remote: &Map<String, Json>,
    remote_wins_ties: bool,
    depth: usize,
) -> Map<String, Json> {
    let mut merged = Map::new();
    for (key, local_value) in local {
        match remote.get(key) {
            Some(remote_value) => {
                merged.insert(
                    key.clone(),
                    merge_kind(local_value, remote_value, remote_wins_ties, depth + 1),
                );
            }
            None => {
                merged.insert(key.clone(), local_value.clone());
            }
        }
    }
    for (key, remote_value) in remote {
        merged.entry(key.clone()).or_insert_with(|| remote_value.clone());
    }
    merged
}

fn array_id(value: &Json) -> Option<&Json> {
    value.as_object().and_then(|obj| obj.get("id").or_else(|| obj.get("_id")))
}

fn is_object_array(arr: &[Json]) -> bool {
    matches!(arr.first(), Some(Json::Object(_))) && !arr.is_empty()
}

fn has_unique_ids(arr: &[Json]) -> bool {
    let mut seen = Vec::new();
    for item in arr {
        match array_id(item) {
            Some(id) if !seen.contains(&id) => seen.push(id),
            _ => return false,
        }
    }
    true
}

/// Arrays merge by `id`/`_id` when both sides are non-empty object-arrays
/// with unique ids; otherwise the whole array is resolved by LWW (spec
/// §4.3).
fn merge_arrays(local: &[Json], remote: &[Json], remote_wins_ties: bool, depth: usize) -> Json {
    if is_object_array(local) && is_object_array(remote) && has_unique_ids(local) && has_unique_ids(remote) {
        let mut merged: Vec<Json> = Vec::new();
        for local_item in local {
            let id = array_id(local_item);
            let remote_item = remote.iter().find(|r| array_id(r) == id);
            match remote_item {
                Some(remote_item) => {
                    merged.push(merge_kind(local_item, remote_item, remote_wins_ties, depth + 1))
                }
                None => merged.push(local_item.clone()),
            }
        }
        for remote_item in remote {
            let id = array_id(remote_item);
            if !local.iter().any(|l| array_id(l) == id) {
                merged.push(remote_item.clone());
            }
        }
        Json::Array(merged)
    } else if local == remote {
        Json::Array(local.to_vec())
    } else if remote_wins_ties {
        Json::Array(remote.to_vec())
    } else {
        Json::Array(local.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hlc::HlcTimestamp;
    use serde_json::json;

    fn entry(ts: HlcTimestamp, payload: Json) -> OplogEntry {
        OplogEntry::new("todos", "t1", Op::Put, Some(payload), ts, "")
    }

    #[test]
    fn lww_applies_when_no_local() {
        let remote = entry(HlcTimestamp::new(100, 0, "a"), json!({"name": "A"}));
        let result = resolve_lww(None, &remote);
        assert!(result.apply);
    }

    #[test]
    fn lww_rejects_older_remote() {
        let local = Document {
            collection: "users".into(),
            key: "u1".into(),
            content: json!({"name": "local"}),
            updated_at: HlcTimestamp::new(200, 0, "a"),
            is_deleted: false,
        };
        let remote = entry(HlcTimestamp::new(100, 0, "b"), json!({"name": "old"}));
        let result = resolve_lww(Some(&local), &remote);
        assert!(!result.apply);
    }

    #[test]
    fn lww_higher_timestamp_wins_regardless_of_origin() {
        let local = Document {
            collection: "users".into(),
            key: "u1".into(),
            content: json!({"name": "X"}),
            updated_at: HlcTimestamp::new(200, 0, "a"),
            is_deleted: false,
        };
        let remote = entry(HlcTimestamp::new(210, 0, "b"), json!({"name": "B"}));
        let result = resolve_lww(Some(&local), &remote);
        assert!(result.apply);
        assert_eq!(result.merged.unwrap().content, json!({"name": "B"}));
    }

    #[test]
    fn structural_merge_unions_object_keys() {
        let local = Document {
            collection: "users".into(),
            key: "u1".into(),
            content: json!({"name": "Alice", "age": 30}),
            updated_at: HlcTimestamp::new(100, 0, "a"),
            is_deleted: false,
        };
        let remote = entry(HlcTimestamp::new(150, 0, "b"), json!({"email": "a@example.com"}));
        let result = resolve_recursive_merge(Some(&local), &remote);
        assert!(result.apply);
        let merged = result.merged.unwrap().content;
        assert_eq!(merged["name"], json!("Alice"));
        assert_eq!(merged["age"], json!(30));
        assert_eq!(merged["email"], json!("a@example.com"));
    }

    #[test]
    fn structural_merge_of_object_arrays_merges_by_id() {
        let local = Document {
            collection: "lists".into(),
            key: "l1".into(),
            content: json!({"items": [
                {"id": "1", "done": true},
                {"id": "2", "done": false},
                {"id": "3", "done": false}
            ]}),
            updated_at: HlcTimestamp::new(100, 0, "a"),
            is_deleted: false,
        };
        let remote = entry(
            HlcTimestamp::new(150, 0, "b"),
            json!({"items": [
                {"id": "2", "done": true},
                {"id": "4", "done": false}
            ]}),
        );
        let result = resolve_recursive_merge(Some(&local), &remote);
        let items = result.merged.unwrap().content["items"].clone();
        let ids: Vec<&str> = items.as_array().unwrap().iter().map(|v| v["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        let item2 = items.as_array().unwrap().iter().find(|v| v["id"] == "2").unwrap();
        assert_eq!(item2["done"], json!(true));
    }

    #[test]
    fn delete_uses_lww_not_structural_merge() {
        let local = Document {
            collection: "users".into(),
            key: "u1".into(),
            content: json!({"name": "Alice"}),
            updated_at: HlcTimestamp::new(200, 0, "a"),
            is_deleted: false,
        };
        let remote_delete = OplogEntry::new(
            "users",
            "u1",
            Op::Delete,
            None,
            HlcTimestamp::new(100, 0, "b"),
            "",
        );
        let result = resolve_recursive_merge(Some(&local), &remote_delete);
        assert!(!result.apply);
    }
}
