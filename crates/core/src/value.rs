/// The JSON-like payload tree operated on by the resolvers and the hash
/// chain (spec §9: `Value = Null | Bool | Number | String | Array(Value) |
/// Object(ordered map)`). We reuse `serde_json::Value` with key order
/// preserved rather than a hand-rolled enum: it already has the right
/// shape, and it's the convention this corpus uses for JSON-like payloads.
pub type Value = serde_json::Value;
