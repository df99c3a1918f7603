//! Local `$ref` resolution.
//!
//! A single upfront traversal over the whole schema collects every `$ref`
//! into a memo map keyed by the reference string, resolving local JSON
//! pointers against the schema root. Remote references and non-pointer
//! forms are rejected — the compiler is strictly offline. Cyclic references
//! are fine here: resolution only records the target subtree; the visitor
//! owns cycle-safety when it actually descends (see `visitor`).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{GrammarError, Result};

/// Resolve every `$ref` reachable in `schema`, returning the memo map from
/// reference string to dereferenced subtree. Must run before visiting.
pub fn resolve_refs(schema: &Value) -> Result<BTreeMap<String, Value>> {
    let mut refs = BTreeMap::new();
    walk(schema, schema, &mut refs)?;
    Ok(refs)
}

fn walk(node: &Value, root: &Value, refs: &mut BTreeMap<String, Value>) -> Result<()> {
    match node {
        Value::Array(items) => {
            for item in items {
                walk(item, root, refs)?;
            }
        }
        Value::Object(map) => {
            if let Some(Value::String(r)) = map.get("$ref") {
                if !refs.contains_key(r) {
                    let target = deref_pointer(r, root)?;
                    // Record before descending so self-references terminate.
                    refs.insert(r.clone(), target.clone());
                }
            }
            for value in map.values() {
                walk(value, root, refs)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Walk a `#/a/b/c` pointer through the root schema.
fn deref_pointer<'a>(r: &str, root: &'a Value) -> Result<&'a Value> {
    if r.starts_with("https://") || r.starts_with("http://") {
        return Err(GrammarError::UnsupportedRef(r.to_string()));
    }
    let Some(pointer) = r.strip_prefix("#/") else {
        return Err(GrammarError::UnsupportedRef(r.to_string()));
    };
    let mut target = root;
    for segment in pointer.split('/') {
        let next = match target {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        target = next.ok_or_else(|| GrammarError::BrokenRef {
            segment: segment.to_string(),
            node: target.to_string(),
        })?;
    }
    Ok(target)
}
