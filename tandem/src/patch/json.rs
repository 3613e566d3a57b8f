use super::{FinishedDraft, PatchEngine};
use crate::errors::{ErrorKind, TandemError, TandemResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};

/// Kind of structural edit carried by a [`Patch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

/// One step of a patch path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    Index(usize),
    Key(String),
}

impl Display for PathKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PathKey::Index(index) => write!(f, "{}", index),
            PathKey::Key(key) => write!(f, "{}", key),
        }
    }
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        PathKey::Key(key.to_string())
    }
}

impl From<String> for PathKey {
    fn from(key: String) -> Self {
        PathKey::Key(key)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

/// A single edit of a JSON value.
///
/// Serializes as `{"op": "replace", "path": ["user", "age"], "value": 100}`.
/// An empty path addresses the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub op: PatchOp,
    pub path: Vec<PathKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Patch {
    pub fn add(path: Vec<PathKey>, value: Value) -> Self {
        Patch {
            op: PatchOp::Add,
            path,
            value: Some(value),
        }
    }

    pub fn remove(path: Vec<PathKey>) -> Self {
        Patch {
            op: PatchOp::Remove,
            path,
            value: None,
        }
    }

    pub fn replace(path: Vec<PathKey>, value: Value) -> Self {
        Patch {
            op: PatchOp::Replace,
            path,
            value: Some(value),
        }
    }

    fn pointer(&self) -> String {
        if self.path.is_empty() {
            return "/".to_string();
        }
        self.path.iter().map(|key| format!("/{}", key)).collect()
    }
}

/// How [`JsonPatchEngine`] diffs two arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayDiff {
    /// Diff common indices element by element, then add or remove the tail.
    #[default]
    ElementWise,
    /// Replace the whole array whenever it changed.
    Replace,
}

/// Configuration of a [`JsonPatchEngine`].
#[derive(Debug, Clone, Default)]
pub struct JsonPatchConfig {
    pub array_diff: ArrayDiff,
}

impl JsonPatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn array_diff(mut self, array_diff: ArrayDiff) -> Self {
        self.array_diff = array_diff;
        self
    }
}

/// Mutable working copy of a JSON value.
///
/// Dereferences to the working value; the base it was opened from is kept
/// aside for diffing.
#[derive(Debug, Clone)]
pub struct JsonDraft {
    base: Value,
    working: Value,
}

impl JsonDraft {
    pub fn base(&self) -> &Value {
        &self.base
    }
}

impl Deref for JsonDraft {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.working
    }
}

impl DerefMut for JsonDraft {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.working
    }
}

/// [`PatchEngine`] over [`serde_json::Value`].
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use tandem::patch::{JsonPatchEngine, PatchEngine};
///
/// let engine = JsonPatchEngine::new();
/// let before = json!({"age": 99, "name": "ali"});
///
/// let mut draft = engine.create_draft(&before);
/// draft["age"] = json!(100);
/// let finished = engine.finish_draft(draft).unwrap();
///
/// assert_eq!(finished.value, json!({"age": 100, "name": "ali"}));
/// let restored = engine.apply_patches(&finished.value, &finished.reverse_patches).unwrap();
/// assert_eq!(restored, before);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonPatchEngine {
    config: JsonPatchConfig,
}

impl JsonPatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: JsonPatchConfig) -> Self {
        JsonPatchEngine { config }
    }

    pub fn config(&self) -> &JsonPatchConfig {
        &self.config
    }

    fn diff(
        &self,
        path: &mut Vec<PathKey>,
        before: &Value,
        after: &Value,
        patches: &mut Vec<Patch>,
        inverse: &mut Vec<Patch>,
    ) {
        if before == after {
            return;
        }

        match (before, after) {
            (Value::Object(old), Value::Object(new)) => {
                self.diff_objects(path, old, new, patches, inverse)
            }
            (Value::Array(old), Value::Array(new))
                if self.config.array_diff == ArrayDiff::ElementWise =>
            {
                self.diff_arrays(path, old, new, patches, inverse)
            }
            _ => {
                patches.push(Patch::replace(path.clone(), after.clone()));
                inverse.push(Patch::replace(path.clone(), before.clone()));
            }
        }
    }

    fn diff_objects(
        &self,
        path: &mut Vec<PathKey>,
        old: &Map<String, Value>,
        new: &Map<String, Value>,
        patches: &mut Vec<Patch>,
        inverse: &mut Vec<Patch>,
    ) {
        for (key, old_value) in old {
            if !new.contains_key(key) {
                path.push(PathKey::Key(key.clone()));
                patches.push(Patch::remove(path.clone()));
                inverse.push(Patch::add(path.clone(), old_value.clone()));
                path.pop();
            }
        }

        for (key, new_value) in new {
            path.push(PathKey::Key(key.clone()));
            match old.get(key) {
                Some(old_value) => self.diff(path, old_value, new_value, patches, inverse),
                None => {
                    patches.push(Patch::add(path.clone(), new_value.clone()));
                    inverse.push(Patch::remove(path.clone()));
                }
            }
            path.pop();
        }
    }

    fn diff_arrays(
        &self,
        path: &mut Vec<PathKey>,
        old: &[Value],
        new: &[Value],
        patches: &mut Vec<Patch>,
        inverse: &mut Vec<Patch>,
    ) {
        let common = old.len().min(new.len());
        for index in 0..common {
            path.push(PathKey::Index(index));
            self.diff(path, &old[index], &new[index], patches, inverse);
            path.pop();
        }

        // appended elements go in ascending order, dropped ones from the end
        for (index, value) in new.iter().enumerate().skip(common) {
            path.push(PathKey::Index(index));
            patches.push(Patch::add(path.clone(), value.clone()));
            inverse.push(Patch::remove(path.clone()));
            path.pop();
        }

        for (index, value) in old.iter().enumerate().skip(common).rev() {
            path.push(PathKey::Index(index));
            patches.push(Patch::remove(path.clone()));
            inverse.push(Patch::add(path.clone(), value.clone()));
            path.pop();
        }
    }
}

impl PatchEngine for JsonPatchEngine {
    type Value = Value;
    type Draft = JsonDraft;
    type Patch = Patch;

    fn create_draft(&self, value: &Value) -> JsonDraft {
        JsonDraft {
            base: value.clone(),
            working: value.clone(),
        }
    }

    fn finish_draft(&self, draft: JsonDraft) -> TandemResult<FinishedDraft<Value, Patch>> {
        let mut patches = Vec::new();
        let mut reverse_patches = Vec::new();
        self.diff(
            &mut Vec::new(),
            &draft.base,
            &draft.working,
            &mut patches,
            &mut reverse_patches,
        );
        reverse_patches.reverse();

        log::trace!(
            "Draft finished with {} patches and {} reverse patches",
            patches.len(),
            reverse_patches.len()
        );
        Ok(FinishedDraft {
            value: draft.working,
            patches,
            reverse_patches,
        })
    }

    fn apply_patches(&self, value: &Value, patches: &[Patch]) -> TandemResult<Value> {
        let mut target = value.clone();
        for patch in patches {
            apply_patch(&mut target, patch)?;
        }
        Ok(target)
    }
}

fn apply_patch(target: &mut Value, patch: &Patch) -> TandemResult<()> {
    let Some((last, parents)) = patch.path.split_last() else {
        return match patch.op {
            PatchOp::Add | PatchOp::Replace => {
                *target = patch_value(patch)?;
                Ok(())
            }
            PatchOp::Remove => Err(invalid_patch(patch, "cannot remove the root value")),
        };
    };

    let mut parent = target;
    for key in parents {
        parent = match (parent, key) {
            (Value::Object(map), PathKey::Key(key)) => map.get_mut(key),
            (Value::Array(items), PathKey::Index(index)) => items.get_mut(*index),
            _ => None,
        }
        .ok_or_else(|| invalid_patch(patch, "path does not exist"))?;
    }

    match (parent, last) {
        (Value::Object(map), PathKey::Key(key)) => match patch.op {
            PatchOp::Add => {
                map.insert(key.clone(), patch_value(patch)?);
            }
            PatchOp::Replace => {
                let value = patch_value(patch)?;
                match map.get_mut(key) {
                    Some(slot) => *slot = value,
                    None => return Err(invalid_patch(patch, "key does not exist")),
                }
            }
            PatchOp::Remove => {
                if map.remove(key).is_none() {
                    return Err(invalid_patch(patch, "key does not exist"));
                }
            }
        },
        (Value::Array(items), PathKey::Index(index)) => {
            let index = *index;
            match patch.op {
                PatchOp::Add if index <= items.len() => items.insert(index, patch_value(patch)?),
                PatchOp::Replace if index < items.len() => items[index] = patch_value(patch)?,
                PatchOp::Remove if index < items.len() => {
                    items.remove(index);
                }
                _ => return Err(invalid_patch(patch, "index is out of bounds")),
            }
        }
        _ => return Err(invalid_patch(patch, "path does not match the value")),
    }
    Ok(())
}

fn patch_value(patch: &Patch) -> TandemResult<Value> {
    patch
        .value
        .clone()
        .ok_or_else(|| invalid_patch(patch, "patch has no value"))
}

fn invalid_patch(patch: &Patch, reason: &str) -> TandemError {
    log::error!("Cannot apply {:?} at {}: {}", patch.op, patch.pointer(), reason);
    TandemError::new(
        &format!("Cannot apply {:?} at {}: {}", patch.op, patch.pointer(), reason),
        ErrorKind::InvalidPatch,
    )
}
