//! Structural diffing of values.
//!
//! A [`PatchEngine`] opens a mutable draft over a value, turns the edits made to
//! that draft into a forward and an inverse patch list, and replays patch lists
//! onto values. The transaction layer only stores patches and hands them back to
//! the engine that produced them.

mod json;

pub use json::{ArrayDiff, JsonDraft, JsonPatchConfig, JsonPatchEngine, Patch, PatchOp, PathKey};

use crate::errors::TandemResult;
use std::ops::DerefMut;

/// Outcome of [`PatchEngine::finish_draft`].
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedDraft<V, P> {
    /// The value the draft was edited into
    pub value: V,
    /// Patches taking the draft's base value to `value`
    pub patches: Vec<P>,
    /// Patches taking `value` back to the draft's base value
    pub reverse_patches: Vec<P>,
}

impl<V, P> FinishedDraft<V, P> {
    /// Returns true if the draft was left structurally unchanged.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty() && self.reverse_patches.is_empty()
    }
}

/// Draft-based structural diff engine.
///
/// Implementations must honor the round-trip law: applying `patches` to the
/// base value yields the finished value, and applying `reverse_patches` to the
/// finished value yields the base value again.
pub trait PatchEngine: Send + Sync {
    type Value: Clone + Send + Sync + 'static;
    type Draft: DerefMut<Target = Self::Value>;
    type Patch: Clone + Send + Sync + 'static;

    /// Opens a mutable draft over a copy of `value`.
    fn create_draft(&self, value: &Self::Value) -> Self::Draft;

    /// Closes `draft` and computes the patch pair for the edits made to it.
    fn finish_draft(
        &self,
        draft: Self::Draft,
    ) -> TandemResult<FinishedDraft<Self::Value, Self::Patch>>;

    /// Applies `patches` in order to a copy of `value`.
    fn apply_patches(&self, value: &Self::Value, patches: &[Self::Patch])
        -> TandemResult<Self::Value>;
}
