//! Change counting hook

use parking_lot::Mutex;
use terrace_engine::{DiffAction, EngineError, Hook, HookAction, InstanceDiff};

/// Planned and applied change tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Planned creates
    pub to_add: usize,
    /// Planned in-place updates
    pub to_change: usize,
    /// Planned destroys
    pub to_remove: usize,
    /// Planned replacements
    pub to_remove_and_add: usize,
    /// Resources created by apply
    pub added: usize,
    /// Resources updated by apply
    pub changed: usize,
    /// Resources destroyed by apply
    pub removed: usize,
}

impl Counts {
    /// Resources the plan adds; a replacement adds one
    #[inline]
    #[must_use]
    pub fn plan_add(&self) -> usize {
        self.to_add + self.to_remove_and_add
    }

    /// Resources the plan changes in place
    #[inline]
    #[must_use]
    pub fn plan_change(&self) -> usize {
        self.to_change
    }

    /// Resources the plan destroys; a replacement destroys one
    #[inline]
    #[must_use]
    pub fn plan_destroy(&self) -> usize {
        self.to_remove + self.to_remove_and_add
    }
}

/// Tallies resource actions as the engine reports them
#[derive(Debug, Default)]
pub struct CountHook {
    counts: Mutex<Counts>,
}

impl CountHook {
    /// Hook with every counter at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tallies
    #[must_use]
    pub fn counts(&self) -> Counts {
        *self.counts.lock()
    }
}

impl Hook for CountHook {
    fn post_diff(&self, _address: &str, diff: &InstanceDiff) -> HookAction {
        let mut counts = self.counts.lock();
        match diff.action {
            DiffAction::Create => counts.to_add += 1,
            DiffAction::Update => counts.to_change += 1,
            DiffAction::Destroy => counts.to_remove += 1,
            DiffAction::Replace => counts.to_remove_and_add += 1,
            DiffAction::Read => {}
        }
        HookAction::Continue
    }

    fn post_apply(&self, _address: &str, action: DiffAction, error: Option<&EngineError>) -> HookAction {
        if error.is_some() {
            return HookAction::Continue;
        }
        let mut counts = self.counts.lock();
        match action {
            DiffAction::Create => counts.added += 1,
            DiffAction::Update => counts.changed += 1,
            DiffAction::Destroy => counts.removed += 1,
            DiffAction::Replace => {
                counts.added += 1;
                counts.removed += 1;
            }
            DiffAction::Read => {}
        }
        HookAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn action() -> impl Strategy<Value = DiffAction> {
        prop_oneof![
            Just(DiffAction::Create),
            Just(DiffAction::Update),
            Just(DiffAction::Destroy),
            Just(DiffAction::Replace),
            Just(DiffAction::Read),
        ]
    }

    #[test]
    fn replace_counts_on_both_sides() {
        let hook = CountHook::new();
        for action in [
            DiffAction::Create,
            DiffAction::Create,
            DiffAction::Update,
            DiffAction::Destroy,
            DiffAction::Replace,
        ] {
            hook.post_diff("x", &InstanceDiff::new(action));
        }

        let counts = hook.counts();
        assert_eq!((counts.plan_add(), counts.plan_change(), counts.plan_destroy()), (3, 1, 2));
    }

    #[test]
    fn failed_apply_is_not_counted() {
        let hook = CountHook::new();
        hook.post_apply("x", DiffAction::Create, Some(&EngineError::msg("no")));
        hook.post_apply("y", DiffAction::Replace, None);
        let counts = hook.counts();
        assert_eq!((counts.added, counts.removed), (1, 1));
    }

    proptest! {
        #[test]
        fn prop_summary_matches_actions(actions in proptest::collection::vec(action(), 0..40)) {
            let hook = CountHook::new();
            for action in &actions {
                hook.post_diff("r", &InstanceDiff::new(*action));
            }
            let n = |a: DiffAction| actions.iter().filter(|x| **x == a).count();
            let counts = hook.counts();
            prop_assert_eq!(counts.plan_add(), n(DiffAction::Create) + n(DiffAction::Replace));
            prop_assert_eq!(counts.plan_change(), n(DiffAction::Update));
            prop_assert_eq!(counts.plan_destroy(), n(DiffAction::Destroy) + n(DiffAction::Replace));
        }
    }
}
