//! Memo surface consumed by statistics derivation.
//!
//! The memo itself (group creation, deduplication, exploration) belongs to
//! the surrounding optimizer; derivation only needs groups it can read
//! cached statistics from and group expressions it can write results onto.
//! Sibling group expressions may be estimated concurrently, so the group's
//! cached slot is guarded and updated with a compare-and-replace.

use crate::plan::Operator;
use cardo_common::{Error, GroupId, Result};
use cardo_core::Statistics;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::Arc;

/// A memo group: a set of logically equivalent plan alternatives sharing
/// one cached best-so-far statistics estimate.
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    statistics: Mutex<Option<Statistics>>,
}

impl Group {
    /// Creates an empty group.
    #[must_use]
    pub fn new(id: GroupId) -> Arc<Self> {
        Arc::new(Self {
            id,
            statistics: Mutex::new(None),
        })
    }

    /// Creates a group whose statistics are already derived. Useful for
    /// wiring leaf inputs in tests and embedders.
    #[must_use]
    pub fn with_statistics(id: GroupId, stats: Statistics) -> Arc<Self> {
        Arc::new(Self {
            id,
            statistics: Mutex::new(Some(stats)),
        })
    }

    /// The group's id.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// A copy of the cached statistics, if any member has been estimated.
    #[must_use]
    pub fn statistics(&self) -> Option<Statistics> {
        self.statistics.lock().clone()
    }

    /// Replaces the cached statistics if the candidate has a strictly lower
    /// row count than the current cache (or nothing is cached yet).
    ///
    /// Group members are not statistically equivalent in practice; keeping
    /// the lowest observed row count avoids over-pruning low-cardinality
    /// alternatives. The check and the write happen under one lock so
    /// concurrent sibling derivations cannot interleave.
    ///
    /// Returns `true` when the cache was replaced.
    pub fn update_if_lower(&self, candidate: &Statistics) -> bool {
        let mut slot = self.statistics.lock();
        let replace = match slot.as_ref() {
            None => true,
            Some(current) => current.row_count() > candidate.row_count(),
        };
        if replace {
            *slot = Some(candidate.clone());
        }
        replace
    }
}

#[derive(Debug, Default)]
struct DerivedState {
    statistics: Option<Statistics>,
    est_output_rows: f64,
    stats_derived: bool,
}

/// One concrete operator instantiation inside a group.
#[derive(Debug)]
pub struct GroupExpression {
    plan: Operator,
    children: SmallVec<[Arc<Group>; 2]>,
    owner: Arc<Group>,
    state: Mutex<DerivedState>,
}

impl GroupExpression {
    /// Creates a group expression for `plan` with the given child groups,
    /// owned by `owner`.
    #[must_use]
    pub fn new(plan: Operator, children: Vec<Arc<Group>>, owner: Arc<Group>) -> Self {
        Self {
            plan,
            children: SmallVec::from_vec(children),
            owner,
            state: Mutex::new(DerivedState::default()),
        }
    }

    /// The plan operator.
    #[must_use]
    pub fn plan(&self) -> &Operator {
        &self.plan
    }

    /// The ordered child groups.
    #[must_use]
    pub fn children(&self) -> &[Arc<Group>] {
        &self.children
    }

    /// The i-th child group.
    pub fn child(&self, index: usize) -> Result<&Arc<Group>> {
        self.children
            .get(index)
            .ok_or(Error::ChildIndexOutOfRange { index })
    }

    /// The i-th child group's cached statistics.
    ///
    /// Children are estimated before parents; a missing value is a
    /// precondition violation and fails fast rather than deriving from
    /// absent data.
    pub fn child_statistics(&self, index: usize) -> Result<Statistics> {
        let child = self.child(index)?;
        child
            .statistics()
            .ok_or(Error::ChildStatisticsNotDerived { group: child.id() })
    }

    /// The owning group.
    #[must_use]
    pub fn owner_group(&self) -> &Arc<Group> {
        &self.owner
    }

    /// The statistics derived for this expression, if any.
    #[must_use]
    pub fn statistics(&self) -> Option<Statistics> {
        self.state.lock().statistics.clone()
    }

    /// The derived output row count, for downstream cost use.
    #[must_use]
    pub fn est_output_rows(&self) -> f64 {
        self.state.lock().est_output_rows
    }

    /// Whether statistics derivation has completed for this expression.
    #[must_use]
    pub fn stats_derived(&self) -> bool {
        self.state.lock().stats_derived
    }

    pub(crate) fn record_statistics(&self, stats: Statistics) {
        let mut state = self.state.lock();
        state.est_output_rows = stats.row_count();
        state.statistics = Some(stats);
        state.stats_derived = true;
    }
}
