//! Occurrence identity for table and subquery references.
//!
//! A [`TableOccurrenceId`] is minted once per `FromTable`/join-table node at tree-construction
//! time and embedded in every [`crate::ir::expr::ColumnRef`] built against it, so that two
//! occurrences of the same table (a self-join) are distinguishable even though their table
//! name is identical. A [`QueryOccurrenceId`] plays the same role for a materialised
//! [`crate::ir::query::QueryKind::Subquery`], addressed from outside via
//! [`crate::ir::expr::AliasRef`].
//!
//! Both are minted from process-global counters rather than threaded through a builder
//! context, because tree construction in this crate has no single "session" object to carry
//! one (unlike alias-string allocation, which is scoped to one `to_sql` call and lives on
//! `Context`). Uniqueness only needs to hold within one constructed tree, which a monotonic
//! counter trivially gives us.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

macro_rules! occurrence_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(usize);

        impl $name {
            pub fn fresh() -> Self {
                static NEXT: AtomicUsize = AtomicUsize::new(0);
                $name(NEXT.fetch_add(1, Ordering::Relaxed))
            }

            pub fn get(&self) -> usize {
                self.0
            }
        }
    };
}

occurrence_id!(
    /// Identifies one occurrence of a table in a constructed tree.
    TableOccurrenceId
);
occurrence_id!(
    /// Identifies one materialised subquery boundary in a constructed tree.
    QueryOccurrenceId
);
