//! Update sessions.
//!
//! While a session is open, [`CellEvent::Changed`] notifications are queued
//! instead of delivered. When the outermost session closes, every queued cell
//! is notified once.

use std::ops::{Deref, DerefMut};

use indexmap::IndexSet;

use crate::cell::CellEvent;
use crate::{CellId, Database};

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) depth: usize,
    pub(crate) pending: IndexSet<CellId>,
}

/// An open update session.
///
/// Dereferences to the [`Database`]; closes the session when dropped.
/// Sessions nest.
#[must_use = "the session closes as soon as the guard is dropped"]
pub struct UpdateSession<'a> {
    db: &'a mut Database,
}

impl Database {
    /// Opens an update session.
    pub fn update_session(&mut self) -> UpdateSession<'_> {
        self.session.depth += 1;
        UpdateSession { db: self }
    }

    /// Returns `true` if an update session is open.
    pub fn in_update_session(&self) -> bool {
        self.session.depth > 0
    }
}

impl Deref for UpdateSession<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        self.db
    }
}

impl DerefMut for UpdateSession<'_> {
    fn deref_mut(&mut self) -> &mut Database {
        self.db
    }
}

impl Drop for UpdateSession<'_> {
    fn drop(&mut self) {
        let state = &mut self.db.session;
        state.depth = state.depth.saturating_sub(1);
        if state.depth > 0 {
            return;
        }
        let pending = std::mem::take(&mut state.pending);
        for cell in pending {
            self.db.notify(cell, CellEvent::Changed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell as Counter;
    use std::rc::Rc;

    use geometry::prelude::*;

    use super::*;

    #[test]
    fn nested_sessions_flush_once() {
        let mut db = Database::new();
        let lib = db.create_library(None, "work").unwrap();
        let cell = db.create_cell(lib, "cell").unwrap();
        let count = Rc::new(Counter::new(0));
        let sink = count.clone();
        db.add_observer(cell, move |_, event| {
            if event == CellEvent::Changed {
                sink.set(sink.get() + 1);
            }
        })
        .unwrap();

        {
            let mut outer = db.update_session();
            {
                let mut inner = outer.update_session();
                inner
                    .set_abutment_box(cell, Rect::from_sides(0, 0, 1, 1))
                    .unwrap();
            }
            assert!(outer.in_update_session());
            assert_eq!(count.get(), 0);
            outer
                .set_abutment_box(cell, Rect::from_sides(0, 0, 2, 2))
                .unwrap();
        }
        assert!(!db.in_update_session());
        assert_eq!(count.get(), 1);

        db.set_abutment_box(cell, Rect::from_sides(0, 0, 3, 3))
            .unwrap();
        assert_eq!(count.get(), 2);
    }
}
