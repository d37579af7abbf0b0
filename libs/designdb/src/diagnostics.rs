//! The diagnostic channel.
//!
//! Policy violations (slaving a shared cell, editing a slaved abutment box,
//! looking up a missing component) do not abort the caller. They are logged
//! through [`tracing`] and recorded as [`Issue`]s in the database's
//! [`IssueSet`], and the offending call becomes a no-op.

use std::fmt::{Debug, Display};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// A diagnostic issue that should be reported to users.
pub trait Diagnostic: Debug + Display {
    /// Returns the severity of this issue.
    ///
    /// The default implementation returns [`Severity::default`].
    fn severity(&self) -> Severity {
        Default::default()
    }
}

/// An enumeration of possible severity levels.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    /// An informational message.
    Info,
    /// A warning.
    #[default]
    Warning,
    /// An error. The call that raised it had no effect.
    Error,
}

impl Severity {
    /// Returns log level corresponding to this severity.
    #[inline]
    pub const fn as_tracing_level(&self) -> Level {
        match *self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }

    /// Returns `true` if the severity is [`Severity::Error`].
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(*self, Self::Error)
    }
}

/// A reported policy violation.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize)]
pub struct Issue {
    cause: Cause,
    severity: Severity,
}

/// The reason an [`Issue`] was raised.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize)]
pub enum Cause {
    /// The abutment box of a slaved cell was set directly.
    AbutmentBoxSlaved {
        /// The slaved cell.
        cell: ArcStr,
        /// The cell whose abutment box is authoritative.
        master: ArcStr,
    },
    /// A cell whose abutment box is already slaved was slaved again.
    AlreadySlaved {
        /// The cell.
        cell: ArcStr,
    },
    /// A cell referenced by more than one instance was slaved.
    NotUnique {
        /// The cell.
        cell: ArcStr,
        /// The number of instances referencing it.
        slaves: usize,
    },
    /// Slaving would make a cell follow its own abutment box.
    SlavingCycle {
        /// The cell to slave.
        cell: ArcStr,
        /// The requested master.
        top: ArcStr,
    },
    /// A cell that other cells are slaved to was itself slaved.
    SlavingMaster {
        /// The cell.
        cell: ArcStr,
    },
    /// Two abutment boxes of different sizes were slaved together.
    SlavingSizeMismatch {
        /// The slaved cell.
        cell: ArcStr,
        /// The master cell.
        top: ArcStr,
    },
    /// A signature names a net the cell does not have.
    MissingNet {
        /// The cell.
        cell: ArcStr,
        /// The missing net name.
        net: ArcStr,
    },
    /// No component of a net matches a signature.
    MissingComponent {
        /// The cell.
        cell: ArcStr,
        /// The kind of component searched for.
        kind: &'static str,
    },
    /// A signature kind cannot be resolved to an entity.
    UnsupportedSignature {
        /// The signature kind.
        kind: &'static str,
    },
    /// A relation was encoded from an owner whose master owner is gone.
    MasterOwnerNotCell {
        /// The relation kind.
        relation: &'static str,
    },
    /// Flattening found a net with the name of a deep net it was about to create.
    DuplicateFlattenNet {
        /// The flattened cell.
        cell: ArcStr,
        /// The name of the existing net.
        net: ArcStr,
    },
    /// A flattened terminal goes through an unplaced instance.
    UnplacedInstance {
        /// The flattened cell.
        cell: ArcStr,
        /// The occurrence name of the terminal.
        occurrence: ArcStr,
    },
    /// The master owner of a shared relation released it.
    RelationReleased {
        /// The relation kind.
        relation: &'static str,
        /// The former master owner.
        owner: ArcStr,
    },
}

impl Diagnostic for Issue {
    fn severity(&self) -> Severity {
        self.severity
    }
}

impl Issue {
    /// Creates a new issue from the given cause and severity.
    pub(crate) fn new(cause: Cause, severity: Severity) -> Self {
        Self { cause, severity }
    }

    /// Gets the underlying cause of this issue.
    #[inline]
    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    /// Creates a new issue and logs it immediately.
    ///
    /// The log level will be selected according to the given severity.
    pub(crate) fn new_and_log(cause: Cause, severity: Severity) -> Self {
        let result = Self::new(cause, severity);
        match severity {
            Severity::Info => tracing::event!(Level::INFO, issue = ?result.cause, "{}", result),
            Severity::Warning => tracing::event!(Level::WARN, issue = ?result.cause, "{}", result),
            Severity::Error => tracing::event!(Level::ERROR, issue = ?result.cause, "{}", result),
        }
        result
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AbutmentBoxSlaved { cell, master } => write!(
                f,
                "abutment box of `{}` is slaved to `{}`; set it on the master instead",
                cell, master
            ),
            Self::AlreadySlaved { cell } => {
                write!(f, "`{}` is already slaved, action cancelled", cell)
            }
            Self::NotUnique { cell, slaves } => write!(
                f,
                "`{}` is not unique ({} instances), action cancelled",
                cell, slaves
            ),
            Self::SlavingCycle { cell, top } => write!(
                f,
                "slaving `{}` to `{}` would make it follow its own abutment box",
                cell, top
            ),
            Self::SlavingMaster { cell } => write!(
                f,
                "`{}` has cells slaved to it and cannot itself be slaved",
                cell
            ),
            Self::SlavingSizeMismatch { cell, top } => write!(
                f,
                "slaving abutment boxes of different sizes (`{}` to `{}`), fixed blocks may shift",
                cell, top
            ),
            Self::MissingNet { cell, net } => write!(
                f,
                "cell `{}` has no net `{}`, signature incoherency",
                cell, net
            ),
            Self::MissingComponent { cell, kind } => write!(
                f,
                "cannot find a {} in cell `{}` matching signature",
                kind, cell
            ),
            Self::UnsupportedSignature { kind } => {
                write!(f, "signature kind {} is unsupported", kind)
            }
            Self::MasterOwnerNotCell { relation } => {
                write!(f, "master owner of `{}` is not a cell", relation)
            }
            Self::DuplicateFlattenNet { cell, net } => write!(
                f,
                "in `{}`, found duplicate net `{}`; skipping deep net",
                cell, net
            ),
            Self::UnplacedInstance { cell, occurrence } => write!(
                f,
                "in `{}`, terminal `{}` goes through an unplaced instance",
                cell, occurrence
            ),
            Self::RelationReleased { relation, owner } => {
                write!(f, "`{}` released by master owner `{}`", relation, owner)
            }
        }
    }
}

/// A collection of issues.
#[derive(Debug, Clone, Default)]
pub struct IssueSet {
    issues: Vec<Issue>,
    num_errors: usize,
    num_warnings: usize,
}

impl IssueSet {
    /// Creates a new, empty issue set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the given issue to the issue set.
    pub fn add(&mut self, issue: Issue) {
        match issue.severity() {
            Severity::Error => self.num_errors += 1,
            Severity::Warning => self.num_warnings += 1,
            Severity::Info => (),
        };
        self.issues.push(issue);
    }

    /// Returns an iterator over all issues in the set.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    /// The number of issues in this issue set.
    #[inline]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if this issue set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns `true` if this issue set contains an error.
    pub fn has_error(&self) -> bool {
        self.num_errors > 0
    }

    /// The number of errors in this issue set.
    #[inline]
    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    /// Returns `true` if this issue set contains a warning.
    pub fn has_warning(&self) -> bool {
        self.num_warnings > 0
    }

    /// The number of warnings in this issue set.
    #[inline]
    pub fn num_warnings(&self) -> usize {
        self.num_warnings
    }

    /// Removes and returns every issue, leaving the set empty.
    pub fn drain(&mut self) -> Vec<Issue> {
        self.num_errors = 0;
        self.num_warnings = 0;
        std::mem::take(&mut self.issues)
    }
}

impl IntoIterator for IssueSet {
    type Item = Issue;
    type IntoIter = <Vec<Issue> as IntoIterator>::IntoIter;
    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_severity() {
        let mut issues = IssueSet::new();
        issues.add(Issue::new(
            Cause::AlreadySlaved { cell: "a".into() },
            Severity::Error,
        ));
        issues.add(Issue::new(
            Cause::SlavingSizeMismatch {
                cell: "a".into(),
                top: "b".into(),
            },
            Severity::Warning,
        ));
        issues.add(Issue::new(
            Cause::RelationReleased {
                relation: "Cell::SlavedsRelation",
                owner: "b".into(),
            },
            Severity::Info,
        ));
        assert_eq!(issues.len(), 3);
        assert_eq!(issues.num_errors(), 1);
        assert_eq!(issues.num_warnings(), 1);

        let drained = issues.drain();
        assert_eq!(drained.len(), 3);
        assert!(issues.is_empty());
        assert!(!issues.has_error());
    }

    #[test]
    fn issues_serialize_with_their_cause() {
        let issue = Issue::new(
            Cause::MasterOwnerNotCell {
                relation: "Cell::UniquifyRelation",
            },
            Severity::Error,
        );
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["severity"], "Error");
        assert_eq!(
            value["cause"]["MasterOwnerNotCell"]["relation"],
            "Cell::UniquifyRelation"
        );
    }
}
