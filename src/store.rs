//! The authoritative in-memory store of family records.
//!
//! The [`FamilyTree`] knows nothing about presentation or persistence. It
//! owns every [`Human`], assigns identifiers, enforces the relationship
//! invariants, and implements search and sort. Records are held in an
//! identifier-keyed arena; father/mother fields are identifier references
//! resolved against that arena, and a relationship graph mirrors them for
//! cycle checks and child queries.

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use chrono::NaiveDate;
use petgraph::{
    Direction,
    algo::{has_path_connecting, is_cyclic_directed},
    graphmap::DiGraphMap,
};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{Candidate, Config, Human, HumanId, Sex, UnknownDatePolicy};

/// The slot a parent reference occupies on a child record.
///
/// Also the edge weight in the relationship graph, so every edge records
/// whether it denotes a father or a mother link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRole {
    /// The father slot; must reference a male record.
    Father,
    /// The mother slot; must reference a female record.
    Mother,
}

impl ParentRole {
    /// The sex a parent in this slot must have.
    #[must_use]
    pub const fn required_sex(self) -> Sex {
        match self {
            Self::Father => Sex::Male,
            Self::Mother => Sex::Female,
        }
    }
}

impl fmt::Display for ParentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Father => f.write_str("father"),
            Self::Mother => f.write_str("mother"),
        }
    }
}

/// Errors that can occur when assigning parents to a record.
///
/// Each variant carries the specific check that failed. A failed assignment
/// never leaves a partial mutation behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParentError {
    /// The referenced parent does not exist in the store.
    #[error("{role} {id} not found")]
    NotFound {
        /// The slot the reference was meant for.
        role: ParentRole,
        /// The identifier that failed to resolve.
        id: HumanId,
    },

    /// The referenced record has the wrong sex for the slot.
    #[error("{role} {id} is not {}", .role.required_sex())]
    WrongSex {
        /// The slot the reference was meant for.
        role: ParentRole,
        /// The identifier of the record with the wrong sex.
        id: HumanId,
    },

    /// A record cannot be its own parent.
    #[error("human {0} cannot be its own parent")]
    SelfReference(HumanId),

    /// The assignment would make the child an ancestor of its own parent.
    #[error("making {parent} the {role} of {child} would create a cycle")]
    Cycle {
        /// The slot the reference was meant for.
        role: ParentRole,
        /// The identifier of the child record.
        child: HumanId,
        /// The identifier of the prospective parent.
        parent: HumanId,
    },
}

/// Errors that can occur when editing a stored record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateError {
    /// No record with this identifier is stored.
    #[error("human {0} not found")]
    UnknownHuman(HumanId),

    /// The record's sex differs from the stored record; sex is fixed at
    /// creation.
    #[error("sex of human {0} cannot change")]
    SexChanged(HumanId),

    /// The record's parent references failed validation.
    #[error(transparent)]
    Parent(#[from] ParentError),
}

/// Errors that can occur when removing a record from the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemoveError {
    /// No record with this identifier is stored.
    #[error("human {0} not found")]
    NotFound(HumanId),

    /// The record is still referenced as a parent and cannot be removed
    /// until the reference is cleared.
    #[error("human {id} is still the {role} of {child}")]
    StillReferenced {
        /// The identifier of the record that cannot be removed.
        id: HumanId,
        /// The slot the record occupies on the referencing child.
        role: ParentRole,
        /// One child that still references the record.
        child: HumanId,
    },
}

/// The authoritative collection of [`Human`] records.
///
/// The store is the sole authority over identifier assignment and the sole
/// enforcement point for the relationship invariants: parents must exist,
/// must have the sex their slot requires, and may never make a record its
/// own direct or transitive ancestor.
///
/// Records are stored in an identifier-keyed arena (`BTreeMap`), so
/// iteration is always in ascending identifier order, which equals
/// insertion order because identifiers come from a monotonic counter. The
/// relationship graph holds one child→parent edge per reference and is kept
/// in sync with the arena by every mutating operation.
#[derive(Debug, Clone)]
pub struct FamilyTree {
    /// Search and sort policies.
    config: Config,

    /// Arena of records, keyed by identifier.
    humans: BTreeMap<HumanId, Human>,

    /// Relationship graph. Edges point from child to parent; the weight
    /// records which slot the link occupies.
    graph: DiGraphMap<HumanId, ParentRole>,

    /// The next identifier to assign. Monotonic; identifiers of removed
    /// records are never reused.
    next_id: HumanId,
}

impl Default for FamilyTree {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl FamilyTree {
    /// Creates an empty store with default policies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given policy configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            humans: BTreeMap::new(),
            graph: DiGraphMap::new(),
            next_id: HumanId::MIN,
        }
    }

    /// The policy configuration this store was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.humans.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.humans.is_empty()
    }

    /// Inserts a candidate, assigning it the next identifier, and returns
    /// the stored record.
    ///
    /// Any parents the candidate already carries are validated with the same
    /// existence and sex rules as [`set_parents`](Self::set_parents). A
    /// candidate has no identifier yet, so self-reference and cycles are
    /// impossible at this point.
    ///
    /// # Errors
    ///
    /// Returns the specific [`ParentError`] if a carried parent reference is
    /// invalid; the candidate is not inserted and no identifier is consumed.
    ///
    /// # Panics
    ///
    /// Panics if the assigned identifier is already present in the arena.
    /// This is unreachable while the counter invariant holds and indicates a
    /// programming error, not a recoverable condition.
    #[instrument(skip(self, candidate), fields(name = %candidate.name()))]
    pub fn add(&mut self, candidate: Candidate) -> Result<&Human, ParentError> {
        self.check_parent(None, ParentRole::Father, candidate.father())?;
        self.check_parent(None, ParentRole::Mother, candidate.mother())?;

        let id = self.next_id;
        assert!(!self.humans.contains_key(&id), "duplicate identifier: {id}");
        self.next_id = id.next();

        let human = Human::from_candidate(id, candidate);
        self.sync_edges(id, human.father(), human.mother());
        self.humans.insert(id, human);

        debug!(%id, "added human");
        Ok(&self.humans[&id])
    }

    /// Looks up a record by identifier.
    ///
    /// Absence is a normal outcome, not an error; callers check for `None`
    /// explicitly.
    #[must_use]
    pub fn find_by_id(&self, id: HumanId) -> Option<&Human> {
        self.humans.get(&id)
    }

    /// Finds every record whose name matches `query` under the configured
    /// matching policy (default: case-insensitive exact match).
    ///
    /// Results are in insertion order. An empty vector means nothing
    /// matched; it is not an error.
    #[must_use]
    pub fn find_by_name(&self, query: &str) -> Vec<&Human> {
        self.humans
            .values()
            .filter(|human| self.config.name_matches(human.name(), query))
            .collect()
    }

    /// Assigns `father` and `mother` as the parents of `child`.
    ///
    /// `None` clears the corresponding slot. The father slot is validated
    /// first, then the mother slot: the reference must resolve, have the
    /// required sex, differ from the child, and must not make the child an
    /// ancestor of its own parent. The check-then-assign is atomic with
    /// respect to this call: the store is only mutated once every check has
    /// passed.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::UnknownHuman`] if `child` is not stored, or
    /// the specific [`ParentError`] for the first slot that fails
    /// validation.
    #[instrument(skip(self))]
    pub fn set_parents(
        &mut self,
        child: HumanId,
        father: Option<HumanId>,
        mother: Option<HumanId>,
    ) -> Result<(), UpdateError> {
        if !self.humans.contains_key(&child) {
            return Err(UpdateError::UnknownHuman(child));
        }
        self.check_parent(Some(child), ParentRole::Father, father)?;
        self.check_parent(Some(child), ParentRole::Mother, mother)?;

        if let Some(human) = self.humans.get_mut(&child) {
            human.set_family_ties(father, mother);
        }
        self.sync_edges(child, father, mother);

        debug!(%child, ?father, ?mother, "assigned parents");
        Ok(())
    }

    /// Replaces the stored copy of a record with `human`.
    ///
    /// A caller holding a clone may have edited it directly, so the record's
    /// parent references are re-validated with the same rules as
    /// [`set_parents`](Self::set_parents). An invalid record is rejected
    /// wholesale: the store's copy is left unchanged and the caller must fix
    /// the reference before retrying.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::UnknownHuman`] if no record with this
    /// identifier is stored, [`UpdateError::SexChanged`] if the edit altered
    /// the sex, or the specific [`ParentError`] if a parent reference is
    /// invalid.
    #[instrument(skip(self, human), fields(id = %human.id()))]
    pub fn update(&mut self, human: &Human) -> Result<(), UpdateError> {
        let id = human.id();
        let Some(stored) = self.humans.get(&id) else {
            return Err(UpdateError::UnknownHuman(id));
        };
        if stored.sex() != human.sex() {
            return Err(UpdateError::SexChanged(id));
        }
        self.check_parent(Some(id), ParentRole::Father, human.father())?;
        self.check_parent(Some(id), ParentRole::Mother, human.mother())?;

        self.sync_edges(id, human.father(), human.mother());
        self.humans.insert(id, human.clone());

        debug!(%id, "updated human");
        Ok(())
    }

    /// Removes a record from the store and returns it.
    ///
    /// A record still referenced as the father or mother of another record
    /// cannot be removed; the reference must be cleared first. The
    /// identifier of a removed record is never reassigned.
    ///
    /// # Errors
    ///
    /// Returns [`RemoveError::NotFound`] if the record does not exist, or
    /// [`RemoveError::StillReferenced`] naming one referencing child.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: HumanId) -> Result<Human, RemoveError> {
        if !self.humans.contains_key(&id) {
            return Err(RemoveError::NotFound(id));
        }
        if let Some((child, role)) = self.referencing_child(id) {
            return Err(RemoveError::StillReferenced { id, role, child });
        }

        self.graph.remove_node(id);
        let human = self
            .humans
            .remove(&id)
            .unwrap_or_else(|| panic!("human {id} vanished during removal"));

        debug!(%id, "removed human");
        Ok(human)
    }

    /// Returns every record sorted by name, ascending.
    ///
    /// Ties are broken by ascending identifier, so records with equal names
    /// appear in insertion order.
    #[must_use]
    pub fn sort_by_name(&self) -> Vec<&Human> {
        let mut humans: Vec<&Human> = self.humans.values().collect();
        humans.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        humans
    }

    /// Returns every record sorted by birth date, ascending.
    ///
    /// Records without a birth date are placed per the configured
    /// unknown-date policy (default: after every record with one). Ties are
    /// broken by ascending identifier.
    #[must_use]
    pub fn sort_by_birth_date(&self) -> Vec<&Human> {
        self.sorted_by_optional_key(Human::birth_date)
    }

    /// Returns every record sorted by age, ascending (youngest first).
    ///
    /// Age is computed at query time, in whole years, from the birth date to
    /// the death date (or to `on` for the living). Records without a birth
    /// date have no computable age and are placed per the configured
    /// unknown-date policy (default: last). Ties are broken by ascending
    /// identifier.
    #[must_use]
    pub fn sort_by_age(&self, on: NaiveDate) -> Vec<&Human> {
        self.sorted_by_optional_key(|human| human.age_on(on))
    }

    /// Iterates over every record in ascending identifier (insertion)
    /// order.
    ///
    /// The listing is total: it covers each stored record exactly once.
    pub fn iter(&self) -> impl Iterator<Item = &Human> + '_ {
        self.humans.values()
    }

    /// Iterates over the direct children of `id`.
    pub fn children(&self, id: HumanId) -> impl Iterator<Item = HumanId> + '_ {
        // Incoming edges are from children.
        if self.graph.contains_node(id) {
            Some(self.graph.neighbors_directed(id, Direction::Incoming))
        } else {
            None
        }
        .into_iter()
        .flatten()
    }

    /// Determines whether the relationship graph contains any cycle.
    ///
    /// Every mutating operation rejects cycle-forming assignments, so this
    /// returns `false` unless an invariant has been broken.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }
}

impl FamilyTree {
    /// Validates a single parent reference.
    ///
    /// `child` is `None` while validating a candidate that has not been
    /// assigned an identifier yet; the self-reference and cycle checks only
    /// apply once the child exists in the store.
    fn check_parent(
        &self,
        child: Option<HumanId>,
        role: ParentRole,
        parent: Option<HumanId>,
    ) -> Result<(), ParentError> {
        let Some(parent) = parent else {
            return Ok(());
        };

        let Some(record) = self.humans.get(&parent) else {
            return Err(ParentError::NotFound { role, id: parent });
        };
        if record.sex() != role.required_sex() {
            return Err(ParentError::WrongSex { role, id: parent });
        }

        let Some(child) = child else {
            return Ok(());
        };
        if parent == child {
            return Err(ParentError::SelfReference(child));
        }
        // Edges point child → parent, so a path from the prospective parent
        // to the child means the child is already an ancestor of the parent.
        if has_path_connecting(&self.graph, parent, child, None) {
            return Err(ParentError::Cycle {
                role,
                child,
                parent,
            });
        }

        Ok(())
    }

    /// Rewrites `child`'s outgoing edges to match the given references.
    fn sync_edges(&mut self, child: HumanId, father: Option<HumanId>, mother: Option<HumanId>) {
        self.graph.add_node(child);
        let existing: Vec<HumanId> = self.graph.edges(child).map(|(_, parent, _)| parent).collect();
        for parent in existing {
            self.graph.remove_edge(child, parent);
        }
        if let Some(father) = father {
            self.graph.add_edge(child, father, ParentRole::Father);
        }
        if let Some(mother) = mother {
            self.graph.add_edge(child, mother, ParentRole::Mother);
        }
    }

    /// Finds one record that still references `id` as a parent, with the
    /// slot it occupies.
    fn referencing_child(&self, id: HumanId) -> Option<(HumanId, ParentRole)> {
        let child = self.children(id).next()?;
        let record = self.humans.get(&child)?;
        let role = if record.father() == Some(id) {
            ParentRole::Father
        } else {
            ParentRole::Mother
        };
        Some((child, role))
    }

    /// Collects every record sorted ascending by an optional key, with
    /// unknown keys placed per the configured policy and ties broken by
    /// ascending identifier.
    fn sorted_by_optional_key<K: Ord>(&self, key: impl Fn(&Human) -> Option<K>) -> Vec<&Human> {
        let unknown_last = self.config.unknown_dates() == UnknownDatePolicy::Last;
        let mut humans: Vec<&Human> = self.humans.values().collect();
        humans.sort_by(|a, b| {
            let by_key = match (key(a), key(b)) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => {
                    if unknown_last {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    }
                }
                (None, Some(_)) => {
                    if unknown_last {
                        Ordering::Greater
                    } else {
                        Ordering::Less
                    }
                }
                (None, None) => Ordering::Equal,
            };
            by_key.then(a.id().cmp(&b.id()))
        });
        humans
    }
}
