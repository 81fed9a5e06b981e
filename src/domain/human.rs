use std::fmt;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{HumanId, dates};

/// The sex of a human, fixed at creation.
///
/// Parent validation depends on it: a father reference must resolve to a
/// [`Sex::Male`] record and a mother reference to a [`Sex::Female`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => f.write_str("male"),
            Self::Female => f.write_str("female"),
        }
    }
}

/// Error returned when a date assignment would place a death before a birth.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
#[error("death date {death} precedes birth date {birth}")]
pub struct DateOrderError {
    /// The birth date involved in the conflict.
    pub birth: NaiveDate,
    /// The death date involved in the conflict.
    pub death: NaiveDate,
}

/// Checks that `death` does not precede `birth`, when both are known.
fn check_date_order(
    birth: Option<NaiveDate>,
    death: Option<NaiveDate>,
) -> Result<(), DateOrderError> {
    match (birth, death) {
        (Some(birth), Some(death)) if death < birth => Err(DateOrderError { birth, death }),
        _ => Ok(()),
    }
}

/// A human value not yet assigned an identifier.
///
/// Candidates are constructed by the caller and handed to
/// [`FamilyTree::add`](crate::FamilyTree::add), which validates any parent
/// references they carry, assigns the identifier, and stores the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    name: String,
    sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "dates::optional")]
    birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "dates::optional")]
    death_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    father: Option<HumanId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mother: Option<HumanId>,
}

impl Candidate {
    /// Constructs a new candidate from a name and a sex.
    ///
    /// All other fields start unset. The store does not reject blank names;
    /// validating the name is the caller's concern.
    #[must_use]
    pub const fn new(name: String, sex: Sex) -> Self {
        Self {
            name,
            sex,
            birth_date: None,
            death_date: None,
            father: None,
            mother: None,
        }
    }

    /// The candidate's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The candidate's sex.
    #[must_use]
    pub const fn sex(&self) -> Sex {
        self.sex
    }

    /// The candidate's birth date, if known.
    #[must_use]
    pub const fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    /// The candidate's death date, if known.
    #[must_use]
    pub const fn death_date(&self) -> Option<NaiveDate> {
        self.death_date
    }

    /// The father reference carried by the candidate, if any.
    #[must_use]
    pub const fn father(&self) -> Option<HumanId> {
        self.father
    }

    /// The mother reference carried by the candidate, if any.
    #[must_use]
    pub const fn mother(&self) -> Option<HumanId> {
        self.mother
    }

    /// Sets the birth date.
    ///
    /// # Errors
    ///
    /// Returns [`DateOrderError`] if a death date is already set and would
    /// precede `date`; the field is not mutated.
    pub fn set_birth_date(&mut self, date: NaiveDate) -> Result<(), DateOrderError> {
        check_date_order(Some(date), self.death_date)?;
        self.birth_date = Some(date);
        Ok(())
    }

    /// Sets the death date.
    ///
    /// # Errors
    ///
    /// Returns [`DateOrderError`] if a birth date is already set and `date`
    /// would precede it; the field is not mutated.
    pub fn set_death_date(&mut self, date: NaiveDate) -> Result<(), DateOrderError> {
        check_date_order(self.birth_date, Some(date))?;
        self.death_date = Some(date);
        Ok(())
    }

    /// Assigns the father and mother references.
    ///
    /// `None` means unknown (or clears a previous reference). This is a pure
    /// assignment; the references are validated when the candidate is added
    /// to a store.
    pub const fn set_family_ties(&mut self, father: Option<HumanId>, mother: Option<HumanId>) {
        self.father = father;
        self.mother = mother;
    }
}

/// A single genealogical record.
///
/// Humans are created only by a [`FamilyTree`](crate::FamilyTree), which
/// assigns the identifier. The identifier and the sex are immutable after
/// creation; demographic fields and parent references are mutable through
/// the setters. The father and mother fields are non-owning identifier
/// references into the same store, resolved by the store rather than held
/// by value, so later edits to a parent are visible through the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Human {
    id: HumanId,
    name: String,
    sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "dates::optional")]
    birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "dates::optional")]
    death_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    father: Option<HumanId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mother: Option<HumanId>,
}

impl Human {
    /// Promotes a candidate into a stored record with the given identifier.
    pub(crate) fn from_candidate(id: HumanId, candidate: Candidate) -> Self {
        Self {
            id,
            name: candidate.name,
            sex: candidate.sex,
            birth_date: candidate.birth_date,
            death_date: candidate.death_date,
            father: candidate.father,
            mother: candidate.mother,
        }
    }

    /// The store-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> HumanId {
        self.id
    }

    /// The human's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The human's sex.
    #[must_use]
    pub const fn sex(&self) -> Sex {
        self.sex
    }

    /// The birth date, if known.
    #[must_use]
    pub const fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    /// The death date, if known.
    #[must_use]
    pub const fn death_date(&self) -> Option<NaiveDate> {
        self.death_date
    }

    /// The father reference, if known.
    #[must_use]
    pub const fn father(&self) -> Option<HumanId> {
        self.father
    }

    /// The mother reference, if known.
    #[must_use]
    pub const fn mother(&self) -> Option<HumanId> {
        self.mother
    }

    /// Sets the birth date.
    ///
    /// # Errors
    ///
    /// Returns [`DateOrderError`] if a death date is already set and would
    /// precede `date`; the field is not mutated.
    pub fn set_birth_date(&mut self, date: NaiveDate) -> Result<(), DateOrderError> {
        check_date_order(Some(date), self.death_date)?;
        self.birth_date = Some(date);
        Ok(())
    }

    /// Sets the death date.
    ///
    /// # Errors
    ///
    /// Returns [`DateOrderError`] if a birth date is already set and `date`
    /// would precede it; the field is not mutated.
    pub fn set_death_date(&mut self, date: NaiveDate) -> Result<(), DateOrderError> {
        check_date_order(self.birth_date, Some(date))?;
        self.death_date = Some(date);
        Ok(())
    }

    /// Assigns the father and mother references.
    ///
    /// `None` means unknown (or clears a previous reference). This is a pure
    /// assignment; only the owning store has global visibility into the
    /// relationship graph, so validation happens in
    /// [`FamilyTree::set_parents`](crate::FamilyTree::set_parents) and
    /// [`FamilyTree::update`](crate::FamilyTree::update).
    pub const fn set_family_ties(&mut self, father: Option<HumanId>, mother: Option<HumanId>) {
        self.father = father;
        self.mother = mother;
    }

    /// The age in whole years on the given date.
    ///
    /// For the deceased the age is fixed at death: the reference date is the
    /// death date when one is set, `on` otherwise. Returns `None` when the
    /// birth date is unknown. The value is derived at call time, never
    /// stored.
    #[must_use]
    pub fn age_on(&self, on: NaiveDate) -> Option<i32> {
        let birth = self.birth_date?;
        let reference = self.death_date.unwrap_or(on);
        let mut years = reference.year() - birth.year();
        // Birthday not yet reached in the reference year.
        if (reference.month(), reference.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        Some(years)
    }

    /// The age in whole years as of today.
    ///
    /// Convenience over [`age_on`](Self::age_on) using the current local
    /// date.
    #[must_use]
    pub fn age(&self) -> Option<i32> {
        self.age_on(Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn human(name: &str, sex: Sex) -> Human {
        Human::from_candidate(HumanId::MIN, Candidate::new(name.to_string(), sex))
    }

    #[test]
    fn death_before_birth_is_rejected() {
        let mut h = human("Anna", Sex::Female);
        h.set_birth_date(date(1990, 6, 15)).unwrap();

        let err = h.set_death_date(date(1989, 1, 1)).unwrap_err();

        assert_eq!(
            err,
            DateOrderError {
                birth: date(1990, 6, 15),
                death: date(1989, 1, 1),
            }
        );
        assert_eq!(h.death_date(), None, "failed assignment must not mutate");
    }

    #[test]
    fn birth_after_death_is_rejected() {
        let mut h = human("Anna", Sex::Female);
        h.set_death_date(date(1989, 1, 1)).unwrap();

        h.set_birth_date(date(1990, 6, 15)).unwrap_err();

        assert_eq!(h.birth_date(), None);
    }

    #[test]
    fn death_on_birth_date_is_allowed() {
        let mut h = human("Anna", Sex::Female);
        h.set_birth_date(date(1990, 6, 15)).unwrap();
        h.set_death_date(date(1990, 6, 15)).unwrap();
        assert_eq!(h.death_date(), Some(date(1990, 6, 15)));
    }

    #[test]
    fn candidate_setters_enforce_the_same_order() {
        let mut candidate = Candidate::new("Anna".to_string(), Sex::Female);
        candidate.set_birth_date(date(2000, 1, 1)).unwrap();
        candidate.set_death_date(date(1999, 1, 1)).unwrap_err();
        assert_eq!(candidate.death_date(), None);
    }

    #[test_case(date(2020, 6, 14), 29 ; "day before birthday")]
    #[test_case(date(2020, 6, 15), 30 ; "on the birthday")]
    #[test_case(date(2020, 6, 16), 30 ; "day after birthday")]
    fn age_adjusts_for_the_birthday(on: NaiveDate, expected: i32) {
        let mut h = human("Anna", Sex::Female);
        h.set_birth_date(date(1990, 6, 15)).unwrap();
        assert_eq!(h.age_on(on), Some(expected));
    }

    #[test]
    fn age_of_the_deceased_is_fixed_at_death() {
        let mut h = human("Boris", Sex::Male);
        h.set_birth_date(date(1900, 1, 1)).unwrap();
        h.set_death_date(date(1970, 6, 1)).unwrap();

        assert_eq!(h.age_on(date(2020, 1, 1)), Some(70));
    }

    #[test]
    fn age_without_birth_date_is_unknown() {
        let h = human("Boris", Sex::Male);
        assert_eq!(h.age_on(date(2020, 1, 1)), None);
    }

    #[test]
    fn family_ties_are_plain_assignment() {
        let father = HumanId::try_from(2).unwrap();
        let mut h = human("Anna", Sex::Female);

        h.set_family_ties(Some(father), None);
        assert_eq!(h.father(), Some(father));
        assert_eq!(h.mother(), None);

        h.set_family_ties(None, None);
        assert_eq!(h.father(), None);
    }

    #[test]
    fn serializes_dates_in_canonical_format() {
        let mut h = human("Anna", Sex::Female);
        h.set_birth_date(date(1990, 1, 1)).unwrap();

        let text = toml::to_string(&h).unwrap();
        assert!(text.contains(r#"birth_date = "1.1.1990""#), "got: {text}");

        let back: Human = toml::from_str(&text).unwrap();
        assert_eq!(back, h);
    }
}
