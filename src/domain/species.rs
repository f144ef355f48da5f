//! Species payload and the drafts used by the factory operations.

use std::fmt;

use crate::domain::error::{LineageError, LineageResult};

/// Data payload of a lineage node: a named segment on the shared timeline.
///
/// `duration > 0` holds for every value of this type; it is checked by
/// [`Species::new`] and by every setter that changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub(crate) name: String,
    pub(crate) apparition: f64,
    pub(crate) duration: f64,
    pub(crate) description: Option<String>,
    pub(crate) image: Option<String>,
    pub(crate) display: bool,
}

impl Species {
    /// Create a displayed species starting at `apparition` and lasting `duration`.
    pub fn new(name: impl Into<String>, apparition: f64, duration: f64) -> LineageResult<Self> {
        let name = name.into();
        check_apparition(&name, apparition)?;
        check_duration(&name, duration)?;
        Ok(Self {
            name,
            apparition,
            duration,
            description: None,
            image: None,
            display: true,
        })
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = non_empty(description);
        self
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = non_empty(image);
        self
    }

    /// Mark the species as a synthetic node that does not render its own branch.
    pub fn hidden(mut self) -> Self {
        self.display = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apparition(&self) -> f64 {
        self.apparition
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn is_displayed(&self) -> bool {
        self.display
    }

    /// End of this species' own segment.
    pub fn extinction(&self) -> f64 {
        self.apparition + self.duration
    }

    /// Whether `point` lies inside `[apparition, extinction]`.
    pub fn covers(&self, point: f64) -> bool {
        self.apparition <= point && point <= self.extinction()
    }

    /// Whether a descendant may start `offset` after this apparition.
    pub fn admits_offset(&self, offset: f64) -> bool {
        (0.0..=self.duration).contains(&offset)
    }

    /// Absolute apparition of a descendant starting `offset` after this one.
    ///
    /// Rounding never places the result outside `[apparition, extinction]`.
    pub(crate) fn place_descendant(&self, offset: f64) -> f64 {
        (self.apparition + offset).clamp(self.apparition, self.extinction())
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.name, self.apparition, self.extinction())
    }
}

pub(crate) fn check_apparition(name: &str, apparition: f64) -> LineageResult<()> {
    if apparition.is_finite() {
        Ok(())
    } else {
        Err(LineageError::InvalidApparition {
            name: name.to_string(),
            apparition,
        })
    }
}

/// Rejects non-positive, infinite and NaN durations.
pub(crate) fn check_duration(name: &str, duration: f64) -> LineageResult<()> {
    if duration.is_finite() && duration > 0.0 {
        Ok(())
    } else {
        Err(LineageError::InvalidDuration {
            name: name.to_string(),
            duration,
        })
    }
}

/// Empty strings are stored as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// How a factory operation treats the tree it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Mutate the existing tree.
    #[default]
    InPlace,
    /// Clone the containing tree first and apply the operation to the clone.
    Copy,
}

/// Relative description of a species to be created next to an existing one.
///
/// `offset` is measured from the existing species' apparition: forwards for
/// a descendant (`afterApparition`), backwards for an ancestor
/// (`previousApparition`).
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesDraft {
    pub name: String,
    pub offset: f64,
    pub duration: f64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub display: bool,
}

impl SpeciesDraft {
    pub fn new(name: impl Into<String>, offset: f64, duration: f64) -> Self {
        Self {
            name: name.into(),
            offset,
            duration,
            description: None,
            image: None,
            display: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    /// Materialise the draft at an absolute apparition.
    pub(crate) fn into_species(self, apparition: f64) -> LineageResult<Species> {
        let mut species = Species::new(self.name, apparition, self.duration)?
            .with_description(self.description)
            .with_image(self.image);
        species.display = self.display;
        Ok(species)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_zero_duration_when_creating_then_fails() {
        let result = Species::new("x", 0.0, 0.0);
        assert!(matches!(result, Err(LineageError::InvalidDuration { .. })));
    }

    #[test]
    fn given_nan_duration_when_creating_then_fails() {
        assert!(Species::new("x", 0.0, f64::NAN).is_err());
    }

    #[test]
    fn given_non_finite_apparition_when_creating_then_fails() {
        for apparition in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = Species::new("x", apparition, 1.0);
            assert!(matches!(result, Err(LineageError::InvalidApparition { .. })));
        }
    }

    #[test]
    fn given_offset_at_duration_when_placing_then_stays_within_segment() {
        let species = Species::new("r", -18.97, 0.763).unwrap();

        let apparition = species.place_descendant(0.763);

        assert!(species.covers(apparition));
        assert!(species.admits_offset(0.763));
        assert!(!species.admits_offset(f64::NAN));
        assert!(!species.admits_offset(-0.1));
    }

    #[test]
    fn given_empty_description_when_creating_then_stored_as_none() {
        let species = Species::new("x", 0.0, 1.0)
            .unwrap()
            .with_description(Some(String::new()))
            .with_image(Some("img.png".into()));
        assert_eq!(species.description(), None);
        assert_eq!(species.image(), Some("img.png"));
    }

    #[test]
    fn test_covers_is_inclusive() {
        let species = Species::new("x", -5.0, 10.0).unwrap();
        assert!(species.covers(-5.0));
        assert!(species.covers(5.0));
        assert!(!species.covers(5.1));
    }
}
