//! Declarative autonomous routines and the registry that selects them.
//!
//! Each routine is its own pair of timer and action tables. Slot numbering
//! is local to a routine; nothing is shared between tables.

use core::fmt;

use heapless::Vec;

use crate::actions::ActionSpec;
use crate::timers::TimerSpec;

pub mod blink_demo;
pub mod score_cube;
pub mod sonar_approach;

pub use blink_demo::{BLINK_DEMO_TEMPLATE, blink_demo_template};
pub use score_cube::{SCORE_CUBE_TEMPLATE, score_cube_template};
pub use sonar_approach::{SONAR_APPROACH_TEMPLATE, sonar_approach_template};

/// Number of distinct [`RoutineKind`] variants.
pub const ROUTINE_KIND_COUNT: usize = 3;

/// Autonomous routines known to the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RoutineKind {
    BlinkDemo,
    ScoreCube,
    SonarApproach,
}

impl RoutineKind {
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            RoutineKind::BlinkDemo => 0,
            RoutineKind::ScoreCube => 1,
            RoutineKind::SonarApproach => 2,
        }
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(RoutineKind::BlinkDemo),
            1 => Some(RoutineKind::ScoreCube),
            2 => Some(RoutineKind::SonarApproach),
            _ => None,
        }
    }

    /// Tag used on the command line and in the REPL.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            RoutineKind::BlinkDemo => "blink",
            RoutineKind::ScoreCube => "score",
            RoutineKind::SonarApproach => "sonar",
        }
    }

    /// Resolves a tag or one of its long aliases, ignoring case.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        const ALIASES: [(&str, RoutineKind); 6] = [
            ("blink", RoutineKind::BlinkDemo),
            ("blink-demo", RoutineKind::BlinkDemo),
            ("score", RoutineKind::ScoreCube),
            ("score-cube", RoutineKind::ScoreCube),
            ("sonar", RoutineKind::SonarApproach),
            ("sonar-approach", RoutineKind::SonarApproach),
        ];
        ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(tag))
            .map(|(_, kind)| *kind)
    }
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Timer and action tables that make up one routine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RoutineTemplate {
    pub kind: RoutineKind,
    pub name: &'static str,
    pub timers: &'static [TimerSpec],
    pub actions: &'static [ActionSpec],
}

impl RoutineTemplate {
    pub const fn new(
        kind: RoutineKind,
        name: &'static str,
        timers: &'static [TimerSpec],
        actions: &'static [ActionSpec],
    ) -> Self {
        Self {
            kind,
            name,
            timers,
            actions,
        }
    }
}

/// Registry of routine templates keyed by [`RoutineKind`].
#[derive(Clone, Debug)]
pub struct RoutineRegistry<const CAPACITY: usize = ROUTINE_KIND_COUNT> {
    templates: Vec<RoutineTemplate, CAPACITY>,
}

impl<const CAPACITY: usize> RoutineRegistry<CAPACITY> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    /// Registers a template, replacing any existing one of the same kind.
    pub fn register(&mut self, template: RoutineTemplate) -> Result<(), RegistryError> {
        if let Some(existing) = self
            .templates
            .iter_mut()
            .find(|existing| existing.kind == template.kind)
        {
            *existing = template;
            Ok(())
        } else {
            self.templates
                .push(template)
                .map_err(|_| RegistryError::RegistryFull)
        }
    }

    #[must_use]
    pub fn get(&self, kind: RoutineKind) -> Option<&RoutineTemplate> {
        self.templates.iter().find(|template| template.kind == kind)
    }

    #[must_use]
    pub fn contains(&self, kind: RoutineKind) -> bool {
        self.get(kind).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, RoutineTemplate> {
        self.templates.iter()
    }
}

impl<const CAPACITY: usize> Default for RoutineRegistry<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised while populating a [`RoutineRegistry`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegistryError {
    RegistryFull,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::RegistryFull => f.write_str("routine registry is full"),
        }
    }
}

/// Registers every built-in routine.
pub fn register_default_routines<const CAPACITY: usize>(
    registry: &mut RoutineRegistry<CAPACITY>,
) -> Result<(), RegistryError> {
    registry.register(blink_demo_template())?;
    registry.register(score_cube_template())?;
    registry.register(sonar_approach_template())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionTable;
    use crate::timers::TimerTable;

    #[test]
    fn tags_resolve_to_kinds() {
        for index in 0..ROUTINE_KIND_COUNT {
            let kind = RoutineKind::from_index(index).expect("kind");
            assert_eq!(kind.as_index(), index);
            assert_eq!(RoutineKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(
            RoutineKind::from_tag("Score-Cube"),
            Some(RoutineKind::ScoreCube)
        );
        assert_eq!(RoutineKind::from_tag("skills"), None);
    }

    #[test]
    fn default_routines_register_once() {
        let mut registry = RoutineRegistry::<ROUTINE_KIND_COUNT>::new();
        register_default_routines(&mut registry).expect("defaults fit");
        assert_eq!(registry.len(), 3);

        // Re-registering replaces in place.
        register_default_routines(&mut registry).expect("replacement");
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(RoutineKind::SonarApproach));
    }

    #[test]
    fn registry_reports_full() {
        let mut registry = RoutineRegistry::<1>::new();
        registry
            .register(blink_demo_template())
            .expect("first fits");
        assert_eq!(
            registry.register(score_cube_template()),
            Err(RegistryError::RegistryFull)
        );
    }

    #[test]
    fn built_in_tables_validate() {
        let mut registry = RoutineRegistry::<ROUTINE_KIND_COUNT>::new();
        register_default_routines(&mut registry).expect("defaults fit");
        for template in registry.iter() {
            let actions = ActionTable::new(template.actions).expect("actions validate");
            TimerTable::new(template.timers, &actions).expect("timers validate");
        }
    }
}
