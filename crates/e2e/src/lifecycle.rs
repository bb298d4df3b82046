//! Entity lifecycle as seen through the UI
//!
//! ```text
//! Absent -> Creating -> Created -> (Editing -> Edited)? -> Deleting -> Absent
//! ```
//!
//! A scenario moves to the next state only after asserting the UI shows
//! the previous one, so each transition is guarded here and an illegal
//! move is an error rather than a silently chained action.

use std::fmt;

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Absent,
    Creating,
    Created,
    Editing,
    Edited,
    Deleting,
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityState::Absent => "absent",
            EntityState::Creating => "creating",
            EntityState::Created => "created",
            EntityState::Editing => "editing",
            EntityState::Edited => "edited",
            EntityState::Deleting => "deleting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    entity: String,
    state: EntityState,
    /// State to return to when an edit is cancelled
    before_edit: Option<EntityState>,
}

impl Lifecycle {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            state: EntityState::Absent,
            before_edit: None,
        }
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Track a rename so errors name the current entity
    pub fn rename(&mut self, entity: impl Into<String>) {
        self.entity = entity.into();
    }

    fn is_allowed(from: EntityState, to: EntityState) -> bool {
        use EntityState::*;
        matches!(
            (from, to),
            (Absent, Creating)
                | (Creating, Created)
                | (Created, Editing)
                | (Edited, Editing)
                | (Editing, Edited)
                | (Created, Deleting)
                | (Edited, Deleting)
                | (Deleting, Absent)
        )
    }

    pub fn advance(&mut self, to: EntityState) -> E2eResult<()> {
        if !Self::is_allowed(self.state, to) {
            return Err(E2eError::InvalidTransition {
                entity: self.entity.clone(),
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        if to == EntityState::Editing {
            self.before_edit = Some(self.state);
        }
        self.state = to;
        Ok(())
    }

    /// Leave `Editing` without saving
    pub fn cancel_edit(&mut self) -> E2eResult<()> {
        match (self.state, self.before_edit.take()) {
            (EntityState::Editing, Some(previous)) => {
                self.state = previous;
                Ok(())
            }
            (state, _) => Err(E2eError::InvalidTransition {
                entity: self.entity.clone(),
                from: state.to_string(),
                to: "cancelled edit".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use EntityState::*;

    #[test]
    fn full_lifecycle_with_edit() {
        let mut lc = Lifecycle::new("본관");
        for state in [Creating, Created, Editing, Edited, Editing, Edited, Deleting, Absent] {
            lc.advance(state).unwrap();
        }
        assert_eq!(lc.state(), Absent);
    }

    #[test]
    fn cancel_returns_to_state_before_edit() {
        let mut lc = Lifecycle::new("본관");
        lc.advance(Creating).unwrap();
        lc.advance(Created).unwrap();
        lc.advance(Editing).unwrap();
        lc.cancel_edit().unwrap();
        assert_eq!(lc.state(), Created);
        assert!(lc.cancel_edit().is_err());
    }

    #[test_case(Absent, Created ; "create without creating")]
    #[test_case(Absent, Deleting ; "delete before create")]
    #[test_case(Creating, Editing ; "edit before confirmed")]
    #[test_case(Created, Absent ; "skip deleting")]
    fn rejects_speculative_transitions(start: EntityState, to: EntityState) {
        let mut lc = Lifecycle::new("x");
        let path: &[EntityState] = match start {
            Absent => &[],
            Creating => &[Creating],
            _ => &[Creating, Created],
        };
        for state in path {
            lc.advance(*state).unwrap();
        }
        assert_eq!(lc.state(), start);

        let err = lc.advance(to).unwrap_err();
        assert!(matches!(err, E2eError::InvalidTransition { .. }));
        assert_eq!(lc.state(), start);
    }
}
