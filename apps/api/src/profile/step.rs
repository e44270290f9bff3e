use std::fmt;

use serde::Serialize;

use crate::profile::models::SectionKind;

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 6;

/// A workflow position. Always within `[FIRST_STEP, LAST_STEP]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Step(u8);

impl Step {
    pub fn new(index: u8) -> Option<Step> {
        (FIRST_STEP..=LAST_STEP).contains(&index).then_some(Step(index))
    }

    pub fn last() -> Step {
        Step(LAST_STEP)
    }

    pub fn of(kind: SectionKind) -> Step {
        Step(kind.step())
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn kind(self) -> SectionKind {
        match SectionKind::from_step(self.0) {
            Some(kind) => kind,
            None => unreachable!("step {} outside 1..=6", self.0),
        }
    }

    pub fn next(self) -> Option<Step> {
        Step::new(self.0 + 1)
    }

    pub fn prev(self) -> Option<Step> {
        self.0.checked_sub(1).and_then(Step::new)
    }

    pub fn is_last(self) -> bool {
        self.0 == LAST_STEP
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
