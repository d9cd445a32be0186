use chrono::NaiveDateTime;
use wg_project::ContextDef;

/// The simulation run a device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    /// Timestamp of the first output sample of every device in the run.
    pub start_time: NaiveDateTime,
}

impl RunContext {
    pub fn new(start_time: NaiveDateTime) -> Self {
        Self { start_time }
    }
}

impl From<&ContextDef> for RunContext {
    fn from(def: &ContextDef) -> Self {
        Self::new(def.start_time)
    }
}
