use tracing::debug;

use super::manager::{ConnectionManager, WriteMode, WriteOutcome};
use crate::domain::WriteArgs;
use crate::error::SummarizerError;

/// One write path serving two purposes, selected by the mode the gate was
/// opened with.
///
/// * `Prepared`: the caller's arguments are discarded and replaced with
///   [`WriteArgs::neutral`]; the result is a statement template and no row is
///   written.
/// * `Unprepared`: the arguments pass through unchanged and one row is written.
///
/// The mode lives in the gate value, so gates opened by concurrent requests
/// never observe each other.
#[derive(Clone, Copy)]
pub struct PrepareGate<'a> {
    manager: &'a ConnectionManager,
    mode: WriteMode,
}

impl<'a> PrepareGate<'a> {
    pub(crate) fn new(manager: &'a ConnectionManager, mode: WriteMode) -> Self {
        Self { manager, mode }
    }

    #[must_use]
    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub async fn write(self, args: WriteArgs) -> Result<WriteOutcome, SummarizerError> {
        let args = match self.mode {
            WriteMode::Prepared => {
                if !args.is_neutral() {
                    debug!(
                        user_id = args.user_id,
                        "prepared write: caller arguments replaced with neutral payload"
                    );
                }
                WriteArgs::neutral()
            }
            WriteMode::Unprepared => args,
        };
        self.manager.write(self.mode, args).await
    }
}
