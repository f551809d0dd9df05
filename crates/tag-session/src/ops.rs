//! Tag operation executor
//!
//! Single-tag operations require the session-scoped radio parameters to
//! be in place first; the executor enforces the antenna precondition
//! locally and converts device-reported operation faults into the
//! operation error class. Embedded per-record faults are a different
//! thing entirely - those ride along in read records and never abort a
//! batch.

use tag_protocol::{DriverError, TagFilter, TagOp, TagReadRecord};
use tracing::debug;

use crate::error::{OperationError, SessionError};
use crate::session::ReaderSession;

impl ReaderSession {
    /// Execute a one-shot operation against a single addressed tag
    ///
    /// `filter` restricts which tag the operation singulates. The
    /// tag-op antenna must have been configured through
    /// [`ReaderSession::set_radio_config`]; passwords are never
    /// validated locally - a wrong one surfaces as a device fault.
    pub async fn execute(
        &mut self,
        op: &TagOp,
        filter: Option<&TagFilter>,
    ) -> Result<Vec<TagReadRecord>, SessionError> {
        if self.radio_config.tagop_antenna.is_none() {
            return Err(OperationError::NoAntenna.into());
        }

        debug!("{}: executing {:?}", self.label, op);
        match self.driver.execute_op(op, filter).await {
            Ok(records) => Ok(records),
            Err(DriverError::TagOpFailed { code }) => {
                Err(OperationError::TagOperationFailed { code }.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
