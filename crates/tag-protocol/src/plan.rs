//! Read plans
//!
//! A read plan is an immutable description of one read invocation. It is
//! built fresh whenever read intent changes and applied to the session
//! wholesale; applying a new plan fully replaces the previous one.

use std::time::Duration;

use crate::filter::TagFilter;
use crate::op::TagOp;
use crate::types::TagProtocol;

/// Default per-invocation search timeout, matching common reader firmware
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_millis(1000);

/// Declarative description of what a reader should search for and how
///
/// Built with [`ReadPlan::new`] plus the `with_*` constructors; there is
/// deliberately no mutating setter surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPlan {
    antennas: Vec<u16>,
    protocol: TagProtocol,
    filter: Option<TagFilter>,
    op: Option<TagOp>,
    timeout: Duration,
}

impl ReadPlan {
    /// Create a plan over the given antennas and protocol
    ///
    /// An empty antenna list means "the device's default antenna set".
    pub fn new(antennas: Vec<u16>, protocol: TagProtocol) -> Self {
        Self {
            antennas,
            protocol,
            filter: None,
            op: None,
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    /// Restrict the plan to tags matching `filter`
    pub fn with_filter(mut self, filter: TagFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Embed a tag operation executed against every tag the plan reads
    pub fn with_op(mut self, op: TagOp) -> Self {
        self.op = Some(op);
        self
    }

    /// Override the search timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ordered antenna indices, empty for the device default
    pub fn antennas(&self) -> &[u16] {
        &self.antennas
    }

    /// Air protocol searched under
    pub fn protocol(&self) -> TagProtocol {
        self.protocol
    }

    /// Optional tag filter
    pub fn filter(&self) -> Option<&TagFilter> {
        self.filter.as_ref()
    }

    /// Optional embedded operation
    pub fn op(&self) -> Option<&TagOp> {
        self.op.as_ref()
    }

    /// Search timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gen2Bank;

    #[test]
    fn test_plan_defaults() {
        let plan = ReadPlan::new(vec![], TagProtocol::Gen2);
        assert!(plan.antennas().is_empty());
        assert!(plan.filter().is_none());
        assert!(plan.op().is_none());
        assert_eq!(plan.timeout(), DEFAULT_SEARCH_TIMEOUT);
    }

    #[test]
    fn test_plan_construction() {
        let filter = TagFilter::select(false, Gen2Bank::Tid, 0, 16, vec![0xE2, 0x80]);
        let plan = ReadPlan::new(vec![1, 2], TagProtocol::Gen2)
            .with_filter(filter.clone())
            .with_op(TagOp::ReadData {
                bank: Gen2Bank::Tid,
                word_address: 0,
                word_count: 2,
            })
            .with_timeout(Duration::from_millis(500));

        assert_eq!(plan.antennas(), [1, 2]);
        assert_eq!(plan.filter(), Some(&filter));
        assert_eq!(plan.timeout(), Duration::from_millis(500));
    }
}
