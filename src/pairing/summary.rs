use log::info;

use crate::error::{PairError, Result};

/// Counters produced by one reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairingSummary {
    /// Number of mate pairs found
    pub paired: u64,
    /// Singletons from the first (indexed) file
    pub unpaired_first: u64,
    /// Singletons from the second file
    pub unpaired_second: u64,
    /// Records read from the first file
    pub records_first: u64,
    /// Records read from the second file
    pub records_second: u64,
}
impl PairingSummary {
    /// Total number of singletons across both files
    #[must_use]
    pub fn unpaired(&self) -> u64 {
        self.unpaired_first + self.unpaired_second
    }

    /// Checks that every input record reached exactly one output
    ///
    /// # Arguments
    ///
    /// * `paired1`, `paired2`, `unpaired` - Records actually written to each output
    pub fn check_accounting(&self, paired1: u64, paired2: u64, unpaired: u64) -> Result<()> {
        let expected_unpaired = (self.records_first + self.records_second)
            .checked_sub(2 * self.paired)
            .unwrap_or(u64::MAX);
        let balanced = paired1 == self.paired
            && paired2 == self.paired
            && unpaired == expected_unpaired
            && self.unpaired() == expected_unpaired;
        if balanced {
            Ok(())
        } else {
            Err(PairError::Unbalanced {
                paired1,
                paired2,
                unpaired,
                expected_paired: self.paired,
                expected_unpaired,
            }
            .into())
        }
    }

    /// Logs the final counters
    pub fn log(&self, first: &str, second: &str) {
        info!("Unpaired from {first}: {}", self.unpaired_first);
        info!("Unpaired from {second}: {}", self.unpaired_second);
        info!("Paired: {}", self.paired);
    }
}

#[cfg(test)]
mod testing {
    use super::*;

    #[test]
    fn test_accounting() {
        let summary = PairingSummary {
            paired: 2,
            unpaired_first: 1,
            unpaired_second: 1,
            records_first: 3,
            records_second: 3,
        };
        assert!(summary.check_accounting(2, 2, 2).is_ok());
        assert!(summary.check_accounting(2, 1, 2).is_err());
        assert!(summary.check_accounting(2, 2, 3).is_err());
    }
}
