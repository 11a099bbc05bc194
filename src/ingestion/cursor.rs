use crate::rpc::SignatureInfo;
use chrono::{DateTime, Utc};

/// Newest signature already handled for one monitored program
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionCursor {
    pub signature: String,
    pub slot: u64,
    pub updated_at: DateTime<Utc>,
}

impl IngestionCursor {
    pub fn anchored_at(latest: &SignatureInfo) -> Self {
        Self {
            signature: latest.signature.clone(),
            slot: latest.slot,
            updated_at: Utc::now(),
        }
    }

    /// Move forward to `newest`; never moves back to an older slot
    pub fn advance(&mut self, newest: &SignatureInfo) -> bool {
        if newest.slot < self.slot || newest.signature == self.signature {
            return false;
        }
        self.signature = newest.signature.clone();
        self.slot = newest.slot;
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(signature: &str, slot: u64) -> SignatureInfo {
        SignatureInfo {
            signature: signature.to_string(),
            slot,
            err: None,
            block_time: None,
        }
    }

    #[test]
    fn advance_is_monotonic() {
        let mut cursor = IngestionCursor::anchored_at(&sig("s1", 10));
        assert!(cursor.advance(&sig("s2", 12)));
        assert!(!cursor.advance(&sig("old", 11)));
        assert_eq!(cursor.signature, "s2");

        // several signatures can share a slot
        assert!(cursor.advance(&sig("s3", 12)));
        assert!(!cursor.advance(&sig("s3", 12)));
        assert_eq!(cursor.slot, 12);
    }
}
