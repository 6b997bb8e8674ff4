//! Append-only receipt journal.

use poolbet_types::{MatchId, Receipt, ReceiptKind, Result};

/// Audit trail of every committed mutation, in commit order.
#[derive(Debug, Default)]
pub struct Journal {
    receipts: Vec<Receipt>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            receipts: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, receipt: Receipt) {
        tracing::trace!(
            receipt = %receipt.id,
            kind = %receipt.kind,
            hash = %receipt.hash_hex(),
            "Receipt recorded"
        );
        self.receipts.push(receipt);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn for_match(&self, match_id: MatchId) -> impl Iterator<Item = &Receipt> {
        self.receipts
            .iter()
            .filter(move |r| r.event.match_id() == Some(match_id))
    }

    #[must_use]
    pub fn count_of(&self, kind: ReceiptKind) -> usize {
        self.receipts.iter().filter(|r| r.kind == kind).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Recompute every receipt hash. Returns the index of the first receipt
    /// that fails verification, if any.
    pub fn first_tampered(&self) -> Result<Option<usize>> {
        for (i, receipt) in self.receipts.iter().enumerate() {
            if !receipt.verify()? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }
}
