use serde::{Deserialize, Serialize};

/// A transfer of `amount` between two account identifiers.
///
/// Transactions carry no identity or signature; they only matter once folded
/// into balances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Signed effect of this transaction on `address`.
    pub fn delta_for(&self, address: &str) -> f64 {
        if self.sender == address {
            -self.amount
        } else if self.recipient == address {
            self.amount
        } else {
            0.0
        }
    }
}
