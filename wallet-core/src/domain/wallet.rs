//! Wallet domain model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A wallet holding a single non-negative integer balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub balance: i64,
}

impl Wallet {
    pub fn new(id: Uuid, balance: i64) -> Self {
        Self { id, balance }
    }

    /// Balance after applying `delta`, or None if the sum overflows
    pub fn balance_after(&self, delta: i64) -> Option<i64> {
        self.balance.checked_add(delta)
    }
}

/// A balance-changing operation requested by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Deposit,
    Withdraw,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Deposit => "DEPOSIT",
            Operation::Withdraw => "WITHDRAW",
        }
    }

    /// Signed delta for a non-negative amount (deposit = +amount, withdraw = -amount)
    pub fn delta(&self, amount: i64) -> i64 {
        match self {
            Operation::Deposit => amount,
            Operation::Withdraw => -amount,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(Operation::Deposit),
            "WITHDRAW" => Ok(Operation::Withdraw),
            other => Err(format!("unknown operation type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parsing_is_exact() {
        assert_eq!("DEPOSIT".parse::<Operation>(), Ok(Operation::Deposit));
        assert_eq!("WITHDRAW".parse::<Operation>(), Ok(Operation::Withdraw));
        assert!("deposit".parse::<Operation>().is_err());
        assert!("UNKNOWN_OPERATION".parse::<Operation>().is_err());
    }

    #[test]
    fn test_operation_delta_sign() {
        assert_eq!(Operation::Deposit.delta(250), 250);
        assert_eq!(Operation::Withdraw.delta(250), -250);
        assert_eq!(Operation::Withdraw.delta(0), 0);
    }

    #[test]
    fn test_balance_after_detects_overflow() {
        let wallet = Wallet::new(Uuid::new_v4(), i64::MAX - 1);
        assert_eq!(wallet.balance_after(1), Some(i64::MAX));
        assert_eq!(wallet.balance_after(2), None);
        assert_eq!(wallet.balance_after(-i64::MAX), Some(-1));
    }

    #[test]
    fn test_wallet_json_shape() {
        let id = Uuid::parse_str("f512717e-1c3f-460e-a3c0-6901c3c2fbce").unwrap();
        let json = serde_json::to_value(Wallet::new(id, 1000)).unwrap();
        assert_eq!(json["id"], "f512717e-1c3f-460e-a3c0-6901c3c2fbce");
        assert_eq!(json["balance"], 1000);
    }
}
