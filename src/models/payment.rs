use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A payment record, created by manual admin entry or by the Stripe
/// confirmation flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub booking_id: Option<String>,
    pub customer_id: Option<String>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentRecordStatus,
    pub payment_date: NaiveDate,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cheque => "cheque",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "card" => PaymentMethod::Card,
            "bank_transfer" => PaymentMethod::BankTransfer,
            "cheque" => PaymentMethod::Cheque,
            _ => PaymentMethod::Cash,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRecordStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Pending => "pending",
            PaymentRecordStatus::Paid => "paid",
            PaymentRecordStatus::Refunded => "refunded",
            PaymentRecordStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "paid" => PaymentRecordStatus::Paid,
            "refunded" => PaymentRecordStatus::Refunded,
            "failed" => PaymentRecordStatus::Failed,
            _ => PaymentRecordStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip() {
        for s in ["cash", "card", "bank_transfer", "cheque"] {
            assert_eq!(PaymentMethod::parse(s).as_str(), s);
        }
    }

    #[test]
    fn test_record_status_round_trip() {
        for s in ["pending", "paid", "refunded", "failed"] {
            assert_eq!(PaymentRecordStatus::parse(s).as_str(), s);
        }
    }
}
