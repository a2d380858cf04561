//! Domain models shared by the receipt services
//!
//! Serialized field names match the documents already held by the store
//! (`uid`, `record.rname`, `mart.martName`, `totalPrice`, ...), so these
//! types must not be renamed on the wire.

use serde::{Deserialize, Serialize};

/// Identity of an authenticated user, as carried inside a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject identifier
    pub uid: String,
    pub email: String,
    /// Display name
    pub nickname: String,
}

impl Identity {
    pub fn new(
        uid: impl Into<String>,
        email: impl Into<String>,
        nickname: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            nickname: nickname.into(),
        }
    }
}

/// Normalized, persisted representation of one OCR-processed receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionRecord {
    /// Owning user's subject identifier
    pub uid: String,
    pub record: RecordHeader,
    pub mart: Mart,
    pub product: Vec<Product>,
    /// Provider-reported total. Not recomputed from `product`.
    #[serde(rename = "totalPrice")]
    pub total_price: i64,
}

impl RecognitionRecord {
    /// Natural key used for conflict detection before insert
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey {
            uid: self.uid.clone(),
            rname: self.record.rname.clone(),
        }
    }

    /// Sum of `price * amount` over all line items.
    ///
    /// Informational only; the stored total is always the provider's.
    pub fn line_item_sum(&self) -> i64 {
        self.product
            .iter()
            .map(|p| p.price.saturating_mul(p.amount))
            .fold(0i64, |acc, v| acc.saturating_add(v))
    }
}

/// Record identity block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    /// Random unique record identifier, generated at normalization time
    pub rid: String,
    /// Derived record name: date string followed by the vendor name
    pub rname: String,
    /// Date string built from the provider's year, month and day
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
}

/// Vendor (store) information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mart {
    #[serde(rename = "martName")]
    pub name: String,
    #[serde(rename = "martAddress")]
    pub address: String,
    pub tel: String,
}

/// One purchased line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub pname: String,
    /// Unit price in integer currency units
    pub price: i64,
    /// Quantity
    pub amount: i64,
}

/// (owning user, derived record name) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub uid: String,
    pub rname: String,
}

impl std::fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.uid, self.rname)
    }
}
