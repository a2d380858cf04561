//! Provider response normalization
//!
//! Converts one raw receipt document into a [`RecognitionRecord`]. The
//! document is walked along a fixed path:
//!
//! ```text
//! images[0].receipt.result
//!   paymentInfo.date.formatted.{year,month,day}
//!   storeInfo.name.formatted.value
//!   storeInfo.addresses[0].formatted.value
//!   storeInfo.tel[0].text
//!   subResults[0].items[*].{name.formatted.value, price.price.formatted.value, count.formatted.value}
//!   totalPrice.price.formatted.value
//! ```
//!
//! Any missing node is fatal. Amounts arrive as text; how unparsable text
//! is handled is governed by [`NumberPolicy`]. The stored total is the
//! provider's total and is never recomputed from the line items.

use receipt_common::models::{Mart, Product, RecordHeader};
use receipt_common::RecognitionRecord;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::schema_path::{PathError, SchemaPath};

/// Handling of amount text that is not a non-negative integer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberPolicy {
    /// Store zero and log a warning
    #[default]
    Lenient,
    /// Reject the whole response
    Strict,
}

impl NumberPolicy {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            NumberPolicy::Strict
        } else {
            NumberPolicy::Lenient
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("malformed provider response at {path}: {reason}")]
    MalformedResponse { path: String, reason: String },
}

impl From<PathError> for NormalizeError {
    fn from(e: PathError) -> Self {
        NormalizeError::MalformedResponse {
            path: e.path,
            reason: e.reason,
        }
    }
}

/// Builds recognition records from provider documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultNormalizer {
    policy: NumberPolicy,
}

impl ResultNormalizer {
    pub fn new(policy: NumberPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> NumberPolicy {
        self.policy
    }

    /// Normalize `document` into a record owned by `uid`
    ///
    /// The record ID is freshly generated; the record name is the literal
    /// `year-month-day` date followed by the vendor name.
    pub fn normalize(&self, uid: &str, document: &Value) -> Result<RecognitionRecord, NormalizeError> {
        let result = SchemaPath::root(document)
            .field("images")?
            .index(0)?
            .field("receipt")?
            .field("result")?;

        let date = result.field("paymentInfo")?.field("date")?.field("formatted")?;
        let time_stamp = format!(
            "{}-{}-{}",
            date.field("year")?.as_str()?,
            date.field("month")?.as_str()?,
            date.field("day")?.as_str()?
        );

        let store = result.field("storeInfo")?;
        let mart = Mart {
            name: store.field("name")?.formatted_value()?.to_string(),
            address: store.field("addresses")?.index(0)?.formatted_value()?.to_string(),
            tel: store.field("tel")?.index(0)?.field("text")?.as_str()?.to_string(),
        };

        let product = result
            .field("subResults")?
            .index(0)?
            .field("items")?
            .items()?
            .iter()
            .map(|item| self.product(item))
            .collect::<Result<Vec<_>, _>>()?;

        let total_price = self.amount(&result.field("totalPrice")?.field("price")?.formatted()?)?;

        let rname = format!("{}{}", time_stamp, mart.name);

        Ok(RecognitionRecord {
            uid: uid.to_string(),
            record: RecordHeader {
                rid: Uuid::new_v4().to_string(),
                rname,
                time_stamp,
            },
            mart,
            product,
            total_price,
        })
    }

    fn product(&self, item: &SchemaPath<'_>) -> Result<Product, NormalizeError> {
        Ok(Product {
            pname: item.field("name")?.formatted_value()?.to_string(),
            price: self.amount(&item.field("price")?.field("price")?.formatted()?)?,
            amount: self.amount(&item.field("count")?.formatted()?)?,
        })
    }

    fn amount(&self, node: &SchemaPath<'_>) -> Result<i64, NormalizeError> {
        let text = node.as_str()?;
        if let Some(value) = parse_amount(text) {
            return Ok(value);
        }

        match self.policy {
            NumberPolicy::Lenient => {
                warn!(path = node.path(), value = text, "Unparsable amount stored as 0");
                Ok(0)
            }
            NumberPolicy::Strict => Err(NormalizeError::MalformedResponse {
                path: node.path().to_string(),
                reason: format!("not a non-negative integer: {:?}", text),
            }),
        }
    }
}

fn parse_amount(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok().filter(|v| *v >= 0)
}
