//! Result normalizer tests against a recorded provider response

use receipt_common::models::Product;
use receipt_ocr::services::{NormalizeError, NumberPolicy, ResultNormalizer};
use serde_json::Value;

const RECEIPT_RESPONSE: &str = include_str!("fixtures/receipt_response.json");

fn fixture() -> Value {
    serde_json::from_str(RECEIPT_RESPONSE).unwrap()
}

fn result_node(doc: &mut Value) -> &mut serde_json::Map<String, Value> {
    doc["images"][0]["receipt"]["result"].as_object_mut().unwrap()
}

#[test]
fn test_fixture_normalizes_to_record() {
    let record = ResultNormalizer::default().normalize("u-42", &fixture()).unwrap();

    assert_eq!(record.uid, "u-42");
    assert_eq!(record.total_price, 15000);
    assert_eq!(record.record.time_stamp, "2024-03-1");
    assert_eq!(record.record.rname, "2024-03-1ACME Mart");
    assert!(!record.record.rid.is_empty());

    assert_eq!(record.mart.name, "ACME Mart");
    assert_eq!(record.mart.address, "12 Market Street, Seoul");
    assert_eq!(record.mart.tel, "02-555-0100");

    assert_eq!(
        record.product,
        vec![
            Product { pname: "Milk 1L".into(), price: 2500, amount: 2 },
            Product { pname: "Bread".into(), price: 3000, amount: 1 },
        ]
    );
}

#[test]
fn test_total_is_provider_total_not_item_sum() {
    let record = ResultNormalizer::default().normalize("u-42", &fixture()).unwrap();

    assert_eq!(record.line_item_sum(), 8000);
    assert_eq!(record.total_price, 15000);
}

#[test]
fn test_missing_total_price_names_path() {
    let mut doc = fixture();
    result_node(&mut doc).remove("totalPrice");

    let err = ResultNormalizer::default().normalize("u-42", &doc).unwrap_err();

    assert_eq!(
        err,
        NormalizeError::MalformedResponse {
            path: "images[0].receipt.result.totalPrice".to_string(),
            reason: "missing".to_string(),
        }
    );
}

#[test]
fn test_missing_nodes_along_path_are_fatal() {
    let cases = [
        ("paymentInfo", "images[0].receipt.result.paymentInfo"),
        ("storeInfo", "images[0].receipt.result.storeInfo"),
        ("subResults", "images[0].receipt.result.subResults"),
    ];

    for (node, expected_path) in cases {
        let mut doc = fixture();
        result_node(&mut doc).remove(node);

        let NormalizeError::MalformedResponse { path, .. } =
            ResultNormalizer::default().normalize("u-42", &doc).unwrap_err();
        assert_eq!(path, expected_path);
    }

    let err = ResultNormalizer::default()
        .normalize("u-42", &serde_json::json!({"images": "oops"}))
        .unwrap_err();
    let NormalizeError::MalformedResponse { path, reason } = err;
    assert_eq!(path, "images[0]");
    assert!(reason.contains("expected array"));
}

#[test]
fn test_unparsable_item_price_by_policy() {
    let mut doc = fixture();
    result_node(&mut doc)["subResults"][0]["items"][1]["price"]["price"]["formatted"]["value"] =
        Value::String("3,000".into());

    let lenient = ResultNormalizer::new(NumberPolicy::Lenient)
        .normalize("u-42", &doc)
        .unwrap();
    assert_eq!(lenient.product[1].price, 0);
    assert_eq!(lenient.total_price, 15000);

    let err = ResultNormalizer::new(NumberPolicy::Strict)
        .normalize("u-42", &doc)
        .unwrap_err();
    let NormalizeError::MalformedResponse { path, .. } = err;
    assert_eq!(
        path,
        "images[0].receipt.result.subResults[0].items[1].price.price.formatted.value"
    );
}
