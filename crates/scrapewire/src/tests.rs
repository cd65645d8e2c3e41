use proptest::prelude::*;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use url::Url;

use crate::*;
use crate::request::param_text;

fn endpoint() -> Url {
    Url::parse("https://script.google.com/macros/s/AKfy/exec").unwrap()
}

fn scrape_request() -> CallRequest {
    CallRequest::new("scrapeAndSave")
        .arg("url", "https://a.com")
        .arg("options", json!({ "extractTitle": true, "extractLinks": false }))
}

// ============================================================================
//  REQUEST ENCODING
// ============================================================================

#[test]
fn test_query_url_reads_back() {
    let url = scrape_request().to_query_url(&endpoint(), 1700000000123);
    let call = ReceivedCall::from_url(&url).unwrap();

    assert_eq!(call.function, "scrapeAndSave");
    assert_eq!(call.nonce, Some(1700000000123));
    assert_eq!(call.callback, None);
    assert_eq!(call.args.get("url"), Some(&json!("https://a.com")));
    assert_eq!(
        call.structured_arg("options").unwrap(),
        json!({ "extractTitle": true, "extractLinks": false })
    );
}

#[test]
fn test_callback_url_carries_callback_name() {
    let url = scrape_request().to_callback_url(&endpoint(), "scrape_cb_3", 9);
    let call = ReceivedCall::from_url(&url).unwrap();

    assert_eq!(call.callback.as_deref(), Some("scrape_cb_3"));
    assert_eq!(call.nonce, Some(9));
    assert_eq!(call.args.len(), 2);
}

#[test]
fn test_existing_params_are_set_not_appended() {
    let endpoint = Url::parse("https://x.test/exec?function=old&keep=1").unwrap();
    let url = CallRequest::new("new").to_query_url(&endpoint, 1);
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

    assert_eq!(
        pairs,
        vec![
            ("function".to_string(), "new".to_string()),
            ("keep".to_string(), "1".to_string()),
            ("_t".to_string(), "1".to_string()),
        ]
    );
}

#[test]
fn test_param_text() {
    assert_eq!(param_text(&json!("plain text")), "plain text");
    assert_eq!(param_text(&json!(5)), "5");
    assert_eq!(param_text(&json!(1.0)), "1");
    assert_eq!(param_text(&json!(-0.0)), "0");
    assert_eq!(param_text(&json!(2.5)), "2.5");
    assert_eq!(param_text(&json!(-3e3)), "-3000");
    assert_eq!(param_text(&json!(true)), "true");
    assert_eq!(param_text(&Value::Null), "null");
    assert_eq!(param_text(&json!([1, 2])), "[1,2]");
}

#[test]
fn test_body_mode() {
    let request = scrape_request();
    let body = request.to_body();

    assert_eq!(body["function"], json!("scrapeAndSave"));
    assert_eq!(body["data"]["url"], json!("https://a.com"));

    let bytes = serde_json::to_vec(&body).unwrap();
    let call = ReceivedCall::from_body(&bytes).unwrap();
    assert_eq!(call.function, "scrapeAndSave");
    assert_eq!(call.args, request.payload);
}

#[test]
fn test_received_call_requires_function() {
    let url = Url::parse("https://x.test/exec?url=a").unwrap();
    assert_eq!(ReceivedCall::from_url(&url), Err(WireError::MissingFunction));
    assert_eq!(ReceivedCall::from_body(b"{\"data\":{}}"), Err(WireError::MissingFunction));
    assert_eq!(ReceivedCall::from_body(b"[]"), Err(WireError::NotAnObject));
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        "\\PC*".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

fn payload_key() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}".prop_filter("reserved", |k| k != "function" && k != "callback")
}

proptest! {
    #[test]
    fn prop_scalar_payload_reads_back(
        entries in prop::collection::btree_map(payload_key(), scalar(), 0..6),
    ) {
        let payload: Map<String, Value> = entries.into_iter().collect();
        let request = CallRequest::with_payload("fn", payload.clone());
        let call = ReceivedCall::from_url(&request.to_query_url(&endpoint(), 1)).unwrap();

        let expected: Map<String, Value> = payload
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(param_text(v))))
            .collect();
        prop_assert_eq!(call.args, expected);
    }

    #[test]
    fn prop_structured_value_survives(
        inner in prop::collection::btree_map("[a-z]{1,6}", scalar(), 0..5),
    ) {
        let object = Value::Object(inner.into_iter().collect());
        let request = CallRequest::new("fn").arg("options", object.clone());
        let call = ReceivedCall::from_url(&request.to_query_url(&endpoint(), 1)).unwrap();

        prop_assert_eq!(call.structured_arg("options").unwrap(), object);
    }
}

// ============================================================================
//  RESPONSE ENVELOPE
// ============================================================================

#[test]
fn test_success_envelope() {
    let body = br#"{
        "success": true,
        "data": { "url": "https://a.com", "statusCode": 200, "title": "A", "textPreview": "..." },
        "timestamp": 1690000000000
    }"#;
    let reply = Envelope::from_slice(body).unwrap().into_reply().unwrap();

    assert_eq!(reply.timestamp, Some(Timestamp::Millis(1690000000000)));
    let data = reply.scrape_data().unwrap();
    assert_eq!(data.url, "https://a.com");
    assert_eq!(data.status_code, 200);
    assert_eq!(data.title.as_deref(), Some("A"));
    assert_eq!(data.meta_description, None);
    assert!(data.links.is_empty());
}

#[test]
fn test_error_envelope() {
    let envelope = Envelope::from_slice(br#"{"success":false,"error":"invalid url"}"#).unwrap();
    assert_eq!(envelope.into_reply(), Err("invalid url".to_string()));

    let envelope = Envelope::from_slice(br#"{"success":false}"#).unwrap();
    assert_eq!(envelope.into_reply(), Err(response::UNSPECIFIED_FAILURE.to_string()));
}

#[test]
fn test_missing_success_flag_is_a_failure() {
    for body in [
        r#"{}"#,
        r#"{"data":{"html":"<gateway page>"}}"#,
        r#"{"success":null,"data":{"ok":1}}"#,
    ] {
        let envelope = Envelope::from_slice(body.as_bytes()).unwrap();
        assert_eq!(
            envelope.into_reply(),
            Err(response::UNSPECIFIED_FAILURE.to_string()),
            "{}",
            body
        );
    }
}

#[test]
fn test_falsy_error_is_not_an_error() {
    for body in [
        r#"{"success":true,"error":""}"#,
        r#"{"success":true,"error":null}"#,
        r#"{"success":true,"error":false}"#,
    ] {
        let envelope = Envelope::from_slice(body.as_bytes()).unwrap();
        assert!(envelope.into_reply().is_ok(), "{}", body);
    }
}

#[test]
fn test_error_without_success_flag() {
    let envelope = Envelope::from_slice(br#"{"error":{"code":7}}"#).unwrap();
    assert_eq!(envelope.into_reply(), Err(r#"{"code":7}"#.to_string()));
}

#[test]
fn test_malformed_bodies() {
    assert_eq!(Envelope::from_slice(b"[1,2]"), Err(WireError::NotAnObject));
    assert!(matches!(
        Envelope::from_slice(b"<!DOCTYPE html><html>"),
        Err(WireError::Json(_))
    ));
}

#[test]
fn test_timestamp_shapes() {
    assert_eq!(Timestamp::from_value(&json!(12)), Some(Timestamp::Millis(12)));
    assert_eq!(Timestamp::from_value(&json!(12.9)), Some(Timestamp::Millis(12)));
    assert_eq!(
        Timestamp::from_value(&json!("2024-01-01T00:00:00Z")),
        Some(Timestamp::Text("2024-01-01T00:00:00Z".into()))
    );
    assert_eq!(Timestamp::from_value(&json!("")), None);
    assert_eq!(Timestamp::from_value(&Value::Null), None);
}

#[test]
fn test_scrape_data_links() {
    let reply = Envelope::from_value(json!({
        "success": true,
        "data": {
            "url": "https://a.com",
            "statusCode": 200,
            "metaDescription": "about a",
            "textPreview": "hello",
            "links": [{ "text": "Home", "url": "/" }, { "url": "/about" }]
        }
    }))
    .unwrap()
    .into_reply()
    .unwrap();

    let data = reply.scrape_data().unwrap();
    assert_eq!(data.meta_description.as_deref(), Some("about a"));
    assert_eq!(data.links.len(), 2);
    assert_eq!(data.links[1], Link { text: None, url: "/about".into() });
}

// ============================================================================
//  CALLBACK SCRIPTS
// ============================================================================

#[test]
fn test_parse_script() {
    let call = script::parse("/**/ scrape_cb_1({\"success\":true,\"data\":{\"t\":\"(x)\"}});\n").unwrap();
    assert_eq!(call.callback, "scrape_cb_1");
    assert_eq!(call.payload, json!({ "success": true, "data": { "t": "(x)" } }));
}

#[test]
fn test_wrap_then_parse() {
    let payload = json!({ "success": false, "error": "nope" });
    let call = script::parse(&script::wrap("cb_0", &payload)).unwrap();
    assert_eq!(call, ScriptCall { callback: "cb_0".into(), payload });
}

#[test]
fn test_bad_scripts() {
    assert!(matches!(script::parse("cb_1{}"), Err(WireError::MalformedScript(_))));
    assert!(matches!(script::parse("cb_1({}"), Err(WireError::MalformedScript(_))));
    assert_eq!(
        script::parse("window.cb({})"),
        Err(WireError::InvalidCallbackName("window.cb".into()))
    );
    assert!(matches!(script::parse("cb_1(not json)"), Err(WireError::Json(_))));
}

#[test]
fn test_callback_names() {
    assert!(script::is_valid_name("scrape_cb_0"));
    assert!(script::is_valid_name("$jsonp"));
    assert!(!script::is_valid_name(""));
    assert!(!script::is_valid_name("0cb"));
    assert!(!script::is_valid_name("a-b"));
}
