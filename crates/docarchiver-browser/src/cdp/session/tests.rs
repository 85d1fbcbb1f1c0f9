use serde_json::json;

use super::core::PageSession;
use crate::cdp::error::CdpError;

#[test]
fn test_evaluation_value() {
    let result = json!({"result": {"type": "object", "value": {"status": "ok"}}});
    let value = PageSession::evaluation_value(result).unwrap();
    assert_eq!(value["status"], "ok");
}

#[test]
fn test_evaluation_value_undefined() {
    let result = json!({"result": {"type": "undefined"}});
    assert!(PageSession::evaluation_value(result).unwrap().is_null());
}

#[test]
fn test_evaluation_exception_uses_description() {
    let result = json!({
        "result": {"type": "object", "subtype": "error"},
        "exceptionDetails": {
            "exceptionId": 1,
            "text": "Uncaught",
            "lineNumber": 0,
            "columnNumber": 12,
            "exception": {
                "type": "object",
                "subtype": "error",
                "description": "TypeError: Cannot read properties of null"
            }
        }
    });
    match PageSession::evaluation_value(result) {
        Err(CdpError::JavaScript(msg)) => assert!(msg.starts_with("TypeError")),
        other => panic!("unexpected: {:?}", other),
    }
}
