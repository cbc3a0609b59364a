use std::collections::HashMap;

use notification_service::{models::event::EventMessage, render::render};

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Test: placeholders are replaced by literal substitution
#[test]
fn test_placeholders_are_substituted() {
    let rendered = render("Welcome {{name}}", &vars(&[("name", "A")]));
    assert_eq!(rendered, "Welcome A");

    let rendered = render("Code: {{otp}}", &vars(&[("otp", "123456"), ("name", "A")]));
    assert_eq!(rendered, "Code: 123456");
}

/// Test: the same placeholder can appear more than once
#[test]
fn test_repeated_placeholder() {
    let rendered = render("{{name}} and {{name}}", &vars(&[("name", "Ada")]));
    assert_eq!(rendered, "Ada and Ada");
}

/// Test: unknown placeholders are left in place, rendering never fails
#[test]
fn test_unknown_placeholder_left_verbatim() {
    let rendered = render("Hi {{name}}, code {{otp}}", &vars(&[("name", "A")]));
    assert_eq!(rendered, "Hi A, code {{otp}}");
}

/// Test: no escaping, values are inserted as-is
#[test]
fn test_values_inserted_literally() {
    let rendered = render("{{x}}", &vars(&[("x", "<b>{{y}}</b>")]));
    assert_eq!(rendered, "<b>{{y}}</b>");
}

/// Test: event fields become substitution variables, scalars coerced
#[test]
fn test_event_variables_coercion() {
    let event: EventMessage = serde_json::from_value(serde_json::json!({
        "email": "a@x.com",
        "event_type": "user.register",
        "name": "A",
        "attempts": 3,
        "verified": true,
        "middle_name": null
    }))
    .unwrap();

    let vars = event.variables();

    assert_eq!(vars.get("email").map(String::as_str), Some("a@x.com"));
    assert_eq!(vars.get("name").map(String::as_str), Some("A"));
    assert_eq!(vars.get("attempts").map(String::as_str), Some("3"));
    assert_eq!(vars.get("verified").map(String::as_str), Some("true"));
    assert_eq!(vars.get("middle_name").map(String::as_str), Some(""));
}

/// Test: required event fields are enforced at decode time
#[test]
fn test_event_decode_requires_email_and_event_type() {
    let missing_event_type: Result<EventMessage, _> =
        serde_json::from_value(serde_json::json!({ "email": "a@x.com" }));
    assert!(missing_event_type.is_err());

    let missing_email: Result<EventMessage, _> =
        serde_json::from_value(serde_json::json!({ "event_type": "user.register" }));
    assert!(missing_email.is_err());
}
