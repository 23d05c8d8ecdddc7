//! Contact normalizer: turns a voice-platform call event into a CRM contact.
//!
//! The platform nests its payload differently per event type: the event may
//! sit under `message`, and call details may sit under `message.call` or at
//! the message level itself. Every lookup here is a fixed-precedence list of
//! candidate paths; the first *present* value wins and a missing path falls
//! through to the next candidate or a default. Nothing in this module fails.

use serde_json::Value;

use crate::models::contact::{ContactRecord, CustomField};

pub const CONTACT_SOURCE: &str = "Vapi Voice Agent";
pub const ENQUIRY_SOURCE: &str = "VAPI Voice Agent";
pub const CONTACT_TAGS: [&str; 2] = ["vapi-call", "ai-captured"];
pub const DEFAULT_FIRST_NAME: &str = "Vapi";
pub const DEFAULT_LAST_NAME: &str = "Caller";
pub const DEFAULT_URGENCY: &str = "normal";

/// Transcript fallback for the summary field is cut to this many characters.
pub const TRANSCRIPT_EXCERPT_CHARS: usize = 500;

/// Build the contact-creation request for a call event.
pub fn normalize_call_event(payload: &Value, location_id: &str) -> ContactRecord {
    let message = first_present([payload.get("message")]).unwrap_or(payload);
    let call = first_present([message.get("call")]).unwrap_or(message);

    let transcript = text_of(first_present([
        message.get("transcript"),
        call.get("transcript"),
    ]));
    let summary = text_of(first_present([
        message.get("summary"),
        lookup(message, &["analysis", "summary"]),
    ]));
    let phone = text_of(first_present([
        lookup(call, &["customer", "number"]),
        call.get("phoneNumber"),
    ]));
    let structured = StructuredData(first_present([lookup(
        message,
        &["analysis", "structuredData"],
    )]));

    let name = text_of(structured.first_of(&["customer_name"]));
    let (first_name, last_name) = split_name(&name);

    let conversation_summary = if summary.is_empty() {
        transcript.chars().take(TRANSCRIPT_EXCERPT_CHARS).collect()
    } else {
        summary
    };

    let field_map: [(&str, String); 6] = [
        (
            "service_requested",
            text_of(structured.first_of(&["service_type", "service_requested"])),
        ),
        ("service_type", text_of(structured.first_of(&["job_category"]))),
        ("conversation_summary_contact", conversation_summary),
        ("enquiry_source", ENQUIRY_SOURCE.to_string()),
        (
            "urgency_contact",
            structured
                .first_of(&["urgency"])
                .map(display_value)
                .unwrap_or_else(|| DEFAULT_URGENCY.to_string()),
        ),
        ("quoted_price", text_of(structured.first_of(&["quoted_price"]))),
    ];

    let custom_fields = field_map
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| CustomField {
            key: key.to_string(),
            value,
        })
        .collect();

    ContactRecord {
        location_id: location_id.to_string(),
        phone,
        name,
        first_name,
        last_name,
        source: CONTACT_SOURCE.to_string(),
        tags: CONTACT_TAGS.iter().map(|t| t.to_string()).collect(),
        custom_fields,
    }
}

/// Whether a payload value counts as supplied: not null, not `false`, not an
/// empty string, not numeric zero. Containers always count, even when empty.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a payload value as the plain text the CRM stores.
///
/// Strings pass through unquoted; integral floats drop their `.0`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// The platform's extracted-entities object, possibly absent.
struct StructuredData<'a>(Option<&'a Value>);

impl<'a> StructuredData<'a> {
    fn first_of(&self, keys: &[&str]) -> Option<&'a Value> {
        let data = self.0?;
        first_present(keys.iter().map(|k| data.get(*k)))
    }
}

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |value, key| value.get(*key))
}

fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> Option<&'a Value> {
    candidates.into_iter().flatten().find(|v| is_present(v))
}

fn text_of(value: Option<&Value>) -> String {
    value.map(display_value).unwrap_or_default()
}

fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string());
    let rest = parts.collect::<Vec<_>>().join(" ");
    let last = if rest.is_empty() {
        DEFAULT_LAST_NAME.to_string()
    } else {
        rest
    };
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(contact: &ContactRecord) -> Vec<&str> {
        contact.custom_fields.iter().map(|f| f.key.as_str()).collect()
    }

    #[test]
    fn test_full_end_of_call_report() {
        let payload = json!({
            "message": {
                "type": "end-of-call-report",
                "transcript": "AI: Hello. User: My roof leaks.",
                "analysis": {
                    "summary": "Caller needs roof repair.",
                    "structuredData": {
                        "customer_name": "Jane Doe",
                        "service_type": "Roof repair",
                        "job_category": "Roofing",
                        "urgency": "high",
                        "quoted_price": 450
                    }
                },
                "call": { "customer": { "number": "+15550100" } }
            }
        });

        let contact = normalize_call_event(&payload, "loc-1");

        assert_eq!(contact.location_id, "loc-1");
        assert_eq!(contact.phone, "+15550100");
        assert_eq!(contact.name, "Jane Doe");
        assert_eq!(contact.first_name, "Jane");
        assert_eq!(contact.last_name, "Doe");
        assert_eq!(contact.source, "Vapi Voice Agent");
        assert_eq!(contact.tags, vec!["vapi-call", "ai-captured"]);
        assert_eq!(
            keys(&contact),
            vec![
                "service_requested",
                "service_type",
                "conversation_summary_contact",
                "enquiry_source",
                "urgency_contact",
                "quoted_price"
            ]
        );
        assert_eq!(contact.custom_field("service_requested"), Some("Roof repair"));
        assert_eq!(contact.custom_field("service_type"), Some("Roofing"));
        assert_eq!(
            contact.custom_field("conversation_summary_contact"),
            Some("Caller needs roof repair.")
        );
        assert_eq!(contact.custom_field("urgency_contact"), Some("high"));
        assert_eq!(contact.custom_field("quoted_price"), Some("450"));
    }

    #[test]
    fn test_empty_structured_data_uses_defaults() {
        let payload = json!({"message": {"analysis": {"structuredData": {}}}});
        let contact = normalize_call_event(&payload, "loc");

        assert_eq!(contact.first_name, "Vapi");
        assert_eq!(contact.last_name, "Caller");
        assert_eq!(contact.name, "");
        assert_eq!(keys(&contact), vec!["enquiry_source", "urgency_contact"]);
        assert_eq!(contact.custom_field("enquiry_source"), Some("VAPI Voice Agent"));
        assert_eq!(contact.custom_field("urgency_contact"), Some("normal"));
    }

    #[test]
    fn test_non_object_payload_does_not_panic() {
        for payload in [json!(null), json!("text"), json!([1, 2]), json!(7)] {
            let contact = normalize_call_event(&payload, "loc");
            assert!(!contact.first_name.is_empty());
            assert!(!contact.last_name.is_empty());
            assert_eq!(contact.phone, "");
        }
    }

    #[test]
    fn test_transcript_excerpt_is_first_500_chars() {
        let transcript: String = (0..800).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let payload = json!({"message": {"transcript": &transcript}});

        let contact = normalize_call_event(&payload, "loc");
        let excerpt = contact.custom_field("conversation_summary_contact").unwrap();
        assert_eq!(excerpt.chars().count(), 500);
        assert_eq!(excerpt, &transcript[..500]);
    }

    #[test]
    fn test_transcript_excerpt_counts_characters_not_bytes() {
        let transcript = "é".repeat(600);
        let payload = json!({"transcript": transcript});

        let contact = normalize_call_event(&payload, "loc");
        let excerpt = contact.custom_field("conversation_summary_contact").unwrap();
        assert_eq!(excerpt.chars().count(), 500);
    }

    #[test]
    fn test_summary_precedence() {
        let payload = json!({
            "message": {
                "summary": "top-level summary",
                "analysis": {"summary": "analysis summary"},
                "transcript": "transcript"
            }
        });
        let contact = normalize_call_event(&payload, "loc");
        assert_eq!(
            contact.custom_field("conversation_summary_contact"),
            Some("top-level summary")
        );

        let payload = json!({
            "message": {"analysis": {"summary": "analysis summary"}, "transcript": "t"}
        });
        let contact = normalize_call_event(&payload, "loc");
        assert_eq!(
            contact.custom_field("conversation_summary_contact"),
            Some("analysis summary")
        );
    }

    #[test]
    fn test_transcript_falls_back_to_call_level() {
        let payload = json!({"message": {"call": {"transcript": "from call"}}});
        let contact = normalize_call_event(&payload, "loc");
        assert_eq!(
            contact.custom_field("conversation_summary_contact"),
            Some("from call")
        );
    }

    #[test]
    fn test_unwrapped_payload_and_phone_number_fallback() {
        let payload = json!({
            "phoneNumber": "+15550199",
            "analysis": {"structuredData": {"customer_name": "Cher"}}
        });
        let contact = normalize_call_event(&payload, "loc");

        assert_eq!(contact.phone, "+15550199");
        assert_eq!(contact.first_name, "Cher");
        assert_eq!(contact.last_name, "Caller");
    }

    #[test]
    fn test_customer_number_beats_phone_number() {
        let payload = json!({
            "message": {
                "call": {"customer": {"number": "+1111"}, "phoneNumber": "+2222"}
            }
        });
        assert_eq!(normalize_call_event(&payload, "loc").phone, "+1111");
    }

    #[test]
    fn test_empty_message_wrapper_falls_back_to_payload() {
        let payload = json!({"message": "", "phoneNumber": "+3333"});
        assert_eq!(normalize_call_event(&payload, "loc").phone, "+3333");
    }

    #[test]
    fn test_multi_word_last_name_is_joined() {
        let payload = json!({
            "message": {"analysis": {"structuredData": {"customer_name": "  Ana  de la Cruz "}}}
        });
        let contact = normalize_call_event(&payload, "loc");
        assert_eq!(contact.first_name, "Ana");
        assert_eq!(contact.last_name, "de la Cruz");
    }

    #[test]
    fn test_service_requested_fallback_key() {
        let payload = json!({
            "message": {"analysis": {"structuredData": {
                "service_type": "",
                "service_requested": "Solar install"
            }}}
        });
        let contact = normalize_call_event(&payload, "loc");
        assert_eq!(contact.custom_field("service_requested"), Some("Solar install"));
        assert_eq!(contact.custom_field("service_type"), None);
    }

    #[test]
    fn test_falsy_values_emit_no_field() {
        let payload = json!({
            "message": {"analysis": {"structuredData": {
                "service_type": "",
                "job_category": null,
                "quoted_price": 0,
                "urgency": false
            }}}
        });
        let contact = normalize_call_event(&payload, "loc");
        assert_eq!(contact.custom_field("service_requested"), None);
        assert_eq!(contact.custom_field("service_type"), None);
        // a zero price is indistinguishable from "not quoted"
        assert_eq!(contact.custom_field("quoted_price"), None);
        assert_eq!(contact.custom_field("urgency_contact"), Some("normal"));
    }

    #[test]
    fn test_each_present_field_emitted_exactly_once() {
        let payload = json!({
            "message": {"analysis": {"structuredData": {
                "service_type": "HVAC",
                "job_category": "Heating",
                "quoted_price": 99.5
            }}}
        });
        let contact = normalize_call_event(&payload, "loc");
        for key in ["service_requested", "service_type", "quoted_price"] {
            let n = contact.custom_fields.iter().filter(|f| f.key == key).count();
            assert_eq!(n, 1, "{} should appear once", key);
        }
        assert_eq!(contact.custom_field("quoted_price"), Some("99.5"));
    }

    #[test]
    fn test_wire_shape_uses_field_value() {
        let contact = normalize_call_event(&json!({}), "loc");
        let v = serde_json::to_value(&contact).unwrap();
        assert_eq!(v["locationId"], "loc");
        assert_eq!(v["firstName"], "Vapi");
        assert_eq!(v["customFields"][0]["key"], "enquiry_source");
        assert_eq!(v["customFields"][0]["field_value"], "VAPI Voice Agent");
    }

    #[test]
    fn test_is_present_rules() {
        assert!(!is_present(&json!(null)));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!(0)));
        assert!(!is_present(&json!(0.0)));
        assert!(!is_present(&json!(false)));
        assert!(is_present(&json!("0")));
        assert!(is_present(&json!(-1)));
        assert!(is_present(&json!({})));
        assert!(is_present(&json!([])));
    }

    #[test]
    fn test_display_value_formats() {
        assert_eq!(display_value(&json!("abc")), "abc");
        assert_eq!(display_value(&json!(150)), "150");
        assert_eq!(display_value(&json!(150.0)), "150");
        assert_eq!(display_value(&json!(1.25)), "1.25");
        assert_eq!(display_value(&json!(true)), "true");
    }
}
