//! callrelay-cli: operator tool for the call-event relay
//!
//! # Subcommands
//! - `normalize <file> [--location-id <id>]`: print the CRM contact a saved call event maps to (offline)
//! - `replay <file>`: POST a saved call event to the relay webhook
//! - `contacts [--json]`: list CRM contacts through the relay
//! - `board [--json]`: list merged board items through the relay
//! - `status`: show relay health

use std::path::Path;

use callrelay_core::normalize_call_event;
use clap::{Parser, Subcommand};
use serde_json::Value;

const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "callrelay-cli", version, about = "Inspect and replay call-event relay traffic")]
struct Cli {
    /// Relay base URL (overrides CALLRELAY_URL env var)
    #[arg(long, env = "CALLRELAY_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the contact record a saved call event normalizes to
    Normalize {
        /// Path to a call-event JSON file
        file: String,

        /// CRM location id to stamp on the record
        #[arg(long, env = "GHL_LOCATION_ID", default_value = "local")]
        location_id: String,
    },

    /// Send a saved call event to the relay webhook
    Replay {
        /// Path to a call-event JSON file
        file: String,
    },

    /// List CRM contacts through the relay
    Contacts {
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// List merged board items through the relay
    Board {
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show relay status
    Status,
}

// ============================================================================
// Formatting
// ============================================================================

fn read_payload(file: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", file.display(), e))?;
    let payload = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not valid JSON: {}", file.display(), e))?;
    Ok(payload)
}

/// One line per contact: id, name, phone.
fn contact_line(contact: &Value) -> String {
    let text = |key: &str| contact[key].as_str().unwrap_or("").to_string();
    let name = [text("firstName"), text("lastName")]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{:<24} {:<30} {}",
        text("id"),
        if name.is_empty() { "-".to_string() } else { name },
        text("phone")
    )
}

/// One line per board item: id, name, then non-empty column texts.
fn item_line(item: &Value) -> String {
    let columns: Vec<String> = item["column_values"]
        .as_array()
        .map(|cols| {
            cols.iter()
                .filter_map(|c| {
                    let text = c["text"].as_str().filter(|t| !t.is_empty())?;
                    Some(format!("{}={}", c["id"].as_str().unwrap_or("?"), text))
                })
                .collect()
        })
        .unwrap_or_default();

    // ids are passed through from the board API, string or number
    let id = match &item["id"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => "?".to_string(),
    };

    format!(
        "{:<14} {:<36} {}",
        id,
        item["name"].as_str().unwrap_or(""),
        columns.join(" ")
    )
}

// ============================================================================
// Commands
// ============================================================================

fn do_normalize(file: &str, location_id: &str) -> anyhow::Result<()> {
    let payload = read_payload(Path::new(file))?;
    let contact = normalize_call_event(&payload, location_id);
    println!("{}", serde_json::to_string_pretty(&contact)?);
    Ok(())
}

fn http_client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}

fn do_replay(server: &str, file: &str) -> anyhow::Result<()> {
    let payload = read_payload(Path::new(file))?;
    let url = format!("{}/webhook/vapi-call", server);

    let resp = match http_client()?.post(&url).json(&payload).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("callrelay-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let status = resp.status();
    let body = resp.text()?;
    println!("HTTP {}", status.as_u16());
    println!("{}", reply_text(&body));

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Pretty-print a JSON reply; anything else (proxy error pages, plain text)
/// is shown as received.
fn reply_text(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string()),
        Err(_) if body.is_empty() => "(empty body)".to_string(),
        Err(_) => body.to_string(),
    }
}

fn fetch(server: &str, endpoint: &str) -> anyhow::Result<Value> {
    let url = format!("{}{}", server, endpoint);
    let resp = match http_client()?.get(&url).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("callrelay-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("callrelay-cli: relay returned {}: {}", status, body);
        std::process::exit(1);
    }

    Ok(resp.json()?)
}

fn do_contacts(server: &str, json_output: bool) -> anyhow::Result<()> {
    let body = fetch(server, "/api/ghl/contacts")?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if let Some(note) = body["note"].as_str() {
        eprintln!("{}", note);
    }
    let contacts = body["contacts"].as_array().cloned().unwrap_or_default();
    for contact in &contacts {
        println!("{}", contact_line(contact));
    }
    eprintln!("{} contact(s)", contacts.len());
    Ok(())
}

fn do_board(server: &str, json_output: bool) -> anyhow::Result<()> {
    let body = fetch(server, "/api/monday")?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if let Some(note) = body["_note"].as_str() {
        eprintln!("{}", note);
    }
    let items = body
        .pointer("/data/boards/0/items_page/items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for item in &items {
        println!("{}", item_line(item));
    }
    eprintln!("{} item(s)", items.len());
    Ok(())
}

fn do_status(server: &str) -> anyhow::Result<()> {
    let body = fetch(server, "/health")?;
    let yes_no = |v: &Value| if v.as_bool().unwrap_or(false) { "configured" } else { "not configured" };
    println!("Relay:   {}", body["status"].as_str().unwrap_or("unknown"));
    println!("Version: {}", body["version"].as_str().unwrap_or("?"));
    println!("CRM:     {}", yes_no(&body["crm_configured"]));
    println!("Boards:  {}", yes_no(&body["board_configured"]));
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Normalize { file, location_id } => do_normalize(&file, &location_id),
        Commands::Replay { file } => do_replay(&server, &file),
        Commands::Contacts { json } => do_contacts(&server, json),
        Commands::Board { json } => do_board(&server, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("callrelay-cli: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contact_line_joins_name() {
        let line = contact_line(&json!({
            "id": "ct-1", "firstName": "Sam", "lastName": "Rivera", "phone": "+614"
        }));
        assert!(line.starts_with("ct-1"));
        assert!(line.contains("Sam Rivera"));
        assert!(line.ends_with("+614"));
    }

    #[test]
    fn test_contact_line_without_name() {
        let line = contact_line(&json!({"id": "ct-2"}));
        assert!(line.contains(" - "), "missing name shows a dash: {:?}", line);
    }

    #[test]
    fn test_item_line_skips_empty_columns() {
        let line = item_line(&json!({
            "id": "9001",
            "name": "Smith install",
            "column_values": [
                {"id": "status", "text": "Booked", "value": null},
                {"id": "notes", "text": "", "value": null},
                {"id": "owner", "text": null, "value": null}
            ]
        }));
        assert!(line.contains("status=Booked"));
        assert!(!line.contains("notes="));
        assert!(!line.contains("owner="));
    }

    #[test]
    fn test_item_line_numeric_id() {
        let line = item_line(&json!({"id": 9002, "name": null}));
        assert!(line.starts_with("9002 "), "got {:?}", line);
    }

    #[test]
    fn test_reply_text_pretty_prints_json() {
        let text = reply_text(r#"{"status":"logged","note":"CRM not configured"}"#);
        assert!(text.contains("\n  \"status\": \"logged\""), "got {:?}", text);
    }

    #[test]
    fn test_reply_text_keeps_non_json_body() {
        let html = "<html><body>502 Bad Gateway</body></html>";
        assert_eq!(reply_text(html), html);
        assert_eq!(reply_text("Unsupported Media Type"), "Unsupported Media Type");
        assert_eq!(reply_text(""), "(empty body)");
    }

    #[test]
    fn test_read_payload_missing_file() {
        let err = read_payload(Path::new("/nonexistent/call.json")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn test_read_payload_sample_call() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("samples/end-of-call-report.json");
        let payload = read_payload(&path).unwrap();
        let contact = normalize_call_event(&payload, "loc");
        assert_eq!(contact.first_name, "Jane");
        assert_eq!(contact.phone, "+15550100");
    }
}
