//! Generate form links for manual testing.
//!
//! ```text
//! sal-token                       # built-in sample meeting
//! sal-token meeting.json          # any JSON object
//! echo '{"meetingId":"m1"}' | sal-token -
//! ```

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use serde_json::{Value, json};

#[derive(Parser)]
#[command(name = "sal-token", about = "Encode a JSON object as a SAL form link")]
struct Args {
    /// JSON file to encode, or `-` for stdin. Defaults to a sample meeting.
    input: Option<PathBuf>,

    /// Where the form is served.
    #[arg(long, default_value = "http://localhost:3000")]
    base_url: String,

    /// Only print the token.
    #[arg(long)]
    token_only: bool,
}

fn sample() -> Value {
    json!({
        "meetingId": "meeting_123",
        "aeName": "Sarah Johnson",
        "aeEmail": "sarah.johnson@example.com",
        "sdrName": "Mike Davis",
        "sdrOwnerId": "67890",
        "meetingDate": chrono::Utc::now().format("%Y-%m-%d").to_string(),
        "companyName": "Acme Corporation",
        "companySize": "50-200",
        "industry": "Technology",
        "source": "Organic Search",
        "contacts": [
            {
                "contactId": "12345",
                "contactName": "John Smith",
                "contactEmail": "john.smith@example.com"
            }
        ]
    })
}

fn read_input(input: Option<&PathBuf>) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = match input {
        None => return Ok(sample()),
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };

    let value: Value = serde_json::from_str(&raw)?;
    if !value.is_object() {
        return Err("input must be a JSON object".into());
    }
    Ok(value)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let data = read_input(args.input.as_ref())?;
    let token = salwatch::token::encode(&data);

    if args.token_only {
        println!("{token}");
        return Ok(());
    }

    let url = format!("{}/?token={token}", args.base_url.trim_end_matches('/'));
    println!("Data:\n{}\n", serde_json::to_string_pretty(&data)?);
    println!("Token:\n{token}\n");
    println!("URL:\n{url}");
    Ok(())
}
