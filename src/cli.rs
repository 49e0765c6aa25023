use std::io::{self, Write};

use clap::Parser;
use glowlens::model::Photo;
use glowlens::parser::{self, Command};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Interactive client for the GlowLens gallery API", long_about = None)]
struct Args {
    #[clap(long, env = "GALLERY_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,
}

struct Session {
    client: Client,
    base: String,
}

fn main() {
    let args = Args::parse();
    print_banner();

    let session = Session {
        client: Client::new(),
        base: args.server.trim_end_matches('/').to_string(),
    };

    match session.client.get(session.url("/api/photos")).send() {
        Ok(_) => println!("[\u{2713}] Connected to GlowLens at {}!", session.base),
        Err(_) => {
            println!("[\u{2717}] Could not connect to server at {}.", session.base);
            println!("    Make sure to run 'cargo run --bin glowlens' in another terminal.");
            return;
        }
    }
    println!("Type 'HELP' for supported commands or 'EXIT' to quit.\n");

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("glowlens> ");
        if io::stdout().flush().is_err() { break; }
        buffer.clear();

        match stdin.read_line(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if buffer.trim().is_empty() { continue; }

        match parser::parse_command(&buffer) {
            Ok(Command::Exit) => break,
            Ok(cmd) => {
                if let Err(e) = session.execute(cmd) {
                    println!("[\u{26a0}\u{fe0f} Error] {}", e);
                }
            }
            Err(e) => {
                println!("[\u{2717} Syntax Error] {}", e);
                if buffer.trim_start().to_uppercase().starts_with("ADD") {
                    println!("    \u{2139}\u{fe0f}  Hint: ADD \"https://...\" \"Title\" \"2024-07-01\" [DESCRIPTION \"...\"] [LOCATION \"...\"]");
                }
            }
        }
    }
}

fn print_banner() {
    println!("\n==================================================");
    println!("   GlowLens CLI - Our Photo Gallery");
    println!("==================================================\n");
}

fn print_help() {
    println!("\n--- Available Commands ---");
    println!("1. LIST:   LIST");
    println!("2. GET:    GET 'uuid'");
    println!("3. ADD:    ADD \"url\" \"title\" \"date\" [DESCRIPTION \"text\"] [LOCATION \"text\"]");
    println!("4. DELETE: DELETE 'uuid'");
    println!("5. EXIT:   Quit\n");
}

impl Session {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn execute(&self, cmd: Command) -> Result<(), String> {
        match cmd {
            Command::Help => { print_help(); Ok(()) },
            Command::List => self.perform_list(),
            Command::Get { id } => self.perform_get(id),
            Command::Add { url, title, date, description, location } => {
                let body = json!({
                    "url": url,
                    "title": title,
                    "date": date,
                    "description": description,
                    "location": location,
                });
                self.perform_add(&body)
            },
            Command::Delete { id } => self.perform_delete(id),
            Command::Exit => Ok(()),
        }
    }

    // --- NETWORK HANDLERS ---

    fn perform_list(&self) -> Result<(), String> {
        let resp = self.client.get(self.url("/api/photos")).send().map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(error_message(resp));
        }
        let photos: Vec<Photo> = resp.json().map_err(|e| e.to_string())?;

        println!("\n{} photo(s):", photos.len());
        for photo in &photos {
            println!("  \u{2022} {} | {} | {}", photo.id, photo.date, photo.title);
        }
        println!();
        Ok(())
    }

    fn perform_get(&self, id: Uuid) -> Result<(), String> {
        let resp = self.client.get(self.url(&format!("/api/photos/{}", id))).send().map_err(|e| e.to_string())?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                println!("[\u{2717}] ID Not Found.");
                Ok(())
            }
            status if status.is_success() => {
                let photo: Photo = resp.json().map_err(|e| e.to_string())?;
                print_photo(&photo);
                Ok(())
            }
            _ => Err(error_message(resp)),
        }
    }

    fn perform_add(&self, body: &Value) -> Result<(), String> {
        let resp = self.client.post(self.url("/api/photos")).json(body).send().map_err(|e| e.to_string())?;

        match resp.status() {
            StatusCode::CREATED => {
                let photo: Photo = resp.json().map_err(|e| e.to_string())?;
                println!("[\u{2713} OK] Added ID: {}", photo.id);
                Ok(())
            }
            StatusCode::BAD_REQUEST => {
                let err: Value = resp.json().map_err(|e| e.to_string())?;
                println!("[\u{2717}] {}", err["message"].as_str().unwrap_or("Rejected"));
                for field in err["errors"].as_array().into_iter().flatten() {
                    let path: Vec<&str> = field["path"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(Value::as_str)
                    .collect();
                    let path = if path.is_empty() { "body".to_string() } else { path.join(".") };
                    println!("    - {}: {}", path, field["message"].as_str().unwrap_or(""));
                }
                Ok(())
            }
            _ => Err(error_message(resp)),
        }
    }

    fn perform_delete(&self, id: Uuid) -> Result<(), String> {
        let resp = self.client.delete(self.url(&format!("/api/photos/{}", id))).send().map_err(|e| e.to_string())?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                println!("[\u{2717}] ID Not Found.");
                Ok(())
            }
            status if status.is_success() => {
                println!("[\u{2713} OK] Deleted ID: {}", id);
                Ok(())
            }
            _ => Err(error_message(resp)),
        }
    }
}

fn print_photo(photo: &Photo) {
    println!("\n{}", photo.title);
    println!("  ID:          {}", photo.id);
    println!("  URL:         {}", photo.url);
    println!("  Date:        {}", photo.date);
    if let Some(location) = &photo.location {
        println!("  Location:    {}", location);
    }
    if let Some(description) = &photo.description {
        println!("  Description: {}", description);
    }
    println!("  Added:       {}\n", photo.created_at.to_rfc3339());
}

fn error_message(resp: reqwest::blocking::Response) -> String {
    let status = resp.status();
    match resp.json::<Value>() {
        Ok(body) => match body["message"].as_str() {
            Some(message) => format!("{} ({})", message, status),
            None => format!("Server returned {}", status),
        },
        Err(_) => format!("Server returned {}", status),
    }
}
