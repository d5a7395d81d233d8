//! Prints a bcrypt hash for ADMIN_PASSWORD_HASH.

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let password = match env::args().nth(1) {
        Some(p) if !p.is_empty() => p,
        _ => {
            eprintln!("Usage: hash-password <PASSWORD>");
            std::process::exit(1);
        }
    };

    let cost = env::var("BCRYPT_COST")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(DEFAULT_COST);

    match hash(&password, cost) {
        Ok(hashed) => {
            println!("# bcrypt cost {}; paste into .env", cost);
            println!("ADMIN_PASSWORD_HASH={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
