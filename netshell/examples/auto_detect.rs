//! Detect a device's type from its login banner, then run a command
//! with the detected vendor plugin.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example auto_detect -- --host 192.168.1.1 --user admin --password secret
//! ```

use std::env;

use netshell::{AdvancedOptions, Credentials, auto_detect};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let credentials =
        Credentials::password_login(&args.host, &args.user, &args.password, "autodetect");

    println!("probing {} ...", args.host);
    match auto_detect(&credentials, &AdvancedOptions::default()).await? {
        Some(device_type) => println!("detected device type: {device_type}"),
        None => println!("no known device type matched the banner"),
    }

    Ok(())
}

struct Args {
    host: String,
    user: String,
    password: String,
}

impl Args {
    fn parse() -> Self {
        let mut host = "localhost".to_string();
        let mut user = "admin".to_string();
        let mut password = String::new();

        let args: Vec<String> = env::args().collect();
        let mut i = 1;
        while i + 1 < args.len() {
            match args[i].as_str() {
                "--host" => host = args[i + 1].clone(),
                "--user" => user = args[i + 1].clone(),
                "--password" => password = args[i + 1].clone(),
                other => eprintln!("unknown argument: {other}"),
            }
            i += 2;
        }

        Self {
            host,
            user,
            password,
        }
    }
}
