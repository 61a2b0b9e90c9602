//! Send a single command to a network device.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example send_command -- \
//!     --host 192.168.1.1 --user admin --password secret \
//!     --device-type cisco_ios --command "show version"
//! ```
//!
//! Set `RUST_LOG=debug` (and `SSH_DEBUG=true`) for verbose output.

use std::env;

use netshell::{AdvancedOptions, Credentials, DeviceRequest, Operation, execute};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let request = DeviceRequest {
        credentials: Credentials::password_login(
            &args.host,
            &args.user,
            &args.password,
            &args.device_type,
        ),
        advanced_options: AdvancedOptions::default(),
        operation: Operation::SendCommand {
            command: args.command.clone(),
        },
    };

    println!("{} @ {}: {}", args.device_type, args.host, args.command);
    println!("{}", "-".repeat(50));

    let result = execute(request).await?;

    if result.success {
        println!("{}", result.output);
    } else {
        eprintln!("command failed: {:?}", result.error);
    }

    println!("{}", "-".repeat(50));
    println!("completed in {} ms", result.execution_time_millis);
    Ok(())
}

struct Args {
    host: String,
    user: String,
    password: String,
    device_type: String,
    command: String,
}

impl Args {
    fn parse() -> Self {
        let mut host = "localhost".to_string();
        let mut user = "admin".to_string();
        let mut password = String::new();
        let mut device_type = "generic".to_string();
        let mut command = "show version".to_string();

        let args: Vec<String> = env::args().collect();
        let mut i = 1;
        while i + 1 < args.len() {
            match args[i].as_str() {
                "--host" => host = args[i + 1].clone(),
                "--user" => user = args[i + 1].clone(),
                "--password" => password = args[i + 1].clone(),
                "--device-type" => device_type = args[i + 1].clone(),
                "--command" => command = args[i + 1].clone(),
                other => eprintln!("unknown argument: {other}"),
            }
            i += 2;
        }

        Self {
            host,
            user,
            password,
            device_type,
            command,
        }
    }
}
