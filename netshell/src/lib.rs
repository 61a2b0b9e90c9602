//! # Netshell
//!
//! Async multi-vendor SSH automation engine for network devices.
//!
//! Netshell drives interactive CLI sessions over SSH against routers,
//! switches, firewalls, wireless controllers, and Linux hosts, exposing a
//! uniform operation surface (send a command, apply configuration, fetch
//! and persist configuration, reboot) while absorbing each platform's
//! dialect: privilege escalation, config-mode rituals, pagination,
//! terminal width, prompt detection, and confirmation dialogs.
//!
//! ## Features
//!
//! - Async SSH via russh with a three-tier algorithm fallback for legacy gear
//! - Prompt learning and tail-bounded prompt detection over the shell stream
//! - ~18 vendor plugins overriding only their dialect deltas
//! - Jump-host (bastion) tunneling over `direct-tcpip`
//! - Process-wide connection pool with idle reaping
//! - Device-type auto-detection from login banners
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netshell::{Credentials, DeviceRequest, Operation, execute};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netshell::Error> {
//!     let request = DeviceRequest {
//!         credentials: Credentials::password_login(
//!             "192.168.1.1",
//!             "admin",
//!             "secret",
//!             "cisco_ios",
//!         ),
//!         advanced_options: Default::default(),
//!         operation: Operation::SendCommand {
//!             command: "show version".to_string(),
//!         },
//!     };
//!
//!     let result = execute(request).await?;
//!     println!("{}", result.output);
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod credentials;
pub mod detect;
pub mod dispatch;
pub mod error;
pub mod jump_host;
pub mod options;
pub mod pool;
pub mod request;
pub mod result;
pub mod sanitize;
pub mod session;
pub mod transport;
pub mod vendors;

// Re-export main types for convenience
pub use credentials::{AuthMethod, Credentials, JumpHost};
pub use detect::{auto_detect, classify_banner};
pub use dispatch::create_session;
pub use error::Error;
pub use jump_host::{JumpHostSession, JumpLink};
pub use options::AdvancedOptions;
pub use pool::{ConnectionPool, PoolKey};
pub use request::{DeviceRequest, Operation, execute, execute_with_cancel};
pub use result::CommandResult;
pub use session::{DeviceSession, SessionCore};
