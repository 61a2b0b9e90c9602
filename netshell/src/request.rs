//! The request boundary for the workflow wrapper.
//!
//! A `DeviceRequest` carries credentials, advanced options, and one
//! operation; [`execute`] turns it into a `CommandResult`, handling
//! connection retries, command retries, the connection pool, and
//! cancellation. This is the only surface the wrapper calls.

use log::{debug, warn};
use serde::Deserialize;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::credentials::Credentials;
use crate::detect;
use crate::dispatch;
use crate::error::{Error, Result, SessionError, TransportError};
use crate::options::AdvancedOptions;
use crate::pool::{ConnectionPool, PoolKey};
use crate::result::CommandResult;
use crate::session::DeviceSession;

/// One operation against a device.
///
/// JSON shape: `{"sendCommand": {"command": "show version"}}`, or the
/// bare string `"saveConfig"` for payload-less operations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    SendCommand { command: String },
    SendConfig { commands: Vec<String> },
    GetCurrentConfig,
    SaveConfig,
    RebootDevice,
    AutoDetect,
    /// Vendor-specific command text from the wrapper; executes exactly
    /// like `sendCommand`.
    CustomVendorOp { command: String },
}

impl Operation {
    fn label(&self) -> String {
        match self {
            Operation::SendCommand { command } | Operation::CustomVendorOp { command } => {
                command.clone()
            }
            Operation::SendConfig { commands } => commands.join("; "),
            Operation::GetCurrentConfig => "getCurrentConfig".to_string(),
            Operation::SaveConfig => "saveConfig".to_string(),
            Operation::RebootDevice => "rebootDevice".to_string(),
            Operation::AutoDetect => "autoDetect".to_string(),
        }
    }
}

/// A structured request from the workflow wrapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub credentials: Credentials,

    #[serde(default)]
    pub advanced_options: AdvancedOptions,

    pub operation: Operation,
}

/// Execute a request to completion.
pub async fn execute(request: DeviceRequest) -> Result<CommandResult> {
    execute_with_cancel(request, None).await
}

/// Execute a request, aborting when `cancel` flips to `true`.
///
/// Cancellation drops the in-flight operation, closes the session's shell
/// (unblocking any pending read), marks the session unhealthy so the pool
/// never hands it out again, and surfaces `CanceledError`.
pub async fn execute_with_cancel(
    request: DeviceRequest,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<CommandResult> {
    let DeviceRequest {
        credentials,
        advanced_options: options,
        operation,
    } = request;

    if let Operation::AutoDetect = operation {
        let started = Instant::now();
        let detected = detect::auto_detect(&credentials, &options).await?;
        return Ok(CommandResult::ok(
            "autoDetect",
            detected.unwrap_or_default(),
            &credentials.device_type,
            &credentials.host,
        )
        .with_elapsed(started.elapsed()));
    }

    let pool = ConnectionPool::global();
    let key = PoolKey::from_credentials(&credentials);

    // Pooled reuse first, when asked for.
    if options.connection_pooling {
        if let Some(pooled) = pool.acquire(&key, options.reuse_connection)? {
            debug!("reusing pooled session for {}", pooled.key());
            let mut session = pooled.session().lock().await;
            let outcome =
                run_cancellable(session.as_mut(), &operation, &options, cancel.clone()).await;

            let keep = session.is_connected() && session.core().is_healthy();
            drop(session);
            drop(pooled);
            if !keep {
                pool.remove(&key);
            }
            return outcome;
        }
    }

    // Fresh session.
    let mut session = dispatch::create_session(credentials, options.clone())?;
    let connection_retries = connect_with_retries(session.as_mut(), &options).await?;

    let mut outcome = run_cancellable(session.as_mut(), &operation, &options, cancel).await;
    if let Ok(result) = outcome.as_mut() {
        if connection_retries > 0 {
            result.connection_retries = Some(connection_retries);
        }
    }

    let keep = options.connection_pooling
        && session.is_connected()
        && session.core().is_healthy()
        && !outcome.as_ref().is_err_and(|e| e.is_canceled());

    if keep {
        match pool.insert(key, session) {
            Ok(pooled) => drop(pooled),
            Err((e, mut session)) => {
                // A concurrent request already pooled this key.
                debug!("not pooling session: {}", e);
                let _ = session.disconnect().await;
            }
        }
    } else {
        let _ = session.disconnect().await;
    }

    outcome
}

/// Connect, retrying transient failures.
///
/// Authentication and algorithm exhaustion are permanent; everything else
/// is retried up to `connectionRetryCount` attempts with `retryDelay`
/// between them. Returns the number of retries that were needed.
async fn connect_with_retries(
    session: &mut dyn DeviceSession,
    options: &AdvancedOptions,
) -> Result<u32> {
    let attempts = options.connection_retry_count.max(1);
    let mut retries = 0u32;

    loop {
        match session.connect().await {
            Ok(()) => return Ok(retries),
            Err(e @ Error::Transport(TransportError::AuthOrAlgorithm { .. })) => return Err(e),
            Err(e) => {
                if retries + 1 >= attempts {
                    return Err(e);
                }
                retries += 1;
                warn!(
                    "connect attempt {}/{} failed: {}; retrying in {:?}",
                    retries,
                    attempts,
                    e,
                    options.retry_delay()
                );
                tokio::time::sleep(options.retry_delay()).await;
            }
        }
    }
}

/// Run the operation, racing it against the cancel signal.
async fn run_cancellable(
    session: &mut dyn DeviceSession,
    operation: &Operation,
    options: &AdvancedOptions,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<CommandResult> {
    let Some(mut cancel) = cancel else {
        return run_operation(session, operation, options).await;
    };

    if *cancel.borrow() {
        return Err(SessionError::Canceled.into());
    }

    let outcome = {
        let operation_future = run_operation(session, operation, options);
        tokio::pin!(operation_future);
        tokio::select! {
            result = &mut operation_future => Some(result),
            _ = wait_for_cancel(&mut cancel) => None,
        }
    };

    match outcome {
        Some(result) => result,
        None => {
            // The dropped operation future released the session borrow;
            // closing the shell unblocks nothing further and poisons the
            // session for the pool.
            session.core_mut().mark_unhealthy();
            let _ = session.disconnect().await;
            Err(SessionError::Canceled.into())
        }
    }
}

async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Sender gone without cancelling: never fires.
            std::future::pending::<()>().await;
        }
    }
}

/// Dispatch one operation, applying the command retry policy.
async fn run_operation(
    session: &mut dyn DeviceSession,
    operation: &Operation,
    options: &AdvancedOptions,
) -> Result<CommandResult> {
    match operation {
        Operation::SendCommand { command } | Operation::CustomVendorOp { command } => {
            let attempts = options.command_retry_count.max(1);
            let mut retries = 0u32;
            loop {
                let outcome = session.send_command(command).await;
                let retryable = match &outcome {
                    Ok(result) => !result.success,
                    Err(_) => true,
                };
                if !retryable || retries + 1 >= attempts {
                    return outcome.map(|mut result| {
                        if retries > 0 {
                            result.command_retries = Some(retries);
                        }
                        result
                    });
                }
                retries += 1;
                debug!(
                    "command {:?} failed, retry {}/{}",
                    operation.label(),
                    retries,
                    attempts
                );
                tokio::time::sleep(options.retry_delay()).await;
            }
        }
        // Re-applying configuration is not idempotent; no retries here.
        Operation::SendConfig { commands } => session.send_config(commands).await,
        Operation::GetCurrentConfig => session.get_current_config().await,
        Operation::SaveConfig => session.save_config().await,
        Operation::RebootDevice => session.reboot_device().await,
        Operation::AutoDetect => unreachable!("autoDetect is handled before dispatch"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_request() {
        let request: DeviceRequest = serde_json::from_str(
            r#"{
                "credentials": {
                    "host": "10.0.0.1",
                    "username": "admin",
                    "auth": {"password": "pw"},
                    "deviceType": "cisco_ios"
                },
                "advancedOptions": {"commandTimeout": 30},
                "operation": {"sendCommand": {"command": "show version"}}
            }"#,
        )
        .unwrap();
        assert_eq!(request.credentials.host, "10.0.0.1");
        assert_eq!(request.advanced_options.command_timeout, 30);
        assert!(matches!(
            request.operation,
            Operation::SendCommand { ref command } if command == "show version"
        ));
    }

    #[test]
    fn test_deserialize_payloadless_operation() {
        let request: DeviceRequest = serde_json::from_str(
            r#"{
                "credentials": {
                    "host": "h",
                    "username": "u",
                    "auth": {"password": "p"},
                    "deviceType": "huawei_vrp"
                },
                "operation": "saveConfig"
            }"#,
        )
        .unwrap();
        assert!(matches!(request.operation, Operation::SaveConfig));
        // Options fall back to defaults entirely when omitted.
        assert_eq!(request.advanced_options.command_timeout, 10);
    }

    #[test]
    fn test_custom_vendor_op_runs_as_send_command() {
        let request: DeviceRequest = serde_json::from_str(
            r#"{
                "credentials": {
                    "host": "h",
                    "username": "u",
                    "auth": {"password": "p"},
                    "deviceType": "paloalto_panos"
                },
                "operation": {"customVendorOp": {"command": "request support info"}}
            }"#,
        )
        .unwrap();
        match request.operation {
            Operation::CustomVendorOp { ref command } => {
                assert_eq!(command, "request support info");
            }
            other => panic!("expected customVendorOp, got {:?}", other),
        }
        assert_eq!(request.operation.label(), "request support info");
    }

    #[test]
    fn test_operation_labels() {
        assert_eq!(
            Operation::SendCommand {
                command: "show ip route".to_string()
            }
            .label(),
            "show ip route"
        );
        assert_eq!(Operation::RebootDevice.label(), "rebootDevice");
    }
}
