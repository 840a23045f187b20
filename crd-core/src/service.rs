//! Service control seam and the toggle algorithm.
//!
//! [`ServiceControl`] is implemented by the Windows SCM backend in
//! `crd-tray` and by simulated services in tests. Every call opens
//! and releases its own handle; nothing is held between calls.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::CrdError;
use crate::status::{ServiceState, ServiceStatus};

/// Default time a toggle waits for the service to settle.
pub const DEFAULT_TOGGLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default delay between status polls while waiting.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Query and command a single named service.
#[async_trait]
pub trait ServiceControl: Send + Sync {
    /// Service name as registered with the service manager.
    fn name(&self) -> &str;

    /// Current run state.
    async fn query(&self) -> Result<ServiceState, CrdError>;

    /// Request the service to start. Returns once the request is accepted.
    async fn start(&self) -> Result<(), CrdError>;

    /// Request the service to stop. Returns once the request is accepted.
    async fn stop(&self) -> Result<(), CrdError>;
}

/// Timing for a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleTiming {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ToggleTiming {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TOGGLE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Query the display status. Query failures become [`ServiceStatus::Unknown`].
pub async fn query_status<S: ServiceControl + ?Sized>(service: &S) -> ServiceStatus {
    match service.query().await {
        Ok(state) => state.into(),
        Err(e) => {
            warn!(service = service.name(), "status query failed: {e}");
            ServiceStatus::Unknown
        }
    }
}

/// Stop the service if it is running, otherwise start it, then wait for
/// the opposite state. Returns the state that was reached.
pub async fn toggle_service<S: ServiceControl + ?Sized>(
    service: &S,
    timing: ToggleTiming,
) -> Result<ServiceState, CrdError> {
    let current = service.query().await?;
    let target = current.toggle_target();

    if current == ServiceState::Running {
        info!(service = service.name(), "stopping service");
        service.stop().await?;
    } else {
        info!(service = service.name(), %current, "starting service");
        service.start().await?;
    }

    wait_for_state(service, target, timing).await?;
    info!(service = service.name(), %target, "service settled");
    Ok(target)
}

/// Poll until `target` is observed or `timing.timeout` elapses.
///
/// Query errors while waiting end the wait immediately.
pub async fn wait_for_state<S: ServiceControl + ?Sized>(
    service: &S,
    target: ServiceState,
    timing: ToggleTiming,
) -> Result<(), CrdError> {
    let poll = async {
        loop {
            let state = service.query().await?;
            debug!(service = service.name(), %state, %target, "waiting for state");
            if state == target {
                return Ok::<(), CrdError>(());
            }
            tokio::time::sleep(timing.poll_interval).await;
        }
    };

    match tokio::time::timeout(timing.timeout, poll).await {
        Ok(result) => result,
        Err(_) => Err(CrdError::Timeout {
            target,
            after: timing.timeout,
        }),
    }
}
