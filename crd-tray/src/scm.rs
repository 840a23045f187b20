//! Windows Service Control Manager backend.
//!
//! Implements [`ServiceControl`] for one named service. Every call
//! opens the SCM and the service with the minimum access it needs,
//! performs one operation on the blocking pool, and closes both
//! handles again.

use async_trait::async_trait;

use crd_core::{CrdError, ServiceControl, ServiceState};

/// A named service reached through the SCM.
#[derive(Debug, Clone)]
pub struct ScmService {
    name: String,
}

impl ScmService {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use tracing::debug;
    use windows::Win32::Foundation::{
        ERROR_ACCESS_DENIED, ERROR_SERVICE_ALREADY_RUNNING, ERROR_SERVICE_DOES_NOT_EXIST,
        ERROR_SERVICE_NOT_ACTIVE, WIN32_ERROR,
    };
    use windows::Win32::System::Services::*;
    use windows::core::HSTRING;

    use crd_core::{CrdError, ServiceState};

    /// Closes an SCM handle on drop.
    struct ScHandle(SC_HANDLE);

    impl Drop for ScHandle {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseServiceHandle(self.0);
            }
        }
    }

    /// Service handle plus the manager handle it was opened from.
    /// Field order closes the service before the manager.
    struct OpenService {
        service: ScHandle,
        _manager: ScHandle,
    }

    fn is(e: &windows::core::Error, code: WIN32_ERROR) -> bool {
        e.code() == code.to_hresult()
    }

    fn classify(name: &str, e: windows::core::Error) -> CrdError {
        if is(&e, ERROR_SERVICE_DOES_NOT_EXIST) {
            CrdError::ServiceNotFound(name.to_string())
        } else if is(&e, ERROR_ACCESS_DENIED) {
            CrdError::AccessDenied(name.to_string())
        } else {
            CrdError::ServiceManager(format!("{name}: {}", e.message()))
        }
    }

    fn open(name: &str, access: u32) -> Result<OpenService, CrdError> {
        let manager = unsafe { OpenSCManagerW(None, None, SC_MANAGER_CONNECT) }
            .map(ScHandle)
            .map_err(|e| classify(name, e))?;

        let wide = HSTRING::from(name);
        let service = unsafe { OpenServiceW(manager.0, &wide, access) }
            .map(ScHandle)
            .map_err(|e| classify(name, e))?;

        Ok(OpenService {
            service,
            _manager: manager,
        })
    }

    pub(super) fn query(name: &str) -> Result<ServiceState, CrdError> {
        let handle = open(name, SERVICE_QUERY_STATUS)?;
        let mut status = SERVICE_STATUS::default();
        unsafe { QueryServiceStatus(handle.service.0, &mut status) }
            .map_err(|e| classify(name, e))?;

        let raw = status.dwCurrentState.0;
        ServiceState::from_raw(raw)
            .ok_or_else(|| CrdError::ServiceManager(format!("{name}: unknown state {raw}")))
    }

    pub(super) fn start(name: &str) -> Result<(), CrdError> {
        let handle = open(name, SERVICE_START)?;
        match unsafe { StartServiceW(handle.service.0, None) } {
            Ok(()) => Ok(()),
            Err(e) if is(&e, ERROR_SERVICE_ALREADY_RUNNING) => {
                debug!(service = name, "start requested but service already running");
                Ok(())
            }
            Err(e) => Err(classify(name, e)),
        }
    }

    pub(super) fn stop(name: &str) -> Result<(), CrdError> {
        let handle = open(name, SERVICE_STOP)?;
        let mut status = SERVICE_STATUS::default();
        match unsafe { ControlService(handle.service.0, SERVICE_CONTROL_STOP, &mut status) } {
            Ok(()) => Ok(()),
            Err(e) if is(&e, ERROR_SERVICE_NOT_ACTIVE) => {
                debug!(service = name, "stop requested but service not active");
                Ok(())
            }
            Err(e) => Err(classify(name, e)),
        }
    }
}

#[cfg(target_os = "windows")]
impl ScmService {
    async fn blocking<T, F>(&self, op: F) -> Result<T, CrdError>
    where
        T: Send + 'static,
        F: FnOnce(&str) -> Result<T, CrdError> + Send + 'static,
    {
        let name = self.name.clone();
        tokio::task::spawn_blocking(move || op(&name)).await?
    }
}

#[cfg(target_os = "windows")]
#[async_trait]
impl ServiceControl for ScmService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self) -> Result<ServiceState, CrdError> {
        self.blocking(platform::query).await
    }

    async fn start(&self) -> Result<(), CrdError> {
        self.blocking(platform::start).await
    }

    async fn stop(&self) -> Result<(), CrdError> {
        self.blocking(platform::stop).await
    }
}

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
#[async_trait]
impl ServiceControl for ScmService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self) -> Result<ServiceState, CrdError> {
        Err(CrdError::Unsupported)
    }

    async fn start(&self) -> Result<(), CrdError> {
        Err(CrdError::Unsupported)
    }

    async fn stop(&self) -> Result<(), CrdError> {
        Err(CrdError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_service_name() {
        let svc = ScmService::new("chromoting");
        assert_eq!(svc.name(), "chromoting");
    }

    #[cfg(not(target_os = "windows"))]
    #[tokio::test]
    async fn unsupported_off_windows() {
        let svc = ScmService::new("chromoting");
        assert!(matches!(svc.query().await, Err(CrdError::Unsupported)));
        assert_eq!(
            crd_core::query_status(&svc).await,
            crd_core::ServiceStatus::Unknown
        );
    }
}
