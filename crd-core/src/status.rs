//! Service state as reported by the service manager, and the
//! three-valued status the popup menu displays.

use std::fmt;

// ── ServiceState ─────────────────────────────────────────────────

/// Raw run state of a service, one-to-one with the SCM states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    Stopped,
    StartPending,
    StopPending,
    Running,
    ContinuePending,
    PausePending,
    Paused,
}

impl ServiceState {
    /// Map a numeric SCM `dwCurrentState` value.
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Stopped),
            2 => Some(Self::StartPending),
            3 => Some(Self::StopPending),
            4 => Some(Self::Running),
            5 => Some(Self::ContinuePending),
            6 => Some(Self::PausePending),
            7 => Some(Self::Paused),
            _ => None,
        }
    }

    /// The state a toggle drives towards from here.
    pub fn toggle_target(self) -> Self {
        if self == Self::Running {
            Self::Stopped
        } else {
            Self::Running
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stopped => "stopped",
            Self::StartPending => "start pending",
            Self::StopPending => "stop pending",
            Self::Running => "running",
            Self::ContinuePending => "continue pending",
            Self::PausePending => "pause pending",
            Self::Paused => "paused",
        };
        f.write_str(s)
    }
}

// ── ServiceStatus ────────────────────────────────────────────────

/// What the popup shows. `Unknown` means the query itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceStatus {
    Running,
    Stopped,
    Unknown,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 3] = [Self::Running, Self::Stopped, Self::Unknown];

    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    /// Status line, e.g. `"CRD is enabled"`.
    pub fn headline(self, name: &str) -> String {
        if self.is_running() {
            format!("{name} is enabled")
        } else {
            format!("{name} is disabled")
        }
    }

    /// Colour of the status line.
    pub fn color(self) -> Rgb {
        if self.is_running() {
            Rgb::GREEN
        } else {
            Rgb::RED
        }
    }

    /// Label of the toggle button, naming the action it performs.
    pub fn toggle_label(self, name: &str) -> String {
        if self.is_running() {
            format!("Disable {name}")
        } else {
            format!("Enable {name}")
        }
    }
}

impl From<ServiceState> for ServiceStatus {
    fn from(state: ServiceState) -> Self {
        match state {
            ServiceState::Running => Self::Running,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        })
    }
}

// ── Rgb ──────────────────────────────────────────────────────────

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GREEN: Rgb = Rgb(0, 128, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const GRAY: Rgb = Rgb(128, 128, 128);
    pub const DIM_GRAY: Rgb = Rgb(105, 105, 105);
    pub const BACKGROUND: Rgb = Rgb(37, 37, 38);
    pub const HOVER: Rgb = Rgb(62, 62, 64);

    /// Pack as a GDI `COLORREF` (`0x00BBGGRR`).
    pub fn to_colorref(self) -> u32 {
        u32::from(self.0) | (u32::from(self.1) << 8) | (u32::from(self.2) << 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_maps_to_label_and_color() {
        for status in ServiceStatus::ALL {
            let headline = status.headline("CRD");
            if status == ServiceStatus::Running {
                assert_eq!(headline, "CRD is enabled");
                assert_eq!(status.color(), Rgb::GREEN);
                assert_eq!(status.toggle_label("CRD"), "Disable CRD");
            } else {
                assert_eq!(headline, "CRD is disabled");
                assert_eq!(status.color(), Rgb::RED);
                assert_eq!(status.toggle_label("CRD"), "Enable CRD");
            }
        }
    }

    #[test]
    fn only_running_state_displays_as_running() {
        assert_eq!(ServiceStatus::from(ServiceState::Running), ServiceStatus::Running);
        for state in [
            ServiceState::Stopped,
            ServiceState::StartPending,
            ServiceState::StopPending,
            ServiceState::Paused,
        ] {
            assert_eq!(ServiceStatus::from(state), ServiceStatus::Stopped);
        }
    }

    #[test]
    fn raw_states() {
        assert_eq!(ServiceState::from_raw(1), Some(ServiceState::Stopped));
        assert_eq!(ServiceState::from_raw(4), Some(ServiceState::Running));
        assert_eq!(ServiceState::from_raw(0), None);
        assert_eq!(ServiceState::from_raw(8), None);
    }

    #[test]
    fn toggle_target_flips_running_only() {
        assert_eq!(ServiceState::Running.toggle_target(), ServiceState::Stopped);
        assert_eq!(ServiceState::Stopped.toggle_target(), ServiceState::Running);
        assert_eq!(ServiceState::Paused.toggle_target(), ServiceState::Running);
    }

    #[test]
    fn colorref_is_bgr() {
        assert_eq!(Rgb(0x11, 0x22, 0x33).to_colorref(), 0x0033_2211);
    }
}
