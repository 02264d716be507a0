//! Detection of environments where gamma changes may have no visible effect.

use std::env;
use std::fmt;
use std::fs;

const DMI_PRODUCT_NAME: &str = "/sys/class/dmi/id/product_name";

/// Product name fragments reported by common hypervisors, lowercase.
const VIRTUAL_PRODUCTS: &[(&str, &str)] = &[
    ("virtualbox", "VirtualBox"),
    ("vmware", "VMware"),
    ("qemu", "QEMU"),
    ("kvm", "KVM"),
    ("bochs", "Bochs"),
    ("virtual machine", "Hyper-V"),
    ("parallels", "Parallels"),
];

/// Why gamma adjustments might not show on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitedSupport {
    /// The session runs on Wayland, where `xgamma` only reaches XWayland.
    Wayland,
    /// Running inside a virtual machine whose display may ignore gamma ramps.
    VirtualMachine(&'static str),
}

impl fmt::Display for LimitedSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitedSupport::Wayland => {
                write!(f, "Wayland session detected: gamma changes may not be visible")
            }
            LimitedSupport::VirtualMachine(name) => write!(
                f,
                "{name} virtual machine detected: the virtual display may ignore gamma changes"
            ),
        }
    }
}

/// Facts about the running session used by [`classify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    /// Value of `XDG_SESSION_TYPE`.
    pub session_type: Option<String>,
    /// Whether `WAYLAND_DISPLAY` is set.
    pub wayland_display: bool,
    /// Whether `DISPLAY` is set.
    pub x_display: bool,
    /// DMI product name of the machine.
    pub product_name: Option<String>,
}

impl SessionInfo {
    /// Read the environment and DMI data of the current process.
    pub fn current() -> Self {
        Self {
            session_type: env::var("XDG_SESSION_TYPE").ok(),
            wayland_display: env::var_os("WAYLAND_DISPLAY").is_some(),
            x_display: env::var_os("DISPLAY").is_some(),
            product_name: fs::read_to_string(DMI_PRODUCT_NAME).ok(),
        }
    }
}

/// Check the current session for known gamma limitations.
///
/// Advisory only: nothing else in the crate depends on the result.
pub fn detect_limited_gamma_support() -> Option<LimitedSupport> {
    classify(&SessionInfo::current())
}

/// Decide whether `info` describes a limited environment.
pub fn classify(info: &SessionInfo) -> Option<LimitedSupport> {
    let wayland_session = info
        .session_type
        .as_deref()
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("wayland"));
    if wayland_session || (info.wayland_display && !info.x_display) {
        return Some(LimitedSupport::Wayland);
    }

    let product = info.product_name.as_deref()?.to_ascii_lowercase();
    VIRTUAL_PRODUCTS
        .iter()
        .find(|(needle, _)| product.contains(needle))
        .map(|&(_, name)| LimitedSupport::VirtualMachine(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x11_on(product: &str) -> SessionInfo {
        SessionInfo {
            session_type: Some("x11".to_string()),
            x_display: true,
            product_name: Some(format!("{product}\n")),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_x11_is_supported() {
        assert_eq!(classify(&x11_on("ThinkPad X1 Carbon")), None);
        assert_eq!(classify(&SessionInfo::default()), None);
    }

    #[test]
    fn test_wayland_session() {
        let info = SessionInfo {
            session_type: Some("Wayland".to_string()),
            x_display: true,
            ..Default::default()
        };
        assert_eq!(classify(&info), Some(LimitedSupport::Wayland));

        let info = SessionInfo {
            wayland_display: true,
            ..Default::default()
        };
        assert_eq!(classify(&info), Some(LimitedSupport::Wayland));
    }

    #[test]
    fn test_xwayland_with_x11_session_is_not_wayland() {
        let info = SessionInfo {
            session_type: Some("x11".to_string()),
            wayland_display: true,
            x_display: true,
            product_name: None,
        };
        assert_eq!(classify(&info), None);
    }

    #[test]
    fn test_virtual_machines() {
        assert_eq!(
            classify(&x11_on("VirtualBox")),
            Some(LimitedSupport::VirtualMachine("VirtualBox"))
        );
        assert_eq!(
            classify(&x11_on("VMware Virtual Platform")),
            Some(LimitedSupport::VirtualMachine("VMware"))
        );
        assert_eq!(
            classify(&x11_on("Standard PC (Q35 + ICH9, 2009) QEMU")),
            Some(LimitedSupport::VirtualMachine("QEMU"))
        );
        assert_eq!(
            classify(&x11_on("Virtual Machine")),
            Some(LimitedSupport::VirtualMachine("Hyper-V"))
        );
    }

    #[test]
    fn test_display_message() {
        let msg = LimitedSupport::VirtualMachine("QEMU").to_string();
        assert!(msg.starts_with("QEMU virtual machine detected"));
    }
}
