// Running-application queries and activation
//
// macOS uses NSWorkspace/NSRunningApplication. Other platforms have no application
// list; the overlay then only shows bound applications and switching is a no-op.

use crate::events::ApplicationHandle;

/// Regular (Dock-visible) running applications, in launch order, excluding this process
pub fn running_applications() -> Vec<ApplicationHandle> {
    #[cfg(target_os = "macos")]
    {
        unsafe { macos::running_applications_impl() }
    }
    #[cfg(not(target_os = "macos"))]
    {
        Vec::new()
    }
}

/// Bring an application to the front, launching it if it is not running
pub fn activate(application: &ApplicationHandle) -> Result<(), String> {
    #[cfg(target_os = "macos")]
    {
        let pid = application.pid.or_else(|| running_pid(application));
        if let Some(pid) = pid {
            if unsafe { macos::activate_pid(pid) } {
                return Ok(());
            }
            crate::debug!("pid {} for {} is gone, launching instead", pid, application.name);
        }
        launch(application)
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(format!("Switching to {} is not supported on this platform", application.name))
    }
}

#[cfg(target_os = "macos")]
fn running_pid(application: &ApplicationHandle) -> Option<i32> {
    running_applications()
        .into_iter()
        .find(|running| match (&application.bundle_id, &running.bundle_id) {
            (Some(wanted), Some(bundle_id)) => wanted == bundle_id,
            _ => running.name == application.name,
        })
        .and_then(|running| running.pid)
}

#[cfg(target_os = "macos")]
fn launch(application: &ApplicationHandle) -> Result<(), String> {
    let mut command = std::process::Command::new("open");
    match application.bundle_id {
        Some(ref bundle_id) => command.arg("-b").arg(bundle_id),
        None => command.arg("-a").arg(&application.name),
    };
    command
        .spawn()
        .map(|_| ())
        .map_err(|e| format!("Failed to launch {}: {}", application.name, e))
}

#[cfg(target_os = "macos")]
mod macos {
    use crate::events::ApplicationHandle;
    use cocoa::base::{id, nil, BOOL, YES};
    use cocoa::foundation::NSString as CocoaNSString;
    use objc::{class, msg_send, sel, sel_impl};

    /// NSApplicationActivationPolicyRegular
    const ACTIVATION_POLICY_REGULAR: i64 = 0;
    /// NSApplicationActivateIgnoringOtherApps
    const ACTIVATE_IGNORING_OTHER_APPS: u64 = 1 << 1;

    #[allow(deprecated)]
    unsafe fn string_from(ns_string: id) -> Option<String> {
        if ns_string == nil {
            return None;
        }
        let cstr: *const std::os::raw::c_char = CocoaNSString::UTF8String(ns_string);
        if cstr.is_null() {
            return None;
        }
        Some(std::ffi::CStr::from_ptr(cstr).to_string_lossy().into_owned())
    }

    #[allow(deprecated)]
    pub unsafe fn running_applications_impl() -> Vec<ApplicationHandle> {
        let mut apps = Vec::new();
        let own_pid = std::process::id() as i32;

        let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
        if workspace == nil {
            return apps;
        }
        let running_apps: id = msg_send![workspace, runningApplications];
        if running_apps == nil {
            return apps;
        }

        let count: usize = msg_send![running_apps, count];
        for i in 0..count {
            let app: id = msg_send![running_apps, objectAtIndex: i];
            if app == nil {
                continue;
            }
            // Accessory apps and background agents have no Dock presence
            let activation_policy: i64 = msg_send![app, activationPolicy];
            if activation_policy != ACTIVATION_POLICY_REGULAR {
                continue;
            }
            let pid: i32 = msg_send![app, processIdentifier];
            if pid == own_pid {
                continue;
            }
            let name_ns: id = msg_send![app, localizedName];
            let Some(name) = string_from(name_ns) else {
                continue;
            };
            let bundle_ns: id = msg_send![app, bundleIdentifier];

            apps.push(ApplicationHandle {
                name,
                bundle_id: string_from(bundle_ns),
                pid: Some(pid),
            });
        }
        apps
    }

    pub unsafe fn activate_pid(pid: i32) -> bool {
        let app: id = msg_send![
            class!(NSRunningApplication),
            runningApplicationWithProcessIdentifier: pid
        ];
        if app == nil {
            return false;
        }
        let activated: BOOL = msg_send![app, activateWithOptions: ACTIVATE_IGNORING_OTHER_APPS];
        activated == YES
    }
}
