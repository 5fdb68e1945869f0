use dabgw_core::Reach;

use crate::device::Device;

/// Picks the device set for one acknowledgment attempt.
///
/// A transport with proven reach is always preferred, and only the
/// best-priority one is used to avoid redundant traffic. When no reach
/// can be proven, every device whose reach is unknown is attempted,
/// trading duplicate-delivery risk for delivery probability. An empty
/// result means "no device available, abort this attempt".
pub fn select(devices: Vec<Device>) -> Vec<Device> {
    let mut reachable = Vec::new();
    let mut indeterminate = Vec::new();
    for mut device in devices {
        match device.estimate_reach() {
            Reach::Reachable => reachable.push(device),
            Reach::Unknown => indeterminate.push(device),
            Reach::NoReach => {}
        }
    }

    if !reachable.is_empty() {
        // Minimum priority value wins; ties keep the first encountered.
        let best = reachable
            .into_iter()
            .fold(None::<Device>, |best, candidate| match best {
                Some(held) if held.priority <= candidate.priority => Some(held),
                _ => Some(candidate),
            });
        return best.into_iter().collect();
    }
    indeterminate
}
