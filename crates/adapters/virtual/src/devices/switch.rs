//! Virtual switch — remembers the last position it was set to.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use mistguard_domain::id::DeviceKey;

/// A simulated on/off device such as a dehumidifier plug.
pub struct VirtualSwitch {
    device_id: DeviceKey,
    on: AtomicBool,
    switch_count: AtomicUsize,
}

impl VirtualSwitch {
    #[must_use]
    pub fn new(device_id: DeviceKey) -> Self {
        Self {
            device_id,
            on: AtomicBool::new(false),
            switch_count: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceKey {
        &self.device_id
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// How many commands the switch has accepted, repeats included.
    #[must_use]
    pub fn switch_count(&self) -> usize {
        self.switch_count.load(Ordering::SeqCst)
    }

    pub fn set(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
        self.switch_count.fetch_add(1, Ordering::SeqCst);
    }
}
