use super::Platform;

/// Ordered list of candidate devices reported by a platform.
#[derive(Debug, Clone)]
pub struct DeviceCatalog<D> {
    devices: Vec<D>,
}

impl<D: Clone> DeviceCatalog<D> {
    /// Queries the platform once. A platform that cannot be queried (missing
    /// runtime, no driver) yields an empty catalog; running out of devices is
    /// reported later by the session.
    pub fn enumerate<P>(platform: &P) -> Self
    where
        P: Platform<Device = D>,
    {
        let devices = match platform.devices() {
            Ok(devices) => devices,
            Err(e) => {
                tracing::warn!("Device enumeration on {} failed: {}", platform.name(), e);
                Vec::new()
            }
        };
        tracing::info!("Found {} {} device(s)", devices.len(), platform.name());

        Self { devices }
    }

    pub fn from_devices(devices: Vec<D>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &[D] {
        &self.devices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, D> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
