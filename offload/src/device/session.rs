use std::fmt;

use super::{ArgSlot, BinaryArtifact, DeviceCatalog, Platform, QueueProperties};
use crate::common::{Error, Result};

/// A resolved, callable entry point of a programmed device.
pub struct EntryPoint<P: Platform> {
    name: String,
    kernel: P::Kernel,
    arity: Option<u32>,
}

impl<P: Platform> EntryPoint<P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kernel(&self) -> &P::Kernel {
        &self.kernel
    }

    /// Declared argument count, when the platform reports it.
    pub fn arity(&self) -> Option<u32> {
        self.arity
    }
}

/// A programmed device with its context, profiling queue and entry point.
///
/// Only [`Session::establish`] creates one, so a session always refers to a
/// device that accepted the binary. Dropping the session drains the queue.
pub struct Session<'p, P: Platform> {
    platform: &'p P,
    device_index: usize,
    device_name: String,
    device: P::Device,
    // Declaration order is release order: kernel, program, queue, context.
    entry_point: EntryPoint<P>,
    program: P::Program,
    queue: P::Queue,
    context: P::Context,
}

impl<'p, P: Platform> Session<'p, P> {
    /// Tries the catalog's devices in order and keeps the first one that
    /// accepts `artifact`.
    ///
    /// A device that rejects the binary is logged and skipped. Failing to
    /// create a context or queue, or to resolve `entry_point_name` on the
    /// programmed device, ends the search with an error.
    pub fn establish(
        platform: &'p P,
        catalog: &DeviceCatalog<P::Device>,
        artifact: &BinaryArtifact,
        entry_point_name: &str,
        layout: &[ArgSlot],
    ) -> Result<Self> {
        for (index, device) in catalog.iter().enumerate() {
            let device_name = platform.device_name(device);

            let context = platform.create_context(device)?;
            let queue =
                platform.create_queue(&context, device, QueueProperties { profiling: true })?;

            tracing::info!("Trying to program device[{}]: {}", index, device_name);
            let program = match platform.build_program(&context, device, artifact) {
                Ok(program) => program,
                Err(e) => {
                    tracing::warn!(
                        "Failed to program device[{}] with {}: {}",
                        index,
                        artifact,
                        e
                    );
                    continue;
                }
            };
            tracing::info!("Device[{}]: program successful!", index);

            let kernel = platform.create_kernel(&program, &queue, entry_point_name, layout)?;
            let arity = platform.kernel_arity(&kernel)?;

            return Ok(Session {
                platform,
                device_index: index,
                device_name,
                device: device.clone(),
                entry_point: EntryPoint {
                    name: entry_point_name.to_string(),
                    kernel,
                    arity,
                },
                program,
                queue,
                context,
            });
        }

        tracing::error!("Failed to program any device found");
        Err(Error::NoUsableDevice {
            tried: catalog.len(),
        })
    }

    pub fn platform(&self) -> &'p P {
        self.platform
    }

    /// Position of the selected device in the catalog.
    pub fn device_index(&self) -> usize {
        self.device_index
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn device(&self) -> &P::Device {
        &self.device
    }

    pub fn context(&self) -> &P::Context {
        &self.context
    }

    pub fn queue(&self) -> &P::Queue {
        &self.queue
    }

    pub fn program(&self) -> &P::Program {
        &self.program
    }

    pub fn entry_point(&self) -> &EntryPoint<P> {
        &self.entry_point
    }
}

impl<P: Platform> Drop for Session<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.platform.finish(&self.queue) {
            tracing::warn!("Draining queue of device[{}] failed: {}", self.device_index, e);
        }
    }
}

impl<P: Platform> fmt::Debug for Session<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("platform", &self.platform.name())
            .field("device_index", &self.device_index)
            .field("device_name", &self.device_name)
            .field("entry_point", &self.entry_point.name)
            .finish()
    }
}
