//! Host side of the accelerator: device discovery, programming, buffers and dispatch.
//!
//! [`Platform`] mirrors the object model of an OpenCL-like compute API so the
//! session and pipeline logic is written once and runs against either real
//! hardware (`opencl` feature) or the software [`EmulatorPlatform`].

mod abi;
mod artifact;
mod catalog;
mod emulator;
#[cfg(feature = "opencl")]
mod opencl;
mod pipeline;
mod session;
#[cfg(test)]
mod tests;

use std::fmt::Debug;
use std::time::Duration;

pub use abi::{ArgKind, ArgSlot, ThresholdArgs, THRESHOLD_LAYOUT};
pub use artifact::BinaryArtifact;
pub use catalog::DeviceCatalog;
pub use emulator::{
    Command, EmulatedDevice, EmulatedKernel, EmulatorArtifact, EmulatorDevice, EmulatorPlatform,
    EmulatorQueue, KernelOp,
};
#[cfg(feature = "opencl")]
pub use opencl::{OpenClDevice, OpenClPlatform};
pub use pipeline::{
    Allocated, Bound, BufferPipeline, Completed, DeviceBuffer, Dispatched, InFlight, MigratedIn,
};
pub use session::{EntryPoint, Session};

use crate::common::{AcceleratorError, ProgrammingError};

pub type PlatformResult<T> = std::result::Result<T, AcceleratorError>;

/// How the device kernel accesses a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAccess {
    /// Written by the host, read by the kernel.
    ReadOnly,
    /// Written by the kernel, read back by the host.
    WriteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueProperties {
    pub profiling: bool,
}

/// A compute API capable of running one precompiled entry point on one device.
///
/// All handles are owned values; dropping them releases the device objects.
/// Commands enqueued on one queue execute in submission order.
pub trait Platform {
    type Device: Clone + Debug;
    type Context;
    type Queue;
    type Program;
    type Kernel;
    type Buffer;
    type Event;

    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    fn devices(&self) -> PlatformResult<Vec<Self::Device>>;

    fn device_name(&self, device: &Self::Device) -> String;

    fn create_context(&self, device: &Self::Device) -> PlatformResult<Self::Context>;

    fn create_queue(
        &self,
        context: &Self::Context,
        device: &Self::Device,
        properties: QueueProperties,
    ) -> PlatformResult<Self::Queue>;

    /// Programs the device with a precompiled binary. One blocking round trip.
    fn build_program(
        &self,
        context: &Self::Context,
        device: &Self::Device,
        artifact: &BinaryArtifact,
    ) -> Result<Self::Program, ProgrammingError>;

    /// Resolves a named entry point. `layout` declares the argument slots the
    /// host is going to bind.
    fn create_kernel(
        &self,
        program: &Self::Program,
        queue: &Self::Queue,
        name: &str,
        layout: &[ArgSlot],
    ) -> PlatformResult<Self::Kernel>;

    /// Number of arguments the entry point declares, if the platform reports it.
    fn kernel_arity(&self, kernel: &Self::Kernel) -> PlatformResult<Option<u32>>;

    fn create_buffer(
        &self,
        context: &Self::Context,
        queue: &Self::Queue,
        access: BufferAccess,
        len: usize,
    ) -> PlatformResult<Self::Buffer>;

    fn set_buffer_arg(
        &self,
        kernel: &Self::Kernel,
        index: u32,
        buffer: &Self::Buffer,
    ) -> PlatformResult<()>;

    fn set_scalar_arg(&self, kernel: &Self::Kernel, index: u32, value: i32) -> PlatformResult<()>;

    /// Host to device migration. May return before the copy completes, so
    /// `data` must stay untouched until [`Platform::finish`].
    fn enqueue_write(
        &self,
        queue: &Self::Queue,
        buffer: &Self::Buffer,
        data: &[i32],
    ) -> PlatformResult<()>;

    /// Single work-item invocation of the whole entry point.
    fn enqueue_task(&self, queue: &Self::Queue, kernel: &Self::Kernel)
        -> PlatformResult<Self::Event>;

    /// Device to host migration. `data` holds the result only after
    /// [`Platform::finish`].
    fn enqueue_read(
        &self,
        queue: &Self::Queue,
        buffer: &Self::Buffer,
        data: &mut [i32],
    ) -> PlatformResult<()>;

    /// Blocks until every command enqueued on `queue` has completed.
    fn finish(&self, queue: &Self::Queue) -> PlatformResult<()>;

    /// Execution time of a completed command, when profiling is available.
    fn elapsed(&self, event: &Self::Event) -> Option<Duration>;
}
