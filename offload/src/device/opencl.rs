//! OpenCL platform on top of the `ocl` crate.
//!
//! Buffers are device allocations. Host storage stays with the pipeline and
//! is migrated with non-blocking writes and reads on the profiling queue, so
//! transfers are in flight until the pipeline calls [`Platform::finish`].

use std::time::Duration;

use ocl::enums::{KernelInfo, KernelInfoResult, ProfilingInfo, ProfilingInfoResult};
use ocl::flags::{self, DeviceType, MemFlags};
use ocl::{Buffer, Context, Device, Event, Kernel, Program, Queue};

use super::{
    ArgKind, ArgSlot, BinaryArtifact, BufferAccess, Platform, PlatformResult, QueueProperties,
};
use crate::common::{AcceleratorError, DeviceKind, ProgrammingError};

/// A device together with the OpenCL platform exposing it.
#[derive(Debug, Clone, Copy)]
pub struct OpenClDevice {
    platform: ocl::Platform,
    device: Device,
}

impl OpenClDevice {
    pub fn device(&self) -> Device {
        self.device
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OpenClPlatform {
    device_kind: DeviceKind,
}

impl OpenClPlatform {
    pub fn new(device_kind: DeviceKind) -> Self {
        Self { device_kind }
    }

    fn device_type(&self) -> DeviceType {
        match self.device_kind {
            DeviceKind::Accelerator => flags::DEVICE_TYPE_ACCELERATOR,
            DeviceKind::Gpu => flags::DEVICE_TYPE_GPU,
            DeviceKind::Cpu => flags::DEVICE_TYPE_CPU,
            DeviceKind::All => flags::DEVICE_TYPE_ALL,
        }
    }
}

impl Platform for OpenClPlatform {
    type Device = OpenClDevice;
    type Context = Context;
    type Queue = Queue;
    type Program = Program;
    type Kernel = Kernel;
    type Buffer = Buffer<i32>;
    type Event = Event;

    fn name(&self) -> &str {
        "OpenCL"
    }

    fn devices(&self) -> PlatformResult<Vec<OpenClDevice>> {
        let mut devices = Vec::new();
        for platform in ocl::Platform::list() {
            // A platform without devices of the requested type reports an error.
            match Device::list(platform, Some(self.device_type())) {
                Ok(found) => devices.extend(
                    found
                        .into_iter()
                        .map(|device| OpenClDevice { platform, device }),
                ),
                Err(e) => tracing::debug!(
                    "No {:?} devices on {}: {}",
                    self.device_kind,
                    platform.name().unwrap_or_default(),
                    e
                ),
            }
        }

        Ok(devices)
    }

    fn device_name(&self, device: &OpenClDevice) -> String {
        device
            .device
            .name()
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|_| "<unnamed device>".to_string())
    }

    fn create_context(&self, device: &OpenClDevice) -> PlatformResult<Context> {
        Context::builder()
            .platform(device.platform)
            .devices(device.device)
            .build()
            .map_err(AcceleratorError::during("create context"))
    }

    fn create_queue(
        &self,
        context: &Context,
        device: &OpenClDevice,
        properties: QueueProperties,
    ) -> PlatformResult<Queue> {
        let properties = properties
            .profiling
            .then_some(flags::QUEUE_PROFILING_ENABLE);
        Queue::new(context, device.device, properties)
            .map_err(AcceleratorError::during("create command queue"))
    }

    fn build_program(
        &self,
        context: &Context,
        device: &OpenClDevice,
        artifact: &BinaryArtifact,
    ) -> Result<Program, ProgrammingError> {
        let binaries = [artifact.bytes()];
        Program::builder()
            .devices(device.device)
            .binaries(&binaries)
            .build(context)
            .map_err(|e| ProgrammingError::new(e.to_string()))
    }

    fn create_kernel(
        &self,
        program: &Program,
        queue: &Queue,
        name: &str,
        layout: &[ArgSlot],
    ) -> PlatformResult<Kernel> {
        let mut builder = Kernel::builder();
        builder
            .program(program)
            .name(name)
            .queue(queue.clone())
            .global_work_size(1);
        for slot in layout {
            match slot.kind {
                ArgKind::Buffer(_) => builder.arg_named(slot.name, None::<&Buffer<i32>>),
                ArgKind::Scalar => builder.arg_named(slot.name, 0i32),
            };
        }

        builder
            .build()
            .map_err(AcceleratorError::during("create kernel"))
    }

    fn kernel_arity(&self, kernel: &Kernel) -> PlatformResult<Option<u32>> {
        match kernel.info(KernelInfo::NumArgs) {
            Ok(KernelInfoResult::NumArgs(count)) => Ok(Some(count)),
            Ok(_) => Ok(None),
            Err(e) => Err(AcceleratorError::new("query kernel arity", e.to_string())),
        }
    }

    fn create_buffer(
        &self,
        _context: &Context,
        queue: &Queue,
        access: BufferAccess,
        len: usize,
    ) -> PlatformResult<Buffer<i32>> {
        let flags = match access {
            BufferAccess::ReadOnly => MemFlags::new().read_only(),
            BufferAccess::WriteOnly => MemFlags::new().write_only(),
        };

        Buffer::<i32>::builder()
            .queue(queue.clone())
            .flags(flags)
            .len(len)
            .build()
            .map_err(AcceleratorError::during("create buffer"))
    }

    fn set_buffer_arg(
        &self,
        kernel: &Kernel,
        index: u32,
        buffer: &Buffer<i32>,
    ) -> PlatformResult<()> {
        kernel
            .set_arg(index as usize, buffer)
            .map_err(AcceleratorError::during("set kernel argument"))
    }

    fn set_scalar_arg(&self, kernel: &Kernel, index: u32, value: i32) -> PlatformResult<()> {
        kernel
            .set_arg(index as usize, &value)
            .map_err(AcceleratorError::during("set kernel argument"))
    }

    fn enqueue_write(
        &self,
        queue: &Queue,
        buffer: &Buffer<i32>,
        data: &[i32],
    ) -> PlatformResult<()> {
        // SAFETY: `data` is the pipeline's host storage, which stays in place
        // until the queue has been finished.
        unsafe { buffer.write(data).queue(queue).block(false).enq() }
            .map_err(AcceleratorError::during("migrate to device"))
    }

    fn enqueue_task(&self, queue: &Queue, kernel: &Kernel) -> PlatformResult<Event> {
        let mut event = Event::empty();
        // The argument contract is checked by the caller before dispatch.
        unsafe {
            kernel
                .cmd()
                .queue(queue)
                .global_work_size(1)
                .enew(&mut event)
                .enq()
        }
        .map_err(AcceleratorError::during("enqueue task"))?;

        Ok(event)
    }

    fn enqueue_read(
        &self,
        queue: &Queue,
        buffer: &Buffer<i32>,
        data: &mut [i32],
    ) -> PlatformResult<()> {
        // SAFETY: as for `enqueue_write`; host code cannot reach `data`
        // before the pipeline synchronizes.
        unsafe { buffer.read(data).queue(queue).block(false).enq() }
            .map_err(AcceleratorError::during("migrate to host"))
    }

    fn finish(&self, queue: &Queue) -> PlatformResult<()> {
        queue
            .finish()
            .map_err(AcceleratorError::during("finish queue"))
    }

    fn elapsed(&self, event: &Event) -> Option<Duration> {
        let start = match event.profiling_info(ProfilingInfo::Start) {
            Ok(ProfilingInfoResult::Start(ns)) => ns,
            _ => return None,
        };
        let end = match event.profiling_info(ProfilingInfo::End) {
            Ok(ProfilingInfoResult::End(ns)) => ns,
            _ => return None,
        };

        Some(Duration::from_nanos(end.saturating_sub(start)))
    }
}
