//! Software model of an accelerator board.
//!
//! Emulated devices are identified by a `target` string, the way hardware
//! binaries are tied to a board revision. An emulator binary is a YAML
//! document naming its target and the kernels it contains:
//!
//! ```yaml
//! target: sw_emu
//! kernels:
//!   - name: threshold
//!     op: threshold
//!     level: 90
//! ```
//!
//! Every kernel takes `(output, input, count)`. `faults` lists output
//! positions whose low bit is flipped after execution, for exercising the
//! validation path. Commands execute eagerly in submission order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{ArgSlot, BinaryArtifact, BufferAccess, Platform, PlatformResult, QueueProperties};
use crate::common::{AcceleratorError, ProgrammingError};

const KERNEL_ARITY: u32 = 3;

/// Configuration of one emulated board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatedDevice {
    pub name: String,
    pub target: String,
}

impl EmulatedDevice {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelOp {
    /// `output[i] = input[i] > level`
    Threshold,
    /// `output[i] = input[i]`
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatedKernel {
    pub name: String,
    pub op: KernelOp,
    #[serde(default)]
    pub level: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<usize>,
    /// Declared argument count, when it differs from `(output, input, count)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<u32>,
}

impl EmulatedKernel {
    pub fn threshold(name: impl Into<String>, level: i32) -> Self {
        Self {
            name: name.into(),
            op: KernelOp::Threshold,
            level,
            faults: Vec::new(),
            arity: None,
        }
    }

    pub fn with_faults(mut self, faults: Vec<usize>) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_arity(mut self, arity: u32) -> Self {
        self.arity = Some(arity);
        self
    }

    fn arity(&self) -> u32 {
        self.arity.unwrap_or(KERNEL_ARITY)
    }

    fn run(&self, input: &[i32], output: &mut [i32]) {
        for (out, &value) in output.iter_mut().zip(input) {
            *out = match self.op {
                KernelOp::Threshold => i32::from(value > self.level),
                KernelOp::Passthrough => value,
            };
        }
        for &position in &self.faults {
            if let Some(out) = output.get_mut(position) {
                *out ^= 1;
            }
        }
    }
}

/// Contents of an emulator binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatorArtifact {
    pub target: String,
    pub kernels: Vec<EmulatedKernel>,
}

impl EmulatorArtifact {
    pub fn new(target: impl Into<String>, kernels: Vec<EmulatedKernel>) -> Self {
        Self {
            target: target.into(),
            kernels,
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(bytes).map_err(|_| "not an emulator binary".to_string())?;
        serde_yml::from_str(text).map_err(|e| format!("not an emulator binary: {}", e))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_yml::Error> {
        serde_yml::to_string(self).map(String::into_bytes)
    }
}

/// Command recorded on an emulated queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Write { len: usize },
    Task { kernel: String },
    Read { len: usize },
    Finish,
}

/// Handle of one emulated board in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorDevice {
    index: usize,
    spec: EmulatedDevice,
}

impl EmulatorDevice {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn spec(&self) -> &EmulatedDevice {
        &self.spec
    }
}

#[derive(Debug)]
pub struct EmulatorContext {
    device: usize,
}

#[derive(Debug)]
pub struct EmulatorQueue {
    device: usize,
    profiling: bool,
    history: Mutex<Vec<Command>>,
}

impl EmulatorQueue {
    /// Commands submitted so far, in order.
    pub fn history(&self) -> Vec<Command> {
        self.history.lock().clone()
    }

    fn record(&self, command: Command) {
        self.history.lock().push(command);
    }
}

#[derive(Debug)]
pub struct EmulatorProgram {
    artifact: EmulatorArtifact,
}

#[derive(Debug, Clone)]
enum KernelArg {
    Buffer(EmulatorBuffer),
    Scalar(i32),
}

#[derive(Debug)]
pub struct EmulatorKernel {
    spec: EmulatedKernel,
    args: Mutex<Vec<Option<KernelArg>>>,
}

impl EmulatorKernel {
    fn set(&self, index: u32, arg: KernelArg) -> PlatformResult<()> {
        let mut args = self.args.lock();
        let slot = args.get_mut(index as usize).ok_or_else(|| {
            AcceleratorError::new(
                "set kernel argument",
                format!(
                    "index {} out of range for '{}' with {} argument(s)",
                    index,
                    self.spec.name,
                    self.spec.arity()
                ),
            )
        })?;
        *slot = Some(arg);
        Ok(())
    }
}

/// Device memory of the emulated board.
#[derive(Debug, Clone)]
pub struct EmulatorBuffer {
    access: BufferAccess,
    memory: Arc<Mutex<Vec<i32>>>,
}

#[derive(Debug)]
pub struct EmulatorEvent {
    elapsed: Option<Duration>,
}

/// Platform made of emulated boards.
#[derive(Debug)]
pub struct EmulatorPlatform {
    devices: Vec<EmulatedDevice>,
    attempts: Mutex<Vec<usize>>,
}

impl EmulatorPlatform {
    pub fn new(devices: Vec<EmulatedDevice>) -> Self {
        Self {
            devices,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Catalog indices of every device a program was built for, in order.
    pub fn program_attempts(&self) -> Vec<usize> {
        self.attempts.lock().clone()
    }
}

impl Platform for EmulatorPlatform {
    type Device = EmulatorDevice;
    type Context = EmulatorContext;
    type Queue = EmulatorQueue;
    type Program = EmulatorProgram;
    type Kernel = EmulatorKernel;
    type Buffer = EmulatorBuffer;
    type Event = EmulatorEvent;

    fn name(&self) -> &str {
        "emulator"
    }

    fn devices(&self) -> PlatformResult<Vec<EmulatorDevice>> {
        Ok(self
            .devices
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, spec)| EmulatorDevice { index, spec })
            .collect())
    }

    fn device_name(&self, device: &EmulatorDevice) -> String {
        format!("{} ({})", device.spec.name, device.spec.target)
    }

    fn create_context(&self, device: &EmulatorDevice) -> PlatformResult<EmulatorContext> {
        Ok(EmulatorContext {
            device: device.index,
        })
    }

    fn create_queue(
        &self,
        context: &EmulatorContext,
        device: &EmulatorDevice,
        properties: QueueProperties,
    ) -> PlatformResult<EmulatorQueue> {
        if context.device != device.index {
            return Err(AcceleratorError::new(
                "create queue",
                "device does not belong to the context",
            ));
        }

        Ok(EmulatorQueue {
            device: device.index,
            profiling: properties.profiling,
            history: Mutex::new(Vec::new()),
        })
    }

    fn build_program(
        &self,
        _context: &EmulatorContext,
        device: &EmulatorDevice,
        artifact: &BinaryArtifact,
    ) -> Result<EmulatorProgram, ProgrammingError> {
        self.attempts.lock().push(device.index);

        let parsed = EmulatorArtifact::parse(artifact.bytes()).map_err(ProgrammingError::new)?;
        if parsed.target != device.spec.target {
            return Err(ProgrammingError::new(format!(
                "binary targets '{}', device is '{}'",
                parsed.target, device.spec.target
            )));
        }

        Ok(EmulatorProgram { artifact: parsed })
    }

    fn create_kernel(
        &self,
        program: &EmulatorProgram,
        _queue: &EmulatorQueue,
        name: &str,
        _layout: &[ArgSlot],
    ) -> PlatformResult<EmulatorKernel> {
        let spec = program
            .artifact
            .kernels
            .iter()
            .find(|k| k.name == name)
            .cloned()
            .ok_or_else(|| {
                AcceleratorError::new(
                    "create kernel",
                    format!("entry point '{}' not found in program", name),
                )
            })?;
        let arity = spec.arity() as usize;

        Ok(EmulatorKernel {
            spec,
            args: Mutex::new(vec![None; arity]),
        })
    }

    fn kernel_arity(&self, kernel: &EmulatorKernel) -> PlatformResult<Option<u32>> {
        Ok(Some(kernel.spec.arity()))
    }

    fn create_buffer(
        &self,
        _context: &EmulatorContext,
        _queue: &EmulatorQueue,
        access: BufferAccess,
        len: usize,
    ) -> PlatformResult<EmulatorBuffer> {
        if len == 0 {
            return Err(AcceleratorError::new("create buffer", "zero-sized buffer"));
        }

        Ok(EmulatorBuffer {
            access,
            memory: Arc::new(Mutex::new(vec![0; len])),
        })
    }

    fn set_buffer_arg(
        &self,
        kernel: &EmulatorKernel,
        index: u32,
        buffer: &EmulatorBuffer,
    ) -> PlatformResult<()> {
        kernel.set(index, KernelArg::Buffer(buffer.clone()))
    }

    fn set_scalar_arg(
        &self,
        kernel: &EmulatorKernel,
        index: u32,
        value: i32,
    ) -> PlatformResult<()> {
        kernel.set(index, KernelArg::Scalar(value))
    }

    fn enqueue_write(
        &self,
        queue: &EmulatorQueue,
        buffer: &EmulatorBuffer,
        data: &[i32],
    ) -> PlatformResult<()> {
        let mut memory = buffer.memory.lock();
        if memory.len() != data.len() {
            return Err(AcceleratorError::new(
                "enqueue write",
                format!("{} samples into a buffer of {}", data.len(), memory.len()),
            ));
        }
        memory.copy_from_slice(data);
        queue.record(Command::Write { len: data.len() });

        Ok(())
    }

    fn enqueue_task(
        &self,
        queue: &EmulatorQueue,
        kernel: &EmulatorKernel,
    ) -> PlatformResult<EmulatorEvent> {
        let start = Instant::now();
        let args = kernel.args.lock().clone();

        let (output, input, count) = match args.as_slice() {
            [
                Some(KernelArg::Buffer(output)),
                Some(KernelArg::Buffer(input)),
                Some(KernelArg::Scalar(count)),
            ] => (output.clone(), input.clone(), *count),
            _ => {
                return Err(AcceleratorError::new(
                    "enqueue task",
                    format!(
                        "'{}' expects (output buffer, input buffer, count), got {:?}",
                        kernel.spec.name, args
                    ),
                ));
            }
        };
        if output.access != BufferAccess::WriteOnly || input.access != BufferAccess::ReadOnly {
            return Err(AcceleratorError::new(
                "enqueue task",
                "output and input buffers are swapped",
            ));
        }

        // Copy first: input and output may alias the same memory.
        let source = input.memory.lock().clone();
        let mut target = output.memory.lock();
        let count = usize::try_from(count)
            .ok()
            .filter(|&n| n <= source.len() && n <= target.len())
            .ok_or_else(|| {
                AcceleratorError::new(
                    "enqueue task",
                    format!("count {} out of range for bound buffers", count),
                )
            })?;

        kernel.spec.run(&source[..count], &mut target[..count]);
        queue.record(Command::Task {
            kernel: kernel.spec.name.clone(),
        });
        tracing::trace!("Emulated device[{}] ran {}", queue.device, kernel.spec.name);

        Ok(EmulatorEvent {
            elapsed: queue.profiling.then(|| start.elapsed()),
        })
    }

    fn enqueue_read(
        &self,
        queue: &EmulatorQueue,
        buffer: &EmulatorBuffer,
        data: &mut [i32],
    ) -> PlatformResult<()> {
        let memory = buffer.memory.lock();
        if memory.len() != data.len() {
            return Err(AcceleratorError::new(
                "enqueue read",
                format!("{} samples from a buffer of {}", data.len(), memory.len()),
            ));
        }
        data.copy_from_slice(&memory);
        queue.record(Command::Read { len: data.len() });

        Ok(())
    }

    fn finish(&self, queue: &EmulatorQueue) -> PlatformResult<()> {
        queue.record(Command::Finish);
        Ok(())
    }

    fn elapsed(&self, event: &EmulatorEvent) -> Option<Duration> {
        event.elapsed
    }
}
