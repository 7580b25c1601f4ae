// Configuration and errors
pub use crate::common::{
    AcceleratorError, Config, DeviceKind, Error, LoggingConfig, PlatformConfig,
    ProgrammingError, Result,
};

// Images
pub use crate::image::{ImageLimits, RasterImage};

// Devices, sessions and data movement
pub use crate::device::{
    Allocated, ArgKind, ArgSlot, BinaryArtifact, Bound, BufferAccess, BufferPipeline, Command,
    Completed, DeviceBuffer, DeviceCatalog, Dispatched, EmulatedDevice, EmulatedKernel,
    EmulatorArtifact, EmulatorDevice, EmulatorPlatform, EmulatorQueue, EntryPoint, InFlight,
    KernelOp, MigratedIn, Platform, PlatformResult, QueueProperties, Session, ThresholdArgs,
    THRESHOLD_LAYOUT,
};
#[cfg(feature = "opencl")]
pub use crate::device::{OpenClDevice, OpenClPlatform};

// Host computation and validation
pub use crate::ops::{
    compare, compute, threshold_rule, Mismatch, ReferenceEngine, ThresholdRule, ValidationResult,
};

// Orchestration
pub use crate::run::{run, run_configured, Report};
