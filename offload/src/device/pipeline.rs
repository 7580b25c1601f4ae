//! Host/device data movement for a single invocation.
//!
//! The pipeline is a typestate chain:
//!
//! `allocate -> bind -> migrate_in -> dispatch -> migrate_out -> synchronize`
//!
//! Each step consumes the previous state. Host storage is owned by the
//! pipeline from allocation on and is handed back only by
//! [`BufferPipeline::synchronize`], after the queue has drained, so host code
//! cannot touch memory the device may still be reading or writing.

use std::marker::PhantomData;
use std::time::Duration;

use super::{BufferAccess, Platform, Session, ThresholdArgs};
use crate::common::{AcceleratorError, Result};

/// Device-visible buffer of `i32` samples.
pub struct DeviceBuffer<P: Platform> {
    access: BufferAccess,
    len: usize,
    buffer: P::Buffer,
}

impl<P: Platform> DeviceBuffer<P> {
    fn allocate(session: &Session<'_, P>, access: BufferAccess, len: usize) -> Result<Self> {
        let buffer = session.platform().create_buffer(
            session.context(),
            session.queue(),
            access,
            len,
        )?;

        Ok(Self {
            access,
            len,
            buffer,
        })
    }

    pub fn access(&self) -> BufferAccess {
        self.access
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_size(&self) -> usize {
        self.len * std::mem::size_of::<i32>()
    }

    pub fn raw(&self) -> &P::Buffer {
        &self.buffer
    }
}

/// Buffers exist, nothing is bound yet.
#[derive(Debug)]
pub struct Allocated;
/// Entry point arguments are set.
#[derive(Debug)]
pub struct Bound;
/// Input transfer is enqueued.
#[derive(Debug)]
pub struct MigratedIn;
/// The invocation is enqueued.
#[derive(Debug)]
pub struct Dispatched;
/// Output transfer is enqueued; only synchronization remains.
#[derive(Debug)]
pub struct InFlight;

struct Staging<'s, 'p, P: Platform> {
    session: &'s Session<'p, P>,
    input: DeviceBuffer<P>,
    output: DeviceBuffer<P>,
    input_host: Vec<i32>,
    output_host: Vec<i32>,
    dispatch: Option<P::Event>,
    pending: bool,
}

impl<P: Platform> Drop for Staging<'_, '_, P> {
    fn drop(&mut self) {
        // Host storage must outlive any command still referring to it.
        if self.pending {
            let session = self.session;
            if let Err(e) = session.platform().finish(session.queue()) {
                tracing::warn!("Draining abandoned transfers failed: {}", e);
            }
        }
    }
}

pub struct BufferPipeline<'s, 'p, P: Platform, S> {
    staging: Staging<'s, 'p, P>,
    _state: PhantomData<S>,
}

impl<'s, 'p, P: Platform, S> BufferPipeline<'s, 'p, P, S> {
    fn advance<T>(self) -> BufferPipeline<'s, 'p, P, T> {
        BufferPipeline {
            staging: self.staging,
            _state: PhantomData,
        }
    }

    pub fn input_buffer(&self) -> &DeviceBuffer<P> {
        &self.staging.input
    }

    pub fn output_buffer(&self) -> &DeviceBuffer<P> {
        &self.staging.output
    }

    /// Number of samples moved through the pipeline.
    pub fn len(&self) -> usize {
        self.staging.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staging.input.is_empty()
    }
}

impl<'s, 'p, P: Platform> BufferPipeline<'s, 'p, P, Allocated> {
    /// Runs the whole chain and returns the synchronized output.
    pub fn execute(session: &'s Session<'p, P>, samples: Vec<i32>) -> Result<Completed> {
        Self::allocate(session, samples)?
            .bind()?
            .migrate_in()?
            .dispatch()?
            .migrate_out()?
            .synchronize()
    }

    /// Creates the input buffer (read by the device) and an output buffer of
    /// the same size (written by the device), each backed by host storage.
    pub fn allocate(session: &'s Session<'p, P>, samples: Vec<i32>) -> Result<Self> {
        let len = samples.len();
        if len == 0 {
            return Err(AcceleratorError::new("allocate buffers", "no samples to process").into());
        }

        let input = DeviceBuffer::allocate(session, BufferAccess::ReadOnly, len)?;
        let output = DeviceBuffer::allocate(session, BufferAccess::WriteOnly, len)?;
        tracing::debug!(
            "Allocated input and output buffers of {} bytes each",
            input.byte_size()
        );

        Ok(Self {
            staging: Staging {
                session,
                input,
                output,
                input_host: samples,
                output_host: vec![0; len],
                dispatch: None,
                pending: false,
            },
            _state: PhantomData,
        })
    }

    pub fn bind(self) -> Result<BufferPipeline<'s, 'p, P, Bound>> {
        let count = i32::try_from(self.len()).map_err(|_| {
            AcceleratorError::new(
                "bind arguments",
                format!("{} samples exceed the entry point's int count", self.len()),
            )
        })?;

        ThresholdArgs {
            output: &self.staging.output,
            input: &self.staging.input,
            count,
        }
        .bind(self.staging.session)?;

        Ok(self.advance())
    }
}

impl<'s, 'p, P: Platform> BufferPipeline<'s, 'p, P, Bound> {
    pub fn migrate_in(mut self) -> Result<BufferPipeline<'s, 'p, P, MigratedIn>> {
        let staging = &mut self.staging;
        staging.pending = true;
        staging.session.platform().enqueue_write(
            staging.session.queue(),
            staging.input.raw(),
            &staging.input_host,
        )?;
        tracing::debug!("Enqueued host to device migration");

        Ok(self.advance())
    }
}

impl<'s, 'p, P: Platform> BufferPipeline<'s, 'p, P, MigratedIn> {
    pub fn dispatch(mut self) -> Result<BufferPipeline<'s, 'p, P, Dispatched>> {
        let staging = &mut self.staging;
        let session = staging.session;
        let event = session
            .platform()
            .enqueue_task(session.queue(), session.entry_point().kernel())?;
        staging.dispatch = Some(event);
        tracing::debug!("Enqueued {}", session.entry_point().name());

        Ok(self.advance())
    }
}

impl<'s, 'p, P: Platform> BufferPipeline<'s, 'p, P, Dispatched> {
    pub fn migrate_out(mut self) -> Result<BufferPipeline<'s, 'p, P, InFlight>> {
        let staging = &mut self.staging;
        staging.session.platform().enqueue_read(
            staging.session.queue(),
            staging.output.raw(),
            &mut staging.output_host,
        )?;
        tracing::debug!("Enqueued device to host migration");

        Ok(self.advance())
    }
}

impl<P: Platform> BufferPipeline<'_, '_, P, InFlight> {
    /// Waits for every enqueued command, then releases host storage.
    pub fn synchronize(self) -> Result<Completed> {
        let mut staging = self.staging;
        let session = staging.session;
        session.platform().finish(session.queue())?;
        staging.pending = false;

        let kernel_time = staging
            .dispatch
            .take()
            .and_then(|event| session.platform().elapsed(&event));
        match kernel_time {
            Some(time) => tracing::info!(
                "{} finished on {} in {:?}",
                session.entry_point().name(),
                session.device_name(),
                time
            ),
            None => tracing::info!(
                "{} finished on {}",
                session.entry_point().name(),
                session.device_name()
            ),
        }

        Ok(Completed {
            input: std::mem::take(&mut staging.input_host),
            output: std::mem::take(&mut staging.output_host),
            kernel_time,
        })
    }
}

/// Host storage returned after the device finished with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    input: Vec<i32>,
    output: Vec<i32>,
    kernel_time: Option<Duration>,
}

impl Completed {
    pub fn input(&self) -> &[i32] {
        &self.input
    }

    pub fn output(&self) -> &[i32] {
        &self.output
    }

    pub fn into_output(self) -> Vec<i32> {
        self.output
    }

    /// Device execution time of the dispatch, from queue profiling.
    pub fn kernel_time(&self) -> Option<Duration> {
        self.kernel_time
    }
}
