//! Argument contract of the threshold entry point.
//!
//! The accelerator program reads its arguments by position. The positions are
//! fixed here, once, and every binding goes through [`ThresholdArgs`], which
//! checks roles and arity instead of trusting the call order.

use super::pipeline::DeviceBuffer;
use super::{BufferAccess, Platform, Session};
use crate::common::{AcceleratorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Buffer(BufferAccess),
    Scalar,
}

/// One positional kernel argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSlot {
    pub index: u32,
    pub name: &'static str,
    pub kind: ArgKind,
}

const OUTPUT: ArgSlot = ArgSlot {
    index: 0,
    name: "output",
    kind: ArgKind::Buffer(BufferAccess::WriteOnly),
};

const INPUT: ArgSlot = ArgSlot {
    index: 1,
    name: "input",
    kind: ArgKind::Buffer(BufferAccess::ReadOnly),
};

const COUNT: ArgSlot = ArgSlot {
    index: 2,
    name: "count",
    kind: ArgKind::Scalar,
};

/// `threshold(int* output, const int* input, int count)`
pub const THRESHOLD_LAYOUT: [ArgSlot; 3] = [OUTPUT, INPUT, COUNT];

/// Named arguments of one threshold invocation.
pub struct ThresholdArgs<'a, P: Platform> {
    pub output: &'a DeviceBuffer<P>,
    pub input: &'a DeviceBuffer<P>,
    pub count: i32,
}

impl<P: Platform> ThresholdArgs<'_, P> {
    pub fn bind(&self, session: &Session<'_, P>) -> Result<()> {
        let entry_point = session.entry_point();

        if let Some(arity) = entry_point.arity() {
            if arity as usize != THRESHOLD_LAYOUT.len() {
                return Err(AcceleratorError::new(
                    "bind arguments",
                    format!(
                        "entry point '{}' declares {} argument(s), binding provides {}",
                        entry_point.name(),
                        arity,
                        THRESHOLD_LAYOUT.len()
                    ),
                )
                .into());
            }
        }

        let count = usize::try_from(self.count).map_err(|_| {
            AcceleratorError::new("bind arguments", format!("negative count {}", self.count))
        })?;
        if count > self.input.len() || count > self.output.len() {
            return Err(AcceleratorError::new(
                "bind arguments",
                format!(
                    "count {} exceeds buffer sizes (input {}, output {})",
                    count,
                    self.input.len(),
                    self.output.len()
                ),
            )
            .into());
        }

        bind_buffer(session, &OUTPUT, self.output)?;
        bind_buffer(session, &INPUT, self.input)?;
        session
            .platform()
            .set_scalar_arg(entry_point.kernel(), COUNT.index, self.count)?;

        tracing::debug!(
            "Bound {}(output, input, count = {})",
            entry_point.name(),
            self.count
        );

        Ok(())
    }
}

fn bind_buffer<P: Platform>(
    session: &Session<'_, P>,
    slot: &ArgSlot,
    buffer: &DeviceBuffer<P>,
) -> Result<()> {
    let ArgKind::Buffer(expected) = slot.kind else {
        return Err(AcceleratorError::new(
            "bind arguments",
            format!("argument {} ({}) is not a buffer slot", slot.index, slot.name),
        )
        .into());
    };
    if buffer.access() != expected {
        return Err(AcceleratorError::new(
            "bind arguments",
            format!(
                "argument {} ({}) expects a {:?} buffer, got {:?}",
                slot.index,
                slot.name,
                expected,
                buffer.access()
            ),
        )
        .into());
    }

    session
        .platform()
        .set_buffer_arg(session.entry_point().kernel(), slot.index, buffer.raw())?;

    Ok(())
}
