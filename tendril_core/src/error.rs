// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced by the work loop.

use core::fmt;

use crate::fiber::FiberId;

/// Which phase of a render cycle failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Building the work-in-progress tree. The host has not been touched.
    Render,
    /// Applying the finished tree to the host. The host may be partially
    /// updated.
    Commit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Render => "render",
            Self::Commit => "commit",
        })
    }
}

/// A host adapter call failed.
///
/// A render failure, or a commit failure before the host changed, drops the
/// work-in-progress tree and keeps the last committed tree as current. A
/// commit failure after the host changed promotes the new tree instead, minus
/// any node it could not place. Either way the next [`render`] or state
/// update starts over from the current tree.
///
/// [`render`]: crate::runtime::Runtime::render
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError<E> {
    /// The adapter rejected an operation.
    #[error("host adapter failed during {phase} at {fiber:?}: {error}")]
    Host {
        /// Phase in which the failure happened.
        phase: Phase,
        /// Fiber whose node was being created or mutated.
        fiber: FiberId,
        /// The adapter's error.
        error: E,
    },
}

impl<E> RenderError<E> {
    pub(crate) fn host(phase: Phase, fiber: FiberId, error: E) -> Self {
        Self::Host { phase, fiber, error }
    }

    /// The phase in which the error occurred.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Host { phase, .. } => *phase,
        }
    }

    /// The adapter's error.
    #[must_use]
    pub fn host_error(&self) -> &E {
        match self {
            Self::Host { error, .. } => error,
        }
    }
}
