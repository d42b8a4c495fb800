// SPDX-License-Identifier: MIT
//
// One complete edit pipeline: parse input bytes, apply a single edit
// request, serialize, report progress along the way and honor
// cancellation between checkpoints. Runs are CPU-bound and synchronous at
// the core; the async entry point offloads to a blocking worker thread so
// callers never stall an executor.

pub mod cancel;
pub mod pipeline;
pub mod progress;
pub mod request;

pub use cancel::CancelToken;
pub use pipeline::EditPipeline;
pub use progress::{ProgressCallback, ProgressReporter};
pub use request::EditRequest;
