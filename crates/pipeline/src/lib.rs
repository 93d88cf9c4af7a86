//! # Pipeline
//!
//! Frame Pipeline: capture at a fixed low resolution, dispatch by inference
//! mode, correlate results by `frame_id`, feed metrics and the overlay.

mod frame_pipeline;
mod store;

pub use frame_pipeline::{
    CapturedFrame, Dispatch, FramePipeline, PipelineConfig, PipelineStats, ResultOutcome,
};
pub use store::FrameStore;
