//! Planning service client
//!
//! Provides the `PlanApi` seam, its reqwest implementation, and the
//! incremental decoder for the generation event stream.

pub mod client;
mod error;
mod http;
pub mod sse;

pub use client::{ByteStream, PlanApi};
pub use error::ApiError;
pub use http::{GenerateRequest, HttpPlanClient};
pub use sse::{DecoderState, SseDecoder, StreamSummary, consume_stream};
