//! # deepomatic-api
//!
//! Blocking client for the Deepomatic computer-vision API:
//! - Configuration from code or `DEEPOMATIC_*` environment variables
//! - HTTP transport with status classification and transport-level retries
//! - Networks, recognition specifications and versions, inference
//! - Task retrieval and completion tracking backed by `deepomatic-core`

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod inputs;
pub mod resources;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder, RequestTimeout};
pub use error::{Error, HttpError, Result};
pub use http::{HttpRetry, RequestOptions};
pub use inputs::{BBox, ImageInput, InferenceOptions, Point};
pub use resources::{Inference, Object, ResourceId, ResourcePage};

pub use deepomatic_core::{BatchOutcome, Task, TaskError, TaskId, TaskStatus, WaitOptions};
