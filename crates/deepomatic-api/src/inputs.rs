//! Inference inputs
//!
//! Images are referenced by URL or embedded in the JSON body as a base64
//! data URI.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use deepomatic_core::WaitOptions;

use crate::error::{Error, Result};

const SUPPORTED_PROTOCOLS: [&str; 2] = ["http://", "https://"];
const DATA_URI_PREFIX: &str = "data:image/*;base64,";

/// Where the image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Value sent as `source`
    fn encode(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Bytes(bytes) => format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(bytes)),
        }
    }
}

/// Region of interest, in relative coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One image to run an inference on
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    source: ImageSource,
    bbox: Option<BBox>,
    polygon: Option<Vec<Point>>,
    crop_uniform_background: bool,
}

impl ImageInput {
    fn new(source: ImageSource) -> Self {
        Self {
            source,
            bbox: None,
            polygon: None,
            crop_uniform_background: false,
        }
    }

    /// Image fetched by the server; only `http://` and `https://` are accepted
    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if !SUPPORTED_PROTOCOLS.iter().any(|p| url.starts_with(p)) {
            return Err(Error::invalid_input(format!(
                "unsupported image URL '{}', expected http:// or https://",
                url
            )));
        }
        Ok(Self::new(ImageSource::Url(url)))
    }

    /// Raw encoded image (JPEG, PNG, ...)
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(ImageSource::Bytes(bytes.into()))
    }

    /// Base64 encoded image
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::invalid_input(format!("invalid base64 image: {}", e)))?;
        Ok(Self::from_bytes(bytes))
    }

    /// Image read from a local file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            Error::invalid_input(format!("cannot read image {}: {}", path.display(), e))
        })?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn with_bbox(mut self, bbox: BBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Restrict the inference to a polygon of at least three points
    pub fn with_polygon(mut self, polygon: Vec<Point>) -> Result<Self> {
        if polygon.len() < 3 {
            return Err(Error::invalid_input(format!(
                "a polygon needs at least 3 points, got {}",
                polygon.len()
            )));
        }
        self.polygon = Some(polygon);
        Ok(self)
    }

    pub fn with_crop_uniform_background(mut self, crop: bool) -> Self {
        self.crop_uniform_background = crop;
        self
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// `{"image": {...}}` entry of the `inputs` array
    pub fn to_json(&self) -> Value {
        let mut image = Map::new();
        image.insert("source".into(), Value::String(self.source.encode()));
        image.insert(
            "crop_uniform_background".into(),
            Value::Bool(self.crop_uniform_background),
        );
        if let Some(bbox) = &self.bbox {
            image.insert("bbox".into(), json!(bbox));
        }
        if let Some(polygon) = &self.polygon {
            image.insert("polygon".into(), json!(polygon));
        }
        json!({ "image": image })
    }
}

/// Inference request body: `extra` fields plus the `inputs` array
pub fn format_inputs(inputs: &[ImageInput], extra: &Map<String, Value>) -> Result<Value> {
    if inputs.is_empty() {
        return Err(Error::invalid_input("at least one input is required"));
    }
    let mut data = extra.clone();
    data.insert(
        "inputs".into(),
        Value::Array(inputs.iter().map(ImageInput::to_json).collect()),
    );
    Ok(Value::Object(data))
}

/// How an inference is submitted
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOptions {
    /// Wait for the task with these options, `None` to return the task at once
    pub wait: Option<WaitOptions>,
    /// Additional body fields (`output_layers`, `show_discarded`, ...)
    pub extra: Map<String, Value>,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            wait: Some(WaitOptions::single()),
            extra: Map::new(),
        }
    }
}

impl InferenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_wait(mut self) -> Self {
        self.wait = None;
        self
    }

    pub fn with_wait(mut self, options: WaitOptions) -> Self {
        self.wait = Some(options);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
