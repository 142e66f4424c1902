//! Inference command

use std::time::Duration;

use anyhow::{Context, Result};

use deepomatic_api::{Client, ImageInput, Inference, InferenceOptions, ResourceId, WaitOptions};

use super::task::task_json;
use crate::cli::InferArgs;
use crate::output;

pub fn run(args: InferArgs, client: &Client, quiet: bool) -> Result<()> {
    let input = image_input(&args.image)?.with_crop_uniform_background(args.crop_uniform_background);

    let mut options = InferenceOptions::new();
    options = if args.no_wait {
        options.no_wait()
    } else {
        options.with_wait(WaitOptions::single().with_timeout(Duration::from_secs(args.timeout)))
    };
    if !args.output_layers.is_empty() {
        options = options.with_param("output_layers", args.output_layers.clone());
    }

    let network = client.networks().object(parse_resource_id(&args.network));
    let pb = output::spinner(&format!("Running inference on {}", args.network), quiet || args.no_wait);
    let result = network.inference(&[input], &options);
    pb.finish_and_clear();

    match result.with_context(|| format!("Inference on network {} failed", args.network))? {
        Inference::Submitted(task) => output::json(&task_json(&task)?),
        Inference::Completed(data) => output::json(&data),
    }
}

/// URLs are passed to the server, anything else is read from disk
fn image_input(image: &str) -> Result<ImageInput> {
    if image.starts_with("http://") || image.starts_with("https://") {
        Ok(ImageInput::from_url(image)?)
    } else {
        ImageInput::from_file(image).with_context(|| format!("Failed to load image {}", image))
    }
}

/// Numeric ids address private networks, names address public ones
fn parse_resource_id(id: &str) -> ResourceId {
    id.parse::<u64>()
        .map(ResourceId::from)
        .unwrap_or_else(|_| ResourceId::from(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_id() {
        assert_eq!(parse_resource_id("12"), ResourceId::Number(12));
        assert!(parse_resource_id("imagenet-inception-v3").is_public());
    }

    #[test]
    fn test_image_input_from_url() {
        assert!(image_input("https://example.com/dog.jpg").is_ok());
        assert!(image_input("/nonexistent/dog.jpg").is_err());
    }
}
