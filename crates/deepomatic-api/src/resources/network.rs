//! Networks: trained models usable for inference

use crate::config::RequestTimeout;
use crate::http::RequestOptions;

use super::{Arg, Creatable, Deletable, Inferable, Listable, Resource, Template, Updatable};

/// `/networks/`
#[derive(Debug, Clone, Copy)]
pub struct Network;

impl Resource for Network {
    const NAME: &'static str = "Network";

    fn base_uri(public: bool) -> &'static str {
        if public {
            "/networks/public/"
        } else {
            "/networks/"
        }
    }

    fn template() -> Template {
        &[
            ("name", Arg::Required),
            ("description", Arg::Optional),
            ("metadata", Arg::Optional),
            ("framework", Arg::Immutable),
            ("preprocessing", Arg::Immutable),
            ("postprocessings", Arg::OptionalImmutable),
        ]
    }
}

impl Listable for Network {}

impl Creatable for Network {
    /// Network uploads are large: no transport retry and a long timeout
    fn create_options() -> RequestOptions {
        RequestOptions::new()
            .without_retry()
            .with_timeout(RequestTimeout::SLOW)
    }
}

impl Updatable for Network {}
impl Deletable for Network {}
impl Inferable for Network {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetrySetting;
    use crate::resources::ResourceId;

    #[test]
    fn test_uris() {
        assert_eq!(Network::uri(None, false, None), "/networks/");
        assert_eq!(
            Network::uri(Some(&ResourceId::from("imagenet-inception-v3")), false, Some("inference")),
            "/networks/public/imagenet-inception-v3/inference"
        );
    }

    #[test]
    fn test_create_options() {
        let options = Network::create_options();
        assert_eq!(options.retry, RetrySetting::Disabled);
        assert_eq!(options.timeout, Some(RequestTimeout::SLOW));
    }
}
