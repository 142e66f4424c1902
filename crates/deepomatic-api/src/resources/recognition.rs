//! Recognition specifications and their versions

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Result;

use super::{
    Arg, Creatable, Deletable, Inferable, Listable, Object, Resource, ResourcePage, Template,
    Updatable,
};

/// `/recognition/specs/`: the output contract of a recognition model
#[derive(Debug, Clone, Copy)]
pub struct RecognitionSpec;

impl Resource for RecognitionSpec {
    const NAME: &'static str = "RecognitionSpec";

    fn base_uri(public: bool) -> &'static str {
        if public {
            "/recognition/public/"
        } else {
            "/recognition/specs/"
        }
    }

    fn template() -> Template {
        &[
            ("name", Arg::Required),
            ("description", Arg::Optional),
            ("metadata", Arg::Optional),
            ("outputs", Arg::Immutable),
            ("current_version_id", Arg::UpdateOnly),
        ]
    }
}

impl Listable for RecognitionSpec {}
impl Creatable for RecognitionSpec {}
impl Updatable for RecognitionSpec {}
impl Deletable for RecognitionSpec {}
impl Inferable for RecognitionSpec {}

impl Object<RecognitionSpec> {
    /// Versions implementing this specification
    pub fn versions(&self, params: &Map<String, Value>) -> Result<ResourcePage<RecognitionVersion>> {
        ResourcePage::fetch(Arc::clone(self.http()), &self.uri(Some("versions")), params)
    }
}

/// `/recognition/versions/`: a network bound to a specification
#[derive(Debug, Clone, Copy)]
pub struct RecognitionVersion;

impl Resource for RecognitionVersion {
    const NAME: &'static str = "RecognitionVersion";

    fn base_uri(_public: bool) -> &'static str {
        "/recognition/versions/"
    }

    fn template() -> Template {
        &[
            ("spec_id", Arg::Required),
            ("network_id", Arg::Required),
            ("post_processings", Arg::Required),
        ]
    }
}

impl Listable for RecognitionVersion {}
impl Creatable for RecognitionVersion {}
impl Deletable for RecognitionVersion {}
impl Inferable for RecognitionVersion {}
