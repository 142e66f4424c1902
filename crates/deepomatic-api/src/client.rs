//! Client facade

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::HttpHelper;
use crate::resources::{Network, RecognitionSpec, RecognitionVersion, Resources, Tasks};

/// Entry point of the API
///
/// ```no_run
/// use deepomatic_api::Client;
///
/// let client = Client::from_env()?;
/// let task = client.tasks().retrieve(42)?;
/// println!("{}", task);
/// # Ok::<(), deepomatic_api::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    http: Arc<HttpHelper>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: Arc::new(HttpHelper::new(config)?),
        })
    }

    /// Client configured from `DEEPOMATIC_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        self.http.config()
    }

    pub fn http(&self) -> &HttpHelper {
        &self.http
    }

    pub fn tasks(&self) -> Tasks {
        Tasks::new(Arc::clone(&self.http))
    }

    pub fn networks(&self) -> Resources<Network> {
        Resources::new(Arc::clone(&self.http))
    }

    pub fn recognition_specs(&self) -> Resources<RecognitionSpec> {
        Resources::new(Arc::clone(&self.http))
    }

    pub fn recognition_versions(&self) -> Resources<RecognitionVersion> {
        Resources::new(Arc::clone(&self.http))
    }
}
