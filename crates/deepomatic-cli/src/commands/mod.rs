//! CLI command implementations

pub mod infer;
pub mod task;

use anyhow::{Context, Result};
use deepomatic_api::{Client, ClientConfig};

use crate::cli::ConnectionArgs;

/// Build the API client from flags, falling back to environment variables
pub fn client(args: &ConnectionArgs) -> Result<Client> {
    let mut builder = ClientConfig::builder().user_agent_prefix(concat!(
        "deepomatic-cli/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(host) = &args.host {
        builder = builder.host(host);
    }
    if let Some(api_key) = &args.api_key {
        builder = builder.api_key(api_key);
    }
    if let Some(app_id) = &args.app_id {
        builder = builder.app_id(app_id);
    }
    let config = builder.build().context("Invalid client configuration")?;
    Client::new(config).context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_from_flags() {
        let args = ConnectionArgs {
            host: Some("http://localhost:8000".to_string()),
            api_key: Some("key".to_string()),
            app_id: None,
        };
        let client = client(&args).unwrap();
        assert_eq!(client.config().host, "http://localhost:8000/");
        assert!(client.config().user_agent.starts_with("deepomatic-cli/"));
    }
}
