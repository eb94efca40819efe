use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its `.secrets` subdirectory and an initial `config.json` that
/// points at `api_url`.
///
/// # Arguments
/// - `home` - The directory that will be the root of data directory, e.g. `$HOME/fintrack`
/// - `api_url` - The base URL of the finance API, e.g. `http://localhost:3333/api`
///
/// # Errors
/// - Returns a `Config` error if the URL is invalid or any file operation fails.
pub async fn init(home: &Path, api_url: &str) -> Result<Out<()>> {
    let config = Config::create(home, api_url)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the fintrack directory at {}, next run 'fintrack login'",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("fintrack");
        let out = init(&home, "http://localhost:3333/api").await.unwrap();
        assert!(out.message().contains("fintrack login"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.api_url(), "http://localhost:3333/api");
    }

    #[tokio::test]
    async fn test_init_bad_url() {
        let dir = TempDir::new().unwrap();
        let err = init(dir.path(), "not a url").await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Config));
    }
}
