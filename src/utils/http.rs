// src/utils/http.rs

//! HTTP client utilities.

use reqwest::{Client, Response};

use crate::error::{AppError, Result};
use crate::models::ScraperConfig;

/// Create the process-wide asynchronous HTTP client.
pub fn create_async_client(config: &ScraperConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Turn a non-2xx response into an error.
pub fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::Status {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_from_defaults() {
        assert!(create_async_client(&ScraperConfig::default()).is_ok());
    }
}
