pub mod dump;
pub mod fetch;
pub mod hash;

/// HTTP client shared by descriptor list loading and the engine.
pub(crate) fn http_client() -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .user_agent(crate::USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}
