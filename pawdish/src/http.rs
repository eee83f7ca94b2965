//! Outbound HTTP client construction.
//!
//! reqwest is built without a bundled TLS crypto provider, so one has to be installed process
//! wide before the first client is created. `main` does this at startup; [`client`] does it too
//! so library users and tests get a working client regardless.

use std::sync::Once;
use std::time::Duration;

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the aws-lc-rs rustls provider if no provider is installed yet.
pub fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Err means another provider won the race, which is fine
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    });
}

/// Build a client for calling third-party APIs.
pub fn client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    install_crypto_provider();
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pawdish/", env!("CARGO_PKG_VERSION")))
        .build()
}
