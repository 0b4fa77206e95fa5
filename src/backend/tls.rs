use std::sync::Arc;

use futures_rustls::{TlsConnector, client::TlsStream};
use once_cell::sync::OnceCell;
use rustls::{ClientConfig, RootCertStore, pki_types::ServerName};

use super::Connection;
use crate::{Error, Result};

/// Shared client configuration: webpki roots plus the platform store.
fn client_config() -> Result<Arc<ClientConfig>> {
    static CONFIG: OnceCell<Arc<ClientConfig>> = OnceCell::new();

    CONFIG
        .get_or_try_init(|| -> Result<Arc<ClientConfig>> {
            let mut roots = RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            };
            // Unreadable platform certificates are skipped.
            let native = rustls_native_certs::load_native_certs();
            let _ = roots.add_parsable_certificates(native.certs);

            let provider = Arc::new(rustls::crypto::ring::default_provider());
            let config = ClientConfig::builder_with_provider(provider)
                .with_safe_default_protocol_versions()
                .map_err(Error::tls)?
                .with_root_certificates(roots)
                .with_no_client_auth();
            Ok(Arc::new(config))
        })
        .cloned()
}

pub(super) async fn handshake(connection: Connection, host: &str) -> Result<TlsStream<Connection>> {
    let server_name = ServerName::try_from(host.to_owned()).map_err(Error::tls)?;
    TlsConnector::from(client_config()?)
        .connect(server_name, connection)
        .await
        .map_err(Error::tls)
}
