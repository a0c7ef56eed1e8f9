//! Network fetchers for remote link lists.
//!
//! `NetworkFetcher` picks a protocol client from the URL scheme: Gemini over
//! TLS with trust-on-first-use certificates, or HTTP(S) through reqwest.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};
use url::{Host, Url};

use crate::services::url_canon::url_scheme;
use crate::types::errors::FetchError;
use crate::types::settings::NetworkSettings;

pub const GEMINI_DEFAULT_PORT: u16 = 1965;

/// Longest Gemini response header: two status digits, a space, 1024 bytes of meta, CRLF.
const GEMINI_MAX_HEADER: usize = 1029;

/// Status of a completed request, in the terms of its protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Gemini(u8),
    Http(u16),
}

impl ResponseStatus {
    pub fn is_success(&self) -> bool {
        match self {
            ResponseStatus::Gemini(code) => (20..30).contains(code),
            ResponseStatus::Http(code) => (200..300).contains(code),
        }
    }
}

/// A response as delivered to the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: ResponseStatus,
    /// Gemini meta line or HTTP content type.
    pub meta: String,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Fetches the document at a URL.
#[async_trait]
pub trait LinkFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

// === Gemini ===

/// Accepts any certificate the first time a host is seen and pins it for
/// the rest of the session. Signatures are still verified.
#[derive(Debug)]
struct TrustOnFirstUse {
    provider: Arc<CryptoProvider>,
    known: Mutex<HashMap<String, Vec<u8>>>,
}

/// Host key a pinned certificate is stored under.
fn pin_key(server_name: &ServerName<'_>) -> String {
    match server_name {
        ServerName::DnsName(name) => name.as_ref().to_ascii_lowercase(),
        ServerName::IpAddress(addr) => std::net::IpAddr::from(addr.clone()).to_string(),
        other => format!("{:?}", other),
    }
}

impl ServerCertVerifier for TrustOnFirstUse {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let host = pin_key(server_name);
        let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);
        match known.get(&host) {
            Some(pinned) if pinned.as_slice() != end_entity.as_ref() => {
                warn!(host, "server certificate changed during session");
                Err(rustls::Error::General(
                    "certificate does not match the one seen earlier".to_string(),
                ))
            }
            Some(_) => Ok(ServerCertVerified::assertion()),
            None => {
                known.insert(host, end_entity.as_ref().to_vec());
                Ok(ServerCertVerified::assertion())
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Splits a raw Gemini response into status, meta and body.
pub fn parse_gemini_response(data: &[u8]) -> Result<FetchResponse, FetchError> {
    let search = &data[..data.len().min(GEMINI_MAX_HEADER)];
    let header_end = search
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| FetchError::InvalidResponse("missing response header".to_string()))?;
    let header = std::str::from_utf8(&data[..header_end])
        .map_err(|_| FetchError::InvalidResponse("header is not UTF-8".to_string()))?
        .trim_end_matches('\r');

    let code = header
        .get(..2)
        .and_then(|digits| digits.parse::<u8>().ok())
        .ok_or_else(|| FetchError::InvalidResponse(format!("bad status line: {}", header)))?;
    let meta = header.get(2..).unwrap_or_default().trim().to_string();

    Ok(FetchResponse {
        status: ResponseStatus::Gemini(code),
        meta,
        body: data[header_end + 1..].to_vec(),
    })
}

/// Gemini protocol client.
pub struct GeminiFetcher {
    connector: TlsConnector,
    max_response_bytes: usize,
    timeout: Option<Duration>,
}

impl GeminiFetcher {
    pub fn new(max_response_bytes: usize, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| FetchError::Tls(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(TrustOnFirstUse {
                provider,
                known: Mutex::new(HashMap::new()),
            }))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            max_response_bytes,
            timeout,
        })
    }

    async fn request(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let host = match parsed.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(FetchError::InvalidUrl(url.to_string())),
        };
        let port = parsed.port().unwrap_or(GEMINI_DEFAULT_PORT);

        let tcp = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let server_name = ServerName::try_from(host.clone())
            .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let mut stream = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| FetchError::Tls(e.to_string()))?;

        stream
            .write_all(format!("{}\r\n", url).as_bytes())
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let limit = u64::try_from(self.max_response_bytes.saturating_add(GEMINI_MAX_HEADER))
            .unwrap_or(u64::MAX);
        let mut data = Vec::new();
        match (&mut stream).take(limit).read_to_end(&mut data).await {
            Ok(_) => {}
            // Many servers close without a TLS close_notify.
            Err(e) if e.kind() == ErrorKind::UnexpectedEof && !data.is_empty() => {
                debug!(host, "connection closed without close_notify");
            }
            Err(e) => return Err(FetchError::Network(e.to_string())),
        }
        parse_gemini_response(&data)
    }
}

#[async_trait]
impl LinkFetcher for GeminiFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.request(url))
                .await
                .map_err(|_| FetchError::Timeout(url.to_string()))?,
            None => self.request(url).await,
        }
    }
}

// === HTTP ===

/// HTTP(S) client for link lists published on the web.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl HttpFetcher {
    pub fn new(settings: &NetworkSettings) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(settings.user_agent.clone());
        if settings.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(settings.request_timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self::with_client(client, settings.max_response_bytes))
    }

    pub(crate) fn with_client(client: reqwest::Client, max_response_bytes: usize) -> Self {
        Self {
            client,
            max_response_bytes,
        }
    }
}

#[async_trait]
impl LinkFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let to_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Network(e.to_string())
            }
        };
        let mut response = self.client.get(url).send().await.map_err(to_error)?;
        let status = ResponseStatus::Http(response.status().as_u16());
        let meta = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(to_error)? {
            let room = self.max_response_bytes.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() >= self.max_response_bytes {
                debug!(url, limit = self.max_response_bytes, "response truncated");
                break;
            }
        }
        Ok(FetchResponse { status, meta, body })
    }
}

// === NetworkFetcher ===

/// Dispatches each request to the client for its scheme.
pub struct NetworkFetcher {
    gemini: GeminiFetcher,
    http: HttpFetcher,
}

impl NetworkFetcher {
    pub fn new(settings: &NetworkSettings) -> Result<Self, FetchError> {
        let timeout = (settings.request_timeout_secs > 0)
            .then(|| Duration::from_secs(settings.request_timeout_secs));
        Ok(Self {
            gemini: GeminiFetcher::new(settings.max_response_bytes, timeout)?,
            http: HttpFetcher::new(settings)?,
        })
    }
}

#[async_trait]
impl LinkFetcher for NetworkFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        match url_scheme(url).as_deref() {
            Some("gemini") => self.gemini.fetch(url).await,
            Some("http") | Some("https") => self.http.fetch(url).await,
            Some(other) => Err(FetchError::UnsupportedScheme(other.to_string())),
            None => Err(FetchError::InvalidUrl(url.to_string())),
        }
    }
}
