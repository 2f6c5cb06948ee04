use http_body_util::{combinators::BoxBody, BodyExt, Full, LengthLimitError, Limited};
use hyper::{
    body::{self, Body, Bytes},
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, ORIGIN, SERVER},
    Request,
    Response,
    StatusCode,
};
use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, error::Error as StdError, fs::File, io::BufReader, sync::Arc, time::Duration};
use derive_more::Debug;
use rustls::ServerConfig;
use rustls_pemfile::{certs, pkcs8_private_keys};
use hyper::service::service_fn;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder as HyperAutoBuilder,
};
use tokio_rustls::TlsAcceptor;
use tokio::net::TcpListener;
use crate::{
    servers::api::{self, ApiRequest},
    CoreError,
};

/// Largest request body read into memory.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct Server {
    pub quiet: bool,
    #[debug(skip)]
    pub rustls_config: Option<Arc<ServerConfig>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

impl Server {
    pub fn new(quiet: bool, tls_config: Option<TlsConfig>) -> Result<Self, CoreError> {
        let rustls_config = match &tls_config {
            Some(tls) => {
                info!("Loading rustls config: cert='{}', key='{}'", tls.cert_path, tls.key_path);
                Some(Arc::new(load_rustls_config(&tls.cert_path, &tls.key_path)?))
            }
            None => {
                debug!("No TLS configuration provided.");
                None
            }
        };

        Ok(Server {
            quiet,
            rustls_config,
        })
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.rustls_config.is_some()
    }

    pub fn scheme(&self) -> &'static str {
        if self.is_tls_enabled() { "https" } else { "http" }
    }
}

fn load_rustls_config(cert_path: &str, key_path: &str) -> Result<ServerConfig, CoreError> {
    debug!("Loading cert file from: {}", cert_path);
    let cert_file = File::open(cert_path)
        .map_err(|e| CoreError::IoError(format!("Failed to open cert file '{}': {}", cert_path, e)))?;
    let mut cert_reader = BufReader::new(cert_file);

    let cert_chain = certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CoreError::IoError(format!("Failed to read certificates from '{}': {}", cert_path, e)))?;

    if cert_chain.is_empty() {
        return Err(CoreError::ConfigParseError(format!("No certificates found in '{}'", cert_path)));
    }
    debug!("Found {} certificate(s) in {}", cert_chain.len(), cert_path);

    debug!("Loading private key file from: {}", key_path);
    let key_file = File::open(key_path)
        .map_err(|e| CoreError::IoError(format!("Failed to open key file '{}': {}", key_path, e)))?;
    let mut key_reader = BufReader::new(key_file);
    let private_key = pkcs8_private_keys(&mut key_reader)
        .next()
        .ok_or_else(|| CoreError::ConfigParseError(format!("No PKCS8 private keys found in '{}'", key_path)))?
        .map_err(|e| CoreError::IoError(format!("Failed to read private key from '{}': {}", key_path, e)))?;

    ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key.into())
        .map_err(|e| CoreError::ConfigParseError(format!("Failed to build rustls ServerConfig: {}", e)))
}

pub async fn handle_http_request(
    req: Request<body::Incoming>,
    server: Arc<Server>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let headers = req.headers().clone();
    let start_time = std::time::Instant::now();

    trace!("[Req: {} {}] Handling request.", method, path);

    let body = match read_body(req.into_body(), MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) if e.is::<LengthLimitError>() => {
            info!("[Req: {} {}] Body larger than {} bytes rejected", method, path, MAX_BODY_BYTES);
            return Ok(plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large."));
        }
        Err(e) => {
            error!("[Req: {} {}] Failed to collect request body: {}", method, path, e);
            return Ok(plain(StatusCode::INTERNAL_SERVER_ERROR, "Failed while reading request body."));
        }
    };

    let api_response = api::route(&ApiRequest {
        method: &method,
        path: &path,
        content_type: header_str(&headers, CONTENT_TYPE),
        origin: header_str(&headers, ORIGIN),
        body: &body,
    });

    let mut response = Response::new(full(api_response.body));
    *response.status_mut() = api_response.status;
    for (name, value) in api_response.headers {
        response.headers_mut().insert(name, value);
    }
    response.headers_mut().insert(SERVER, HeaderValue::from_static("calculator/HTTP"));

    if server.quiet {
        trace!("[Req: {} {}] Responded with status {}", method, path, response.status());
    } else {
        info!(
            "[Req: {} {}] Responded with status {} in {:?}",
            method,
            path,
            response.status(),
            start_time.elapsed()
        );
    }

    Ok(response)
}

fn plain(status: StatusCode, text: &'static str) -> Response<BoxBody<Bytes, hyper::Error>> {
    let mut response = Response::new(full(text));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response.headers_mut().insert(SERVER, HeaderValue::from_static("calculator/HTTP"));
    response
}

async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, Box<dyn StdError + Send + Sync>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    Ok(Limited::new(body, limit).collect().await?.to_bytes())
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Accepts connections on `listener` until the task is dropped.
pub async fn serve(listener: TcpListener, server: Arc<Server>) -> Result<(), CoreError> {
    let local_addr = listener
        .local_addr()
        .map_err(|e| CoreError::IoError(format!("Failed to read local address: {}", e)))?;
    info!("[HTTP] Listening on {}://{}/", server.scheme(), local_addr);

    loop {
        match listener.accept().await {
            Ok((tcp_stream, remote_addr)) => {
                trace!("[HTTP] Accepted from {}", remote_addr);
                let state_for_service = server.clone();
                let tls_config = server.rustls_config.clone();

                tokio::spawn(async move {
                    let executor = TokioExecutor::new();

                    let hyper_service = service_fn(move |req| {
                        handle_http_request(req, state_for_service.clone())
                    });

                    let result = match tls_config {
                        Some(tls_conf) => {
                            let acceptor = TlsAcceptor::from(tls_conf);
                            match acceptor.accept(tcp_stream).await {
                                Ok(tls_stream) => {
                                    trace!("[HTTP] TLS Handshake OK for {}", remote_addr);
                                    HyperAutoBuilder::new(executor)
                                        .serve_connection(TokioIo::new(tls_stream), hyper_service)
                                        .await
                                }
                                Err(e) => {
                                    error!("[HTTP] TLS Handshake error {}: {}", remote_addr, e);
                                    return;
                                }
                            }
                        }
                        None => {
                            HyperAutoBuilder::new(executor)
                                .serve_connection(TokioIo::new(tcp_stream), hyper_service)
                                .await
                        }
                    };

                    if let Err(err) = result {
                        let is_incomplete = err
                            .downcast_ref::<hyper::Error>()
                            .is_some_and(|he| he.is_incomplete_message());
                        if !is_incomplete {
                            error!("[HTTP] Conn error {}: {}", remote_addr, err);
                        }
                    }
                    trace!("[HTTP] Conn finished for {}", remote_addr);
                });
            }
            Err(e) => {
                error!("[HTTP] Accept error: {}. Pausing...", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
