pub type HttpResult<E = std::io::Error> = Result<HttpResponse, E>;

pub type HttpResponse =
    hyper::Response<http_body_util::combinators::BoxBody<hyper::body::Bytes, std::io::Error>>;

pub async fn run_server(
    addr: std::net::SocketAddr,
    cache: blelink_shell::ShellCache,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let cache = std::sync::Arc::new(cache);
    tracing::info!(
        "Listening on http://{addr}, cache {} with {} entries",
        cache.name(),
        cache.len()
    );
    loop {
        tokio::select! {
            val = listener.accept() => {
                match val {
                    Ok((stream, _addr)) => {
                        tokio::task::spawn(handle_connection(
                            stream, cache.clone()
                        ));
                    },
                    Err(e) => {
                        tracing::error!("failed to accept: {e:?}");
                        continue;
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    stream: tokio::net::TcpStream,
    cache: std::sync::Arc<blelink_shell::ShellCache>,
) {
    let io = hyper_util::rt::TokioIo::new(stream);

    let builder =
        hyper_util::server::conn::auto::Builder::new(hyper_util::rt::tokio::TokioExecutor::new());
    tokio::pin! {
        let conn = builder
            .serve_connection(
                io,
                hyper::service::service_fn(|r| handle_request(r, cache.clone())),
            );
    }

    if let Err(e) = tokio::select! {
        r = &mut conn => r,
    } {
        tracing::warn!("connection error: {e:?}");
    }
}

async fn handle_request(
    r: hyper::Request<hyper::body::Incoming>,
    cache: std::sync::Arc<blelink_shell::ShellCache>,
) -> HttpResult {
    if r.method() != hyper::Method::GET && r.method() != hyper::Method::HEAD {
        return bytes_to_resp(
            b"method not allowed".to_vec(),
            hyper::StatusCode::METHOD_NOT_ALLOWED,
        );
    }

    let path = r.uri().path();
    match cache.fetch(path).await {
        Ok((asset, source)) => {
            tracing::debug!(path, ?source, "served");
            let mut resp = body_to_resp(asset.bytes, hyper::StatusCode::OK)?;
            resp.headers_mut().insert(
                hyper::header::CONTENT_TYPE,
                hyper::header::HeaderValue::from_static(asset.content_type),
            );
            Ok(resp)
        }
        Err(blelink_shell::FetchError::NotFound(p)) => blelink_shell::not_found!("not found: {p}"),
        Err(blelink_shell::FetchError::InvalidPath(p)) => {
            blelink_shell::bad_request!("invalid path: {p}")
        }
        Err(e) => {
            tracing::error!("{e}");
            blelink_shell::server_error!("{e}")
        }
    }
}

pub fn server_error_(s: String) -> HttpResult {
    bytes_to_resp(s.into_bytes(), hyper::StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn bytes_to_resp(bytes: Vec<u8>, status: hyper::StatusCode) -> HttpResult {
    body_to_resp(hyper::body::Bytes::from(bytes), status)
}

fn body_to_resp(bytes: hyper::body::Bytes, status: hyper::StatusCode) -> HttpResult {
    use http_body_util::BodyExt;

    let mut r = hyper::Response::new(
        http_body_util::Full::new(bytes)
            .map_err(|e| match e {})
            .boxed(),
    );
    *r.status_mut() = status;
    Ok(r)
}

pub fn not_found_(m: String) -> HttpResult {
    bytes_to_resp(m.into_bytes(), hyper::StatusCode::NOT_FOUND)
}

pub fn bad_request_(m: String) -> HttpResult {
    bytes_to_resp(m.into_bytes(), hyper::StatusCode::BAD_REQUEST)
}

#[macro_export]
macro_rules! server_error {
    ($($t:tt)*) => {{
        blelink_shell::http::server_error_(format!($($t)*))
    }};
}

#[macro_export]
macro_rules! not_found {
    ($($t:tt)*) => {{
        blelink_shell::http::not_found_(format!($($t)*))
    }};
}

#[macro_export]
macro_rules! bad_request {
    ($($t:tt)*) => {{
        blelink_shell::http::bad_request_(format!($($t)*))
    }};
}
