use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response},
    middleware::Next,
};

/// Add security headers to every response.
///
/// Headers added:
/// - X-Content-Type-Options: nosniff
/// - X-Frame-Options: DENY
/// - Content-Security-Policy: Restrict resource loading
/// - Referrer-Policy: no-referrer
/// - Cache-Control: no-store on API responses, which carry patient data
pub async fn add_security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let is_api = request.uri().path().starts_with("/api/consultations");
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    // Swagger UI needs inline scripts and styles
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data:; \
             frame-ancestors 'none'; \
             base-uri 'self'",
        ),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    if is_api {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    headers.remove(header::SERVER);

    response
}
