/// SOAP adapter
///
/// Owns the fixed `/soap` path on the shared listener:
///
/// - `POST /soap` runs an envelope through the operation dispatch
/// - `GET /soap?wsdl` serves the contract document verbatim
/// - `OPTIONS /soap` short-circuits pre-flight negotiation
///
/// SOAP tooling tends to do its own transport handling, so every response
/// from this module carries explicit permissive CORS headers and a
/// `text/xml` content type rather than relying on the REST-side layers.

pub mod envelope;
pub mod service;

use crate::app::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

/// WSDL contract, embedded at compile time and served verbatim
const WSDL: &str = include_str!("user.wsdl");

fn apply_soap_headers(headers: &mut HeaderMap) {
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("POST, GET, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type, SOAPAction, Authorization"),
    );
}

/// Serves the WSDL under the `?wsdl` query marker
///
/// `GET /soap` without the marker is not an operation of this service and
/// answers 404.
pub async fn serve_wsdl(Query(query): Query<HashMap<String, String>>) -> Response {
    if !query.contains_key("wsdl") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut response =
        ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], WSDL).into_response();
    apply_soap_headers(response.headers_mut());
    response
}

/// Answers pre-flight negotiation with an empty acknowledgement
pub async fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    apply_soap_headers(response.headers_mut());
    response
}

/// Processes a SOAP envelope
///
/// The body is handed to the operation dispatch as-is; malformed envelopes
/// (including invalid UTF-8) come back as Client faults, never as bare
/// HTTP errors.
pub async fn handle_envelope(State(state): State<AppState>, body: axum::body::Bytes) -> Response {
    let body = String::from_utf8_lossy(&body);
    let (status, xml) = service::process(&state.directory, &body).await;

    let mut response = (
        status,
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        xml,
    )
        .into_response();
    apply_soap_headers(response.headers_mut());
    response
}
