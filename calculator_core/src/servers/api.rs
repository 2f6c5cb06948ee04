//! Routing for the browser front-end, kept free of connection handling so it
//! can be exercised without a socket.

use hyper::{
    body::Bytes,
    header::{
        HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, VARY,
    },
    Method, StatusCode,
};
use log::debug;
use serde::Serialize;
use serde_json::Value;
use crate::language::evaluate;

pub const INDEX_HTML: &str = include_str!("../../static/calculator.html");

const API_PREFIX: &str = "/api/";
const JSON: &str = "application/json; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

#[derive(Debug, Serialize, PartialEq)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    fn ok() -> Self {
        Reply { ok: true, result: None, error: None }
    }

    fn value(result: f64) -> Self {
        Reply { ok: true, result: Some(result), error: None }
    }

    fn error(message: impl Into<String>) -> Self {
        Reply { ok: false, result: None, error: Some(message.into()) }
    }
}

#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Bytes,
}

impl ApiResponse {
    fn new(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        ApiResponse {
            status,
            headers: vec![(CONTENT_TYPE, HeaderValue::from_static(content_type))],
            body: body.into(),
        }
    }

    fn json(status: StatusCode, reply: &Reply) -> Self {
        // A struct of a bool, a float and a string always serialises.
        let body = serde_json::to_vec(reply).unwrap_or_default();
        ApiResponse::new(status, JSON, body)
    }

    fn empty(status: StatusCode) -> Self {
        ApiResponse {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    fn not_found() -> Self {
        ApiResponse::new(StatusCode::NOT_FOUND, TEXT, "Not found")
    }

    pub fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

pub struct ApiRequest<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub content_type: Option<&'a str>,
    pub origin: Option<&'a str>,
    pub body: &'a [u8],
}

pub fn route(request: &ApiRequest<'_>) -> ApiResponse {
    let mut response = match (request.method, request.path) {
        (&Method::GET, "/") | (&Method::GET, "/calculator.html") => {
            ApiResponse::new(StatusCode::OK, HTML, INDEX_HTML)
        }
        (&Method::GET, "/api/health") => ApiResponse::json(StatusCode::OK, &Reply::ok()),
        (&Method::POST, "/api/eval") => eval(request),
        (&Method::OPTIONS, path) if path.starts_with(API_PREFIX) => {
            ApiResponse::empty(StatusCode::NO_CONTENT)
        }
        _ => ApiResponse::not_found(),
    };

    if request.path.starts_with(API_PREFIX) {
        add_cors_headers(&mut response, request.origin);
    }

    response
}

fn add_cors_headers(response: &mut ApiResponse, origin: Option<&str>) {
    let allow_origin = origin
        .and_then(|o| HeaderValue::from_str(o).ok())
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    response.headers.push((ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin));
    response.headers.push((VARY, HeaderValue::from_static("Origin")));
    response.headers.push((
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    ));
    response.headers.push((
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    ));
}

enum Extracted {
    Expression(String),
    Missing,
    BadJson,
}

fn media_type(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

fn extract_expression(request: &ApiRequest<'_>) -> Extracted {
    match media_type(request.content_type).as_str() {
        "application/json" => {
            let body = if request.body.is_empty() { b"{}".as_slice() } else { request.body };
            match serde_json::from_slice::<Value>(body) {
                Ok(value) => match value.get("expr").and_then(Value::as_str) {
                    Some(expr) => Extracted::Expression(expr.to_string()),
                    None => Extracted::Missing,
                },
                Err(_) => Extracted::BadJson,
            }
        }
        "application/x-www-form-urlencoded" => url::form_urlencoded::parse(request.body)
            .find(|(key, _)| key == "expr")
            .map_or(Extracted::Missing, |(_, value)| Extracted::Expression(value.into_owned())),
        _ => Extracted::Missing,
    }
}

fn eval(request: &ApiRequest<'_>) -> ApiResponse {
    let expr = match extract_expression(request) {
        Extracted::Expression(expr) => expr,
        Extracted::Missing => {
            return ApiResponse::json(StatusCode::BAD_REQUEST, &Reply::error("Missing 'expr'"));
        }
        Extracted::BadJson => {
            return ApiResponse::json(StatusCode::BAD_REQUEST, &Reply::error("Bad JSON"));
        }
    };

    match evaluate(&expr) {
        Ok(value) => {
            debug!("Evaluated {:?} to {}", expr, value);
            ApiResponse::json(StatusCode::OK, &Reply::value(value))
        }
        Err(e) => {
            debug!("Evaluation of {:?} failed: {}", expr, e);
            ApiResponse::json(StatusCode::OK, &Reply::error(e.to_string()))
        }
    }
}
