//! Caller identity as forwarded by the authenticating gateway.
//!
//! The gateway verifies tokens and passes the outcome in `X-Role`,
//! `X-Api-Access`, `X-Customer-Id` and `X-Store-Id`. This module only turns
//! those headers into typed claims.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::access::{Claims, RawClaims};
use crate::errors::AppError;

pub const ROLE_HEADER: &str = "x-role";
pub const API_ACCESS_HEADER: &str = "x-api-access";
pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub const STORE_ID_HEADER: &str = "x-store-id";

/// Verified claims of the caller.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Claims);

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(caller_from_headers(req.headers()))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| AppError::Unauthorized(format!("{name} header is not valid text")))
        })
        .transpose()
}

fn uuid_header(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, AppError> {
    header(headers, name)?
        .filter(|value| !value.is_empty())
        .map(|value| {
            Uuid::parse_str(value)
                .map_err(|_| AppError::Unauthorized(format!("{name} header is not a valid id")))
        })
        .transpose()
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, AppError> {
    let role = header(headers, ROLE_HEADER)?
        .ok_or_else(|| AppError::Unauthorized("missing caller identity".to_string()))?;

    let raw = RawClaims {
        role: role.to_string(),
        api_access_granted: header(headers, API_ACCESS_HEADER)?
            .is_some_and(|value| value.eq_ignore_ascii_case("true")),
        customer_id: uuid_header(headers, CUSTOMER_ID_HEADER)?,
        store_id: uuid_header(headers, STORE_ID_HEADER)?,
    };

    Ok(Caller(Claims::try_from(raw)?))
}
