use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use warden_core::CallContext;

/// Address of the remote client: the socket peer, or the first forwarded hop
/// when `server.trust_forwarded_for` is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIp(pub String);

/// Give every request a [`CallContext`] with the configured deadline.
///
/// The context's cancellation token fires when the request future is dropped,
/// e.g. because the client disconnected, so in-flight storage calls stop early.
pub async fn attach_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let cancellation = CancellationToken::new();
    let _cancel_on_drop = cancellation.clone().drop_guard();

    let ctx = CallContext::new()
        .with_timeout(state.request_timeout())
        .with_cancellation(cancellation);
    let ip = client_ip(&req, state.trust_forwarded_for());

    req.extensions_mut().insert(ctx);
    req.extensions_mut().insert(ClientIp(ip));
    next.run(req).await
}

/// Reject requests without a valid bearer token and record the caller in the context.
///
/// Must run inside [`attach_context`].
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()) else {
        return ApiError::MissingToken.into_response();
    };

    let caller = match state.tokens().parse_token(&token) {
        Ok(caller) => caller,
        Err(err) => {
            tracing::debug!(code = err.code(), "bearer token rejected");
            return ApiError::from(err).into_response();
        }
    };

    let ctx = req
        .extensions_mut()
        .remove::<CallContext>()
        .unwrap_or_default();
    let identity = CallContext::for_caller(&caller);
    req.extensions_mut().insert(merge_identity(ctx, identity));
    tracing::debug!(user_id = %caller.user_id, role = %caller.role, "session attached");

    next.run(req).await
}

/// Copy the operator fields of `identity` into `ctx`, keeping its deadline and cancellation.
fn merge_identity(mut ctx: CallContext, identity: CallContext) -> CallContext {
    for key in [warden_core::OPERATOR_ID, warden_core::OPERATOR_ROLE] {
        if let Some(values) = identity.get(key) {
            ctx.insert(key, values.to_vec());
        }
    }
    ctx
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Socket peer address. The first hop of `x-forwarded-for` is only taken when
/// `trust_forwarded_for` is set, since any client can send that header.
fn client_ip(req: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);
    }

    fn request_from_peer(forwarded: Option<&str>) -> Request {
        let mut builder = Request::builder();
        if let Some(forwarded) = forwarded {
            builder = builder.header("x-forwarded-for", forwarded);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        req
    }

    #[test]
    fn test_client_ip_ignores_forwarded_by_default() {
        let req = request_from_peer(Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&req, false), "192.0.2.1");
    }

    #[test]
    fn test_client_ip_trusted_forwarded_first_hop() {
        let req = request_from_peer(Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&req, true), "203.0.113.7");

        let req = request_from_peer(Some(" "));
        assert_eq!(client_ip(&req, true), "192.0.2.1");
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let req = request_from_peer(None);
        assert_eq!(client_ip(&req, false), "192.0.2.1");
        assert_eq!(client_ip(&req, true), "192.0.2.1");

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req, false), "");
    }
}
