//! HTTP/2 connection driver with server push.
//!
//! hyper's server does not expose push promises, so HTTP/2 connections are
//! driven with `h2` directly. Each stream is turned into an axum request,
//! tagged with a [`PushCapability`] bound to that stream, and run through
//! the router. Every push promise issued by the handler becomes a synthetic
//! GET that is run through the same router in its own task, its response
//! written into the pushed stream.
//!
//! Promised stream ids are allocated when a promise is queued, but the
//! `PUSH_PROMISE` frames of different initiating streams are flushed in
//! scheduling order. Two triggers pushing at once on one connection can put
//! the ids on the wire out of order, which the client answers with a
//! connection error. A [`PushGate`] per connection lets one trigger push at a
//! time; pushes from a trigger that finds the gate taken fail individually.

use axum::{
    body::{Body, HttpBody},
    http::{
        header, uri::Authority, uri::Scheme, HeaderMap, Method, Request, Response, Uri,
    },
    Router,
};
use bytes::Bytes;
use futures::future::poll_fn;
use h2::server::{SendPushedResponse, SendResponse};
use h2::{Reason, RecvStream, SendStream};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tower::ServiceExt;

use crate::push::{PushCapability, PushError, ResourcePusher};

/// Serve one HTTP/2 connection until the peer goes away.
pub async fn serve_connection<I>(io: I, app: Router) -> Result<(), h2::Error>
where
    I: AsyncRead + AsyncWrite + Unpin,
{
    let mut connection = h2::server::handshake(io).await?;
    let gate = Arc::new(PushGate::default());

    while let Some(result) = connection.accept().await {
        let (request, respond) = result?;
        let app = app.clone();
        let gate = gate.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_stream(request, respond, app, gate).await {
                tracing::debug!("HTTP/2 stream error: {}", e);
            }
        });
    }

    Ok(())
}

async fn handle_stream(
    request: Request<RecvStream>,
    respond: SendResponse<Bytes>,
    app: Router,
    gate: Arc<PushGate>,
) -> Result<(), h2::Error> {
    let (mut parts, recv) = request.into_parts();

    let responder = Arc::new(Mutex::new(Some(respond)));
    let authority = parts.uri.authority().cloned().or_else(|| {
        parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.parse().ok())
    });
    // Kept until the response is written so a claimed gate stays held for
    // the whole trigger.
    let pusher = Arc::new(StreamPusher::new(
        responder.clone(),
        parts.uri.scheme().cloned().unwrap_or(Scheme::HTTPS),
        authority,
        app.clone(),
        gate,
    ));
    parts
        .extensions
        .insert(PushCapability::new(pusher.clone()));

    let request = Request::from_parts(parts, recv_body(recv));
    let response = match app.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    // The handler has returned, so no pusher can still be holding the lock.
    let Some(mut respond) = responder.lock().take() else {
        return Ok(());
    };

    let (parts, body) = response.into_parts();
    let end_of_stream = body.is_end_stream();
    let mut stream = respond.send_response(response_head(parts), end_of_stream)?;
    if !end_of_stream {
        write_body(&mut stream, body).await?;
    }
    drop(pusher);
    Ok(())
}

/// Lets one initiating stream per connection push at a time.
#[derive(Default)]
struct PushGate {
    busy: AtomicBool,
}

impl PushGate {
    fn try_acquire(self: &Arc<Self>) -> Option<Arc<PushPermit>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Arc::new(PushPermit(self.clone())))
    }
}

/// Held by a trigger and each of its pushed streams; the gate reopens when
/// the last clone drops.
struct PushPermit(Arc<PushGate>);

impl Drop for PushPermit {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::Release);
    }
}

/// Claim state of one initiating stream, decided on its first push.
enum GateClaim {
    Unclaimed,
    Held(Arc<PushPermit>),
    Denied,
}

/// Pushes on behalf of one initiating stream.
struct StreamPusher {
    responder: Arc<Mutex<Option<SendResponse<Bytes>>>>,
    scheme: Scheme,
    authority: Option<Authority>,
    app: Router,
    gate: Arc<PushGate>,
    claim: Mutex<GateClaim>,
}

impl StreamPusher {
    fn new(
        responder: Arc<Mutex<Option<SendResponse<Bytes>>>>,
        scheme: Scheme,
        authority: Option<Authority>,
        app: Router,
        gate: Arc<PushGate>,
    ) -> Self {
        Self {
            responder,
            scheme,
            authority,
            app,
            gate,
            claim: Mutex::new(GateClaim::Unclaimed),
        }
    }

    /// All pushes of one trigger share the outcome of its first claim.
    fn permit(&self, target: &str) -> Result<Arc<PushPermit>, PushError> {
        let mut claim = self.claim.lock();
        if let GateClaim::Unclaimed = *claim {
            *claim = match self.gate.try_acquire() {
                Some(permit) => GateClaim::Held(permit),
                None => GateClaim::Denied,
            };
        }
        match &*claim {
            GateClaim::Held(permit) => Ok(permit.clone()),
            _ => Err(PushError::ConnectionBusy {
                target: target.to_string(),
            }),
        }
    }

    fn push_uri(&self, target: &str) -> Result<Uri, PushError> {
        let invalid = |reason: String| PushError::InvalidTarget {
            target: target.to_string(),
            reason,
        };

        let authority = self
            .authority
            .clone()
            .ok_or_else(|| invalid("initiating request has no authority".to_string()))?;

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(authority)
            .path_and_query(target)
            .build()
            .map_err(|e| invalid(e.to_string()))
    }
}

impl ResourcePusher for StreamPusher {
    fn push(&self, target: &str) -> Result<(), PushError> {
        let uri = self.push_uri(target)?;
        let promise = Request::builder()
            .method(Method::GET)
            .uri(uri.clone())
            .body(())
            .map_err(|e| PushError::InvalidTarget {
                target: target.to_string(),
                reason: e.to_string(),
            })?;
        let permit = self.permit(target)?;

        let pushed = {
            let mut responder = self.responder.lock();
            let respond = responder.as_mut().ok_or(PushError::StreamClosed)?;
            respond
                .push_request(promise)
                .map_err(|source| PushError::Refused {
                    target: target.to_string(),
                    source,
                })?
        };

        let app = self.app.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_pushed(pushed, uri.clone(), app).await {
                tracing::debug!("Pushed stream for {} failed: {}", uri.path(), e);
            }
            drop(permit);
        });

        Ok(())
    }
}

/// Run the synthetic request for a promised resource and send its response.
async fn serve_pushed(
    mut pushed: SendPushedResponse<Bytes>,
    uri: Uri,
    app: Router,
) -> Result<(), h2::Error> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .map_err(|_| h2::Error::from(Reason::INTERNAL_ERROR))?;

    let response = match app.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let (parts, body) = response.into_parts();
    let end_of_stream = body.is_end_stream();
    let mut stream = pushed.send_response(response_head(parts), end_of_stream)?;
    if !end_of_stream {
        write_body(&mut stream, body).await?;
    }
    Ok(())
}

fn recv_body(recv: RecvStream) -> Body {
    let chunks = futures::stream::unfold(Some(recv), |state| async move {
        let mut recv = state?;
        match recv.data().await? {
            Ok(chunk) => {
                if let Err(e) = recv.flow_control().release_capacity(chunk.len()) {
                    tracing::debug!("Failed to release HTTP/2 capacity: {}", e);
                }
                Some((Ok::<_, h2::Error>(chunk), Some(recv)))
            }
            Err(e) => Some((Err(e), None)),
        }
    });
    Body::from_stream(chunks)
}

fn response_head(parts: axum::http::response::Parts) -> Response<()> {
    let mut head = Response::from_parts(parts, ());
    strip_connection_headers(head.headers_mut());
    head
}

/// HTTP/2 forbids connection-specific header fields.
fn strip_connection_headers(headers: &mut HeaderMap) {
    for name in [
        header::CONNECTION,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
        header::HeaderName::from_static("keep-alive"),
        header::HeaderName::from_static("proxy-connection"),
    ] {
        headers.remove(name);
    }
}

async fn write_body(stream: &mut SendStream<Bytes>, mut body: Body) -> Result<(), h2::Error> {
    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("Response body error: {}", e);
                stream.send_reset(Reason::INTERNAL_ERROR);
                return Ok(());
            }
        };

        match frame.into_data() {
            Ok(data) => send_data(stream, data).await?,
            Err(frame) => {
                if let Ok(trailers) = frame.into_trailers() {
                    return stream.send_trailers(trailers);
                }
            }
        }
    }

    stream.send_data(Bytes::new(), true)
}

/// Send `data` honoring the peer's flow-control window.
async fn send_data(stream: &mut SendStream<Bytes>, mut data: Bytes) -> Result<(), h2::Error> {
    while !data.is_empty() {
        stream.reserve_capacity(data.len());
        let capacity = match poll_fn(|cx| stream.poll_capacity(cx)).await {
            Some(capacity) => capacity?,
            None => return Err(h2::Error::from(Reason::STREAM_CLOSED)),
        };
        if capacity == 0 {
            continue;
        }
        let chunk = data.split_to(capacity.min(data.len()));
        stream.send_data(chunk, false)?;
    }
    Ok(())
}
