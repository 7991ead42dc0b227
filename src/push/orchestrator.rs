//! Push trigger.
//!
//! Resets the request counter, pushes the whole catalog in order and answers
//! with an HTML page that references every pushed segment.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use super::{PushSupport, ResourcePusher, UNSUPPORTED_BODY};
use crate::catalog::ResourceCatalog;
use crate::metrics::RequestMetrics;
use crate::server::AppContext;

const DOCUMENT_HEADER: &str = "<html><body><h1>Server Push</h1>";
const DOCUMENT_FOOTER: &str = "</body></html>";

/// Outcome of one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub attempted: usize,
    pub failed: usize,
    pub document: String,
}

/// GET /push
pub async fn trigger_push(State(ctx): State<AppContext>, support: PushSupport) -> Response {
    match support {
        PushSupport::Unsupported => {
            tracing::debug!("Push requested on a connection without push support");
            (StatusCode::HTTP_VERSION_NOT_SUPPORTED, UNSUPPORTED_BODY).into_response()
        }
        PushSupport::Supported(pusher) => {
            let report = push_catalog(&ctx.catalog, &ctx.metrics, pusher.as_ref());
            if report.failed > 0 {
                tracing::debug!("{}/{} pushes failed", report.failed, report.attempted);
            }
            Html(report.document).into_response()
        }
    }
}

/// Push every catalog entry through `pusher` and render the index page.
///
/// A failed push is logged and skipped; the remaining entries are still
/// attempted and the page still lists every entry.
pub fn push_catalog(
    catalog: &ResourceCatalog,
    metrics: &RequestMetrics,
    pusher: &dyn ResourcePusher,
) -> PushReport {
    metrics.reset();

    let mut failed = 0;
    for target in catalog.iter() {
        tracing::info!("Pushing {}...", target);
        if let Err(e) = pusher.push(target) {
            tracing::warn!("Failed to push: {}", e);
            failed += 1;
        }
    }

    PushReport {
        attempted: catalog.len(),
        failed,
        document: render_document(catalog),
    }
}

/// Header, then one `<video>` element per catalog entry in catalog order.
pub fn render_document(catalog: &ResourceCatalog) -> String {
    let mut html = String::from(DOCUMENT_HEADER);
    for target in catalog.iter() {
        html.push_str("<video src=\"");
        push_escaped(&mut html, target);
        html.push_str("\"></video>");
    }
    html.push_str(DOCUMENT_FOOTER);
    html
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
