//! Swagger document and UI routes.
//!
//! Registered only when the document exists on disk at construction. The
//! document is served at its own location; the UI page loads its assets
//! from a CDN and points at that location.

use std::fs;

use axum::http::header;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, get_service};
use tower_http::services::ServeFile;

use crate::http::handler::Handler;
use crate::observability::Logger;

pub const SWAGGER_PATH: &str = "/swagger";
pub const SWAGGER_UI_PATH: &str = "/swagger/";

const SWAGGER_UI_VERSION: &str = "5.18.2";

/// Register the document and UI routes for `file`.
///
/// Returns false, after an info log, when the file cannot be read.
pub fn register(router: &mut dyn Handler, file: &str, logger: &dyn Logger) -> bool {
    if let Err(e) = fs::metadata(file) {
        logger.info(None, "swagger not added", &[("location", &file), ("error", &e)]);
        return false;
    }

    let route = document_route(file);
    router.handle(&route, get_service(ServeFile::new(file)));

    router.handle(
        SWAGGER_PATH,
        get(|| async {
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, SWAGGER_UI_PATH)])
        }),
    );

    let page = ui_page(&route);
    let ui = get(move || {
        let page = page.clone();
        async move { Html(page).into_response() }
    });
    router.handle(SWAGGER_UI_PATH, ui.clone());
    router.handle("/swagger/{*rest}", ui);

    true
}

/// Route under which the document at `file` is served.
fn document_route(file: &str) -> String {
    let trimmed = file.trim_start_matches("./");
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn ui_page(spec_url: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Swagger UI</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {{
            window.ui = SwaggerUIBundle({{
                url: '{spec_url}',
                dom_id: '#swagger-ui',
                deepLinking: true,
            }});
        }};
    </script>
</body>
</html>"##,
        version = SWAGGER_UI_VERSION,
    )
}
