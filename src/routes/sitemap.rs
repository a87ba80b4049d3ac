use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::{sitemap, tenant::Tenant, AppState};

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=3600";

fn xml_response(xml: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, XML_CONTENT_TYPE),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        xml,
    )
        .into_response()
}

/// GET /sitemap.xml
pub async fn sitemap_index(Tenant(tenant): Tenant) -> Response {
    xml_response(sitemap::render_index(&tenant))
}

/// GET /sitemap-blog.xml. A failed query still yields an (empty) urlset.
pub async fn blog_sitemap(State(state): State<AppState>, Tenant(tenant): Tenant) -> Response {
    let posts = state
        .content
        .list_sitemap_posts(&tenant.username)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "blog sitemap query failed, serving empty sitemap");
            Vec::new()
        });

    xml_response(sitemap::render_urlset(&sitemap::blog_entries(&tenant, &posts)))
}

/// GET /sitemap-services.xml
pub async fn services_sitemap(State(state): State<AppState>, Tenant(tenant): Tenant) -> Response {
    let extra = state
        .content
        .list_sitemap_entries(&tenant.username)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "sitemap entries query failed, serving static pages only");
            Vec::new()
        });

    xml_response(sitemap::render_urlset(&sitemap::service_entries(
        &tenant, &extra,
    )))
}
