//! Sitemap XML rendering.
//!
//! Pure builders: the route handlers fetch rows and hand them over, so a
//! failed query simply yields fewer entries.

use chrono::{DateTime, Utc};

use crate::db::models::{SitemapEntry, SitemapPost};
use crate::tenant::TenantConfig;

pub const INDEX_PATH: &str = "/sitemap.xml";
pub const BLOG_SITEMAP_PATH: &str = "/sitemap-blog.xml";
pub const SERVICES_SITEMAP_PATH: &str = "/sitemap-services.xml";

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Pages every tenant site has.
const STATIC_PAGES: &[(&str, &str, f32)] = &[("/", "daily", 1.0), ("/blog", "daily", 0.8)];

#[derive(Debug, Clone, PartialEq)]
pub struct UrlEntry {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
    pub changefreq: Option<String>,
    pub priority: Option<f32>,
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn w3c_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

pub fn render_urlset(entries: &[UrlEntry]) -> String {
    let mut urls = String::new();
    for entry in entries {
        urls.push_str("  <url>\n");
        urls.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        if let Some(lastmod) = &entry.lastmod {
            urls.push_str(&format!("    <lastmod>{}</lastmod>\n", w3c_date(lastmod)));
        }
        if let Some(changefreq) = &entry.changefreq {
            urls.push_str(&format!(
                "    <changefreq>{}</changefreq>\n",
                escape_xml(changefreq)
            ));
        }
        if let Some(priority) = entry.priority {
            urls.push_str(&format!("    <priority>{:.1}</priority>\n", priority));
        }
        urls.push_str("  </url>\n");
    }

    format!("{XML_HEADER}\n<urlset xmlns=\"{SITEMAP_NS}\">\n{urls}</urlset>\n")
}

pub fn render_index(tenant: &TenantConfig) -> String {
    let mut sitemaps = String::new();
    for path in [SERVICES_SITEMAP_PATH, BLOG_SITEMAP_PATH] {
        sitemaps.push_str(&format!(
            "  <sitemap>\n    <loc>{}</loc>\n  </sitemap>\n",
            escape_xml(&tenant.url_for(path))
        ));
    }

    format!("{XML_HEADER}\n<sitemapindex xmlns=\"{SITEMAP_NS}\">\n{sitemaps}</sitemapindex>\n")
}

pub fn blog_entries(tenant: &TenantConfig, posts: &[SitemapPost]) -> Vec<UrlEntry> {
    posts
        .iter()
        .map(|post| UrlEntry {
            loc: tenant.url_for(&format!("/blog/{}", post.slug)),
            lastmod: Some(post.lastmod()),
            changefreq: Some("weekly".to_string()),
            priority: Some(0.7),
        })
        .collect()
}

pub fn service_entries(tenant: &TenantConfig, extra: &[SitemapEntry]) -> Vec<UrlEntry> {
    let fixed = STATIC_PAGES.iter().map(|(path, changefreq, priority)| UrlEntry {
        loc: tenant.url_for(path),
        lastmod: None,
        changefreq: Some((*changefreq).to_string()),
        priority: Some(*priority),
    });

    let listed = extra
        .iter()
        .filter(|entry| !STATIC_PAGES.iter().any(|(path, _, _)| *path == entry.path))
        .map(|entry| UrlEntry {
            loc: tenant.url_for(&entry.path),
            lastmod: entry.lastmod,
            changefreq: entry.changefreq.clone(),
            priority: entry.priority,
        });

    fixed.chain(listed).collect()
}
