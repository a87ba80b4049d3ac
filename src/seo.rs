//! schema.org JSON-LD for public pages.

use serde_json::{json, Value};

use crate::db::models::{Author, BlogPost};
use crate::tenant::TenantConfig;

const SCHEMA_CONTEXT: &str = "https://schema.org";

pub fn website(tenant: &TenantConfig) -> Value {
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "WebSite",
        "name": tenant.site_name,
        "url": tenant.site_url,
        "potentialAction": {
            "@type": "ReadAction",
            "target": tenant.url_for("/blog"),
        },
    })
}

pub fn blog_posting(tenant: &TenantConfig, post: &BlogPost) -> Value {
    let url = tenant.url_for(&format!("/blog/{}", post.slug));
    let published = post.published_date.unwrap_or(post.created_date);
    let modified = post.updated_date.unwrap_or(published);

    let mut doc = json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BlogPosting",
        "headline": post.title,
        "url": url,
        "mainEntityOfPage": { "@type": "WebPage", "@id": url },
        "datePublished": published.to_rfc3339(),
        "dateModified": modified.to_rfc3339(),
        "publisher": {
            "@type": "Organization",
            "name": tenant.site_name,
            "url": tenant.site_url,
        },
    });

    let extra = [
        ("description", post.meta_description.clone().map(Value::from)),
        ("image", post.featured_image.clone().map(Value::from)),
        ("articleSection", post.category.clone().map(Value::from)),
        (
            "keywords",
            (!post.tags.is_empty()).then(|| Value::from(post.tags.join(", "))),
        ),
    ];
    insert_present(&mut doc, extra);
    doc
}

pub fn person(tenant: &TenantConfig, author: &Author) -> Value {
    let mut doc = json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Person",
        "name": author.name,
        "url": tenant.url_for(&format!("/authors/{}", author.slug)),
        "worksFor": { "@type": "Organization", "name": tenant.site_name },
    });

    let extra = [
        ("description", author.bio.clone().map(Value::from)),
        ("image", author.avatar_url.clone().map(Value::from)),
        (
            "sameAs",
            author.linkedin_url.clone().map(|url| Value::from(vec![url])),
        ),
    ];
    insert_present(&mut doc, extra);
    doc
}

fn insert_present<const N: usize>(doc: &mut Value, fields: [(&str, Option<Value>); N]) {
    if let Some(map) = doc.as_object_mut() {
        for (key, value) in fields {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        }
    }
}
