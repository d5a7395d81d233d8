use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::config::AppConfig;
use crate::db;
use crate::error::ApiResult;

const FEED_LIMIT: i64 = 50;

#[derive(Debug, Clone, FromRow)]
pub struct FeedItem {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

/// RSS 2.0 document for the given posts, newest first.
pub fn render_feed(config: &AppConfig, posts: &[FeedItem]) -> String {
    let base_url = &config.site_url;

    let items: String = posts
        .iter()
        .map(|post| {
            let post_url = format!("{}/blog/{}", base_url, post.slug);
            format!(
                "    <item>\n\
                       <title>{}</title>\n\
                       <link>{}</link>\n\
                       <description>{}</description>\n\
                       <category>{}</category>\n\
                       <pubDate>{}</pubDate>\n\
                       <guid isPermaLink=\"true\">{}</guid>\n\
                     </item>\n",
                escape_xml(&post.title),
                escape_xml(&post_url),
                escape_xml(&post.excerpt),
                escape_xml(&post.category),
                rfc822(&post.created_at),
                escape_xml(&post_url),
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>en-us</language>
    <atom:link href="{}" rel="self" type="application/rss+xml"/>
    <lastBuildDate>{}</lastBuildDate>
{}  </channel>
</rss>"#,
        escape_xml(&config.site_title),
        escape_xml(&format!("{}/blog", base_url)),
        escape_xml(&config.site_description),
        escape_xml(&format!("{}/rss.xml", base_url)),
        posts.first().map(|p| rfc822(&p.created_at)).unwrap_or_default(),
        items,
    )
}

/// GET /rss.xml
pub async fn rss_feed(Extension(config): Extension<Arc<AppConfig>>) -> ApiResult<Response> {
    let pool = db::require_pool()?;

    let posts = sqlx::query_as::<_, FeedItem>(
        r#"
        SELECT title, slug, excerpt, category, created_at
        FROM blog_posts
        WHERE published = true
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(FEED_LIMIT)
    .fetch_all(pool.as_ref())
    .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/rss+xml; charset=utf-8"),
            (
                header::CACHE_CONTROL,
                "public, max-age=3600, stale-while-revalidate=600",
            ),
        ],
        render_feed(&config, &posts),
    )
        .into_response())
}
