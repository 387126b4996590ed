//! Media transforms offered on the command line

use async_trait::async_trait;
use serde_json::Value;

use graft_core::{MediaDescriptor, MediaTransform};

/// Rewrites protocol-relative asset URLs (`//images.example.net/a.png`) to https
pub struct AbsoluteUrls;

#[async_trait]
impl MediaTransform for AbsoluteUrls {
    async fn transform(&self, mut media: MediaDescriptor) -> anyhow::Result<Value> {
        if media.url.starts_with("//") {
            media.url = format!("https:{}", media.url);
        }
        Ok(serde_json::to_value(media)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(url: &str) -> MediaDescriptor {
        MediaDescriptor {
            id: "a1".to_string(),
            url: url.to_string(),
            description: None,
            content_type: "image/png".to_string(),
            dimensions: None,
            size: 10,
            version: None,
        }
    }

    #[tokio::test]
    async fn test_protocol_relative_url() {
        let value = AbsoluteUrls
            .transform(descriptor("//images.example.net/a.png"))
            .await
            .unwrap();
        assert_eq!(value["url"], "https://images.example.net/a.png");
        assert_eq!(value["contentType"], "image/png");
    }

    #[tokio::test]
    async fn test_absolute_url_untouched() {
        let value = AbsoluteUrls
            .transform(descriptor("http://cdn.example.net/a.png"))
            .await
            .unwrap();
        assert_eq!(value["url"], "http://cdn.example.net/a.png");
    }
}
