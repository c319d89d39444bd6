//! Serves the bot's profile image over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use tracing::info;

use crate::annotator::BotContext;

pub fn router(context: BotContext) -> Router {
    Router::new()
        .route("/", get(profile_image))
        .route("/profile.png", get(profile_image))
        .with_state(context.profile_image)
}

async fn profile_image(State(image): State<Arc<Vec<u8>>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], image.to_vec())
}

pub async fn serve(addr: SocketAddr, context: BotContext) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Profile image server listening on http://{}", addr);

    axum::serve(listener, router(context))
        .await
        .context("Profile image server error")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn(context: BotContext) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(context)).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_serves_image_verbatim() {
        let image = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 42];
        let addr = spawn(BotContext {
            bot_id: "1".to_string(),
            profile_image: Arc::new(image.clone()),
        })
        .await;

        for path in ["/", "/profile.png"] {
            let response = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
            assert!(response.status().is_success());
            assert_eq!(
                response.headers()[reqwest::header::CONTENT_TYPE],
                "image/png"
            );
            assert_eq!(response.bytes().await.unwrap().to_vec(), image);
        }
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let addr = spawn(BotContext {
            bot_id: "1".to_string(),
            profile_image: Arc::new(Vec::new()),
        })
        .await;

        let response = reqwest::get(format!("http://{addr}/other")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
