//! OpenAPI document and Scalar reference page.
//!
//! The document is generated from the [`ApiRouter`] routes and their
//! `_docs` transforms, so it always matches the served API.
//!
//! [`ApiRouter`]: aide::axum::ApiRouter

use aide::axum::ApiRouter;
use aide::openapi::{Info, License, OpenApi, Tag};
use aide::scalar::Scalar;
use axum::routing::{Router, get};
use axum::{Extension, Json};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Where the OpenAPI document and the reference page are served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct OpenApiConfig {
    /// Path of the OpenAPI JSON document.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAPI_JSON_PATH", default_value = "/api/openapi.json")
    )]
    pub open_api_json: String,

    /// Path of the Scalar API reference page.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAPI_SCALAR_PATH", default_value = "/api/scalar")
    )]
    pub scalar_ui: String,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            open_api_json: "/api/openapi.json".to_owned(),
            scalar_ui: "/api/scalar".to_owned(),
        }
    }
}

/// Extension trait for [`ApiRouter`] to serve its OpenAPI document.
///
/// [`ApiRouter`]: aide::axum::ApiRouter
pub trait RouterOpenApiExt<S> {
    /// Finishes the API with the default ferry [`Info`] and adds the
    /// document and reference page routes.
    ///
    /// [`Info`]: aide::openapi::Info
    fn with_open_api(self, config: &OpenApiConfig) -> Router<S>;

    /// Same as [`with_open_api`](Self::with_open_api) with a custom [`Info`].
    ///
    /// [`Info`]: aide::openapi::Info
    fn with_open_api_info(self, config: &OpenApiConfig, info: Info) -> Router<S>;
}

impl<S> RouterOpenApiExt<S> for ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_open_api(self, config: &OpenApiConfig) -> Router<S> {
        let info = Info {
            title: "Ferry API".to_owned(),
            summary: Some("Firestore document and blob migrations".to_owned()),
            description: Some(
                "Copies Firestore collections and Cloud Storage objects from a source \
                 Firebase project to a target project. Each request names its own \
                 credentials, or falls back to the ones the server was started with."
                    .to_owned(),
            ),
            license: Some(License {
                name: "MIT".to_owned(),
                identifier: Some("MIT".to_owned()),
                ..License::default()
            }),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            ..Info::default()
        };

        self.with_open_api_info(config, info)
    }

    fn with_open_api_info(self, config: &OpenApiConfig, info: Info) -> Router<S> {
        async fn serve_openapi(Extension(api): Extension<OpenApi>) -> Json<OpenApi> {
            Json(api)
        }

        let mut api = OpenApi {
            info,
            tags: vec![
                Tag {
                    name: "Migrations".to_owned(),
                    description: Some("Connection checks, listings and migration runs".to_owned()),
                    ..Tag::default()
                },
                Tag {
                    name: "Monitors".to_owned(),
                    description: Some("Service health".to_owned()),
                    ..Tag::default()
                },
            ],
            ..OpenApi::default()
        };

        let scalar = Scalar::new(&config.open_api_json).with_title("Ferry API");
        let router = self
            .route(&config.scalar_ui, scalar.axum_route())
            .route(&config.open_api_json, get(serve_openapi));

        router.finish_api(&mut api).layer(Extension(api))
    }
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;

    use super::*;
    use crate::handler::routes;
    use crate::handler::test::create_test_state;

    fn server(config: &OpenApiConfig) -> anyhow::Result<TestServer> {
        let (state, _) = create_test_state()?;
        let app: Router = routes().with_open_api(config).with_state(state);
        Ok(TestServer::new(app)?)
    }

    #[tokio::test]
    async fn document_lists_every_route() -> anyhow::Result<()> {
        let config = OpenApiConfig::default();
        let response = server(&config)?.get(&config.open_api_json).await;
        response.assert_status_ok();

        let document = response.json::<serde_json::Value>();
        assert_eq!(document["info"]["title"], "Ferry API");
        for path in [
            "/health",
            "/migrations/verify",
            "/migrations/collections",
            "/migrations/documents",
            "/migrations/folders",
            "/migrations/blobs",
        ] {
            assert!(document["paths"].get(path).is_some(), "{path} is documented");
        }
        Ok(())
    }

    #[tokio::test]
    async fn reference_page_points_at_document() -> anyhow::Result<()> {
        let config = OpenApiConfig {
            open_api_json: "/docs/openapi.json".to_owned(),
            scalar_ui: "/docs".to_owned(),
        };
        let response = server(&config)?.get("/docs").await;
        response.assert_status_ok();
        assert!(response.text().contains("/docs/openapi.json"));
        Ok(())
    }
}
