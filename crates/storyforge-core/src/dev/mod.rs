//! Dev context manager.
//!
//! Owns the single incremental build context of a dev server process and
//! the route serving the preview document.
//!
//! ```text
//! Uninitialized ──start──▶ Starting ──ok──▶ Running ──bail──▶ Disposed
//!       ▲                     │ │
//!       └───────error─────────┘ └──bail──▶ Disposed (start fails with Bailed)
//! ```

pub mod html;

pub use html::{generate_iframe_html, PreviewDocument, LIVE_RELOAD_GRACE_MS};

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::bundler::{BuildContext, BuildOutput, BundleError, Bundler, ServeOptions};
use crate::compose::compose_build_options;
use crate::config::CatalogOptions;
use crate::error::{Error, Result};
use crate::stories::list_stories;

/// Path of the preview document route.
pub const IFRAME_ROUTE: &str = "/iframe.html";

/// Lifecycle state of a [`DevServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DevStatus {
    Uninitialized,
    Starting,
    Running,
    Disposed,
}

impl DevStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Disposed => "disposed",
        }
    }
}

enum DevState {
    Uninitialized,
    Starting,
    Running(Arc<dyn BuildContext>),
    Disposed,
}

impl DevState {
    fn status(&self) -> DevStatus {
        match self {
            Self::Uninitialized => DevStatus::Uninitialized,
            Self::Starting => DevStatus::Starting,
            Self::Running(_) => DevStatus::Running,
            Self::Disposed => DevStatus::Disposed,
        }
    }
}

/// Stats reported once the dev server is up.
#[derive(Debug, Clone, Serialize)]
pub struct BuilderStats {
    pub message: String,
    pub stories: usize,
    pub entry_points: usize,
}

/// Result of a successful [`DevServer::start`].
pub struct StartResult {
    /// The host router with the preview route registered.
    pub router: Router,
    /// Base URL of the bundler's asset server.
    pub server_url: String,
    pub stats: BuilderStats,
    pub total_time: Duration,
}

struct IframeState {
    options: CatalogOptions,
    server_url: String,
}

async fn serve_iframe(State(state): State<Arc<IframeState>>) -> Response {
    match generate_iframe_html(&state.options, &state.server_url).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render preview document");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Register the preview document route on `router`.
pub fn iframe_router(router: Router, options: CatalogOptions, server_url: String) -> Router {
    let iframe = Router::new()
        .route(IFRAME_ROUTE, get(serve_iframe))
        .with_state(Arc::new(IframeState {
            options,
            server_url,
        }));
    router.merge(iframe)
}

/// The dev-mode builder: one incremental context per instance.
pub struct DevServer {
    bundler: Arc<dyn Bundler>,
    state: Mutex<DevState>,
}

impl DevServer {
    pub fn new(bundler: Arc<dyn Bundler>) -> Self {
        Self {
            bundler,
            state: Mutex::new(DevState::Uninitialized),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DevState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle state.
    pub fn status(&self) -> DevStatus {
        self.lock().status()
    }

    /// Discover stories, create the build context, start its asset server and
    /// register the preview route.
    ///
    /// Only valid once, from `Uninitialized`. A failed start returns the
    /// server to `Uninitialized`; a [`bail`](Self::bail) racing the start
    /// disposes the new context and fails with [`Error::Bailed`].
    pub async fn start(&self, options: CatalogOptions, router: Router) -> Result<StartResult> {
        let started = Instant::now();

        {
            let mut state = self.lock();
            if !matches!(*state, DevState::Uninitialized) {
                return Err(Error::InvalidState {
                    action: "start",
                    state: state.status().as_str(),
                });
            }
            *state = DevState::Starting;
        }

        let (context, server_url, stats) = match self.create_context(&options).await {
            Ok(created) => created,
            Err(e) => {
                let mut state = self.lock();
                if matches!(*state, DevState::Starting) {
                    *state = DevState::Uninitialized;
                }
                return Err(e);
            }
        };

        let router = iframe_router(router, options, server_url.clone());

        {
            let mut state = self.lock();
            if matches!(*state, DevState::Starting) {
                *state = DevState::Running(context);
                tracing::info!(url = %server_url, "Dev server started");
                return Ok(StartResult {
                    router,
                    server_url,
                    stats,
                    total_time: started.elapsed(),
                });
            }
        }

        dispose_best_effort(context.as_ref()).await;
        Err(Error::Bailed)
    }

    async fn create_context(
        &self,
        options: &CatalogOptions,
    ) -> Result<(Arc<dyn BuildContext>, String, BuilderStats)> {
        let stories = list_stories(options).await?;
        let config = compose_build_options(&stories, options).await?;

        let stats = BuilderStats {
            message: "storyforge stats".to_string(),
            stories: stories.len(),
            entry_points: config.entry_points.len(),
        };
        let servedir = config.outdir.clone();

        let context: Arc<dyn BuildContext> = Arc::from(self.bundler.context(config).await?);

        let served = context
            .serve(ServeOptions {
                servedir: Some(servedir),
                host: None,
                port: 0,
                cors_origin: Some("*".to_string()),
            })
            .await;

        match served {
            Ok(served) => Ok((context, served.url(), stats)),
            Err(e) => {
                dispose_best_effort(context.as_ref()).await;
                Err(e.into())
            }
        }
    }

    /// Release the build context.
    ///
    /// A no-op before `start` and after a previous `bail`. Disposal failures
    /// are logged, not retried.
    pub async fn bail(&self) -> Result<()> {
        let context = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, DevState::Disposed) {
                DevState::Running(context) => Some(context),
                DevState::Starting => None,
                previous @ (DevState::Uninitialized | DevState::Disposed) => {
                    *state = previous;
                    return Ok(());
                }
            }
        };

        if let Some(context) = context {
            dispose_best_effort(context.as_ref()).await;
        }
        tracing::info!("Dev server stopped");
        Ok(())
    }

    /// Run a one-shot build with the composed configuration.
    ///
    /// Independent of the dev context. Production builds clear the output
    /// directory first.
    pub async fn build(&self, options: &CatalogOptions) -> Result<BuildOutput> {
        build(self.bundler.as_ref(), options).await
    }
}

/// One-shot build, see [`DevServer::build`].
pub async fn build(bundler: &dyn Bundler, options: &CatalogOptions) -> Result<BuildOutput> {
    let stories = list_stories(options).await?;
    let config = compose_build_options(&stories, options).await?;

    if options.config_type.is_production() {
        clear_output_dir(&config.outdir)?;
    }

    let output = bundler.build(config).await?;
    for warning in &output.warnings {
        tracing::warn!(warning = %warning, "Bundler warning");
    }
    if !output.errors.is_empty() {
        return Err(BundleError::new("BUILD_FAILED", output.errors.join("\n")).into());
    }
    Ok(output)
}

fn clear_output_dir(dir: &Path) -> Result<()> {
    tracing::debug!(dir = %dir.display(), "Clearing output directory");
    storyforge_util::fs::remove_dir_all_if_exists(dir).map_err(Error::Io)
}

async fn dispose_best_effort(context: &dyn BuildContext) {
    if let Err(e) = context.dispose().await {
        tracing::warn!(error = %e, "Failed to dispose build context");
    }
}
