//! MCP Server Lifecycle
//!
//! Owns the tool registry, the current settings and the running actix server.
//! The listener always binds to loopback.

use std::io;
use std::net::{Ipv4Addr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use actix_web::{
    App, HttpServer,
    dev::ServerHandle,
    middleware::{Compress, Logger},
    web,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::mcp::config::Settings;
use crate::mcp::handlers::{self, AppState};
use crate::mcp::registry::{EnabledTool, ToolRegistry, ToolRegistryEntry};

/// Snapshot of the server's run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub running: bool,
    /// Bound port while running, configured port otherwise
    pub port: u16,
}

struct RunningServer {
    handle: ServerHandle,
    task: JoinHandle<io::Result<()>>,
    port: u16,
}

/// MCP server bound to `127.0.0.1`.
///
/// `start` and `stop` may be called repeatedly; `update_settings` restarts a
/// running server with the new settings. Restarts do not drain in-flight
/// requests beyond actix's graceful shutdown.
pub struct McpServer {
    settings: Mutex<Settings>,
    registry: Arc<ToolRegistry>,
    running: tokio::sync::Mutex<Option<RunningServer>>,
}

impl McpServer {
    /// Create a stopped server; the settings' enabled tools become the
    /// registry filter.
    pub fn new(settings: Settings, registry: ToolRegistry) -> Self {
        registry.update_filter(settings.enabled_tools.clone());
        Self {
            settings: Mutex::new(settings),
            registry: Arc::new(registry),
            running: tokio::sync::Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> Settings {
        self.settings.lock().clone()
    }

    /// Bind the listener and start serving.
    ///
    /// Calling `start` on a running server only logs.
    ///
    /// # Configuration
    /// - Workers: `settings.workers`
    /// - Max connections per worker: `settings.max_connections`
    /// - Keep-alive / request timeout: 30 seconds
    /// - Shutdown timeout: 10 seconds
    pub async fn start(&self) -> io::Result<()> {
        let mut running = self.running.lock().await;
        if let Some(server) = running.as_ref() {
            tracing::info!(port = server.port, "MCP server is already running");
            return Ok(());
        }

        let settings = self.settings();
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, settings.port))?;
        let port = listener.local_addr()?.port();
        let state = web::Data::new(AppState::new(&settings, port, Arc::clone(&self.registry)));

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(Compress::default())
                .wrap(handlers::default_headers())
                // %r = request line, %s = status, %D = duration in ms
                .wrap(Logger::new("%r %s %Dms"))
                .configure(handlers::configure)
        })
        .workers(settings.workers)
        .max_connections(settings.max_connections)
        .keep_alive(Duration::from_secs(30))
        .client_request_timeout(Duration::from_secs(30))
        .client_disconnect_timeout(Duration::from_secs(2))
        .shutdown_timeout(10)
        .disable_signals()
        .listen(listener)?
        .run();

        let handle = server.handle();
        let task = tokio::spawn(server);
        *running = Some(RunningServer { handle, task, port });

        tracing::info!(
            port,
            workers = settings.workers,
            tools = self.registry.len(),
            "MCP server listening on http://127.0.0.1:{port}/mcp"
        );
        Ok(())
    }

    /// Stop the server and wait for it to shut down. No-op when stopped.
    pub async fn stop(&self) {
        let Some(server) = self.running.lock().await.take() else {
            return;
        };

        server.handle.stop(true).await;
        match server.task.await {
            Ok(Ok(())) => tracing::info!(port = server.port, "MCP server stopped"),
            Ok(Err(err)) => tracing::warn!(error = %err, "MCP server exited with an error"),
            Err(err) => tracing::warn!(error = %err, "MCP server task failed"),
        }
    }

    /// Store new settings, apply their tool filter and restart if running.
    pub async fn update_settings(&self, settings: Settings) -> io::Result<()> {
        let was_running = self.running.lock().await.is_some();
        self.registry.update_filter(settings.enabled_tools.clone());
        *self.settings.lock() = settings;

        if was_running {
            tracing::info!("restarting MCP server with new settings");
            self.stop().await;
            self.start().await?;
        }
        Ok(())
    }

    pub async fn status(&self) -> ServerStatus {
        match self.running.lock().await.as_ref() {
            Some(server) => ServerStatus {
                running: true,
                port: server.port,
            },
            None => ServerStatus {
                running: false,
                port: self.settings.lock().port,
            },
        }
    }

    /// Replace the enabled-tool filter and persist it in the settings.
    pub fn update_enabled_tools(&self, filter: Vec<EnabledTool>) {
        self.settings.lock().enabled_tools = filter.clone();
        self.registry.update_filter(filter);
    }

    /// Tools currently published to clients.
    pub fn available_tools(&self) -> Vec<ToolRegistryEntry> {
        self.registry.list()
    }

    /// Preview of the published tools under a different filter.
    pub fn filtered_tools(&self, candidate: &[EnabledTool]) -> Vec<ToolRegistryEntry> {
        self.registry.filter_for(candidate)
    }
}
