//! Test-session database lifecycle.
//!
//! Guarantees that a test session starts from a known-clean, minimally seeded
//! database and releases the connection afterwards:
//!
//! ```text
//! Uninitialized -> Connecting -> Resetting -> Seeding -> Ready -> Disconnecting -> Closed
//!                       \______________\___________\--> Failed
//! ```
//!
//! `connect()` alone stops at `Connected`, from which `reset_database()`,
//! `seed_data()` or a full `set_up()` may follow.
//!
//! Setup runs at most once per session: concurrent callers serialize on the
//! internal lock and later callers get the already-seeded store back.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use domain::fixtures;

use super::store::{CatalogStore, StoreConnector, Table};
use crate::config::DatabaseConfig;
use crate::errors::{AppError, AppResult};
use crate::infra::observer::{Listener, Listeners};

/// Lifecycle states of a test session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Connecting,
    Connected,
    Resetting,
    Seeding,
    Ready,
    Disconnecting,
    Closed,
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Connecting => "connecting",
            LifecycleState::Connected => "connected",
            LifecycleState::Resetting => "resetting",
            LifecycleState::Seeding => "seeding",
            LifecycleState::Ready => "ready",
            LifecycleState::Disconnecting => "disconnecting",
            LifecycleState::Closed => "closed",
            LifecycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Events published while a session is set up and torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Transition {
        from: LifecycleState,
        to: LifecycleState,
    },
    TableCleared {
        table: Table,
        rows: u64,
    },
    Seeded {
        entity: &'static str,
        rows: u64,
    },
    SetUpFailed {
        error: String,
    },
    TearDownFailed {
        error: String,
    },
}

/// Rows removed per table, in deletion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    pub deleted: Vec<(Table, u64)>,
}

impl ResetReport {
    pub fn total(&self) -> u64 {
        self.deleted.iter().map(|(_, rows)| rows).sum()
    }
}

/// Rows inserted by the seed step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub categories: u64,
    pub products: u64,
}

/// Emits one structured log line per lifecycle event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLifecycleListener;

impl Listener<LifecycleEvent> for TracingLifecycleListener {
    fn on_event(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Transition { from, to } => {
                tracing::info!(%from, %to, "Database lifecycle transition");
            }
            LifecycleEvent::TableCleared { table, rows } => {
                tracing::info!(%table, rows, "Table cleared");
            }
            LifecycleEvent::Seeded { entity, rows } => {
                tracing::info!(entity, rows, "Seed data inserted");
            }
            LifecycleEvent::SetUpFailed { error } => {
                tracing::error!(error = %error, "Database setup failed");
            }
            LifecycleEvent::TearDownFailed { error } => {
                tracing::warn!(error = %error, "Database teardown failed");
            }
        }
    }
}

struct Session {
    state: LifecycleState,
    store: Option<Arc<dyn CatalogStore>>,
}

/// Connect, reset, seed and tear down the test database.
pub struct DatabaseLifecycle {
    config: DatabaseConfig,
    connector: Arc<dyn StoreConnector>,
    listeners: Listeners<LifecycleEvent>,
    session: Mutex<Session>,
}

impl DatabaseLifecycle {
    /// Create a lifecycle with the tracing listener registered.
    pub fn new(config: DatabaseConfig, connector: Arc<dyn StoreConnector>) -> Self {
        let mut listeners = Listeners::new();
        listeners.register(Arc::new(TracingLifecycleListener));
        Self::with_listeners(config, connector, listeners)
    }

    /// Create a lifecycle with an explicit listener set.
    pub fn with_listeners(
        config: DatabaseConfig,
        connector: Arc<dyn StoreConnector>,
        listeners: Listeners<LifecycleEvent>,
    ) -> Self {
        Self {
            config,
            connector,
            listeners,
            session: Mutex::new(Session {
                state: LifecycleState::Uninitialized,
                store: None,
            }),
        }
    }

    /// Register an additional listener.
    pub fn subscribe(&mut self, listener: Arc<dyn Listener<LifecycleEvent>>) {
        self.listeners.register(listener);
    }

    /// Current lifecycle state
    pub async fn state(&self) -> LifecycleState {
        self.session.lock().await.state
    }

    /// The connected store while the session is ready.
    pub async fn store(&self) -> Option<Arc<dyn CatalogStore>> {
        let session = self.session.lock().await;
        match session.state {
            LifecycleState::Ready => session.store.clone(),
            _ => None,
        }
    }

    /// Connect, reset and seed, in that order.
    ///
    /// Returns the ready store. Calling this again on a ready session returns
    /// the same store without touching the data. Every error here is fatal
    /// for the run; the session is left `Failed`.
    pub async fn set_up(&self) -> AppResult<Arc<dyn CatalogStore>> {
        let mut session = self.session.lock().await;

        match session.state {
            LifecycleState::Ready => {
                if let Some(store) = session.store.clone() {
                    return Ok(store);
                }
            }
            LifecycleState::Uninitialized
            | LifecycleState::Connected
            | LifecycleState::Closed
            | LifecycleState::Failed => {}
            other => {
                return Err(AppError::invalid_state(format!(
                    "cannot set up while {}",
                    other
                )));
            }
        }

        match self.run_set_up(&mut session).await {
            Ok(store) => Ok(store),
            Err(e) => {
                self.listeners.emit(&LifecycleEvent::SetUpFailed {
                    error: e.to_string(),
                });
                if let Some(store) = session.store.take() {
                    if let Err(close_err) = store.close().await {
                        tracing::debug!(error = %close_err, "Closing store after failed setup");
                    }
                }
                self.transition(&mut session, LifecycleState::Failed);
                Err(e)
            }
        }
    }

    async fn run_set_up(&self, session: &mut Session) -> AppResult<Arc<dyn CatalogStore>> {
        let store = match (session.state, session.store.clone()) {
            (LifecycleState::Connected, Some(store)) => store,
            _ => self.open(session).await?,
        };

        self.transition(session, LifecycleState::Resetting);
        self.reset_store(store.as_ref()).await?;

        self.transition(session, LifecycleState::Seeding);
        self.seed_store(store.as_ref()).await?;

        self.transition(session, LifecycleState::Ready);
        Ok(store)
    }

    /// Open the store without touching data.
    ///
    /// Returns the existing store when already connected or ready.
    pub async fn connect(&self) -> AppResult<Arc<dyn CatalogStore>> {
        let mut session = self.session.lock().await;

        match session.state {
            LifecycleState::Connected | LifecycleState::Ready => {
                if let Some(store) = session.store.clone() {
                    return Ok(store);
                }
            }
            LifecycleState::Uninitialized | LifecycleState::Closed | LifecycleState::Failed => {}
            other => {
                return Err(AppError::invalid_state(format!(
                    "cannot connect while {}",
                    other
                )));
            }
        }

        match self.open(&mut session).await {
            Ok(store) => {
                self.transition(&mut session, LifecycleState::Connected);
                Ok(store)
            }
            Err(e) => {
                self.listeners.emit(&LifecycleEvent::SetUpFailed {
                    error: e.to_string(),
                });
                self.transition(&mut session, LifecycleState::Failed);
                Err(e)
            }
        }
    }

    async fn open(&self, session: &mut Session) -> AppResult<Arc<dyn CatalogStore>> {
        self.transition(session, LifecycleState::Connecting);
        let store = self.connector.connect(&self.config).await?;
        session.store = Some(store.clone());
        Ok(store)
    }

    /// Delete every row, children first. The first failing table aborts the
    /// reset and the error is returned.
    ///
    /// A ready session drops back to `Connected`: the catalog is gone until the
    /// next seed.
    pub async fn reset_database(&self) -> AppResult<ResetReport> {
        let mut session = self.session.lock().await;
        let store = connected_store(&session)?;

        let result = self.reset_store(store.as_ref()).await;
        if session.state == LifecycleState::Ready {
            self.transition(&mut session, LifecycleState::Connected);
        }
        result
    }

    /// Insert the fixed categories, then the fixed products.
    ///
    /// Expects an empty catalog; it does not check for existing rows.
    pub async fn seed_data(&self) -> AppResult<SeedReport> {
        let session = self.session.lock().await;
        let store = connected_store(&session)?;
        self.seed_store(store.as_ref()).await
    }

    /// Release the connection. Failures are logged and otherwise ignored.
    pub async fn tear_down(&self) {
        let mut session = self.session.lock().await;

        let Some(store) = session.store.take() else {
            if session.state != LifecycleState::Closed {
                self.transition(&mut session, LifecycleState::Closed);
            }
            return;
        };

        self.transition(&mut session, LifecycleState::Disconnecting);
        if let Err(e) = store.close().await {
            self.listeners.emit(&LifecycleEvent::TearDownFailed {
                error: e.to_string(),
            });
        }
        self.transition(&mut session, LifecycleState::Closed);
    }

    async fn reset_store(&self, store: &dyn CatalogStore) -> AppResult<ResetReport> {
        let mut report = ResetReport::default();
        for table in Table::RESET_ORDER {
            let rows = store.delete_all(table).await?;
            self.listeners.emit(&LifecycleEvent::TableCleared { table, rows });
            report.deleted.push((table, rows));
        }
        Ok(report)
    }

    async fn seed_store(&self, store: &dyn CatalogStore) -> AppResult<SeedReport> {
        let categories = fixtures::categories();
        let products = fixtures::products();
        domain::check_integrity(&categories, &products)?;

        let categories = store.insert_categories(categories).await?;
        self.listeners.emit(&LifecycleEvent::Seeded {
            entity: "categories",
            rows: categories,
        });

        let products = store.insert_products(products).await?;
        self.listeners.emit(&LifecycleEvent::Seeded {
            entity: "products",
            rows: products,
        });

        Ok(SeedReport {
            categories,
            products,
        })
    }

    fn transition(&self, session: &mut Session, to: LifecycleState) {
        let from = session.state;
        session.state = to;
        self.listeners.emit(&LifecycleEvent::Transition { from, to });
    }
}

fn connected_store(session: &Session) -> AppResult<Arc<dyn CatalogStore>> {
    session
        .store
        .clone()
        .ok_or_else(|| AppError::invalid_state(format!("no store connection ({})", session.state)))
}
