//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and
//! the REST API. Services are generic over the core ports; AppState pins
//! them to the SQLite-backed infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use formforge_core::compose::FormComposer;
use formforge_core::handler::StandardHandlerFactory;
use formforge_core::permission::PermissionGate;
use formforge_core::service::FormAdminService;
use formforge_infra::catalog::StaticModelCatalog;
use formforge_infra::config::load_global_config;
use formforge_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use formforge_infra::sqlite::form::SqliteFormRepository;
use formforge_infra::sqlite::instance::SqliteInstanceStore;
use formforge_infra::sqlite::outbox::SqliteOutboxMailer;
use formforge_infra::sqlite::pool::DatabasePool;
use formforge_types::config::GlobalConfig;
use formforge_types::permission::Actor;

/// Admin service pinned to the SQLite repository and config catalog.
pub type ConcreteAdminService = FormAdminService<SqliteFormRepository, StaticModelCatalog>;

pub type ConcreteComposer = FormComposer<SqliteFormRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<ConcreteAdminService>,
    pub composer: Arc<ConcreteComposer>,
    pub outbox: Arc<SqliteOutboxMailer>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load config, open the database, and wire
    /// services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir).await?;

        let config = load_global_config(&data_dir).await;

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("formforge.db").display()
        );
        let pool = DatabasePool::new(&db_url).await?;

        Ok(Self::wire(pool, config, data_dir))
    }

    /// Wire services over an already-open pool.
    pub fn wire(pool: DatabasePool, config: GlobalConfig, data_dir: PathBuf) -> Self {
        let repo = SqliteFormRepository::new(pool.clone());
        let outbox = Arc::new(SqliteOutboxMailer::new(pool.clone()));
        let instances = Arc::new(SqliteInstanceStore::new(pool));

        let catalog = StaticModelCatalog::new(config.models.clone());
        let gate = PermissionGate::from_config(&config.permissions);
        let admin = FormAdminService::new(repo.clone(), catalog, gate);

        let factory = StandardHandlerFactory::new(
            outbox.clone(),
            instances,
            config.mail.default_from.clone(),
        );
        let composer = FormComposer::new(repo, Arc::new(factory));

        Self {
            admin: Arc::new(admin),
            composer: Arc::new(composer),
            outbox,
            config: Arc::new(config),
            data_dir,
        }
    }

    /// The actor CLI commands run as (`cli_user` in config.toml).
    pub fn cli_actor(&self) -> Actor {
        self.config.cli_actor()
    }
}
