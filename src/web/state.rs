use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::{
    authors::{AuthorDirectory, PgAuthorDirectory},
    config::Settings,
    dissemination::{ArticleStore, FsArticleStore, PublishSchedule},
    documents::{DocumentService, PgDocumentService},
};

/// Read-only handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    store: Arc<dyn ArticleStore>,
    docs: Arc<dyn DocumentService>,
    authors: Arc<dyn AuthorDirectory>,
    schedule: Arc<PublishSchedule>,
}

impl AppState {
    pub async fn new(settings: Settings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.database_max_connections)
            .connect(&settings.database_url)
            .await
            .context("failed to connect to Postgres")?;

        if settings.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run database migrations")?;
            info!("database schema is up to date");
        }

        let docs: Arc<dyn DocumentService> = Arc::new(PgDocumentService::new(pool.clone()));
        let authors: Arc<dyn AuthorDirectory> = Arc::new(PgAuthorDirectory::new(pool));
        let store: Arc<dyn ArticleStore> =
            Arc::new(FsArticleStore::new(&settings.document_root, docs.clone()));

        info!(root = %settings.document_root.display(), "serving artifacts from document root");

        Ok(Self::from_parts(settings, store, docs, authors))
    }

    pub fn from_parts(
        settings: Settings,
        store: Arc<dyn ArticleStore>,
        docs: Arc<dyn DocumentService>,
        authors: Arc<dyn AuthorDirectory>,
    ) -> Self {
        let schedule = PublishSchedule::new(
            settings.publish_hour_utc,
            settings.no_publish_dates.clone(),
        );
        Self {
            settings: Arc::new(settings),
            store,
            docs,
            authors,
            schedule: Arc::new(schedule),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &dyn ArticleStore {
        self.store.as_ref()
    }

    pub fn docs(&self) -> &dyn DocumentService {
        self.docs.as_ref()
    }

    pub fn authors(&self) -> &dyn AuthorDirectory {
        self.authors.as_ref()
    }

    pub fn schedule(&self) -> &PublishSchedule {
        &self.schedule
    }
}
