use crate::entities::{fileables, files, metadata, posts, products, users};
use anyhow::Context;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Schema,
    Statement,
};
use std::env;
use std::time::Duration;
use tracing::info;

const SQLITE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_fileables_unique_role ON fileables(file_id, fileable_type, fileable_id, role)",
    "CREATE INDEX IF NOT EXISTS idx_fileables_lookup ON fileables(fileable_type, fileable_id, role)",
    "CREATE INDEX IF NOT EXISTS idx_metadata_file_key ON metadata(file_id, key)",
    "CREATE INDEX IF NOT EXISTS idx_files_created_at ON files(created_at)",
];

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();

    if builder == DatabaseBackend::Postgres {
        info!("🔄 Running SQLx migrations for PostgreSQL...");
        let pool = db.get_postgres_connection_pool();
        sqlx::migrate!("./migrations").run(pool).await?;
        return Ok(());
    }

    info!("🔄 Running SeaORM auto-migrations for SQLite/Other...");
    let schema = Schema::new(builder);

    // Files first: metadata and fileables reference it
    let stmts = vec![
        (
            "files",
            schema
                .create_table_from_entity(files::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "metadata",
            schema
                .create_table_from_entity(metadata::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "fileables",
            schema
                .create_table_from_entity(fileables::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "posts",
            schema
                .create_table_from_entity(posts::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "products",
            schema
                .create_table_from_entity(products::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "users",
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        db.execute(builder.build(&stmt))
            .await
            .with_context(|| format!("Failed to create table '{}'", name))?;
        info!("   - Table '{}' checked/created", name);
    }

    for query in SQLITE_INDEXES {
        db.execute(Statement::from_string(builder, query.to_string()))
            .await
            .with_context(|| format!("Failed to create index: {}", query))?;
    }
    info!("   - Indexes checked/created");

    Ok(())
}
