use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn execute(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        sql.to_owned(),
    ))
    .await?;
    Ok(())
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .await?;

    // Series, characters, manufacturers, categories, scales and shops share one table
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS master_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            parent_id INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (parent_id) REFERENCES master_data(id)
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS figures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            name_en TEXT,
            name_ja TEXT,
            manufacturer_id INTEGER,
            series_id INTEGER,
            character_id INTEGER,
            category_id INTEGER,
            scale_id INTEGER,
            size TEXT,
            material TEXT,
            sculptors TEXT,
            paint_work TEXT,
            release_date TEXT,
            release_precision TEXT NOT NULL DEFAULT 'unknown',
            price_krw INTEGER,
            price_jpy INTEGER,
            price_usd REAL,
            description TEXT,
            specification TEXT,
            is_limited BOOLEAN NOT NULL DEFAULT 0,
            is_adult BOOLEAN NOT NULL DEFAULT 0,
            created_by INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (manufacturer_id) REFERENCES master_data(id),
            FOREIGN KEY (series_id) REFERENCES master_data(id),
            FOREIGN KEY (character_id) REFERENCES master_data(id),
            FOREIGN KEY (category_id) REFERENCES master_data(id),
            FOREIGN KEY (scale_id) REFERENCES master_data(id),
            FOREIGN KEY (created_by) REFERENCES users(id)
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS figure_images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            figure_id INTEGER NOT NULL,
            url TEXT NOT NULL,
            is_thumbnail BOOLEAN NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY (figure_id) REFERENCES figures(id) ON DELETE CASCADE
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS acquisitions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            figure_id INTEGER NOT NULL,
            shop_id INTEGER,
            status TEXT NOT NULL DEFAULT 'reserved',
            total_price INTEGER NOT NULL DEFAULT 0,
            deposit_price INTEGER,
            deposit_paid_at TEXT,
            balance_paid_at TEXT,
            paid_at TEXT,
            delivered_at TEXT,
            memo TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (figure_id) REFERENCES figures(id),
            FOREIGN KEY (shop_id) REFERENCES master_data(id)
        )
        "#,
    )
    .await?;

    for sql in [
        "CREATE INDEX IF NOT EXISTS idx_master_data_kind_name ON master_data(kind, name)",
        "CREATE INDEX IF NOT EXISTS idx_master_data_parent ON master_data(parent_id)",
        "CREATE INDEX IF NOT EXISTS idx_figures_series ON figures(series_id)",
        "CREATE INDEX IF NOT EXISTS idx_figures_manufacturer ON figures(manufacturer_id)",
        "CREATE INDEX IF NOT EXISTS idx_figure_images_figure ON figure_images(figure_id)",
        "CREATE INDEX IF NOT EXISTS idx_acquisitions_user ON acquisitions(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_acquisitions_figure ON acquisitions(figure_id)",
    ] {
        execute(db, sql).await?;
    }

    Ok(())
}
