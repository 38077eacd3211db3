//! Schema generation: column metadata and `CREATE TABLE IF NOT EXISTS`
//! statements for every table, applied at startup and by tests.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::debug;

/// Column definition for schema generation.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: &'static str,
    /// SQLite column type (TEXT, INTEGER, REAL, BLOB)
    pub sql_type: &'static str,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// Foreign key target, e.g. `"performers(id) ON DELETE CASCADE"`.
    pub references: Option<&'static str>,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
            is_primary_key: false,
            references: None,
        }
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    const fn references(mut self, target: &'static str) -> Self {
        self.references = Some(target);
        self
    }

    /// Generate the column definition SQL.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);

        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }

        if !self.nullable && !self.is_primary_key {
            sql.push_str(" NOT NULL");
        }

        if let Some(target) = self.references {
            sql.push_str(&format!(" REFERENCES {target}"));
        }

        sql
    }
}

/// A table and its columns.
#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    /// Generate `CREATE TABLE IF NOT EXISTS` SQL.
    pub fn create_table_sql(&self) -> String {
        let column_defs: Vec<String> = self.columns.iter().map(|c| c.to_sql()).collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            self.name,
            column_defs.join(",\n  ")
        )
    }
}

const PERFORMERS: TableDef = TableDef {
    name: "performers",
    columns: &[
        ColumnDef::new("id", "INTEGER").primary_key(),
        ColumnDef::new("name", "TEXT"),
        ColumnDef::new("disambiguation", "TEXT").nullable(),
        ColumnDef::new("gender", "TEXT").nullable(),
        ColumnDef::new("birthdate", "TEXT").nullable(),
        ColumnDef::new("ethnicity", "TEXT").nullable(),
        ColumnDef::new("country", "TEXT").nullable(),
        ColumnDef::new("height_cm", "INTEGER").nullable(),
        ColumnDef::new("created_at", "TEXT"),
        ColumnDef::new("updated_at", "TEXT"),
    ],
};

const PERFORMER_ALIASES: TableDef = TableDef {
    name: "performer_aliases",
    columns: &[
        ColumnDef::new("performer_id", "INTEGER").references("performers(id) ON DELETE CASCADE"),
        ColumnDef::new("alias", "TEXT"),
    ],
};

const PERFORMER_URLS: TableDef = TableDef {
    name: "performer_urls",
    columns: &[
        ColumnDef::new("performer_id", "INTEGER").references("performers(id) ON DELETE CASCADE"),
        ColumnDef::new("url", "TEXT"),
        ColumnDef::new("kind", "TEXT"),
    ],
};

const PERFORMER_TATTOOS: TableDef = TableDef {
    name: "performer_tattoos",
    columns: &[
        ColumnDef::new("performer_id", "INTEGER").references("performers(id) ON DELETE CASCADE"),
        ColumnDef::new("location", "TEXT"),
        ColumnDef::new("description", "TEXT").nullable(),
    ],
};

const PERFORMER_PIERCINGS: TableDef = TableDef {
    name: "performer_piercings",
    columns: &[
        ColumnDef::new("performer_id", "INTEGER").references("performers(id) ON DELETE CASCADE"),
        ColumnDef::new("location", "TEXT"),
        ColumnDef::new("description", "TEXT").nullable(),
    ],
};

const STUDIOS: TableDef = TableDef {
    name: "studios",
    columns: &[
        ColumnDef::new("id", "INTEGER").primary_key(),
        ColumnDef::new("name", "TEXT"),
        ColumnDef::new("parent_studio_id", "INTEGER")
            .nullable()
            .references("studios(id) ON DELETE SET NULL"),
        ColumnDef::new("created_at", "TEXT"),
        ColumnDef::new("updated_at", "TEXT"),
    ],
};

const STUDIO_URLS: TableDef = TableDef {
    name: "studio_urls",
    columns: &[
        ColumnDef::new("studio_id", "INTEGER").references("studios(id) ON DELETE CASCADE"),
        ColumnDef::new("url", "TEXT"),
        ColumnDef::new("kind", "TEXT"),
    ],
};

const PENDING_ACTIVATIONS: TableDef = TableDef {
    name: "pending_activations",
    columns: &[
        ColumnDef::new("id", "BLOB").primary_key(),
        ColumnDef::new("email", "TEXT"),
        ColumnDef::new("invite_key", "TEXT"),
        ColumnDef::new("created_at", "TEXT"),
    ],
};

/// All tables, parents before the join tables that reference them.
pub fn all_tables() -> &'static [TableDef] {
    static TABLES: [TableDef; 8] = [
        PERFORMERS,
        PERFORMER_ALIASES,
        PERFORMER_URLS,
        PERFORMER_TATTOOS,
        PERFORMER_PIERCINGS,
        STUDIOS,
        STUDIO_URLS,
        PENDING_ACTIVATIONS,
    ];
    &TABLES
}

/// Create any missing tables. Existing tables are left untouched.
pub async fn sync_all_schemas(pool: &SqlitePool) -> Result<()> {
    for table in all_tables() {
        let sql = table.create_table_sql();
        debug!(table = table.name, "syncing table schema");
        sqlx::query(&sql).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_sql_includes_cascade() {
        let sql = PERFORMER_ALIASES.create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS performer_aliases"));
        assert!(
            sql.contains(
                "performer_id INTEGER NOT NULL REFERENCES performers(id) ON DELETE CASCADE"
            )
        );
        assert!(sql.contains("alias TEXT NOT NULL"));
    }

    #[test]
    fn primary_key_column_skips_not_null() {
        let sql = PERFORMERS.create_table_sql();
        assert!(sql.contains("id INTEGER PRIMARY KEY"));
        assert!(!sql.contains("id INTEGER PRIMARY KEY NOT NULL"));
    }
}
