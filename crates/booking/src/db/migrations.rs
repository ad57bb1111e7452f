//! Versioned schema migrations for the local store.
//!
//! Applied versions are tracked in `_migrations`. Each migration runs in its
//! own transaction together with its `_migrations` row, so a failure leaves
//! the schema as it was. Column additions check `PRAGMA table_info` per
//! column, so a database that already has some of them (created by hand, or
//! by an older build that inlined them) still migrates.

use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    step: Step,
}

enum Step {
    Sql(&'static str),
    /// `(name, definition)` pairs. Columns already on `table` are skipped.
    AddColumns {
        table: &'static str,
        columns: &'static [(&'static str, &'static str)],
    },
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_appointments_table",
        step: Step::Sql(include_str!("sql/001_create_appointments.sql")),
    },
    Migration {
        version: 2,
        description: "add_is_intern_to_appointments",
        step: Step::AddColumns {
            table: "appointments",
            columns: &[("is_intern", "INTEGER NOT NULL DEFAULT 0")],
        },
    },
    Migration {
        version: 3,
        description: "add_secondary_attachment_to_appointments",
        step: Step::AddColumns {
            table: "appointments",
            columns: &[
                ("secondary_uploaded", "INTEGER NOT NULL DEFAULT 0"),
                ("secondary_file_name", "TEXT"),
                ("secondary_file_path", "TEXT"),
            ],
        },
    },
    Migration {
        version: 4,
        description: "index_appointments_created_at",
        step: Step::Sql(include_str!("sql/004_index_created_at.sql")),
    },
];

pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    apply(conn, MIGRATIONS)
}

fn apply(conn: &Connection, migrations: &[Migration]) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in migrations.iter().filter(|m| m.version > current_version) {
        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        // Dropping the transaction without commit rolls it back.
        let tx = conn.unchecked_transaction()?;
        run_step(&tx, &migration.step).map_err(|e| DatabaseError::Migration {
            version: migration.version,
            reason: e.to_string(),
        })?;
        tx.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
        tx.commit()?;
    }

    Ok(())
}

fn run_step(conn: &Connection, step: &Step) -> Result<(), DatabaseError> {
    match step {
        Step::Sql(sql) => conn.execute_batch(sql)?,
        Step::AddColumns { table, columns } => {
            for (name, definition) in columns.iter() {
                if column_exists(conn, table, name)? {
                    log::debug!("Column {}.{} already present, skipping", table, name);
                    continue;
                }
                conn.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {};",
                    table, name, definition
                ))?;
            }
        }
    }
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::Migration {
            version: 0,
            reason: format!("Invalid table name: {}", table),
        });
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    Ok(names.any(|name| name.is_ok_and(|n| n == column)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDED_COLUMNS: [&str; 4] = [
        "is_intern",
        "secondary_uploaded",
        "secondary_file_name",
        "secondary_file_path",
    ];

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();
        conn
    }

    fn applied(conn: &Connection) -> u32 {
        conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_fresh_database_has_all_columns() {
        let conn = migrated();
        assert_eq!(applied(&conn), MIGRATIONS.len() as u32);
        for column in ADDED_COLUMNS {
            assert!(column_exists(&conn, "appointments", column).unwrap(), "{column}");
        }
    }

    #[test]
    fn test_rerun_is_noop() {
        let conn = migrated();
        run_all(&conn).unwrap();
        assert_eq!(applied(&conn), MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_preexisting_column_is_skipped() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("sql/001_create_appointments.sql"))
            .unwrap();
        conn.execute_batch("ALTER TABLE appointments ADD COLUMN is_intern INTEGER NOT NULL DEFAULT 0;")
            .unwrap();

        run_all(&conn).unwrap();
        assert!(column_exists(&conn, "appointments", "is_intern").unwrap());
        assert!(column_exists(&conn, "appointments", "secondary_file_path").unwrap());
    }

    #[test]
    fn test_partially_added_columns_are_completed() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("sql/001_create_appointments.sql"))
            .unwrap();
        conn.execute_batch(
            "ALTER TABLE appointments ADD COLUMN is_intern INTEGER NOT NULL DEFAULT 0;
             ALTER TABLE appointments ADD COLUMN secondary_uploaded INTEGER NOT NULL DEFAULT 0;
             CREATE TABLE _migrations (
                 version INTEGER PRIMARY KEY,
                 description TEXT NOT NULL,
                 applied_at TEXT NOT NULL DEFAULT (datetime('now'))
             );
             INSERT INTO _migrations (version, description) VALUES
                 (1, 'create_appointments_table'),
                 (2, 'add_is_intern_to_appointments');",
        )
        .unwrap();

        run_all(&conn).unwrap();

        assert_eq!(applied(&conn), MIGRATIONS.len() as u32);
        for column in ADDED_COLUMNS {
            assert!(column_exists(&conn, "appointments", column).unwrap(), "{column}");
        }
    }

    #[test]
    fn test_failed_migration_leaves_no_trace() {
        const BROKEN: &[Migration] = &[
            Migration {
                version: 1,
                description: "create_items",
                step: Step::Sql("CREATE TABLE items (id INTEGER PRIMARY KEY);"),
            },
            Migration {
                version: 2,
                description: "add_item_columns",
                step: Step::AddColumns {
                    table: "items",
                    columns: &[("label", "TEXT"), ("weight", "NOT A TYPE (")],
                },
            },
        ];
        let conn = Connection::open_in_memory().unwrap();

        let err = apply(&conn, BROKEN).unwrap_err();

        assert!(matches!(err, DatabaseError::Migration { version: 2, .. }));
        assert_eq!(applied(&conn), 1);
        assert!(!column_exists(&conn, "items", "label").unwrap());

        const FIXED: &[Migration] = &[
            Migration {
                version: 1,
                description: "create_items",
                step: Step::Sql("CREATE TABLE items (id INTEGER PRIMARY KEY);"),
            },
            Migration {
                version: 2,
                description: "add_item_columns",
                step: Step::AddColumns {
                    table: "items",
                    columns: &[("label", "TEXT"), ("weight", "REAL")],
                },
            },
        ];
        apply(&conn, FIXED).unwrap();
        assert_eq!(applied(&conn), 2);
        assert!(column_exists(&conn, "items", "weight").unwrap());
    }

    #[test]
    fn test_status_constraint() {
        let conn = migrated();
        let err = conn
            .execute(
                "INSERT INTO appointments (id, name, email, phone, appointment_type,
                 appointment_date, appointment_time, reason, created_at, status)
                 VALUES ('x', 'n', 'e', 'p', 't', 'd', 't', 'r', 'c', 'archived')",
                [],
            )
            .unwrap_err();
        assert!(err.to_string().contains("CHECK"));
    }

    #[test]
    fn test_rejects_odd_table_name() {
        let conn = migrated();
        assert!(column_exists(&conn, "appointments; DROP", "id").is_err());
    }
}
