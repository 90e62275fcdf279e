//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each backend has its own ordered list of (name, sql_content) tuples.
//!
//! IMPORTANT: When adding a new migration:
//! 1. Create the SQL file for each backend: NNN_description.sql
//! 2. Add an entry to both lists in order

/// Name of the bootstrap migration that creates `sys_migrations`
pub const BOOTSTRAP_MIGRATION: &str = "000_migrations.sql";

/// DuckDB migrations, embedded at compile time
pub const DUCKDB_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("duckdb/000_migrations.sql")),
    ("001_wallets.sql", include_str!("duckdb/001_wallets.sql")),
];

/// PostgreSQL migrations, embedded at compile time
pub const POSTGRES_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("postgres/000_migrations.sql")),
    ("001_wallets.sql", include_str!("postgres/001_wallets.sql")),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_lists_are_ordered_and_aligned() {
        for list in [DUCKDB_MIGRATIONS, POSTGRES_MIGRATIONS] {
            assert_eq!(list[0].0, BOOTSTRAP_MIGRATION);
            let names: Vec<&str> = list.iter().map(|(n, _)| *n).collect();
            let mut sorted = names.clone();
            sorted.sort();
            assert_eq!(names, sorted);
        }
        let duck: Vec<&str> = DUCKDB_MIGRATIONS.iter().map(|(n, _)| *n).collect();
        let pg: Vec<&str> = POSTGRES_MIGRATIONS.iter().map(|(n, _)| *n).collect();
        assert_eq!(duck, pg);
    }
}
