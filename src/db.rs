use std::path::Path;

use rusqlite::Connection;

use crate::error::SinkError;
use crate::table::Table;

const TABLE_NAME: &str = "notices";

pub fn connect(path: &Path) -> Result<Connection, SinkError> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

/// Replace the `notices` table with the contents of `table`, adding a 1-based `id`.
pub fn save_table(conn: &Connection, table: &Table) -> Result<usize, SinkError> {
    let columns: Vec<String> = table.columns().iter().map(|c| quote_ident(c)).collect();

    let create = format!(
        "CREATE TABLE {} (id INTEGER PRIMARY KEY, {})",
        TABLE_NAME,
        columns
            .iter()
            .map(|c| format!("{} TEXT NOT NULL", c))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let placeholders: Vec<String> = (1..=columns.len() + 1).map(|i| format!("?{}", i)).collect();
    let insert = format!(
        "INSERT INTO {} (id, {}) VALUES ({})",
        TABLE_NAME,
        columns.join(", "),
        placeholders.join(", ")
    );

    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", TABLE_NAME))?;
        tx.execute(&create, [])?;
        let mut stmt = tx.prepare(&insert)?;
        for (i, row) in table.rows().iter().enumerate() {
            let id = (i + 1) as i64;
            let mut params: Vec<&dyn rusqlite::types::ToSql> = Vec::with_capacity(row.len() + 1);
            params.push(&id);
            params.extend(row.iter().map(|c| c as &dyn rusqlite::types::ToSql));
            count += stmt.execute(params.as_slice())?;
        }
    }
    tx.commit()?;
    Ok(count)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
