//! SQLite implementation of `DocumentStore`.
//!
//! Documents live in the `documents` table as JSON text; filters and patches
//! are compiled to `json_extract` / `json_set` expressions. Identifier keys
//! are inlined as `'$.key'` so the expression indexes apply; any other key is
//! bound as a quoted path `$."key"`.

use super::{
    ensure_field_name, is_plain_field, Collection, Document, DocumentStore, Filter, Patch,
    StoreError, StoreResult,
};
use crate::db::migrations::{current_user_version, latest_version};
use rusqlite::types::Value as SqlValue;
use rusqlite::{ffi, params_from_iter, Connection, Transaction, TransactionBehavior};
use serde_json::Value;

/// SQLite-backed document store borrowing one migrated connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Creates a store from a connection returned by `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn apply_patch(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: &Patch,
        first_only: bool,
    ) -> StoreResult<usize> {
        if patch.is_empty() {
            let matched = self.count(collection, filter)?;
            return Ok(if first_only { matched.min(1) } else { matched });
        }

        let (set_sql, mut binds) = compile_patch(patch)?;
        let (where_sql, where_binds) = compile_filter(collection, filter)?;
        binds.extend(where_binds);

        let target = if first_only {
            format!("seq = (SELECT seq FROM documents WHERE {where_sql} ORDER BY seq ASC LIMIT 1)")
        } else {
            where_sql
        };
        let changed = self.conn.execute(
            &format!(
                "UPDATE documents
                 SET body = {set_sql},
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE {target};"
            ),
            params_from_iter(binds),
        )?;
        Ok(changed)
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        let (where_sql, mut binds) = compile_filter(collection, filter)?;
        binds.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

        let mut stmt = self.conn.prepare(&format!(
            "SELECT body FROM documents WHERE {where_sql} ORDER BY seq ASC LIMIT ?;"
        ))?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            documents.push(parse_body(&body)?);
        }
        Ok(documents)
    }

    fn count(&self, collection: Collection, filter: &Filter) -> StoreResult<usize> {
        let (where_sql, binds) = compile_filter(collection, filter)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM documents WHERE {where_sql};"),
            params_from_iter(binds),
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn insert_one(&self, collection: Collection, document: &Document) -> StoreResult<()> {
        let body = serde_json::to_string(document)
            .map_err(|err| StoreError::InvalidData(format!("cannot encode document: {err}")))?;

        let result = self.conn.execute(
            "INSERT INTO documents (collection, body) VALUES (?1, ?2);",
            [collection.as_str(), body.as_str()],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                let id = document
                    .get("id")
                    .map(|value| match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_default();
                Err(StoreError::DuplicateId { collection, id })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: &Patch,
    ) -> StoreResult<usize> {
        self.apply_patch(collection, filter, patch, true)
    }

    fn update_many(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: &Patch,
    ) -> StoreResult<usize> {
        self.apply_patch(collection, filter, patch, false)
    }

    fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<usize> {
        let (where_sql, binds) = compile_filter(collection, filter)?;
        let deleted = self.conn.execute(
            &format!(
                "DELETE FROM documents
                 WHERE seq = (SELECT seq FROM documents WHERE {where_sql} ORDER BY seq ASC LIMIT 1);"
            ),
            params_from_iter(binds),
        )?;
        Ok(deleted)
    }

    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        // Dropping `tx` on the error path rolls back every write made by `op`.
        let value = op()?;
        tx.commit().map_err(StoreError::from)?;
        Ok(value)
    }
}

fn compile_filter(collection: Collection, filter: &Filter) -> StoreResult<(String, Vec<SqlValue>)> {
    let mut sql = String::from("collection = ?");
    let mut binds = vec![SqlValue::Text(collection.as_str().to_string())];

    for (field, expected) in filter.clauses() {
        let path = json_path(field, &mut binds)?;
        let column = format!("json_extract(body, {path})");
        match expected {
            Value::Null => sql.push_str(&format!(" AND {column} IS NULL")),
            Value::Bool(flag) => {
                sql.push_str(&format!(" AND json_type(body, {path}) = ?"));
                binds.push(SqlValue::Text(if *flag { "true" } else { "false" }.to_string()));
            }
            Value::Number(number) => {
                sql.push_str(&format!(" AND {column} = ?"));
                binds.push(match number.as_i64() {
                    Some(int) => SqlValue::Integer(int),
                    None => SqlValue::Real(number.as_f64().unwrap_or(f64::NAN)),
                });
            }
            Value::String(text) => {
                sql.push_str(&format!(" AND {column} = ?"));
                binds.push(SqlValue::Text(text.clone()));
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(StoreError::UnsupportedFilterValue {
                    field: field.clone(),
                });
            }
        }
    }

    Ok((sql, binds))
}

fn compile_patch(patch: &Patch) -> StoreResult<(String, Vec<SqlValue>)> {
    let mut sql = String::from("json_set(body");
    let mut binds = Vec::with_capacity(patch.len());
    for (field, value) in patch {
        let path = json_path(field, &mut binds)?;
        sql.push_str(&format!(", {path}, json(?)"));
        binds.push(SqlValue::Text(value.to_string()));
    }
    sql.push(')');
    Ok((sql, binds))
}

/// Returns the SQL for the JSON path of `field`, pushing a bind when the path
/// has to be quoted.
fn json_path(field: &str, binds: &mut Vec<SqlValue>) -> StoreResult<String> {
    ensure_field_name(field)?;
    if is_plain_field(field) {
        return Ok(format!("'$.{field}'"));
    }
    binds.push(SqlValue::Text(format!("$.\"{field}\"")));
    Ok("?".to_string())
}

fn parse_body(body: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(StoreError::InvalidData(format!(
            "expected JSON object, found `{other}`"
        ))),
        Err(err) => Err(StoreError::InvalidData(err.to_string())),
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{compile_filter, compile_patch};
    use rusqlite::types::Value as SqlValue;
    use crate::store::{Collection, Filter, Patch, StoreError};
    use serde_json::{json, Value};

    #[test]
    fn compile_filter_scopes_collection_and_binds_values() {
        let filter = Filter::new().eq("id", "p1").eq("folderId", Value::Null);
        let (sql, binds) = compile_filter(Collection::Pebbles, &filter).unwrap();
        assert_eq!(
            sql,
            "collection = ? AND json_extract(body, '$.id') = ? AND json_extract(body, '$.folderId') IS NULL"
        );
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn compile_filter_rejects_structured_values() {
        let filter = Filter::new().eq("tags", json!(["a"]));
        let err = compile_filter(Collection::Pebbles, &filter).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedFilterValue { field } if field == "tags"));
    }

    #[test]
    fn compile_patch_encodes_values_as_json_text() {
        let mut patch = Patch::new();
        patch.insert("folderId".to_string(), Value::Null);
        let (sql, binds) = compile_patch(&patch).unwrap();
        assert_eq!(sql, "json_set(body, '$.folderId', json(?))");
        assert_eq!(binds, vec![SqlValue::Text("null".to_string())]);
    }

    #[test]
    fn non_identifier_keys_are_bound_as_quoted_paths() {
        let mut patch = Patch::new();
        patch.insert("my-note".to_string(), json!("z"));
        let (sql, binds) = compile_patch(&patch).unwrap();
        assert_eq!(sql, "json_set(body, ?, json(?))");
        assert_eq!(
            binds,
            vec![
                SqlValue::Text("$.\"my-note\"".to_string()),
                SqlValue::Text("\"z\"".to_string())
            ]
        );

        let filter = Filter::new().eq("x') OR 1=1 --", "v");
        let (sql, binds) = compile_filter(Collection::Pebbles, &filter).unwrap();
        assert_eq!(sql, "collection = ? AND json_extract(body, ?) = ?");
        assert_eq!(binds[1], SqlValue::Text("$.\"x') OR 1=1 --\"".to_string()));
    }
}
