//! CRUD statement builder.
//!
//! Pure transformation from a `CrudIntent` into SQL text plus an ordered
//! parameter list with `$1..$n` positional placeholders. Values are never
//! interpolated; identifiers are validated before any SQL is assembled.
//!
//! Placeholder numbering is order-sensitive: for UPDATE, the SET clause
//! consumes `$1..$k` and the WHERE clause continues at `$k+1`, with the
//! params vector concatenated in the same order.

use crate::error::{DbError, DbResult};
use crate::models::{CrudIntent, FieldMap, ParamValue};

/// A built statement, ready for the executor.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<ParamValue>,
    /// Command-tag prefix, populated for raw queries only.
    pub command: Option<String>,
}

/// Build SQL and ordered params from a CRUD intent.
pub fn build(intent: CrudIntent) -> DbResult<Statement> {
    match intent {
        CrudIntent::RawQuery { sql, params } => {
            if sql.trim().is_empty() {
                return Err(DbError::validation("Query must not be empty"));
            }
            let command = leading_keyword(&sql);
            Ok(Statement {
                sql,
                params,
                command,
            })
        }
        CrudIntent::Create { table, fields } => build_create(&table, fields),
        CrudIntent::Read {
            table,
            conditions,
            order_by,
            limit,
            offset,
        } => build_read(&table, conditions, order_by.as_deref(), limit, offset),
        CrudIntent::Update {
            table,
            fields,
            conditions,
        } => build_update(&table, fields, conditions),
        CrudIntent::Delete { table, conditions } => build_delete(&table, conditions),
    }
}

fn build_create(table: &str, fields: FieldMap) -> DbResult<Statement> {
    ensure_table(table)?;
    if fields.is_empty() {
        return Err(DbError::validation(
            "Create requires at least one field to insert",
        ));
    }

    let mut columns = Vec::with_capacity(fields.len());
    let mut placeholders = Vec::with_capacity(fields.len());
    let mut params = Vec::with_capacity(fields.len());
    for (idx, (column, value)) in fields.into_iter().enumerate() {
        ensure_column(&column)?;
        placeholders.push(format!("${}", idx + 1));
        columns.push(column);
        params.push(ParamValue::from(value));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );
    Ok(Statement {
        sql,
        params,
        command: None,
    })
}

fn build_read(
    table: &str,
    conditions: FieldMap,
    order_by: Option<&str>,
    limit: Option<u64>,
    offset: Option<u64>,
) -> DbResult<Statement> {
    ensure_table(table)?;

    let mut sql = format!("SELECT * FROM {}", table);
    let mut params = Vec::with_capacity(conditions.len());
    if !conditions.is_empty() {
        let clause = where_clause(conditions, 0, &mut params)?;
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }

    if let Some(order_by) = order_by {
        ensure_order_by(order_by)?;
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
    }
    // Spliced as integer literals; the u64 type rules out injection.
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = offset {
        sql.push_str(&format!(" OFFSET {}", offset));
    }

    Ok(Statement {
        sql,
        params,
        command: None,
    })
}

fn build_update(table: &str, fields: FieldMap, conditions: FieldMap) -> DbResult<Statement> {
    ensure_table(table)?;
    if fields.is_empty() {
        return Err(DbError::validation(
            "Update requires at least one field to set",
        ));
    }
    if conditions.is_empty() {
        return Err(DbError::validation(
            "Update requires at least one condition; an unconditional update is not allowed",
        ));
    }

    let mut params = Vec::with_capacity(fields.len() + conditions.len());
    let mut assignments = Vec::with_capacity(fields.len());
    for (idx, (column, value)) in fields.into_iter().enumerate() {
        ensure_column(&column)?;
        assignments.push(format!("{} = ${}", column, idx + 1));
        params.push(ParamValue::from(value));
    }

    // WHERE placeholders continue numbering after the SET values.
    let offset = params.len();
    let clause = where_clause(conditions, offset, &mut params)?;

    let sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING *",
        table,
        assignments.join(", "),
        clause
    );
    Ok(Statement {
        sql,
        params,
        command: None,
    })
}

fn build_delete(table: &str, conditions: FieldMap) -> DbResult<Statement> {
    ensure_table(table)?;
    if conditions.is_empty() {
        return Err(DbError::validation(
            "Delete requires at least one condition; an unconditional delete is not allowed",
        ));
    }

    let mut params = Vec::with_capacity(conditions.len());
    let clause = where_clause(conditions, 0, &mut params)?;

    let sql = format!("DELETE FROM {} WHERE {} RETURNING *", table, clause);
    Ok(Statement {
        sql,
        params,
        command: None,
    })
}

/// Render `col = $n AND ...` starting at placeholder `offset + 1`, pushing
/// condition values onto `params` in map order.
fn where_clause(
    conditions: FieldMap,
    offset: usize,
    params: &mut Vec<ParamValue>,
) -> DbResult<String> {
    let mut terms = Vec::with_capacity(conditions.len());
    for (idx, (column, value)) in conditions.into_iter().enumerate() {
        ensure_column(&column)?;
        terms.push(format!("{} = ${}", column, offset + idx + 1));
        params.push(ParamValue::from(value));
    }
    Ok(terms.join(" AND "))
}

/// Leading SQL keyword, uppercased.
fn leading_keyword(sql: &str) -> Option<String> {
    sql.split_whitespace()
        .next()
        .map(|word| word.trim_end_matches(';').to_ascii_uppercase())
        .filter(|word| !word.is_empty())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn ensure_table(table: &str) -> DbResult<()> {
    // Optionally schema-qualified: schema.table
    let mut parts = table.split('.');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, None) => is_identifier(name),
        (Some(schema), Some(name), None) => is_identifier(schema) && is_identifier(name),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DbError::validation(format!(
            "Invalid table name: {:?}",
            table
        )))
    }
}

fn ensure_column(column: &str) -> DbResult<()> {
    if is_identifier(column) {
        Ok(())
    } else {
        Err(DbError::validation(format!(
            "Invalid column name: {:?}",
            column
        )))
    }
}

/// An ORDER BY term list: comma-separated identifiers, each with an optional
/// ASC/DESC direction.
fn ensure_order_by(order_by: &str) -> DbResult<()> {
    let valid = !order_by.trim().is_empty()
        && order_by.split(',').all(|term| {
            let mut tokens = term.split_whitespace();
            match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(column), None, None) => is_identifier(column),
                (Some(column), Some(dir), None) => {
                    is_identifier(column)
                        && (dir.eq_ignore_ascii_case("asc") || dir.eq_ignore_ascii_case("desc"))
                }
                _ => false,
            }
        });
    if valid {
        Ok(())
    } else {
        Err(DbError::validation(format!(
            "Invalid ORDER BY expression: {:?}",
            order_by
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, serde_json::Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_raw_query_passthrough() {
        let statement = build(CrudIntent::RawQuery {
            sql: "select now()".to_string(),
            params: vec![ParamValue::Int(1)],
        })
        .unwrap();

        assert_eq!(statement.sql, "select now()");
        assert_eq!(statement.params, vec![ParamValue::Int(1)]);
        assert_eq!(statement.command.as_deref(), Some("SELECT"));
    }

    #[test]
    fn test_raw_query_empty_rejected() {
        let result = build(CrudIntent::RawQuery {
            sql: "   ".to_string(),
            params: Vec::new(),
        });
        assert!(matches!(result, Err(DbError::Validation { .. })));
    }

    #[test]
    fn test_create_builds_insert_in_field_order() {
        let statement = build(CrudIntent::Create {
            table: "users".to_string(),
            fields: map(&[("name", json!("Alice")), ("age", json!(30))]),
        })
        .unwrap();

        assert_eq!(
            statement.sql,
            "INSERT INTO users (name, age) VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(
            statement.params,
            vec![ParamValue::Text("Alice".to_string()), ParamValue::Int(30)]
        );
        assert!(statement.command.is_none());
    }

    #[test]
    fn test_create_empty_fields_rejected() {
        let result = build(CrudIntent::Create {
            table: "users".to_string(),
            fields: FieldMap::new(),
        });
        assert!(matches!(result, Err(DbError::Validation { .. })));
    }

    #[test]
    fn test_read_without_conditions_selects_all() {
        let statement = build(CrudIntent::Read {
            table: "users".to_string(),
            conditions: FieldMap::new(),
            order_by: None,
            limit: None,
            offset: None,
        })
        .unwrap();

        assert_eq!(statement.sql, "SELECT * FROM users");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_read_with_conditions_and_paging() {
        let statement = build(CrudIntent::Read {
            table: "users".to_string(),
            conditions: map(&[("active", json!(true)), ("role", json!("admin"))]),
            order_by: Some("created_at DESC".to_string()),
            limit: Some(10),
            offset: Some(20),
        })
        .unwrap();

        assert_eq!(
            statement.sql,
            "SELECT * FROM users WHERE active = $1 AND role = $2 \
             ORDER BY created_at DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            statement.params,
            vec![
                ParamValue::Bool(true),
                ParamValue::Text("admin".to_string())
            ]
        );
    }

    #[test]
    fn test_update_where_placeholders_continue_after_set() {
        let statement = build(CrudIntent::Update {
            table: "users".to_string(),
            fields: map(&[("name", json!("Bob")), ("age", json!(41))]),
            conditions: map(&[("id", json!(5)), ("active", json!(true))]),
        })
        .unwrap();

        assert_eq!(
            statement.sql,
            "UPDATE users SET name = $1, age = $2 WHERE id = $3 AND active = $4 RETURNING *"
        );
        assert_eq!(
            statement.params,
            vec![
                ParamValue::Text("Bob".to_string()),
                ParamValue::Int(41),
                ParamValue::Int(5),
                ParamValue::Bool(true),
            ]
        );
    }

    #[test]
    fn test_update_placeholder_count_is_fields_plus_conditions() {
        let fields = map(&[("a", json!(1)), ("b", json!(2)), ("c", json!(3))]);
        let conditions = map(&[("x", json!(4)), ("y", json!(5))]);
        let statement = build(CrudIntent::Update {
            table: "t".to_string(),
            fields,
            conditions,
        })
        .unwrap();

        for n in 1..=5 {
            assert!(
                statement.sql.contains(&format!("${}", n)),
                "missing placeholder ${} in {}",
                n,
                statement.sql
            );
        }
        assert!(!statement.sql.contains("$6"));
        assert_eq!(statement.params.len(), 5);
    }

    #[test]
    fn test_update_requires_fields_and_conditions() {
        let result = build(CrudIntent::Update {
            table: "users".to_string(),
            fields: FieldMap::new(),
            conditions: map(&[("id", json!(1))]),
        });
        assert!(matches!(result, Err(DbError::Validation { .. })));

        let result = build(CrudIntent::Update {
            table: "users".to_string(),
            fields: map(&[("name", json!("x"))]),
            conditions: FieldMap::new(),
        });
        assert!(matches!(result, Err(DbError::Validation { .. })));
    }

    #[test]
    fn test_delete_builds_where_from_conditions() {
        let statement = build(CrudIntent::Delete {
            table: "users".to_string(),
            conditions: map(&[("id", json!(5))]),
        })
        .unwrap();

        assert_eq!(statement.sql, "DELETE FROM users WHERE id = $1 RETURNING *");
        assert_eq!(statement.params, vec![ParamValue::Int(5)]);
    }

    #[test]
    fn test_delete_without_conditions_rejected() {
        let result = build(CrudIntent::Delete {
            table: "users".to_string(),
            conditions: FieldMap::new(),
        });
        assert!(matches!(result, Err(DbError::Validation { .. })));
    }

    #[test]
    fn test_hostile_table_names_rejected() {
        for table in [
            "users; DROP TABLE users",
            "users--",
            "",
            "1users",
            "a.b.c",
            "us ers",
        ] {
            let result = build(CrudIntent::Read {
                table: table.to_string(),
                conditions: FieldMap::new(),
                order_by: None,
                limit: None,
                offset: None,
            });
            assert!(
                matches!(result, Err(DbError::Validation { .. })),
                "table {:?} should be rejected",
                table
            );
        }
    }

    #[test]
    fn test_schema_qualified_table_accepted() {
        let statement = build(CrudIntent::Read {
            table: "audit.events".to_string(),
            conditions: FieldMap::new(),
            order_by: None,
            limit: None,
            offset: None,
        })
        .unwrap();
        assert_eq!(statement.sql, "SELECT * FROM audit.events");
    }

    #[test]
    fn test_hostile_column_names_rejected() {
        let result = build(CrudIntent::Create {
            table: "users".to_string(),
            fields: map(&[("name) VALUES ('x'); --", json!("y"))]),
        });
        assert!(matches!(result, Err(DbError::Validation { .. })));
    }

    #[test]
    fn test_order_by_validation() {
        for order_by in ["name", "name ASC", "name desc", "a, b DESC"] {
            let result = build(CrudIntent::Read {
                table: "users".to_string(),
                conditions: FieldMap::new(),
                order_by: Some(order_by.to_string()),
                limit: None,
                offset: None,
            });
            assert!(result.is_ok(), "{:?} should be accepted", order_by);
        }

        for order_by in ["name; DROP TABLE users", "name ASCX", "1col", ""] {
            let result = build(CrudIntent::Read {
                table: "users".to_string(),
                conditions: FieldMap::new(),
                order_by: Some(order_by.to_string()),
                limit: None,
                offset: None,
            });
            assert!(
                matches!(result, Err(DbError::Validation { .. })),
                "{:?} should be rejected",
                order_by
            );
        }
    }

    #[test]
    fn test_null_and_json_values_become_params() {
        let statement = build(CrudIntent::Create {
            table: "events".to_string(),
            fields: map(&[("payload", json!({"k": 1})), ("note", json!(null))]),
        })
        .unwrap();

        assert!(matches!(statement.params[0], ParamValue::Json(_)));
        assert_eq!(statement.params[1], ParamValue::Null);
    }

    #[test]
    fn test_leading_keyword() {
        assert_eq!(leading_keyword("SELECT 1").as_deref(), Some("SELECT"));
        assert_eq!(
            leading_keyword("  insert into t values (1);").as_deref(),
            Some("INSERT")
        );
        assert_eq!(leading_keyword(""), None);
    }
}
