//! Inline parameter binding for MySQL statements

use dblog_core::{DblogError, Result, Value};

/// Escape a value for SQL literal inclusion
pub fn value_to_mysql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Float64(v) if v.is_finite() => v.to_string(),
        Value::Float64(_) => "NULL".to_string(),
        Value::Decimal(v) => v.clone(),
        Value::String(v) => quote(v),
        Value::Bytes(v) => {
            let hex: String = v.iter().map(|b| format!("{:02x}", b)).collect();
            format!("X'{}'", hex)
        }
        Value::Date(v) => format!("'{}'", v),
        Value::Time(v) => format!("'{}'", v.format("%H:%M:%S%.f")),
        Value::DateTime(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S%.f")),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// Substitute `?` and `$n` placeholders with escaped literals.
///
/// Placeholders inside quoted strings and identifiers are left alone, and
/// substituted values are never rescanned.
pub fn bind_params(sql: &str, params: &[Value]) -> Result<String> {
    if params.is_empty() {
        return Ok(sql.to_string());
    }

    let missing = |index: usize| {
        DblogError::Query(format!(
            "statement references parameter {} but {} were given",
            index + 1,
            params.len()
        ))
    };

    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut next = 0;
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(open) = quote {
            out.push(c);
            if c == '\\' && open != '`' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == open {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            '?' => {
                let value = params.get(next).ok_or_else(|| missing(next))?;
                out.push_str(&value_to_mysql_literal(value));
                next += 1;
            }
            '$' if chars.peek().is_some_and(|d| d.is_ascii_digit()) => {
                let mut position = 0usize;
                while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                    position = position.saturating_mul(10).saturating_add(digit as usize);
                    chars.next();
                }
                let index = position
                    .checked_sub(1)
                    .ok_or_else(|| DblogError::Query("parameter $0 is not valid".into()))?;
                let value = params.get(index).ok_or_else(|| missing(index))?;
                out.push_str(&value_to_mysql_literal(value));
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(value_to_mysql_literal(&Value::Null), "NULL");
        assert_eq!(value_to_mysql_literal(&Value::Bool(true)), "TRUE");
        assert_eq!(value_to_mysql_literal(&Value::Int64(-7)), "-7");
        assert_eq!(value_to_mysql_literal(&Value::Float64(f64::NAN)), "NULL");
        assert_eq!(value_to_mysql_literal(&Value::Bytes(vec![0xde, 0xad])), "X'dead'");
        assert_eq!(
            value_to_mysql_literal(&Value::String(r"it's C:\temp".into())),
            r"'it''s C:\\temp'"
        );
    }

    #[test]
    fn test_bind_positional() {
        let sql = bind_params(
            "INSERT INTO log (level, text) VALUES (?, ?)",
            &["Error".into(), "disk full?".into()],
        )
        .unwrap();
        assert_eq!(sql, "INSERT INTO log (level, text) VALUES ('Error', 'disk full?')");
    }

    #[test]
    fn test_bind_numbered() {
        let sql = bind_params("SELECT $2, $1, $2", &[Value::Int64(1), "b".into()]).unwrap();
        assert_eq!(sql, "SELECT 'b', 1, 'b'");
    }

    #[test]
    fn test_placeholders_in_strings_are_kept() {
        let sql = bind_params("SELECT '?', `a?`, 'it''s ?' , ?", &[Value::Int64(5)]).unwrap();
        assert_eq!(sql, "SELECT '?', `a?`, 'it''s ?' , 5");

        let sql = bind_params(r"SELECT 'a\'?', ?", &[Value::Int64(5)]).unwrap();
        assert_eq!(sql, r"SELECT 'a\'?', 5");
    }

    #[test]
    fn test_missing_params() {
        let err = bind_params("SELECT ?, ?", &[Value::Int64(1)]).unwrap_err();
        assert!(err.to_string().contains("parameter 2"));
        assert!(bind_params("SELECT $3", &[Value::Int64(1)]).is_err());
        assert!(bind_params("SELECT $0", &[Value::Int64(1)]).is_err());
    }

    #[test]
    fn test_no_params_is_untouched() {
        assert_eq!(bind_params("SELECT '?'", &[]).unwrap(), "SELECT '?'");
        assert_eq!(bind_params("SELECT ?", &[]).unwrap(), "SELECT ?");
    }
}
