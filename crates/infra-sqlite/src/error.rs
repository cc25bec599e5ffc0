// sqlx::Error -> AppError mapping
// (orphan rules prevent a From impl for AppError in this crate)

use jobmatch_core::error::AppError;

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let Some(code) = db_err.code() else {
                return AppError::Database(format!("Database error: {}", db_err.message()));
            };
            let code = code.as_ref();

            // SQLite result codes: https://www.sqlite.org/rescode.html
            match code {
                "2067" | "1555" => AppError::Conflict(format!(
                    "Unique constraint violation: {} ({code})",
                    db_err.message()
                )),
                "5" => AppError::Database(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                _ => AppError::Database(format!("Database error [{code}]: {}", db_err.message())),
            }
        }
        sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Database(format!("Column not found: {col}")),
        _ => AppError::Database(err.to_string()),
    }
}
