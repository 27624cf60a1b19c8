use crate::errors::PlaybackError;
use crate::logging::append_run_log;
use crate::matcher::RequestMatcher;
use crate::recording::{RequestRecord, ResponseRecord};
use crate::repository::jsonl::unix_ms;
use crate::repository::RecordingRepository;
use crate::request::Request;
use crate::response::Response;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::path::{Path, PathBuf};

type StoreResult<T> = Result<T, PlaybackError>;

const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    "CREATE TABLE IF NOT EXISTS recordings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        method TEXT NOT NULL,
        uri TEXT NOT NULL,
        request_json TEXT NOT NULL,
        response_json TEXT NOT NULL,
        recorded_at INTEGER NOT NULL
    );",
)];

/// SQLite-backed store. Rows are scanned in `id` order, so insertion order
/// decides which of several equivalent recordings wins.
#[derive(Debug)]
pub struct SqliteRecordingRepository {
    conn: Connection,
    db_path: PathBuf,
}

impl SqliteRecordingRepository {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        append_run_log(
            "info",
            "repository.sqlite.open",
            json!({ "path": path.display().to_string() }),
        );
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PlaybackError::Database(e.to_string()))?;
        }

        if path.exists() {
            let meta =
                std::fs::metadata(&path).map_err(|e| PlaybackError::Database(e.to_string()))?;
            if meta.len() == 0 {
                return Err(PlaybackError::Database(format!(
                    "recording database is 0 bytes (corrupt): {}",
                    path.display()
                )));
            }
        }

        let mut conn = Connection::open(&path).map_err(db_err)?;
        configure_connection(&conn)?;
        run_migrations(&mut conn)?;

        Ok(Self {
            conn,
            db_path: path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl RecordingRepository for SqliteRecordingRepository {
    fn save(&mut self, request: Request, response: Response) -> StoreResult<()> {
        let request_json = serde_json::to_string(&RequestRecord::from(&request))
            .map_err(|e| PlaybackError::Database(e.to_string()))?;
        let response_json = serde_json::to_string(&ResponseRecord::from(&response))
            .map_err(|e| PlaybackError::Database(e.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO recordings(method, uri, request_json, response_json, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    request.method().as_str(),
                    request.uri().to_string(),
                    request_json,
                    response_json,
                    unix_ms()
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    fn find(
        &self,
        request: &Request,
        matcher: &dyn RequestMatcher,
    ) -> StoreResult<Option<Response>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, request_json, response_json FROM recordings ORDER BY id ASC")
            .map_err(db_err)?;
        let mut rows = stmt.query([]).map_err(db_err)?;
        while let Some(row) = rows.next().map_err(db_err)? {
            let id: i64 = row.get(0).map_err(db_err)?;
            let request_json: String = row.get(1).map_err(db_err)?;
            let recorded: RequestRecord = serde_json::from_str(&request_json)
                .map_err(|e| PlaybackError::Database(format!("recording {id}: {e}")))?;
            let recorded = recorded.into_request()?;
            if !matcher.matches(request, &recorded).is_match() {
                continue;
            }
            let response_json: String = row.get(2).map_err(db_err)?;
            let response: ResponseRecord = serde_json::from_str(&response_json)
                .map_err(|e| PlaybackError::Database(format!("recording {id}: {e}")))?;
            return response.into_response().map(Some);
        }
        Ok(None)
    }

    fn len(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM recordings", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn configure_connection(conn: &Connection) -> StoreResult<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(db_err)?;
    conn.pragma_update(None, "synchronous", "FULL")
        .map_err(db_err)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(db_err)?;
    Ok(())
}

fn run_migrations(conn: &mut Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER PRIMARY KEY, applied_at INTEGER NOT NULL);",
    )
    .map_err(db_err)?;

    for (version, sql) in MIGRATIONS {
        let exists = conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1 LIMIT 1",
                [version],
                |_| Ok(()),
            )
            .optional()
            .map_err(db_err)?
            .is_some();
        if exists {
            continue;
        }

        let tx = conn.transaction().map_err(db_err)?;
        tx.execute_batch(sql).map_err(db_err)?;
        tx.execute(
            "INSERT INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
            params![version, unix_ms()],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        append_run_log(
            "info",
            "repository.sqlite.migration.applied",
            json!({ "version": version }),
        );
    }

    Ok(())
}

fn db_err(error: rusqlite::Error) -> PlaybackError {
    PlaybackError::Database(error.to_string())
}
