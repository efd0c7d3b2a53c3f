//! SQLite 持久化：倒计时完成记录，便于迁移与长期保存

use chrono::Utc;
use rusqlite::Connection;

/// 数据库文件名（放在应用数据目录下）
pub const DB_FILENAME: &str = "pmdr.db";

/// 应用数据目录（可迁移：复制此目录即可）
pub fn data_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("pmdr")
}

pub fn db_path() -> std::path::PathBuf {
    data_dir().join(DB_FILENAME)
}

/// 打开数据库并创建表（若不存在）
pub fn open_and_init() -> Result<Connection, rusqlite::Error> {
    let path = db_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let conn = Connection::open(&path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 创建 countdown_records 表
fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS countdown_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            duration_secs INTEGER NOT NULL,
            completed_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// 插入一条完成记录
fn insert_record(conn: &Connection, duration_secs: i64, completed_at: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO countdown_records (duration_secs, completed_at) VALUES (?1, ?2)",
        rusqlite::params![duration_secs, completed_at],
    )?;
    Ok(())
}

/// 记一笔刚跑完的倒计时。自带连接，可以从后台线程调用。
pub fn record_completion(duration: std::time::Duration) -> Result<(), rusqlite::Error> {
    let conn = open_and_init()?;
    insert_record(&conn, duration.as_secs() as i64, &Utc::now().to_rfc3339())
}

/// 已完成的倒计时总数
pub fn completed_count(conn: &Connection) -> Result<u64, rusqlite::Error> {
    conn.query_row("SELECT COUNT(*) FROM countdown_records", [], |row| {
        row.get::<_, i64>(0).map(|n| n as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        init_schema(&conn).expect("init schema");
        conn
    }

    #[test]
    fn schema_init_is_idempotent() {
        let conn = memory_db();
        init_schema(&conn).expect("second init");
    }

    #[test]
    fn insert_and_count_records() {
        let conn = memory_db();
        assert_eq!(completed_count(&conn).unwrap(), 0);
        insert_record(&conn, 900, "2026-08-30T10:00:00Z").unwrap();
        insert_record(&conn, 300, "2026-08-30T11:00:00Z").unwrap();
        assert_eq!(completed_count(&conn).unwrap(), 2);
    }
}
