use sqlx::{Executor, Result, Sqlite, SqlitePool};

use super::{FaceRecord, encode_vector};

/// 保存人脸，身份已存在时覆盖旧的向量
pub async fn save_entry<'c, E>(executor: E, identity: &str, vector: &[f64]) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    let encoding = encode_vector(vector);
    sqlx::query(
        r#"
        INSERT INTO face (identity, encoding)
        VALUES (?, ?)
        ON CONFLICT(identity) DO UPDATE SET
            encoding = excluded.encoding,
            enrolled_at = excluded.enrolled_at
        "#,
    )
    .bind(identity)
    .bind(encoding)
    .execute(executor)
    .await?;

    Ok(())
}

/// 按登记顺序读取所有人脸
pub async fn load_all_entries(executor: &SqlitePool) -> Result<Vec<FaceRecord>> {
    sqlx::query_as::<_, FaceRecord>(
        r#"
        SELECT identity, encoding FROM face ORDER BY rowid
        "#,
    )
    .fetch_all(executor)
    .await
}

/// 删除一个身份，返回是否存在
pub async fn delete_entry(executor: &SqlitePool, identity: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM face WHERE identity = ?
        "#,
    )
    .bind(identity)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 已登记的身份数量
pub async fn count_entries(executor: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM face").fetch_one(executor).await?;
    Ok(count)
}
