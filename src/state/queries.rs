// Database CRUD operations
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::db::{DbConnection, DbError, DbResult};
use super::models::{FoldScoreRecord, Run, RunStatus, RunWithScores};

fn parse_uuid(idx: usize, raw: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<Run> {
    Ok(Run {
        id: parse_uuid(0, row.get(0)?)?,
        created_at: parse_timestamp(1, row.get(1)?)?,
        classifier: row.get(2)?,
        laterality: row.get(3)?,
        sensors: row.get(4)?,
        window_size: row.get(5)?,
        folds: row.get(6)?,
        seed: row.get(7)?,
        example_count: row.get(8)?,
        status: RunStatus::from_string(&row.get::<_, String>(9)?),
    })
}

const RUN_COLUMNS: &str = "id, created_at, classifier, laterality, sensors, window_size, folds, seed, example_count, status";

// ==================== RUN QUERIES ====================

/// Create a new pending run
#[allow(clippy::too_many_arguments)]
pub fn create_run(
    db: &DbConnection,
    classifier: &str,
    laterality: &str,
    sensors: &str,
    window_size: usize,
    folds: usize,
    seed: u64,
    example_count: usize,
) -> DbResult<Run> {
    let seed = i64::try_from(seed).map_err(|_| DbError::OutOfRange {
        field: "seed",
        value: seed,
    })?;

    let run = Run {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        classifier: classifier.to_string(),
        laterality: laterality.to_string(),
        sensors: sensors.to_string(),
        window_size: window_size as i64,
        folds: folds as i64,
        seed,
        example_count: example_count as i64,
        status: RunStatus::Pending,
    };

    let conn = db.lock()?;
    conn.execute(
        "INSERT INTO runs (id, created_at, classifier, laterality, sensors, window_size, folds, seed, example_count, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            run.id.to_string(),
            run.created_at.to_rfc3339(),
            run.classifier,
            run.laterality,
            run.sensors,
            run.window_size,
            run.folds,
            run.seed,
            run.example_count,
            run.status.to_string(),
        ],
    )?;

    Ok(run)
}

/// Get a run by ID
pub fn get_run(db: &DbConnection, id: &Uuid) -> DbResult<Option<Run>> {
    let conn = db.lock()?;
    let mut stmt = conn.prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

    match stmt.query_row([id.to_string()], run_from_row) {
        Ok(run) => Ok(Some(run)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List all runs, newest first
pub fn list_runs(db: &DbConnection) -> DbResult<Vec<Run>> {
    let conn = db.lock()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM runs ORDER BY created_at DESC",
        RUN_COLUMNS
    ))?;

    let runs = stmt
        .query_map([], run_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(runs)
}

/// Update run status
pub fn update_run_status(db: &DbConnection, id: &Uuid, status: RunStatus) -> DbResult<()> {
    let conn = db.lock()?;
    conn.execute(
        "UPDATE runs SET status = ?1 WHERE id = ?2",
        params![status.to_string(), id.to_string()],
    )?;
    Ok(())
}

// ==================== FOLD SCORE QUERIES ====================

/// Insert (or replace) the per-fold accuracies of a run in one transaction
pub fn record_fold_scores(db: &DbConnection, scores: &[FoldScoreRecord]) -> DbResult<()> {
    let conn = db.lock()?;
    let tx = conn.unchecked_transaction()?;

    for score in scores {
        tx.execute(
            "INSERT OR REPLACE INTO fold_scores (run_id, fold, overall, steady_state, transitional)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                score.run_id.to_string(),
                score.fold,
                score.overall,
                score.steady_state,
                score.transitional,
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Fold scores of a run, ordered by fold
pub fn list_fold_scores(db: &DbConnection, run_id: &Uuid) -> DbResult<Vec<FoldScoreRecord>> {
    let conn = db.lock()?;
    let mut stmt = conn.prepare(
        "SELECT run_id, fold, overall, steady_state, transitional
         FROM fold_scores WHERE run_id = ?1 ORDER BY fold ASC",
    )?;

    let scores = stmt
        .query_map([run_id.to_string()], |row| {
            Ok(FoldScoreRecord {
                run_id: parse_uuid(0, row.get(0)?)?,
                fold: row.get(1)?,
                overall: row.get(2)?,
                steady_state: row.get(3)?,
                transitional: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(scores)
}

/// Get run with all its fold scores
pub fn get_run_with_scores(db: &DbConnection, id: &Uuid) -> DbResult<Option<RunWithScores>> {
    let Some(run) = get_run(db, id)? else {
        return Ok(None);
    };
    let scores = list_fold_scores(db, id)?;
    Ok(Some(RunWithScores { run, scores }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_run(db: &DbConnection) -> Run {
        create_run(db, "LDA", "bilateral", "imu_emg", 500, 10, 7, 420).unwrap()
    }

    #[test]
    fn test_create_and_get_run() {
        let db = DbConnection::open_in_memory().unwrap();
        let run = sample_run(&db);

        let fetched = get_run(&db, &run.id).unwrap().unwrap();
        assert_eq!(fetched.classifier, "LDA");
        assert_eq!(fetched.sensors, "imu_emg");
        assert_eq!(fetched.example_count, 420);
        assert_eq!(fetched.seed, 7);
        assert_eq!(fetched.status, RunStatus::Pending);
    }

    #[test]
    fn test_get_missing_run() {
        let db = DbConnection::open_in_memory().unwrap();
        assert!(get_run(&db, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_seed_kept_exactly() {
        let db = DbConnection::open_in_memory().unwrap();
        let max = i64::MAX as u64;

        let run = create_run(&db, "SVM", "bilateral", "emg", 500, 10, max, 12).unwrap();
        assert_eq!(get_run(&db, &run.id).unwrap().unwrap().seed as u64, max);

        let result = create_run(&db, "SVM", "bilateral", "emg", 500, 10, max + 1, 12);
        assert!(matches!(
            result,
            Err(DbError::OutOfRange { field: "seed", value }) if value == max + 1
        ));
        assert_eq!(list_runs(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_update_run_status() {
        let db = DbConnection::open_in_memory().unwrap();
        let run = sample_run(&db);

        update_run_status(&db, &run.id, RunStatus::Complete).unwrap();
        let fetched = get_run(&db, &run.id).unwrap().unwrap();
        assert_eq!(fetched.status, RunStatus::Complete);
        assert_eq!(list_runs(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_fold_scores_keep_undefined_as_null() {
        let db = DbConnection::open_in_memory().unwrap();
        let run = sample_run(&db);

        let scores = vec![
            FoldScoreRecord {
                run_id: run.id,
                fold: 1,
                overall: Some(0.5),
                steady_state: None,
                transitional: Some(0.25),
            },
            FoldScoreRecord {
                run_id: run.id,
                fold: 0,
                overall: Some(0.75),
                steady_state: Some(1.0),
                transitional: None,
            },
        ];
        record_fold_scores(&db, &scores).unwrap();

        let with_scores = get_run_with_scores(&db, &run.id).unwrap().unwrap();
        assert_eq!(with_scores.scores.len(), 2);
        assert_eq!(with_scores.scores[0].fold, 0);
        assert_eq!(with_scores.scores[0].transitional, None);
        assert_eq!(with_scores.scores[1], scores[0]);

        let nulls: i32 = db
            .lock()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM fold_scores WHERE steady_state IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(nulls, 1);
    }
}
