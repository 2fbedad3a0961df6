//! [`SqliteStore`], the SQLite implementation of [`ObservationStore`] and
//! [`AuditSink`].

use std::path::Path;

use carelog_core::{
  observation::{Category, DayLog, MealWindow, ObservationRow},
  store::{
    AuditEntry, AuditSink, NewAuditEntry, ObservationStore, ReplaceCounts, ReplacePlan,
  },
};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, Transaction, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RawAuditEntry, RawPayload, RawRecord, encode_date, encode_dt, encode_enum, encode_uuid,
    table,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Carelog observation store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an empty in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statements ──────────────────────────────────────────────────────────────

/// The logical key rows are replaced under.
struct Key {
  resident_id: String,
  date:        String,
  meal:        MealWindow,
}

/// Delete the rows stored under `key` for `category`. Vitals are keyed by
/// day alone.
fn delete_key(tx: &Transaction<'_>, key: &Key, category: Category) -> rusqlite::Result<usize> {
  if category == Category::Vitals {
    return tx.execute(
      "DELETE FROM vitals WHERE resident_id = ?1 AND date = ?2",
      params![key.resident_id, key.date],
    );
  }
  tx.execute(
    &format!(
      "DELETE FROM {} WHERE resident_id = ?1 AND date = ?2 AND meal_window = ?3",
      table(category)
    ),
    params![key.resident_id, key.date, encode_enum(key.meal)],
  )
}

fn insert_row(tx: &Transaction<'_>, key: &Key, row: &ObservationRow) -> rusqlite::Result<()> {
  let record_id = encode_uuid(Uuid::new_v4());
  let recorded_at = encode_dt(Utc::now());
  let meal = encode_enum(key.meal);

  match row {
    ObservationRow::Vitals(v) => tx.execute(
      "INSERT INTO vitals (
         record_id, resident_id, date, meal_window,
         systolic, diastolic, pulse, recorded_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      params![
        record_id,
        key.resident_id,
        key.date,
        meal,
        v.systolic,
        v.diastolic,
        v.pulse,
        recorded_at,
      ],
    ),
    ObservationRow::Food(f) => tx.execute(
      "INSERT INTO food_intake (
         record_id, resident_id, date, meal_window, intake_level, notes, recorded_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      params![
        record_id,
        key.resident_id,
        key.date,
        meal,
        encode_enum(f.intake_level),
        f.notes,
        recorded_at,
      ],
    ),
    ObservationRow::Liquid { intake } => tx.execute(
      "INSERT INTO liquid_intake (
         record_id, resident_id, date, meal_window, intake, recorded_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![record_id, key.resident_id, key.date, meal, intake, recorded_at],
    ),
    ObservationRow::Bowel(b) => tx.execute(
      "INSERT INTO bowel_movements (
         record_id, resident_id, date, meal_window, size, consistency, recorded_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      params![
        record_id,
        key.resident_id,
        key.date,
        meal,
        encode_enum(b.size),
        encode_enum(b.consistency),
        recorded_at,
      ],
    ),
    ObservationRow::Urine(u) => tx.execute(
      "INSERT INTO urine_output (
         record_id, resident_id, date, meal_window, output, recorded_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![record_id, key.resident_id, key.date, meal, encode_enum(u.output), recorded_at],
    ),
  }?;
  Ok(())
}

/// Read one category's rows for a resident and date, in insertion order.
fn select_category(
  conn: &Connection,
  category: Category,
  resident_id: &str,
  date: &str,
) -> rusqlite::Result<Vec<RawRecord>> {
  let columns = match category {
    Category::Vitals => "systolic, diastolic, pulse",
    Category::Food => "intake_level, notes",
    Category::Liquid => "intake",
    Category::Bowel => "size, consistency",
    Category::Urine => "output",
  };
  let sql = format!(
    "SELECT record_id, resident_id, date, meal_window, recorded_at, {columns}
     FROM {}
     WHERE resident_id = ?1 AND date = ?2
     ORDER BY rowid",
    table(category)
  );

  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(params![resident_id, date], |row| {
      let payload = match category {
        Category::Vitals => RawPayload::Vitals {
          systolic:  row.get(5)?,
          diastolic: row.get(6)?,
          pulse:     row.get(7)?,
        },
        Category::Food => RawPayload::Food {
          intake_level: row.get(5)?,
          notes:        row.get(6)?,
        },
        Category::Liquid => RawPayload::Liquid { intake: row.get(5)? },
        Category::Bowel => RawPayload::Bowel {
          size:        row.get(5)?,
          consistency: row.get(6)?,
        },
        Category::Urine => RawPayload::Urine { output: row.get(5)? },
      };
      Ok(RawRecord {
        record_id: row.get(0)?,
        resident_id: row.get(1)?,
        date: row.get(2)?,
        meal_window: row.get(3)?,
        recorded_at: row.get(4)?,
        payload,
      })
    })?
    .collect()
}

// ─── ObservationStore impl ───────────────────────────────────────────────────

impl ObservationStore for SqliteStore {
  type Error = crate::Error;

  async fn replace(&self, plan: ReplacePlan) -> Result<ReplaceCounts> {
    let resident_id = encode_uuid(plan.resident_id);
    let date = encode_date(plan.date);

    let counts = self
      .conn
      .call(move |conn| {
        // Dropping `tx` on an early return rolls everything back.
        let tx = conn.transaction()?;
        let mut counts = ReplaceCounts::default();

        for replacement in &plan.replacements {
          let key = Key {
            resident_id: resident_id.clone(),
            date:        date.clone(),
            meal:        replacement.meal,
          };
          counts.deleted += delete_key(&tx, &key, replacement.category)?;
          for row in &replacement.rows {
            insert_row(&tx, &key, row)?;
            counts.inserted += 1;
          }
        }

        tx.commit()?;
        Ok(counts)
      })
      .await?;

    tracing::debug!(deleted = counts.deleted, inserted = counts.inserted, "replace committed");
    Ok(counts)
  }

  async fn day_log(&self, resident_id: Uuid, date: NaiveDate) -> Result<DayLog> {
    let resident_str = encode_uuid(resident_id);
    let date_str = encode_date(date);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut raws = Vec::new();
        for category in [
          Category::Vitals,
          Category::Food,
          Category::Liquid,
          Category::Bowel,
          Category::Urine,
        ] {
          raws.extend(select_category(conn, category, &resident_str, &date_str)?);
        }
        Ok(raws)
      })
      .await?;

    let mut records = raws
      .into_iter()
      .map(RawRecord::into_record)
      .collect::<Result<Vec<_>>>()?;
    // Stable: slot order within a liquid key survives.
    records.sort_by_key(|r| (r.meal, r.row.category()));

    Ok(DayLog { resident_id, date, records })
  }
}

// ─── AuditSink impl ──────────────────────────────────────────────────────────

impl AuditSink for SqliteStore {
  type Error = crate::Error;

  async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
    let entry = AuditEntry {
      entry_id:    Uuid::new_v4(),
      user_id:     entry.user_id,
      action:      entry.action,
      recorded_at: Utc::now(),
    };

    let id_str = encode_uuid(entry.entry_id);
    let user_str = encode_uuid(entry.user_id);
    let action = entry.action.clone();
    let at_str = encode_dt(entry.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_log (entry_id, user_id, action, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![id_str, user_str, action, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawAuditEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, user_id, action, recorded_at
           FROM audit_log
           ORDER BY recorded_at DESC, rowid DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(params![limit_val], |row| {
            Ok(RawAuditEntry {
              entry_id:    row.get(0)?,
              user_id:     row.get(1)?,
              action:      row.get(2)?,
              recorded_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }
}
