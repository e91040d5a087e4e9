//! Formulary table operations.

use rusqlite::{params, ErrorCode, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{AlternativeSlot, DrugRecord, RawCost, ALTERNATIVE_SLOTS};
use crate::pricing::lookup::{lookup_record, FormularyLookup};

const SELECT_COLUMNS: &str = r#"
    medicine, therapeutic_class, indication, drug_cost,
    alternative_1, cost_1, alternative_2, cost_2, alternative_3, cost_3,
    alternative_4, cost_4, alternative_5, cost_5,
    insurance_drug, insurance_final_cost
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO formulary (
        id, medicine, therapeutic_class, indication, drug_cost,
        alternative_1, cost_1, alternative_2, cost_2, alternative_3, cost_3,
        alternative_4, cost_4, alternative_5, cost_5,
        insurance_drug, insurance_final_cost
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
"#;

/// Stored cost: only finite parsed values are persisted.
fn stored(cost: Option<&RawCost>) -> Option<f64> {
    cost.map(RawCost::value).filter(|c| c.is_finite())
}

fn slot(record: &DrugRecord, index: usize) -> (Option<String>, Option<f64>) {
    record
        .alternatives
        .get(index)
        .map(|s| (s.name.clone(), stored(s.cost.as_ref())))
        .unwrap_or((None, None))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DrugRecord> {
    let mut alternatives = Vec::with_capacity(ALTERNATIVE_SLOTS);
    for i in 0..ALTERNATIVE_SLOTS {
        let name: Option<String> = row.get(4 + i * 2)?;
        let cost: Option<f64> = row.get(5 + i * 2)?;
        alternatives.push(AlternativeSlot {
            name,
            cost: cost.map(RawCost::Number),
        });
    }
    while alternatives.last() == Some(&AlternativeSlot::default()) {
        alternatives.pop();
    }

    let base_cost: Option<f64> = row.get(3)?;
    let insurance_final_cost: Option<f64> = row.get(15)?;
    Ok(DrugRecord {
        name: row.get(0)?,
        therapeutic_class: row.get(1)?,
        indication: row.get(2)?,
        base_cost: base_cost.map(RawCost::Number),
        alternatives,
        insurance_drug: row.get(14)?,
        insurance_final_cost: insurance_final_cost.map(RawCost::Number),
    })
}

impl Database {
    fn insert_row(conn: &rusqlite::Connection, record: &DrugRecord, ignore_existing: bool) -> DbResult<Option<String>> {
        let name = record.name.trim();
        if name.is_empty() {
            return Err(DbError::InvalidInput("medicine name is empty".into()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let slots: Vec<_> = (0..ALTERNATIVE_SLOTS).map(|i| slot(record, i)).collect();
        let sql = if ignore_existing {
            INSERT_SQL.replacen("INSERT INTO", "INSERT OR IGNORE INTO", 1)
        } else {
            INSERT_SQL.to_string()
        };

        let result = conn.execute(
            &sql,
            params![
                id,
                name,
                record.therapeutic_class,
                record.indication,
                stored(record.base_cost.as_ref()),
                slots[0].0,
                slots[0].1,
                slots[1].0,
                slots[1].1,
                slots[2].0,
                slots[2].1,
                slots[3].0,
                slots[3].1,
                slots[4].0,
                slots[4].1,
                record.insurance_drug,
                stored(record.insurance_final_cost.as_ref()),
            ],
        );

        match result {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(id)),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(DbError::Constraint(format!("drug already exists: {}", name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a new drug. Returns the generated row id.
    ///
    /// Existing drugs are never overwritten: a name already in the store
    /// (case-insensitive) is a constraint violation.
    pub fn insert_drug(&self, record: &DrugRecord) -> DbResult<String> {
        let id = Self::insert_row(&self.conn, record, false)?
            .ok_or_else(|| DbError::Constraint(format!("drug already exists: {}", record.name.trim())))?;
        tracing::info!(medicine = %record.name.trim(), id = %id, "drug inserted");
        Ok(id)
    }

    /// Bulk-insert records in one transaction, skipping names already stored.
    ///
    /// Rows with blank names are skipped. Returns the number of rows inserted.
    pub fn import_drugs(&mut self, records: &[DrugRecord]) -> DbResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for record in records {
            if record.name.trim().is_empty() {
                continue;
            }
            if Self::insert_row(&tx, record, true)?.is_some() {
                inserted += 1;
            }
        }
        tx.commit()?;

        tracing::info!(offered = records.len(), inserted, "drugs imported");
        Ok(inserted)
    }

    /// Get a drug by name (case-insensitive).
    pub fn get_drug(&self, name: &str) -> DbResult<Option<DrugRecord>> {
        let sql = format!("SELECT {} FROM formulary WHERE medicine = ?", SELECT_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, [name.trim()], record_from_row)
            .optional()?)
    }

    /// All drugs in insertion order.
    pub fn list_drugs(&self) -> DbResult<Vec<DrugRecord>> {
        let sql = format!("SELECT {} FROM formulary ORDER BY rowid", SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], record_from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Number of drugs stored.
    pub fn count_drugs(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM formulary", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Real-time cost lookup. Unknown drugs keep using the same drug.
    pub fn lookup(&self, name: &str) -> DbResult<FormularyLookup> {
        let info = match self.get_drug(name)? {
            Some(record) => lookup_record(&record),
            None => FormularyLookup::unknown(name.trim()),
        };
        tracing::debug!(medicine = %info.medicine, exists = info.exists, "formulary lookup");
        Ok(info)
    }
}
