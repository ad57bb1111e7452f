//! Row-level access to the `appointments` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::model::{AppointmentRow, AttachmentSlot};

const COLUMNS: &str = "id, name, email, phone, appointment_type, appointment_date,
    appointment_time, reason, notes, is_intern, file_uploaded, file_name, file_path,
    secondary_uploaded, secondary_file_name, secondary_file_path, created_at, status";

fn from_row(row: &Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        appointment_type: row.get("appointment_type")?,
        appointment_date: row.get("appointment_date")?,
        appointment_time: row.get("appointment_time")?,
        reason: row.get("reason")?,
        notes: row.get("notes")?,
        is_intern: row.get("is_intern")?,
        file_uploaded: row.get("file_uploaded")?,
        file_name: row.get("file_name")?,
        file_path: row.get("file_path")?,
        secondary_uploaded: row.get("secondary_uploaded")?,
        secondary_file_name: row.get("secondary_file_name")?,
        secondary_file_path: row.get("secondary_file_path")?,
        created_at: row.get("created_at")?,
        status: row.get("status")?,
    })
}

pub fn insert(db: &Database, row: &AppointmentRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            &format!(
                "INSERT INTO appointments ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
            ),
            params![
                row.id,
                row.name,
                row.email,
                row.phone,
                row.appointment_type,
                row.appointment_date,
                row.appointment_time,
                row.reason,
                row.notes,
                row.is_intern,
                row.file_uploaded,
                row.file_name,
                row.file_path,
                row.secondary_uploaded,
                row.secondary_file_name,
                row.secondary_file_path,
                row.created_at,
                row.status,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<AppointmentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM appointments WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Every row, oldest insert first.
pub fn list_all(db: &Database) -> Result<Vec<AppointmentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM appointments ORDER BY rowid ASC"
        ))?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns the number of rows changed (0 when `id` is unknown).
pub fn update_status(db: &Database, id: &str, status: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE appointments SET status = ?2 WHERE id = ?1",
            params![id, status],
        )?;
        Ok(changed)
    })
}

/// Sets a slot's flag and reference together. Returns the number of rows
/// changed (0 when `id` is unknown).
pub fn set_attachment(
    db: &Database,
    id: &str,
    slot: AttachmentSlot,
    uploaded: bool,
    reference: Option<&str>,
) -> Result<usize, DatabaseError> {
    let sql = match slot {
        AttachmentSlot::Primary => {
            "UPDATE appointments SET file_uploaded = ?2, file_path = ?3 WHERE id = ?1"
        }
        AttachmentSlot::Secondary => {
            "UPDATE appointments SET secondary_uploaded = ?2, secondary_file_path = ?3 WHERE id = ?1"
        }
    };
    db.with_conn(|conn| {
        let changed = conn.execute(sql, params![id, uploaded, reference])?;
        Ok(changed)
    })
}

pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let total: u64 = conn.query_row("SELECT COUNT(*) FROM appointments", [], |r| r.get(0))?;
        Ok(total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(id: &str) -> AppointmentRow {
        AppointmentRow {
            id: id.to_string(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "5551234567".to_string(),
            appointment_type: "Urgent Care".to_string(),
            appointment_date: "2024-01-02".to_string(),
            appointment_time: "10:00".to_string(),
            reason: "Headache".to_string(),
            notes: None,
            is_intern: false,
            file_uploaded: true,
            file_name: Some("scan.pdf".to_string()),
            file_path: None,
            secondary_uploaded: false,
            secondary_file_name: None,
            secondary_file_path: None,
            created_at: "2024-01-01T09:00:00Z".to_string(),
            status: "pending".to_string(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = Database::open_in_memory().unwrap();
        let row = sample_row("a1");
        insert(&db, &row).unwrap();

        assert_eq!(find_by_id(&db, "a1").unwrap(), Some(row));
        assert_eq!(find_by_id(&db, "missing").unwrap(), None);
    }

    #[test]
    fn test_duplicate_id_is_constraint_violation() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &sample_row("a1")).unwrap();
        let err = insert(&db, &sample_row("a1")).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_list_all_in_insert_order() {
        let db = Database::open_in_memory().unwrap();
        for id in ["c", "a", "b"] {
            insert(&db, &sample_row(id)).unwrap();
        }
        let ids: Vec<String> = list_all(&db).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(count(&db).unwrap(), 3);
    }

    #[test]
    fn test_update_status() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &sample_row("a1")).unwrap();

        assert_eq!(update_status(&db, "a1", "confirmed").unwrap(), 1);
        assert_eq!(find_by_id(&db, "a1").unwrap().unwrap().status, "confirmed");

        assert_eq!(update_status(&db, "ghost", "confirmed").unwrap(), 0);
        assert_eq!(count(&db).unwrap(), 1);
    }

    #[test]
    fn test_set_and_clear_attachment() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, &sample_row("a1")).unwrap();

        set_attachment(&db, "a1", AttachmentSlot::Primary, true, Some("uploads/x-scan.pdf"))
            .unwrap();
        let row = find_by_id(&db, "a1").unwrap().unwrap();
        assert!(row.file_uploaded);
        assert_eq!(row.file_path.as_deref(), Some("uploads/x-scan.pdf"));
        assert!(!row.secondary_uploaded);

        set_attachment(&db, "a1", AttachmentSlot::Primary, false, None).unwrap();
        let row = find_by_id(&db, "a1").unwrap().unwrap();
        assert!(!row.file_uploaded);
        assert_eq!(row.file_path, None);
        assert_eq!(row.file_name.as_deref(), Some("scan.pdf"));

        assert_eq!(
            set_attachment(&db, "ghost", AttachmentSlot::Secondary, false, None).unwrap(),
            0
        );
    }
}
