//! Student repository
//!
//! The only code that issues SQL against `students`:
//! - every operation runs in its own unit of work
//! - inserts are idempotent on `student_id` via ON CONFLICT DO NOTHING
//! - rows are decoded into a typed `Student` before leaving this module

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgPool, QueryBuilder};
use studentdb_core::{
    check_gpa, Gender, MajorCount, NewStudent, Student, StudentPatch, StudentStatistics,
    StudentStatus,
};
use tracing::debug;

use crate::db::error::{DbError, DbResult};
use crate::db::pool::unit_of_work;
use crate::models::{Paginated, Pagination};

/// Columns selected for every `Student`. Decimals are read as float8.
const STUDENT_COLUMNS: &str = "id, student_id, name, gender, date_of_birth, enrollment_date, \
     major, class_name, email, phone, address, gpa::float8 AS gpa, status, \
     scholarship_amount::float8 AS scholarship_amount, emergency_contact_name, \
     emergency_contact_phone, created_at, updated_at";

const INSERT_COLUMNS: &str = "INSERT INTO students (student_id, name, gender, date_of_birth, \
     enrollment_date, major, class_name, email, phone, address, gpa, status, \
     scholarship_amount, emergency_contact_name, emergency_contact_phone) ";

/// Rows per INSERT statement. 15 binds per row keeps a chunk well under the
/// 65535 bind-parameter limit.
const BATCH_CHUNK_SIZE: usize = 1000;

/// Majors reported in statistics
const TOP_MAJORS: i64 = 5;

/// Raw `students` row as Postgres returns it
#[derive(Debug, FromRow)]
struct StudentRow {
    id: i32,
    student_id: String,
    name: String,
    gender: Option<String>,
    date_of_birth: NaiveDate,
    enrollment_date: NaiveDate,
    major: String,
    class_name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    gpa: Option<f64>,
    status: String,
    scholarship_amount: f64,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StudentRow> for Student {
    type Error = DbError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        let gender = row
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(|e| DbError::Decode {
                column: "gender",
                reason: e.to_string(),
            })?;
        let status = row.status.parse::<StudentStatus>().map_err(|e| DbError::Decode {
            column: "status",
            reason: e.to_string(),
        })?;

        Ok(Student {
            id: row.id,
            student_id: row.student_id,
            name: row.name,
            gender,
            date_of_birth: row.date_of_birth,
            enrollment_date: row.enrollment_date,
            major: row.major,
            class_name: row.class_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            gpa: row.gpa,
            status,
            scholarship_amount: row.scholarship_amount,
            emergency_contact_name: row.emergency_contact_name,
            emergency_contact_phone: row.emergency_contact_phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_all(rows: Vec<StudentRow>) -> DbResult<Vec<Student>> {
    rows.into_iter().map(Student::try_from).collect()
}

/// Bind one student as a VALUES tuple, in `INSERT_COLUMNS` order.
fn push_student<'args>(
    mut row: Separated<'_, 'args, Postgres, &'static str>,
    student: &'args NewStudent,
) {
    row.push_bind(&student.student_id)
        .push_bind(&student.name)
        .push_bind(student.gender.map(|g| g.as_str()))
        .push_bind(student.date_of_birth)
        .push_bind(student.enrollment_date)
        .push_bind(&student.major)
        .push_bind(&student.class_name)
        .push_bind(student.email.as_deref())
        .push_bind(student.phone.as_deref())
        .push_bind(student.address.as_deref())
        .push_bind(student.gpa)
        .push_bind(student.status.as_str())
        .push_bind(student.scholarship_amount)
        .push_bind(student.emergency_contact_name.as_deref())
        .push_bind(student.emergency_contact_phone.as_deref());
}

/// `col = $n` for every supplied patch field
macro_rules! set_if_present {
    ($set:ident, $column:literal, $value:expr) => {
        if let Some(value) = $value {
            $set.push(concat!($column, " = ")).push_bind_unseparated(value);
        }
    };
}

/// Student repository
pub struct StudentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> StudentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert one student. Returns the new surrogate id, or `None` when the
    /// `student_id` already exists (nothing is changed in that case).
    pub async fn insert(&self, student: &NewStudent) -> DbResult<Option<i32>> {
        let mut tx = unit_of_work(self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(INSERT_COLUMNS);
        qb.push_values(std::iter::once(student), push_student);
        qb.push(" ON CONFLICT (student_id) DO NOTHING RETURNING id");

        let id: Option<i32> = qb.build_query_scalar().fetch_optional(&mut *tx).await?;
        tx.commit().await?;

        match id {
            Some(id) => debug!(id, student_id = %student.student_id, "student inserted"),
            None => debug!(student_id = %student.student_id, "student exists, insert skipped"),
        }
        Ok(id)
    }

    /// Insert a student, or read back the row already holding its `student_id`.
    ///
    /// The flag is true when the row was created by this call. `None` only
    /// when a conflicting row was deleted before it could be read.
    pub async fn insert_or_get(&self, student: &NewStudent) -> DbResult<Option<(Student, bool)>> {
        let mut tx = unit_of_work(self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(INSERT_COLUMNS);
        qb.push_values(std::iter::once(student), push_student);
        qb.push(" ON CONFLICT (student_id) DO NOTHING RETURNING ")
            .push(STUDENT_COLUMNS);

        let inserted: Option<StudentRow> = qb.build_query_as().fetch_optional(&mut *tx).await?;
        let (row, created) = match inserted {
            Some(row) => (Some(row), true),
            None => {
                let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = $1");
                let row: Option<StudentRow> = sqlx::query_as(&sql)
                    .bind(&student.student_id)
                    .fetch_optional(&mut *tx)
                    .await?;
                (row, false)
            }
        };
        tx.commit().await?;

        debug!(student_id = %student.student_id, created, "insert_or_get");
        row.map(|row| Student::try_from(row).map(|s| (s, created)))
            .transpose()
    }

    /// Insert many students atomically, skipping existing `student_id`s.
    ///
    /// Returns the number of rows actually inserted. Running the same batch
    /// twice inserts nothing the second time.
    pub async fn insert_batch(&self, students: &[NewStudent]) -> DbResult<u64> {
        if students.is_empty() {
            return Ok(0);
        }

        let mut tx = unit_of_work(self.pool).await?;
        let mut inserted = 0;
        for chunk in students.chunks(BATCH_CHUNK_SIZE) {
            let mut qb = QueryBuilder::<Postgres>::new(INSERT_COLUMNS);
            qb.push_values(chunk, push_student);
            qb.push(" ON CONFLICT (student_id) DO NOTHING");
            inserted += qb.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        debug!(requested = students.len(), inserted, "batch insert committed");
        Ok(inserted)
    }

    /// Look up by business key.
    pub async fn get_by_business_key(&self, student_id: &str) -> DbResult<Option<Student>> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = $1");
        let mut tx = unit_of_work(self.pool).await?;
        let row: Option<StudentRow> = sqlx::query_as(&sql)
            .bind(student_id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        row.map(Student::try_from).transpose()
    }

    /// Look up by surrogate id.
    pub async fn get_by_id(&self, id: i32) -> DbResult<Option<Student>> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1");
        let mut tx = unit_of_work(self.pool).await?;
        let row: Option<StudentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        row.map(Student::try_from).transpose()
    }

    /// Page through all students ordered by id.
    pub async fn list(&self, page: Pagination) -> DbResult<Paginated<Student>> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY id LIMIT $1 OFFSET $2");
        let mut tx = unit_of_work(self.pool).await?;

        // Same snapshot for count and rows
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&mut *tx)
            .await?;
        let rows: Vec<StudentRow> = sqlx::query_as(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Paginated {
            items: decode_all(rows)?,
            total,
            skip: page.skip,
            limit: page.limit,
        })
    }

    /// Students of one major, best GPA first; students without a GPA last.
    pub async fn list_by_major(&self, major: &str, limit: i64) -> DbResult<Vec<Student>> {
        let sql = format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE major = $1 \
             ORDER BY gpa DESC NULLS LAST, id LIMIT $2"
        );
        let mut tx = unit_of_work(self.pool).await?;
        let rows: Vec<StudentRow> = sqlx::query_as(&sql)
            .bind(major)
            .bind(limit.max(0))
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        decode_all(rows)
    }

    /// Highest GPAs first, ties broken by id. Students without a GPA are excluded.
    pub async fn list_top_by_gpa(&self, limit: i64) -> DbResult<Vec<Student>> {
        let sql = format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE gpa IS NOT NULL \
             ORDER BY gpa DESC, id LIMIT $1"
        );
        let mut tx = unit_of_work(self.pool).await?;
        let rows: Vec<StudentRow> = sqlx::query_as(&sql)
            .bind(limit.max(0))
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        decode_all(rows)
    }

    /// Set the GPA of one student. `false` when the student does not exist.
    pub async fn update_gpa(&self, student_id: &str, gpa: f64) -> DbResult<bool> {
        let gpa = check_gpa(gpa)?;

        let mut tx = unit_of_work(self.pool).await?;
        let result = sqlx::query("UPDATE students SET gpa = $1 WHERE student_id = $2")
            .bind(gpa)
            .bind(student_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(student_id, gpa, rows = result.rows_affected(), "gpa updated");
        Ok(result.rows_affected() > 0)
    }

    /// Set the status of one student. `false` when the student does not exist.
    pub async fn update_status(&self, student_id: &str, status: StudentStatus) -> DbResult<bool> {
        let mut tx = unit_of_work(self.pool).await?;
        let result = sqlx::query("UPDATE students SET status = $1 WHERE student_id = $2")
            .bind(status.as_str())
            .bind(student_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(student_id, %status, rows = result.rows_affected(), "status updated");
        Ok(result.rows_affected() > 0)
    }

    /// Apply a validated patch. Only supplied columns change.
    ///
    /// Returns the updated record, or `None` when no student has this id. An
    /// empty patch returns the current record untouched.
    pub async fn update_fields(&self, id: i32, patch: &StudentPatch) -> DbResult<Option<Student>> {
        if patch.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE students SET ");
        {
            let mut set = qb.separated(", ");
            set_if_present!(set, "student_id", patch.student_id.as_deref());
            set_if_present!(set, "name", patch.name.as_deref());
            set_if_present!(set, "gender", patch.gender.map(|g| g.as_str()));
            set_if_present!(set, "date_of_birth", patch.date_of_birth);
            set_if_present!(set, "enrollment_date", patch.enrollment_date);
            set_if_present!(set, "major", patch.major.as_deref());
            set_if_present!(set, "class_name", patch.class_name.as_deref());
            set_if_present!(set, "email", patch.email.as_deref());
            set_if_present!(set, "phone", patch.phone.as_deref());
            set_if_present!(set, "address", patch.address.as_deref());
            set_if_present!(set, "gpa", patch.gpa);
            set_if_present!(set, "status", patch.status.map(|s| s.as_str()));
            set_if_present!(set, "scholarship_amount", patch.scholarship_amount);
            set_if_present!(set, "emergency_contact_name", patch.emergency_contact_name.as_deref());
            set_if_present!(set, "emergency_contact_phone", patch.emergency_contact_phone.as_deref());
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(STUDENT_COLUMNS);

        let mut tx = unit_of_work(self.pool).await?;
        let row: Option<StudentRow> = qb.build_query_as().fetch_optional(&mut *tx).await?;
        tx.commit().await?;

        debug!(id, updated = row.is_some(), "student patched");
        row.map(Student::try_from).transpose()
    }

    /// Hard delete. `false` when no student has this id.
    pub async fn delete(&self, id: i32) -> DbResult<bool> {
        let mut tx = unit_of_work(self.pool).await?;
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(id, rows = result.rows_affected(), "student deleted");
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let mut tx = unit_of_work(self.pool).await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(total)
    }

    /// Totals, status breakdown, average GPA and the five largest majors.
    pub async fn aggregate_statistics(&self) -> DbResult<StudentStatistics> {
        let mut tx = unit_of_work(self.pool).await?;

        let (total_students, active_students, graduated_students, average_gpa): (
            i64,
            i64,
            i64,
            Option<f64>,
        ) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = $1),
                COUNT(*) FILTER (WHERE status = $2),
                ROUND(AVG(gpa), 2)::float8
            FROM students
            "#,
        )
        .bind(StudentStatus::Active.as_str())
        .bind(StudentStatus::Graduated.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let top_majors: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT major, COUNT(*) AS count
            FROM students
            GROUP BY major
            ORDER BY count DESC, major ASC
            LIMIT $1
            "#,
        )
        .bind(TOP_MAJORS)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(StudentStatistics {
            total_students,
            active_students,
            graduated_students,
            average_gpa,
            top_majors: top_majors
                .into_iter()
                .map(|(major, count)| MajorCount { major, count })
                .collect(),
        })
    }
}
