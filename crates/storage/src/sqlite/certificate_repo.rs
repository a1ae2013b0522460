use quiz_core::model::{Certificate, CourseId, UserId};

use super::{SqliteRepository, conn_err, mapping::map_certificate_row, write_err};
use crate::repository::{CertificateRepository, StorageError};

#[async_trait::async_trait]
impl CertificateRepository for SqliteRepository {
    async fn insert_certificate(&self, certificate: &Certificate) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO certificates (
                    id, number, user_id, enrollment_id, course_id, course_name, issued_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(certificate.id.value())
        .bind(certificate.number.as_str())
        .bind(certificate.user_id.as_str())
        .bind(certificate.enrollment_id.value())
        .bind(certificate.course_id.as_str())
        .bind(certificate.course_name.as_str())
        .bind(certificate.issued_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn find_certificate(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Certificate>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, number, user_id, enrollment_id, course_id, course_name, issued_at
                FROM certificates
                WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(course_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        row.as_ref().map(map_certificate_row).transpose()
    }

    async fn list_certificates(&self, user_id: &UserId) -> Result<Vec<Certificate>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, number, user_id, enrollment_id, course_id, course_name, issued_at
                FROM certificates
                WHERE user_id = ?1
                ORDER BY issued_at DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_certificate_row(&row)?);
        }
        Ok(out)
    }
}
