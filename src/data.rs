use crate::{
    data::student::{NewStudent, Student, StudentPatch},
    error::StudentsResult,
};
use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod student;

/// The collection of student records.
///
/// Every method is atomic for a single record and nothing more - there are no
/// transactions spanning multiple calls, so concurrent updates are last-write-wins.
/// "Not found" is always `Ok(None)`, never an error.
#[async_trait]
pub trait StudentStore: Debug + Send + Sync {
    async fn create(&self, to_be_added: NewStudent) -> StudentsResult<Student>;
    ///in insertion order
    async fn list(&self) -> StudentsResult<Vec<Student>>;
    async fn get_by_id(&self, id: Uuid) -> StudentsResult<Option<Student>>;
    ///only the `Some` fields of `patch` are touched, `updated_at` is always bumped
    async fn update_by_id(&self, id: Uuid, patch: StudentPatch)
    -> StudentsResult<Option<Student>>;
    ///returns the record as it was just before removal
    async fn delete_by_id(&self, id: Uuid) -> StudentsResult<Option<Student>>;
    async fn close(&self);
}

///malformed ids can't match anything, so they just become `None`
pub fn parse_id(original: &str) -> Option<Uuid> {
    Uuid::try_parse(original.trim()).ok()
}
