use crate::{
    data::{
        StudentStore,
        student::{NewStudent, Student, StudentPatch},
    },
    error::{StudentsError, StudentsResult},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

///in-process stand-in for postgres, so the routes can be driven without a database
#[derive(Debug, Default)]
pub struct MemoryStudentStore {
    students: RwLock<Vec<Student>>,
    fail_writes: AtomicBool,
    closed: AtomicBool,
}

impl MemoryStudentStore {
    ///makes every create/update fail like a dropped connection would
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> StudentsResult<()> {
        if self.is_closed() {
            return Err(StudentsError::MakeQuery {
                source: sqlx::Error::PoolClosed,
            });
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StudentsError::MakeQuery {
                source: sqlx::Error::PoolTimedOut,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn create(&self, to_be_added: NewStudent) -> StudentsResult<Student> {
        self.check_writable()?;

        let NewStudent {
            name,
            father,
            mother,
            description,
            class,
            roll,
            phone,
            image,
        } = to_be_added;
        let now = OffsetDateTime::now_utc();

        let student = Student {
            id: Uuid::new_v4(),
            name,
            father,
            mother,
            description,
            class,
            roll,
            phone,
            image,
            created_at: now,
            updated_at: now,
        };
        self.students.write().await.push(student.clone());
        Ok(student)
    }

    async fn list(&self) -> StudentsResult<Vec<Student>> {
        Ok(self.students.read().await.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> StudentsResult<Option<Student>> {
        Ok(self
            .students
            .read()
            .await
            .iter()
            .find(|student| student.id == id)
            .cloned())
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: StudentPatch,
    ) -> StudentsResult<Option<Student>> {
        self.check_writable()?;

        let mut students = self.students.write().await;
        let Some(student) = students.iter_mut().find(|student| student.id == id) else {
            return Ok(None);
        };

        let StudentPatch {
            name,
            father,
            mother,
            description,
            class,
            roll,
            phone,
            image,
        } = patch;

        if let Some(name) = name {
            student.name = name;
        }
        if let Some(father) = father {
            student.father = father;
        }
        if let Some(mother) = mother {
            student.mother = mother;
        }
        if let Some(description) = description {
            student.description = description;
        }
        if let Some(class) = class {
            student.class = class;
        }
        if let Some(roll) = roll {
            student.roll = roll;
        }
        if let Some(phone) = phone {
            student.phone = phone;
        }
        if let Some(image) = image {
            student.image = image;
        }
        student.updated_at = OffsetDateTime::now_utc();

        Ok(Some(student.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> StudentsResult<Option<Student>> {
        let mut students = self.students.write().await;
        Ok(students
            .iter()
            .position(|student| student.id == id)
            .map(|index| students.remove(index)))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::student::PLACEHOLDER_IMAGE_URL;

    fn new_student(name: &str) -> NewStudent {
        NewStudent {
            name: name.into(),
            father: "B".into(),
            mother: "C".into(),
            description: "D".into(),
            class: "5".into(),
            roll: 1,
            phone: 1_234_567_890,
            image: PLACEHOLDER_IMAGE_URL.into(),
        }
    }

    #[tokio::test]
    async fn created_students_round_trip() {
        let store = MemoryStudentStore::default();
        let created = store.create(new_student("A")).await.unwrap();

        assert_eq!(store.get_by_id(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() {
        let store = MemoryStudentStore::default();
        let created = store.create(new_student("A")).await.unwrap();

        let updated = store
            .update_by_id(
                created.id,
                StudentPatch {
                    roll: Some(42),
                    ..StudentPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.roll, 42);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(
            Student {
                roll: created.roll,
                updated_at: created.updated_at,
                ..updated
            },
            created
        );
    }

    #[tokio::test]
    async fn missing_ids_are_none_not_errors() {
        let store = MemoryStudentStore::default();
        let id = Uuid::new_v4();

        assert_eq!(store.get_by_id(id).await.unwrap(), None);
        assert_eq!(
            store
                .update_by_id(id, StudentPatch::default())
                .await
                .unwrap(),
            None
        );
        assert_eq!(store.delete_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn closed_store_refuses_writes() {
        let store = MemoryStudentStore::default();
        store.close().await;

        let err = store.create(new_student("A")).await.unwrap_err();
        assert!(matches!(
            err,
            StudentsError::MakeQuery {
                source: sqlx::Error::PoolClosed
            }
        ));
    }

    #[tokio::test]
    async fn delete_returns_snapshot_then_forgets() {
        let store = MemoryStudentStore::default();
        let first = store.create(new_student("A")).await.unwrap();
        let second = store.create(new_student("B")).await.unwrap();

        assert_eq!(store.delete_by_id(first.id).await.unwrap(), Some(first.clone()));
        assert_eq!(store.get_by_id(first.id).await.unwrap(), None);
        assert_eq!(store.list().await.unwrap(), vec![second]);
    }
}
