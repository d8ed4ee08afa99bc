use crate::{
    config::DbConfig,
    data::{
        StudentStore,
        student::{NewStudent, Student, StudentPatch},
    },
    error::{MakeQuerySnafu, MigrateSnafu, OpenDatabaseSnafu, StudentsResult},
};
use async_trait::async_trait;
use futures::TryStreamExt;
use secrecy::ExposeSecret;
use snafu::ResultExt;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PostgresStudentStore {
    pool: Pool<Postgres>,
}

impl PostgresStudentStore {
    ///doesn't touch the network - the first query (or [`Self::migrate`]) is what actually connects
    pub fn connect_lazy(config: &DbConfig) -> StudentsResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(config.url().expose_secret())
            .context(OpenDatabaseSnafu)?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> StudentsResult<()> {
        sqlx::migrate!().run(&self.pool).await.context(MigrateSnafu)
    }
}

#[async_trait]
impl StudentStore for PostgresStudentStore {
    async fn create(&self, to_be_added: NewStudent) -> StudentsResult<Student> {
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

        sqlx::query_as::<_, Student>("INSERT INTO public.students (name, father, mother, description, class_name, roll, phone, image) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *")
            .bind(name)
            .bind(father)
            .bind(mother)
            .bind(description)
            .bind(class)
            .bind(roll)
            .bind(phone)
            .bind(image)
            .fetch_one(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn list(&self) -> StudentsResult<Vec<Student>> {
        sqlx::query_as::<_, Student>("SELECT * FROM public.students ORDER BY created_at, id")
            .fetch(&self.pool)
            .try_collect()
            .await
            .context(MakeQuerySnafu)
    }

    async fn get_by_id(&self, id: Uuid) -> StudentsResult<Option<Student>> {
        sqlx::query_as::<_, Student>("SELECT * FROM public.students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: StudentPatch,
    ) -> StudentsResult<Option<Student>> {
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

        //NULL means "leave it alone"
        sqlx::query_as::<_, Student>(
            "UPDATE public.students SET
                name = COALESCE($2, name),
                father = COALESCE($3, father),
                mother = COALESCE($4, mother),
                description = COALESCE($5, description),
                class_name = COALESCE($6, class_name),
                roll = COALESCE($7, roll),
                phone = COALESCE($8, phone),
                image = COALESCE($9, image),
                updated_at = now()
            WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(father)
        .bind(mother)
        .bind(description)
        .bind(class)
        .bind(roll)
        .bind(phone)
        .bind(image)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)
    }

    async fn delete_by_id(&self, id: Uuid) -> StudentsResult<Option<Student>> {
        sqlx::query_as::<_, Student>("DELETE FROM public.students WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
