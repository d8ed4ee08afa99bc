use crate::{
    data::{parse_id, student::Student},
    error::StudentsResult,
    routes::input::StudentInput,
    state::StudentsState,
};
use axum::{
    Json,
    extract::{Path, State},
};

pub async fn post_create_student(
    State(state): State<StudentsState>,
    StudentInput { fields, image }: StudentInput,
) -> StudentsResult<Json<Student>> {
    //validate before anything touches the disk
    let mut new_student = fields.into_new_student()?;

    let stored_image = match image {
        Some(file) => Some(state.uploads().store(file).await?),
        None => None,
    };
    if let Some(path) = &stored_image {
        new_student.image.clone_from(path);
    }

    match state.create(new_student).await {
        Ok(student) => {
            info!(id = ?student.id, "Created student");
            Ok(Json(student))
        }
        Err(e) => {
            if let Some(path) = stored_image {
                state.uploads().discard(&path).await;
            }
            Err(e)
        }
    }
}

pub async fn get_students(
    State(state): State<StudentsState>,
) -> StudentsResult<Json<Vec<Student>>> {
    state.list().await.map(Json)
}

pub async fn get_single_student(
    State(state): State<StudentsState>,
    Path(id): Path<String>,
) -> StudentsResult<Json<Option<Student>>> {
    let Some(id) = parse_id(&id) else {
        return Ok(Json(None));
    };

    state.get_by_id(id).await.map(Json)
}

pub async fn put_update_student(
    State(state): State<StudentsState>,
    Path(id): Path<String>,
    StudentInput { fields, image }: StudentInput,
) -> StudentsResult<Json<Option<Student>>> {
    let mut patch = fields.into_patch()?;
    let Some(id) = parse_id(&id) else {
        return Ok(Json(None));
    };

    if let Some(file) = image {
        patch.image = Some(state.uploads().store(file).await?);
    }
    let stored_image = patch.image.clone();

    let result = state.update_by_id(id, patch).await;
    //nobody will ever point at the new file if the update didn't land
    if let (Some(path), Ok(None) | Err(_)) = (&stored_image, &result) {
        state.uploads().discard(path).await;
    }

    let updated = result?;
    if updated.is_some() {
        info!(?id, "Updated student");
    }
    Ok(Json(updated))
}

pub async fn delete_student(
    State(state): State<StudentsState>,
    Path(id): Path<String>,
) -> StudentsResult<Json<Option<Student>>> {
    let Some(id) = parse_id(&id) else {
        return Ok(Json(None));
    };

    let deleted = state.delete_by_id(id).await?;
    if deleted.is_some() {
        info!(?id, "Deleted student");
    }
    Ok(Json(deleted))
}
