use crate::{
    data::student::{IMAGE_FIELD, StudentFields},
    error::{
        JsonBodySnafu, MultipartBodySnafu, MultipartSnafu, StudentsError, TooManyFilesSnafu,
        UnknownFieldSnafu,
    },
    uploads::UploadedFile,
};
use axum::{
    Json,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use snafu::{ResultExt, ensure};

/// A create/update body: the text fields plus at most one image file.
///
/// Accepts `multipart/form-data` (the only way to send a file) or a JSON object.
/// A request with no content type at all is read as an empty body.
#[derive(Debug)]
pub struct StudentInput {
    pub fields: StudentFields,
    pub image: Option<UploadedFile>,
}

impl<S: Send + Sync> FromRequest<S> for StudentInput {
    type Rejection = StudentsError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Some(content_type) = req.headers().get(CONTENT_TYPE) else {
            return Ok(Self {
                fields: StudentFields::default(),
                image: None,
            });
        };

        let is_multipart = content_type
            .to_str()
            .is_ok_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .context(MultipartBodySnafu)?;
            read_multipart(multipart).await
        } else {
            let Json(fields) = Json::<StudentFields>::from_request(req, state)
                .await
                .context(JsonBodySnafu)?;
            Ok(Self {
                fields,
                image: None,
            })
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<StudentInput, StudentsError> {
    let mut fields = StudentFields::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.context(MultipartSnafu)? {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        if name == IMAGE_FIELD {
            //a part without a filename is plain text, and `image` can't be set that way
            let Some(file_name) = field.file_name().map(ToString::to_string) else {
                return UnknownFieldSnafu { field: name }.fail();
            };
            let bytes = field.bytes().await.context(MultipartSnafu)?;
            //an untouched <input type="file"> still sends an empty part
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }

            ensure!(image.is_none(), TooManyFilesSnafu);
            image = Some(UploadedFile { file_name, bytes });
        } else {
            let value = field.text().await.context(MultipartSnafu)?;
            fields.set_text(&name, value)?;
        }
    }

    Ok(StudentInput { fields, image })
}
