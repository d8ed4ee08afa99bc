use crate::error::{
    EmptyFieldSnafu, InvalidNumberSnafu, MissingFieldSnafu, StudentsResult, UnknownFieldSnafu,
};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt, ensure};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

///used whenever a student is created without an image upload
pub const PLACEHOLDER_IMAGE_URL: &str = "https://img.freepik.com/premium-vector/student-avatar-illustration-user-profile-icon-youth-avatar_118339-4401.jpg";

///the multipart field that carries the (optional) photo
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub father: String,
    pub mother: String,
    pub description: String,
    #[sqlx(rename = "class_name")]
    pub class: String,
    pub roll: i64,
    pub phone: i64,
    pub image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub father: String,
    pub mother: String,
    pub description: String,
    pub class: String,
    pub roll: i64,
    pub phone: i64,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub father: Option<String>,
    pub mother: Option<String>,
    pub description: Option<String>,
    pub class: Option<String>,
    pub roll: Option<i64>,
    pub phone: Option<i64>,
    pub image: Option<String>,
}

///JSON clients send `"roll": 12` or `"roll": "12"`, multipart ones only ever send text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(i64),
    Text(String),
}

impl NumberInput {
    fn into_number(self, field: &'static str) -> StudentsResult<i64> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(original) => original
                .trim()
                .parse()
                .context(InvalidNumberSnafu { field, original }),
        }
    }
}

/// Raw, unvalidated input for a student, as it comes off the wire.
///
/// Unknown fields are rejected rather than passed through, and `image` is
/// deliberately absent - it can only be set by uploading a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentFields {
    pub name: Option<String>,
    pub father: Option<String>,
    pub mother: Option<String>,
    pub description: Option<String>,
    pub class: Option<String>,
    pub roll: Option<NumberInput>,
    pub phone: Option<NumberInput>,
}

impl StudentFields {
    ///sets a field from a text form part
    pub fn set_text(&mut self, field: &str, value: String) -> StudentsResult<()> {
        let slot = match field {
            "name" => &mut self.name,
            "father" => &mut self.father,
            "mother" => &mut self.mother,
            "description" => &mut self.description,
            "class" => &mut self.class,
            "roll" => {
                self.roll = Some(NumberInput::Text(value));
                return Ok(());
            }
            "phone" => {
                self.phone = Some(NumberInput::Text(value));
                return Ok(());
            }
            _ => return UnknownFieldSnafu { field }.fail(),
        };
        *slot = Some(value);
        Ok(())
    }

    ///every field must be there and non-empty; the image starts out as the placeholder
    pub fn into_new_student(self) -> StudentsResult<NewStudent> {
        let Self {
            name,
            father,
            mother,
            description,
            class,
            roll,
            phone,
        } = self;

        Ok(NewStudent {
            name: required_text(name, "name")?,
            father: required_text(father, "father")?,
            mother: required_text(mother, "mother")?,
            description: required_text(description, "description")?,
            class: required_text(class, "class")?,
            roll: roll
                .context(MissingFieldSnafu { field: "roll" })?
                .into_number("roll")?,
            phone: phone
                .context(MissingFieldSnafu { field: "phone" })?
                .into_number("phone")?,
            image: PLACEHOLDER_IMAGE_URL.to_string(),
        })
    }

    ///any subset is fine, but what is given still has to be valid
    pub fn into_patch(self) -> StudentsResult<StudentPatch> {
        let Self {
            name,
            father,
            mother,
            description,
            class,
            roll,
            phone,
        } = self;

        Ok(StudentPatch {
            name: optional_text(name, "name")?,
            father: optional_text(father, "father")?,
            mother: optional_text(mother, "mother")?,
            description: optional_text(description, "description")?,
            class: optional_text(class, "class")?,
            roll: roll.map(|roll| roll.into_number("roll")).transpose()?,
            phone: phone.map(|phone| phone.into_number("phone")).transpose()?,
            image: None,
        })
    }
}

fn required_text(value: Option<String>, field: &'static str) -> StudentsResult<String> {
    let value = value.context(MissingFieldSnafu { field })?;
    //an empty string counts as not being there at all
    ensure!(!value.trim().is_empty(), MissingFieldSnafu { field });
    Ok(value)
}

fn optional_text(value: Option<String>, field: &'static str) -> StudentsResult<Option<String>> {
    if let Some(value) = &value {
        ensure!(!value.trim().is_empty(), EmptyFieldSnafu { field });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudentsError;

    fn complete_fields() -> StudentFields {
        let mut fields = StudentFields::default();
        for (field, value) in [
            ("name", "A"),
            ("father", "B"),
            ("mother", "C"),
            ("description", "D"),
            ("class", "5"),
            ("roll", "1"),
            ("phone", "1234567890"),
        ] {
            fields.set_text(field, value.to_string()).unwrap();
        }
        fields
    }

    #[test]
    fn complete_form_becomes_a_new_student() {
        let student = complete_fields().into_new_student().unwrap();

        assert_eq!(
            student,
            NewStudent {
                name: "A".into(),
                father: "B".into(),
                mother: "C".into(),
                description: "D".into(),
                class: "5".into(),
                roll: 1,
                phone: 1_234_567_890,
                image: PLACEHOLDER_IMAGE_URL.into(),
            }
        );
    }

    #[test]
    fn every_required_field_is_checked() {
        for missing in ["name", "father", "mother", "description", "class", "roll", "phone"] {
            let mut fields = complete_fields();
            match missing {
                "name" => fields.name = None,
                "father" => fields.father = None,
                "mother" => fields.mother = None,
                "description" => fields.description = None,
                "class" => fields.class = None,
                "roll" => fields.roll = None,
                _ => fields.phone = None,
            }

            let err = fields.into_new_student().unwrap_err();
            assert!(
                matches!(err, StudentsError::MissingField { field } if field == missing),
                "expected {missing} to be missing, got {err:?}"
            );
        }
    }

    #[test]
    fn blank_text_counts_as_missing_on_create() {
        let mut fields = complete_fields();
        fields.set_text("mother", "   ".into()).unwrap();

        assert!(matches!(
            fields.into_new_student(),
            Err(StudentsError::MissingField { field: "mother" })
        ));
    }

    #[test]
    fn roll_must_be_numeric() {
        let mut fields = complete_fields();
        fields.set_text("roll", "twelve".into()).unwrap();

        assert!(matches!(
            fields.into_new_student(),
            Err(StudentsError::InvalidNumber { field: "roll", .. })
        ));
    }

    #[test]
    fn unknown_form_fields_are_rejected() {
        let mut fields = StudentFields::default();
        assert!(matches!(
            fields.set_text("age", "12".into()),
            Err(StudentsError::UnknownField { .. })
        ));
    }

    #[test]
    fn json_accepts_numbers_and_numeric_text() {
        let fields: StudentFields =
            serde_json::from_str(r#"{"roll": 7, "phone": "5550100"}"#).unwrap();
        let patch = fields.into_patch().unwrap();

        assert_eq!(patch.roll, Some(7));
        assert_eq!(patch.phone, Some(5_550_100));
        assert_eq!(patch.name, None);
    }

    #[test]
    fn json_rejects_unknown_fields_and_image() {
        assert!(serde_json::from_str::<StudentFields>(r#"{"age": 12}"#).is_err());
        assert!(serde_json::from_str::<StudentFields>(r#"{"image": "x.png"}"#).is_err());
    }

    #[test]
    fn patch_rejects_blank_text() {
        let mut fields = StudentFields::default();
        fields.set_text("name", String::new()).unwrap();

        assert!(matches!(
            fields.into_patch(),
            Err(StudentsError::EmptyField { field: "name" })
        ));
    }

    #[test]
    fn students_serialise_with_the_original_wire_names() {
        let student = Student {
            id: Uuid::nil(),
            name: "A".into(),
            father: "B".into(),
            mother: "C".into(),
            description: "D".into(),
            class: "5".into(),
            roll: 1,
            phone: 2,
            image: PLACEHOLDER_IMAGE_URL.into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["class"], "5");
        assert_eq!(json["roll"], 1);
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert!(json.get("updatedAt").is_some());
    }
}
