use biblio_db::{BookChanges, NewBook};
use biblio_http::error::AppError;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    UtcOffset,
};

pub const MSG_MISSING_FIELDS: &str =
    "Tous les champs sont obligatoires (titre, auteur, date_publication, genre)";
pub const MSG_INVALID_DATE: &str = "La date de publication est invalide";
pub const MSG_INVALID_FIELDS: &str = "Champs invalides";

/// Request body for `POST /books`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLivre {
    pub titre: Option<String>,
    pub auteur: Option<String>,
    pub date_publication: Option<String>,
    pub genre: Option<String>,
    /// Defaults to `true` when omitted.
    pub disponible: Option<bool>,
}

/// Request body for `PUT /books/{id}`.
///
/// The outer `Option` records whether the key was present at all, the inner
/// one whether it was `null`. Absent keys leave the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLivre {
    #[serde(default, deserialize_with = "present")]
    pub titre: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub auteur: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub date_publication: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub genre: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub disponible: Option<Option<bool>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProblem {
    Required,
    Empty,
    Null,
    InvalidDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: FieldProblem,
}

/// Rejected payload: a summary message plus one entry per offending field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationErrors {
    pub message: &'static str,
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    fn check(message: &'static str, fields: Vec<FieldError>) -> Result<(), Self> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Self { message, fields })
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .fields
            .iter()
            .filter_map(|field| serde_json::to_value(field).ok())
            .collect();
        AppError::validation(details, errors.message)
    }
}

/// Accepts a full RFC 3339 timestamp or a calendar date (`YYYY-MM-DD`, midnight UTC).
pub fn parse_publication_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at.to_offset(UtcOffset::UTC));
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateLivre {
    pub fn validate(self) -> Result<NewBook, ValidationErrors> {
        let titre = trimmed(self.titre);
        let auteur = trimmed(self.auteur);
        let date_publication = trimmed(self.date_publication);
        let genre = trimmed(self.genre);

        let missing: Vec<FieldError> = [
            ("titre", titre.is_none()),
            ("auteur", auteur.is_none()),
            ("date_publication", date_publication.is_none()),
            ("genre", genre.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(field, _)| FieldError {
            field,
            error: FieldProblem::Required,
        })
        .collect();

        let (Some(title), Some(author), Some(raw_date), Some(genre)) =
            (titre, auteur, date_publication, genre)
        else {
            return Err(ValidationErrors {
                message: MSG_MISSING_FIELDS,
                fields: missing,
            });
        };

        let publication_date = parse_publication_date(&raw_date).ok_or(ValidationErrors {
            message: MSG_INVALID_DATE,
            fields: vec![FieldError {
                field: "date_publication",
                error: FieldProblem::InvalidDate,
            }],
        })?;

        Ok(NewBook {
            title,
            author,
            publication_date,
            genre,
            available: self.disponible.unwrap_or(true),
        })
    }
}

impl UpdateLivre {
    pub fn validate(self) -> Result<BookChanges, ValidationErrors> {
        let mut problems = Vec::new();
        let mut text = |field: &'static str, value: Option<Option<String>>| match value {
            None => None,
            Some(None) => {
                problems.push(FieldError {
                    field,
                    error: FieldProblem::Null,
                });
                None
            }
            Some(Some(raw)) => {
                let value = trimmed(Some(raw));
                if value.is_none() {
                    problems.push(FieldError {
                        field,
                        error: FieldProblem::Empty,
                    });
                }
                value
            }
        };

        let title = text("titre", self.titre);
        let author = text("auteur", self.auteur);
        let genre = text("genre", self.genre);
        let raw_date = text("date_publication", self.date_publication);

        let publication_date = raw_date.and_then(|raw| {
            let parsed = parse_publication_date(&raw);
            if parsed.is_none() {
                problems.push(FieldError {
                    field: "date_publication",
                    error: FieldProblem::InvalidDate,
                });
            }
            parsed
        });

        let available = match self.disponible {
            None => None,
            Some(None) => {
                problems.push(FieldError {
                    field: "disponible",
                    error: FieldProblem::Null,
                });
                None
            }
            Some(Some(flag)) => Some(flag),
        };

        ValidationErrors::check(MSG_INVALID_FIELDS, problems)?;

        Ok(BookChanges {
            title,
            author,
            publication_date,
            genre,
            available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn create(json: serde_json::Value) -> Result<NewBook, ValidationErrors> {
        serde_json::from_value::<CreateLivre>(json).unwrap().validate()
    }

    fn update(json: serde_json::Value) -> Result<BookChanges, ValidationErrors> {
        serde_json::from_value::<UpdateLivre>(json).unwrap().validate()
    }

    #[test]
    fn create_defaults_availability_and_trims() {
        let book = create(serde_json::json!({
            "titre": "  Dune ",
            "auteur": "Herbert",
            "date_publication": "1965-08-01",
            "genre": "SF"
        }))
        .unwrap();

        assert_eq!(book.title, "Dune");
        assert!(book.available);
        assert_eq!(book.publication_date, datetime!(1965-08-01 0:00 UTC));
    }

    #[test]
    fn create_keeps_explicit_unavailability() {
        let book = create(serde_json::json!({
            "titre": "Dune",
            "auteur": "Herbert",
            "date_publication": "1965-08-01T12:30:00+02:00",
            "genre": "SF",
            "disponible": false
        }))
        .unwrap();

        assert!(!book.available);
        assert_eq!(book.publication_date, datetime!(1965-08-01 10:30 UTC));
    }

    #[test]
    fn create_names_every_missing_field() {
        let err = create(serde_json::json!({ "titre": "Dune", "genre": "   " })).unwrap_err();

        assert_eq!(err.message, MSG_MISSING_FIELDS);
        let fields: Vec<&str> = err.fields.iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["auteur", "date_publication", "genre"]);
        assert!(err
            .fields
            .iter()
            .all(|f| f.error == FieldProblem::Required));
    }

    #[test]
    fn create_rejects_unparseable_date() {
        let err = create(serde_json::json!({
            "titre": "Dune",
            "auteur": "Herbert",
            "date_publication": "August 1965",
            "genre": "SF"
        }))
        .unwrap_err();

        assert_eq!(err.message, MSG_INVALID_DATE);
        assert_eq!(err.fields[0].error, FieldProblem::InvalidDate);
    }

    #[test]
    fn update_distinguishes_absent_from_false() {
        let changes = update(serde_json::json!({ "disponible": false })).unwrap();
        assert_eq!(changes.available, Some(false));
        assert!(changes.title.is_none());

        let changes = update(serde_json::json!({ "genre": "Roman" })).unwrap();
        assert_eq!(changes.available, None);
        assert_eq!(changes.genre.as_deref(), Some("Roman"));
    }

    #[test]
    fn update_with_empty_body_is_a_no_op() {
        assert!(update(serde_json::json!({})).unwrap().is_empty());
    }

    #[test]
    fn update_rejects_blank_null_and_bad_dates() {
        let err = update(serde_json::json!({
            "titre": "",
            "disponible": null,
            "date_publication": "demain"
        }))
        .unwrap_err();

        assert_eq!(err.message, MSG_INVALID_FIELDS);
        assert!(err.fields.contains(&FieldError {
            field: "titre",
            error: FieldProblem::Empty
        }));
        assert!(err.fields.contains(&FieldError {
            field: "disponible",
            error: FieldProblem::Null
        }));
        assert!(err.fields.contains(&FieldError {
            field: "date_publication",
            error: FieldProblem::InvalidDate
        }));
    }

    #[test]
    fn validation_errors_become_400_details() {
        let err = create(serde_json::json!({})).unwrap_err();
        match AppError::from(err) {
            AppError::Validation { details, message } => {
                assert_eq!(message, MSG_MISSING_FIELDS);
                assert_eq!(details.len(), 4);
                assert_eq!(details[0]["field"], "titre");
                assert_eq!(details[0]["error"], "required");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
