use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::{NotifierError, Result};

/// Review status of a submission as reported by the homework API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub const ALL: [HomeworkStatus; 3] = [
        HomeworkStatus::Approved,
        HomeworkStatus::Reviewing,
        HomeworkStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
        }
    }

    /// Sentence sent to the chat for this status.
    pub fn verdict(self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = NotifierError;

    fn from_str(s: &str) -> Result<Self> {
        HomeworkStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| NotifierError::ShapeMismatch(format!("unknown homework status {s:?}")))
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homework {
    pub homework_name: String,
    pub status: HomeworkStatus,
}

impl Homework {
    pub fn message(&self) -> String {
        format!(
            "Изменился статус проверки работы \"{}\". {}",
            self.homework_name,
            self.status.verdict()
        )
    }
}

impl TryFrom<&Value> for Homework {
    type Error = NotifierError;

    fn try_from(record: &Value) -> Result<Self> {
        let record = record.as_object().ok_or_else(|| {
            NotifierError::ShapeMismatch(format!("homework record is not an object: {record}"))
        })?;

        let homework_name = match record.get("homework_name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(NotifierError::ShapeMismatch(
                    "homework record has no homework_name".into(),
                ));
            }
        };

        let status: HomeworkStatus = record
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| NotifierError::ShapeMismatch("homework record has no status".into()))?
            .parse()?;

        Ok(Homework { homework_name, status })
    }
}

/// Validates the API document and returns its most recent homework record.
///
/// An empty `homeworks` list means nothing changed since `from_date`; it is
/// reported as a [`NotifierError::ShapeMismatch`] so the cycle sends nothing.
pub fn check_response(response: &Value) -> Result<&Value> {
    let document = response.as_object().ok_or_else(|| {
        NotifierError::ShapeMismatch("API response is not a JSON object".into())
    })?;

    let homeworks = document
        .get("homeworks")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            NotifierError::ShapeMismatch("API response has no \"homeworks\" list".into())
        })?;

    match homeworks.first() {
        Some(latest) => Ok(latest),
        None => {
            debug!("No new homework statuses");
            Err(NotifierError::ShapeMismatch("no new homework statuses".into()))
        }
    }
}

pub fn parse_status(homework: &Value) -> Result<String> {
    let homework = Homework::try_from(homework)?;
    debug!(homework = %homework.homework_name, status = %homework.status, "Parsed homework status");
    Ok(homework.message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_shape_mismatch<T: fmt::Debug>(result: Result<T>) {
        match result {
            Err(NotifierError::ShapeMismatch(_)) => {}
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn check_response_returns_first_homework() {
        let response = json!({
            "homeworks": [
                {"homework_name": "newest", "status": "reviewing"},
                {"homework_name": "older", "status": "approved"},
                {"homework_name": "oldest", "status": "rejected"}
            ],
            "current_date": 1700000000
        });
        let latest = check_response(&response).unwrap();
        assert_eq!(latest["homework_name"], "newest");
    }

    #[test]
    fn check_response_single_element() {
        let response = json!({"homeworks": [{"homework_name": "hw1", "status": "approved"}]});
        assert_eq!(check_response(&response).unwrap(), &response["homeworks"][0]);
    }

    #[test]
    fn check_response_rejects_non_object() {
        assert_shape_mismatch(check_response(&json!([1, 2, 3])));
        assert_shape_mismatch(check_response(&json!("homeworks")));
    }

    #[test]
    fn check_response_rejects_missing_or_non_list_homeworks() {
        assert_shape_mismatch(check_response(&json!({"current_date": 1})));
        assert_shape_mismatch(check_response(&json!({"homeworks": {"homework_name": "hw1"}})));
        assert_shape_mismatch(check_response(&json!({"homeworks": null})));
    }

    #[test]
    fn check_response_rejects_empty_list() {
        assert_shape_mismatch(check_response(&json!({"homeworks": []})));
    }

    #[test]
    fn every_status_has_its_verdict() {
        let expected = [
            ("approved", "Работа проверена: ревьюеру всё понравилось. Ура!"),
            ("reviewing", "Работа взята на проверку ревьюером."),
            ("rejected", "Работа проверена: у ревьюера есть замечания."),
        ];
        for (status, verdict) in expected {
            let message = parse_status(&json!({"homework_name": "hw1", "status": status})).unwrap();
            assert_eq!(
                message,
                format!("Изменился статус проверки работы \"hw1\". {verdict}")
            );
        }
    }

    #[test]
    fn approved_message_matches_exactly() {
        let message = parse_status(&json!({"homework_name": "hw1", "status": "approved"})).unwrap();
        assert_eq!(
            message,
            "Изменился статус проверки работы \"hw1\". Работа проверена: ревьюеру всё понравилось. Ура!"
        );
    }

    #[test]
    fn parse_status_rejects_unknown_status() {
        assert_shape_mismatch(parse_status(&json!({"homework_name": "hw1", "status": "lost"})));
        assert_shape_mismatch(parse_status(&json!({"homework_name": "hw1", "status": "APPROVED"})));
        assert_shape_mismatch(parse_status(&json!({"homework_name": "hw1"})));
        assert_shape_mismatch(parse_status(&json!({"homework_name": "hw1", "status": 1})));
    }

    #[test]
    fn parse_status_rejects_missing_or_empty_name() {
        assert_shape_mismatch(parse_status(&json!({"status": "approved"})));
        assert_shape_mismatch(parse_status(&json!({"homework_name": "", "status": "approved"})));
        assert_shape_mismatch(parse_status(&json!({"homework_name": 7, "status": "approved"})));
    }

    #[test]
    fn parse_status_rejects_non_object() {
        assert_shape_mismatch(parse_status(&json!("hw1")));
        assert_shape_mismatch(parse_status(&json!(null)));
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in HomeworkStatus::ALL {
            assert_eq!(status.as_str().parse::<HomeworkStatus>().unwrap(), status);
        }
    }
}
