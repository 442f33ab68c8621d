use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Recipient {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub comment: Option<String>,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipient {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipientPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub comment: Option<Option<String>>, // Some(None) clears
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_null_from_absent_comment() {
        let absent: RecipientPatch = serde_json::from_str(r#"{"name":"Ann"}"#).unwrap();
        assert_eq!(absent.comment, None);

        let cleared: RecipientPatch = serde_json::from_str(r#"{"comment":null}"#).unwrap();
        assert_eq!(cleared.comment, Some(None));

        let set: RecipientPatch = serde_json::from_str(r#"{"comment":"vip"}"#).unwrap();
        assert_eq!(set.comment, Some(Some("vip".to_string())));
    }
}
