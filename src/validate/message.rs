//! Message record posted to the message-list route.
//!
//! Decoding is lenient: absent and `null` fields read as zero values, and the
//! PascalCase and snake_case spellings of each key are accepted as well.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    #[serde(alias = "Id", deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(alias = "MsgText", alias = "msg_text", deserialize_with = "null_as_default")]
    pub msg_text: String,
    #[serde(alias = "MsgType", alias = "msg_type", deserialize_with = "null_as_default")]
    pub msg_type: i32,
    #[serde(alias = "SenderId", alias = "sender_id", deserialize_with = "null_as_default")]
    pub sender_id: String,
    #[serde(alias = "SourceType", alias = "source_type", deserialize_with = "null_as_default")]
    pub source_type: i32,
    #[serde(alias = "UserId", alias = "user_id", deserialize_with = "null_as_default")]
    pub user_id: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_default_to_zero_values() {
        let msg: Message = serde_json::from_str(r#"{"msgText":"hi"}"#).unwrap();
        assert_eq!(msg.msg_text, "hi");
        assert!(msg.sender_id.is_empty());
        assert_eq!(msg.user_id, 0);
    }

    #[test]
    fn test_null_fields_read_as_zero_values() {
        let msg: Message = serde_json::from_str(
            r#"{"id":null,"msgText":null,"msgType":1,"senderId":"S1","sourceType":null,"userId":7}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            Message {
                msg_type: 1,
                sender_id: "S1".into(),
                user_id: 7,
                ..Default::default()
            }
        );

        let nulls: Message = serde_json::from_str(r#"{"senderId":null,"userId":null}"#).unwrap();
        assert!(nulls.sender_id.is_empty());
        assert_eq!(nulls.user_id, 0);
    }

    #[test]
    fn test_pascal_case_keys_are_accepted() {
        let msg: Message = serde_json::from_str(r#"{"SenderId":"S1","UserId":7,"MsgText":"hi"}"#).unwrap();
        assert_eq!(msg.sender_id, "S1");
        assert_eq!(msg.user_id, 7);
        assert_eq!(msg.msg_text, "hi");
    }

    #[test]
    fn test_string_user_id_is_rejected() {
        assert!(serde_json::from_str::<Message>(r#"{"senderId":"S1","userId":"7"}"#).is_err());
    }
}
