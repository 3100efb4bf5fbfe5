use std::collections::HashMap;

use reqwest::Client;
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use serde_json::{
    json,
    Value,
};

use crate::core::MorphRankError;

pub const DEFAULT_ANKI_CONNECT_URL: &str = "http://localhost:8765/";
const ANKI_CONNECT_VERSION: u32 = 6;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Field {
    pub value: String,
    pub order: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    pub note_id: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fields: HashMap<String, Field>,
    pub model_name: String,
}

impl NoteInfo {
    /// Field values in note type order.
    pub fn ordered_fields(&self) -> Vec<String> {
        let mut fields: Vec<&Field> = self.fields.values().collect();
        fields.sort_by_key(|field| field.order);
        fields.into_iter().map(|field| field.value.clone()).collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub card_id: u64,
    pub note: u64,
    pub model_name: String,
    /// Negative values are learning steps in seconds.
    #[serde(default)]
    pub interval: i64,
    #[serde(rename = "type")]
    pub card_type: i32,
    pub queue: i32,
    pub due: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self, action: &str) -> Result<Option<T>, MorphRankError> {
        match self.error {
            Some(message) => {
                Err(MorphRankError::AnkiConnect { action: action.to_string(), message })
            }
            None => Ok(self.result),
        }
    }
}

/// A single AnkiConnect action, as sent on its own or inside `multi`.
pub fn action(action: &str, params: Option<Value>) -> Value {
    let mut body = serde_json::Map::new();
    body.insert("action".to_string(), Value::String(action.to_string()));
    body.insert("version".to_string(), Value::Number(ANKI_CONNECT_VERSION.into()));

    if let Some(params) = params {
        body.insert("params".to_string(), params);
    }
    Value::Object(body)
}

pub fn set_card_due_and_queue(card_id: u64, due: i64, queue: i32) -> Value {
    action(
        "setSpecificValueOfCard",
        Some(json!({
            "card": card_id,
            "keys": ["due", "queue"],
            "newValues": [due.to_string(), queue.to_string()],
            "warning_check": true,
        })),
    )
}

pub fn update_note(note_id: u64, fields: HashMap<&str, &str>, tags: &[String]) -> Value {
    action(
        "updateNote",
        Some(json!({
            "note": {
                "id": note_id,
                "fields": fields,
                "tags": tags,
            }
        })),
    )
}

#[derive(Debug, Clone)]
pub struct AnkiConnectClient {
    client: Client,
    url: String,
}

impl AnkiConnectClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: Client::new(), url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn make_request<T: DeserializeOwned>(
        &self,
        action_name: &str,
        params: Option<Value>,
    ) -> Result<Option<T>, MorphRankError> {
        let body = action(action_name, params);
        let response: ApiResponse<T> =
            self.client.post(&self.url).json(&body).send().await?.json().await?;
        response.into_result(action_name)
    }

    // Used to check that AnkiConnect is reachable.
    pub async fn get_version(&self) -> Result<u32, MorphRankError> {
        Ok(self.make_request("version", None).await?.unwrap_or_default())
    }

    pub async fn get_model_ids(&self) -> Result<HashMap<String, u64>, MorphRankError> {
        Ok(self.make_request("modelNamesAndIds", None).await?.unwrap_or_default())
    }

    pub async fn get_field_names(&self, model_name: &str) -> Result<Vec<String>, MorphRankError> {
        let params = json!({ "modelName": model_name });
        Ok(self.make_request("modelFieldNames", Some(params)).await?.unwrap_or_default())
    }

    pub async fn add_field(
        &self,
        model_name: &str,
        field_name: &str,
        index: usize,
    ) -> Result<(), MorphRankError> {
        let params = json!({ "modelName": model_name, "fieldName": field_name, "index": index });
        self.make_request::<Value>("modelFieldAdd", Some(params)).await?;
        Ok(())
    }

    pub async fn find_cards(&self, query: &str) -> Result<Vec<u64>, MorphRankError> {
        let params = json!({ "query": query });
        Ok(self.make_request("findCards", Some(params)).await?.unwrap_or_default())
    }

    pub async fn get_cards(&self, card_ids: &[u64]) -> Result<Vec<CardInfo>, MorphRankError> {
        let params = json!({ "cards": card_ids });
        Ok(self.make_request("cardsInfo", Some(params)).await?.unwrap_or_default())
    }

    pub async fn get_notes(&self, note_ids: &[u64]) -> Result<Vec<NoteInfo>, MorphRankError> {
        let params = json!({ "notes": note_ids });
        Ok(self.make_request("notesInfo", Some(params)).await?.unwrap_or_default())
    }

    /// Sends several actions in one request. Fails on the first action that reported an error.
    pub async fn multi(&self, actions: Vec<Value>) -> Result<Vec<Value>, MorphRankError> {
        let params = json!({ "actions": actions });
        let results: Vec<Value> =
            self.make_request("multi", Some(params)).await?.unwrap_or_default();

        for result in &results {
            if let Some(message) = result.get("error").and_then(Value::as_str) {
                return Err(MorphRankError::AnkiConnect {
                    action: "multi".to_string(),
                    message: message.to_string(),
                });
            }
        }
        Ok(results)
    }
}

impl Default for AnkiConnectClient {
    fn default() -> Self {
        Self::new(DEFAULT_ANKI_CONNECT_URL)
    }
}

/// Search query matching every note of a note type.
pub fn note_type_query(model_name: &str) -> String {
    if model_name.contains(' ') || model_name.contains(':') || model_name.contains('"') {
        format!("note:\"{}\"", model_name.replace('"', "\\\""))
    } else {
        format!("note:{}", model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_type_query_quotes_when_needed() {
        assert_eq!(note_type_query("Basic"), "note:Basic");
        assert_eq!(note_type_query("Japanese Sentence"), "note:\"Japanese Sentence\"");
        assert_eq!(note_type_query("a\"b"), "note:\"a\\\"b\"");
    }

    #[test]
    fn test_api_error_becomes_typed_error() {
        let response: ApiResponse<Vec<u64>> =
            serde_json::from_str(r#"{"result": null, "error": "collection is not available"}"#)
                .unwrap();
        match response.into_result("findCards") {
            Err(MorphRankError::AnkiConnect { action, message }) => {
                assert_eq!(action, "findCards");
                assert_eq!(message, "collection is not available");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_note_fields_follow_field_order() {
        let note: NoteInfo = serde_json::from_str(
            r#"{
                "noteId": 5,
                "modelName": "Basic",
                "tags": ["am-ready"],
                "fields": {
                    "Back": {"value": "b", "order": 1},
                    "Front": {"value": "f", "order": 0}
                },
                "cards": [1]
            }"#,
        )
        .unwrap();
        assert_eq!(note.ordered_fields(), vec!["f", "b"]);
    }

    #[test]
    fn test_card_write_action_shape() {
        let value = set_card_due_and_queue(7, 500_001, -1);
        assert_eq!(value["action"], "setSpecificValueOfCard");
        assert_eq!(value["version"], 6);
        assert_eq!(value["params"]["newValues"], json!(["500001", "-1"]));
    }
}
