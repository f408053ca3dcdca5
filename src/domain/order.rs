use serde::Deserialize;
use std::collections::BTreeMap;

/// A single semantic parameter value as supplied by the caller.
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
}

impl ParamValue {
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Protocol fields injected verbatim after validation, overwriting anything
/// the formatter produced. This bypasses every check.
pub type OverrideFields = BTreeMap<String, String>;

/// The semantic description of one payment operation.
///
/// Keys are the semantic names (`order`, `merchantCode`, `amount`, ...).
/// Unknown keys are accepted here and rejected when formatting.
#[derive(Debug, Deserialize, PartialEq, Clone, Default)]
pub struct OrderParameters {
    #[serde(default)]
    raw: Option<OverrideFields>,
    #[serde(flatten)]
    fields: BTreeMap<String, ParamValue>,
}

impl OrderParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_overrides(mut self, overrides: OverrideFields) -> Self {
        self.raw = Some(overrides);
        self
    }

    /// Returns the value for `key` unless it is missing or an empty string.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.fields.get(key).filter(|v| !v.is_empty())
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(ParamValue::as_text)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn overrides(&self) -> Option<&OverrideFields> {
        self.raw.as_ref()
    }

    /// The order id, as used for key derivation.
    pub fn order(&self) -> Option<String> {
        self.text("order")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_parameters_deserialization() {
        let json = r#"{"order":"1234abc","amount":145,"merchantCode":"999008881","raw":{"DS_X":"1"}}"#;
        let params: OrderParameters = serde_json::from_str(json).unwrap();

        assert_eq!(params.order(), Some("1234abc".to_string()));
        assert_eq!(params.get("amount"), Some(&ParamValue::Integer(145)));
        assert_eq!(params.overrides().unwrap().get("DS_X").unwrap(), "1");
        assert!(params.get("raw").is_none());
    }

    #[test]
    fn test_empty_text_counts_as_missing() {
        let params = OrderParameters::new().with("terminal", "");
        assert!(params.get("terminal").is_none());
        assert_eq!(params.fields().count(), 1);
    }
}
