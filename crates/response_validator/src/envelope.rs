//! Typed view of the panel's response envelope.
//!
//! Bodies come in three documented shapes: a list
//! (`{"object":"list","data":[...],"meta":{...}}`), a single resource
//! (`{"object":"server","attributes":{...}}`) and an error body
//! (`{"errors":[{"code":..,"status":..,"detail":..}]}`). Anything else is
//! `Unrecognized`.

use serde::Deserialize;
use serde_json::{Map, Value};

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

/// One entry of an error body's `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: String,
    /// HTTP status as the panel sends it, a string such as `"404"`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub detail: String,
}

impl ApiErrorDetail {
    fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| ApiErrorDetail {
            detail: value.to_string(),
            ..Default::default()
        })
    }
}

/// A single `{object, attributes}` resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub object: String,
    pub attributes: Map<String, Value>,
    pub meta: Option<Value>,
}

impl Resource {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.get("object")?.as_str()?.to_string();
        let attributes = value.get("attributes")?.as_object()?.clone();
        Some(Self {
            object,
            attributes,
            meta: value.get("meta").cloned(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn str_attr(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn u64_attr(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    pub fn bool_attr(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    List {
        items: Vec<Resource>,
        meta: Option<Value>,
    },
    Resource(Resource),
    Errors(Vec<ApiErrorDetail>),
    Unrecognized(Value),
}

impl Envelope {
    /// Classify a response body.
    ///
    /// An `errors` array wins over any other content. A list whose items are
    /// not all `{object, attributes}` resources is `Unrecognized`.
    pub fn parse(data: &Value) -> Self {
        if let Some(errors) = data.get("errors").and_then(Value::as_array) {
            return Envelope::Errors(errors.iter().map(ApiErrorDetail::from_value).collect());
        }

        match data.get("object").and_then(Value::as_str) {
            Some("list") => {
                let items = data
                    .get("data")
                    .and_then(Value::as_array)
                    .and_then(|items| items.iter().map(Resource::from_value).collect::<Option<Vec<_>>>());
                match items {
                    Some(items) => Envelope::List {
                        items,
                        meta: data.get("meta").cloned(),
                    },
                    None => Envelope::Unrecognized(data.clone()),
                }
            }
            Some(_) => match Resource::from_value(data) {
                Some(resource) => Envelope::Resource(resource),
                None => Envelope::Unrecognized(data.clone()),
            },
            None => Envelope::Unrecognized(data.clone()),
        }
    }

    pub fn as_list(&self) -> Option<&[Resource]> {
        match self {
            Envelope::List { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Envelope::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_errors(&self) -> Option<&[ApiErrorDetail]> {
        match self {
            Envelope::Errors(errors) => Some(errors),
            _ => None,
        }
    }
}
