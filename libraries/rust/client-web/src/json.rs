use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::JsValue;

pub(crate) fn to_json(value: &impl Serialize) -> Result<String, js_sys::Error> {
    serde_json::to_string(value).map_err(|e| js_sys::Error::new(&e.to_string()))
}

pub(crate) fn from_json<T: DeserializeOwned>(
    method: &str,
    value: JsValue,
) -> Result<T, js_sys::Error> {
    let json = value
        .as_string()
        .ok_or_else(|| js_sys::Error::new(&format!("{method} did not return a string")))?;

    serde_json::from_str(&json)
        .map_err(|e| js_sys::Error::new(&format!("{method} returned invalid JSON: {e}")))
}
