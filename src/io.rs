use std::path::Path;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::JsFuture;

/// Turns an asset path into a URL relative to the page.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn web_url(path: &Path) -> Result<String, String> {
    let mut url = path.to_string_lossy().replace('\\', "/");

    while let Some(stripped) = url.strip_prefix("./") {
        url = stripped.to_string();
    }

    if let Some(stripped) = url.strip_prefix("public/") {
        url = stripped.to_string();
    }

    let url = url.trim_start_matches('/').to_string();
    if url.is_empty() {
        return Err("Cannot fetch an empty asset path".into());
    }

    Ok(url)
}

/// Downloads `url` with the page's `fetch`, yielding to the event loop while
/// the request is in flight.
#[cfg(target_arch = "wasm32")]
pub(crate) async fn fetch_binary(url: &str) -> Result<Vec<u8>, String> {
    let window = web_sys::window().ok_or_else(|| format!("No window to fetch {} from", url))?;

    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| format!("Request for {} failed: {:?}", url, err))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| format!("Unexpected fetch result for {}", url))?;
    if !response.ok() {
        return Err(format!("HTTP {} when requesting {}", response.status(), url));
    }

    let body = response
        .array_buffer()
        .map_err(|err| format!("Failed to read body of {}: {:?}", url, err))?;
    let body = JsFuture::from(body)
        .await
        .map_err(|err| format!("Failed to read body of {}: {:?}", url, err))?;

    Ok(js_sys::Uint8Array::new(&body).to_vec())
}

/// Reads an asset's raw bytes from disk.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn load_binary(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|err| format!("Failed to read {:?}: {}", path, err))
}
