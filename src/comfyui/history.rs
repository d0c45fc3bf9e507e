//! Locating result images inside a `/history/<prompt_id>` document.
//!
//! Shape: `{ "<prompt_id>": { "outputs": { "<node_id>": { "images": [ImageRef] } } } }`.
use serde_json::Value;

use crate::comfyui::client::ImageRef;

/// Output images of `prompt_id`, preferring `output_node`.
///
/// Falls back to the first node that produced images of type `output` when
/// the preferred node has none.
pub fn output_images(history: &Value, prompt_id: &str, output_node: &str) -> Vec<ImageRef> {
    let Some(outputs) = history
        .get(prompt_id)
        .and_then(|entry| entry.get("outputs"))
        .and_then(|o| o.as_object())
    else {
        return Vec::new();
    };

    if let Some(node) = outputs.get(output_node) {
        let images = collect_images(node);
        if !images.is_empty() {
            return images;
        }
    }

    outputs
        .values()
        .map(collect_images)
        .find(|images| !images.is_empty())
        .unwrap_or_default()
}

fn collect_images(node: &Value) -> Vec<ImageRef> {
    node.get("images")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .filter_map(|img| serde_json::from_value::<ImageRef>(img.clone()).ok())
        .filter(|img| img.folder_type == "output")
        .collect()
}
