//! Fixed img2img job graph submitted to ComfyUI.
//!
//! load image -> load checkpoint -> encode to latent -> encode positive and
//! negative text -> sample -> decode -> save. Only the input image, checkpoint,
//! prompts and seed vary per request.
use rand::Rng;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::prompt::{PromptConstructor, Style};

/// Node id of the `SaveImage` node whose outputs hold the result.
pub const OUTPUT_NODE_ID: &str = "8";

pub const STEPS: u32 = 20;
pub const CFG: f64 = 7.0;
pub const DENOISE: f64 = 0.55;
pub const SAMPLER: &str = "euler_ancestral";
pub const SCHEDULER: &str = "normal";
pub const FILENAME_PREFIX: &str = "family_stylizer";

fn template() -> Value {
    json!({
        "1": {"class_type": "LoadImage", "inputs": {"image": "{{image}}"}},
        "2": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "{{ckpt_name}}"}},
        "3": {"class_type": "VAEEncode", "inputs": {"pixels": ["1", 0], "vae": ["2", 2]}},
        "4": {"class_type": "CLIPTextEncode", "inputs": {"text": "{{positive}}", "clip": ["2", 1]}},
        "5": {"class_type": "CLIPTextEncode", "inputs": {"text": "{{negative}}", "clip": ["2", 1]}},
        "6": {
            "class_type": "KSampler",
            "inputs": {
                "seed": "{{seed}}",
                "steps": "{{steps}}",
                "cfg": "{{cfg}}",
                "sampler_name": "{{sampler_name}}",
                "scheduler": "{{scheduler}}",
                "denoise": "{{denoise}}",
                "model": ["2", 0],
                "positive": ["4", 0],
                "negative": ["5", 0],
                "latent_image": ["3", 0]
            }
        },
        "7": {"class_type": "VAEDecode", "inputs": {"samples": ["6", 0], "vae": ["2", 2]}},
        OUTPUT_NODE_ID: {
            "class_type": "SaveImage",
            "inputs": {"filename_prefix": FILENAME_PREFIX, "images": ["7", 0]}
        }
    })
}

pub fn random_seed() -> u64 {
    u64::from(rand::thread_rng().gen::<u32>())
}

/// Build the job graph for one request.
pub fn build_graph(image: &str, ckpt_name: &str, style: Style, seed: u64) -> AppResult<Value> {
    let prompt = style.prompt();
    let inputs = json!({
        "image": image,
        "ckpt_name": ckpt_name,
        "positive": prompt.positive,
        "negative": prompt.negative,
        "seed": seed,
        "steps": STEPS,
        "cfg": CFG,
        "sampler_name": SAMPLER,
        "scheduler": SCHEDULER,
        "denoise": DENOISE,
    });
    PromptConstructor::new().construct_prompt(&template(), &inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_carries_style_prompts_and_sampling_params() {
        let graph = build_graph("upload-x.jpg", "model.safetensors", Style::Cartoon, 7).unwrap();
        let cartoon = Style::Cartoon.prompt();
        assert_eq!(graph["1"]["inputs"]["image"], "upload-x.jpg");
        assert_eq!(graph["2"]["inputs"]["ckpt_name"], "model.safetensors");
        assert_eq!(graph["4"]["inputs"]["text"], cartoon.positive);
        assert_eq!(graph["5"]["inputs"]["text"], cartoon.negative);
        assert_eq!(graph["6"]["inputs"]["seed"], 7);
        assert_eq!(graph["6"]["inputs"]["steps"], STEPS);
        assert_eq!(graph["6"]["inputs"]["denoise"], DENOISE);
        assert_eq!(graph["6"]["inputs"]["positive"], json!(["4", 0]));
        assert_eq!(graph[OUTPUT_NODE_ID]["class_type"], "SaveImage");
    }

    #[test]
    fn seeds_fit_in_u32() {
        for _ in 0..32 {
            assert!(random_seed() <= u64::from(u32::MAX));
        }
    }
}
