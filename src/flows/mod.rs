//! Built-in scenes.

pub mod cube;
pub mod train;

pub use cube::SpinningCube;
pub use train::ToyTrain;

use crate::flow::SceneFlow;

/// Look up a built-in scene by name: `"cube"` or `"train"`.
pub fn by_name(name: &str) -> Option<Box<dyn SceneFlow>> {
    match name {
        "cube" => Some(Box::new(SpinningCube::new())),
        "train" => Some(Box::new(ToyTrain::new())),
        _ => None,
    }
}

/// Web entry point: run a built-in scene in the configured canvas.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(js_name = runScene)]
pub fn run_scene(name: &str) -> Result<(), wasm_bindgen::JsValue> {
    let flow = by_name(name)
        .ok_or_else(|| wasm_bindgen::JsValue::from_str(&format!("unknown scene '{}'", name)))?;
    crate::flow::run(crate::config::SceneConfig::default(), flow)
        .map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{:#}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{material::Color, scene_graph::Scene};

    #[test]
    fn built_in_scenes_are_found_by_name() {
        for name in ["cube", "train"] {
            let mut flow = by_name(name).unwrap();
            let mut scene = Scene::new(Color::BLACK);
            flow.on_init(&mut scene).unwrap();
            assert!(!scene.is_empty());
        }
        assert!(by_name("tram").is_none());
    }
}
