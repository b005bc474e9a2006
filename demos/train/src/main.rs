use scene_bootstrap::{config::SceneConfig, flow, flows::ToyTrain};

fn main() -> anyhow::Result<()> {
    let config = SceneConfig {
        title: "Toy train".to_string(),
        ..Default::default()
    };
    flow::run(config, Box::new(ToyTrain::new()))
}
