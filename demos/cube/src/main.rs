use scene_bootstrap::{config::SceneConfig, flow, flows::SpinningCube};

fn main() -> anyhow::Result<()> {
    let config = SceneConfig {
        title: "Spinning cube".to_string(),
        ..Default::default()
    };
    flow::run(config, Box::new(SpinningCube::new()))
}
