#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod gpu {
    use scene_bootstrap::{
        LogicalSize,
        bootstrap::SceneContext,
        config::SceneConfig,
        context::WgpuRenderer,
        data_structures::scene_graph::Scene,
        flow::SceneFlow,
        flows::{SpinningCube, ToyTrain},
    };

    use crate::common::test_utils::FixedSurface;

    const SIZE: f64 = 96.0;

    struct Empty;

    impl SceneFlow for Empty {
        fn on_init(&mut self, _: &mut Scene) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn render_once(flow: Box<dyn SceneFlow>, config: &SceneConfig) -> image::RgbaImage {
        let runtime = tokio::runtime::Runtime::new().expect("Failed to create a tokio runtime");
        let surface = FixedSurface::new(SIZE, SIZE);
        let renderer = runtime
            .block_on(WgpuRenderer::headless(LogicalSize::new(SIZE, SIZE), config))
            .expect("No GPU adapter available for the golden image test");
        let mut ctx = SceneContext::initialize(&surface, renderer, flow, config)
            .expect("Failed to bootstrap the scene");
        assert!(ctx.on_frame().expect("Failed to render a frame"));
        assert_eq!(ctx.renderer().frames(), 1);
        runtime
            .block_on(ctx.renderer().read_pixels())
            .expect("Failed to read the frame back")
    }

    fn background() -> image::Rgba<u8> {
        let hex = SceneConfig::default().background.to_hex();
        image::Rgba([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255])
    }

    fn close(a: &image::Rgba<u8>, b: &image::Rgba<u8>) -> bool {
        a.0.iter().zip(b.0.iter()).all(|(x, y)| x.abs_diff(*y) <= 2)
    }

    #[test]
    fn should_render_background_colour() {
        let img = render_once(Box::new(Empty), &SceneConfig::default());
        let desired_pixel = background();
        for pixel in img.pixels() {
            assert!(close(pixel, &desired_pixel), "{:?} != {:?}", pixel, desired_pixel);
        }
    }

    #[test]
    fn should_render_cube_in_the_middle() {
        let img = render_once(Box::new(SpinningCube::new()), &SceneConfig::default());
        let centre = img.get_pixel(img.width() / 2, img.height() / 2);
        let corner = img.get_pixel(0, 0);
        assert!(close(corner, &background()));
        assert!(!close(centre, &background()));
        // purple: red and blue dominate green
        assert!(centre.0[0] > centre.0[1] && centre.0[2] > centre.0[1]);
    }

    #[test]
    fn should_render_train_without_multisampling() {
        let config = SceneConfig {
            antialias: false,
            ..Default::default()
        };
        let img = render_once(Box::new(ToyTrain::new()), &config);
        let covered = img.pixels().filter(|p| !close(p, &background())).count();
        assert!(covered > 0, "the train did not cover any pixel");
        assert!(covered < (img.width() * img.height()) as usize);
    }
}
