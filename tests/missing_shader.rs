// Setup must fail cleanly when a shader binary is missing
//
// Needs a Vulkan device and a display; ignored by default.

use hello_triangle::{run_with_event_loop, AppConfig, TriangleError};
use std::path::PathBuf;
use winit::event_loop::EventLoop;

#[test]
#[ignore = "requires a Vulkan device and a display"]
fn missing_shader_fails_setup() {
    let shaders = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders");
    let missing = shaders.join("missing.vert.spv");

    let mut builder = EventLoop::builder();
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        builder.with_any_thread(true);
    }
    let event_loop = builder.build().unwrap();

    let config = AppConfig::default()
        .with_shaders(missing.clone(), shaders.join("frag.spv"))
        .with_visible(false)
        .with_frame_limit(1);

    match run_with_event_loop(event_loop, config) {
        Err(TriangleError::ShaderRead { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected a shader read error, got {other:?}"),
    }
}
