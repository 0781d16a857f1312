use spirv_builder::{MetadataPrintout, SpirvBuilder};
use std::path::PathBuf;

/// Entry point name → output file the renderer expects.
const OUTPUTS: [(&str, &str); 2] = [("main_vs", "vert.spv"), ("main_fs", "frag.spv")];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let shaders_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("shaders");

    // One module per entry point so each stage lands in its own file.
    let result = SpirvBuilder::new(&shaders_dir, "spirv-unknown-vulkan1.0")
        .multimodule(true)
        .print_metadata(MetadataPrintout::None)
        .build()?;

    let modules = result.module.unwrap_multi();
    for (entry, file_name) in OUTPUTS {
        let module = modules
            .get(entry)
            .ok_or_else(|| format!("shader entry point {entry} was not built"))?;
        let target = shaders_dir.join(file_name);
        std::fs::copy(module, &target)?;
        println!("{entry}: {} -> {}", module.display(), target.display());
    }

    Ok(())
}
