//! Example: Querying the Taichi C-API
//!
//! This example loads the native library, prints its version and the archs
//! it can run on, picks one GPU-first, and lists the device capabilities.
//!
//! Run with:
//!
//! ```bash
//! cargo run --example query_archs
//! TAICHI_C_API_DIR=/opt/taichi/lib cargo run --example query_archs
//! RUST_LOG=taichi_aot=debug cargo run --example query_archs
//! ```

use taichi_aot::{
    init_logging, select_arch, warn_if_cpu, LogConfig, Loader, LoaderConfig, Result, Runtime,
    RuntimeConfig,
};

fn main() -> Result<()> {
    init_logging(&LogConfig::default());
    println!("=== Taichi C-API Query Example ===\n");

    // 1. Locate and load the library
    println!("1. Loading the library:");
    let mut config = LoaderConfig::default();
    if let Some(dir) = std::env::var_os("TAICHI_C_API_DIR") {
        config = config.with_search_dir(dir);
    }
    for dir in config.candidate_dirs() {
        println!("   candidate: {}", dir.display());
    }
    let library = Loader::new(config).load()?;
    if let Some(path) = library.path() {
        println!("   loaded: {}", path.display());
    }
    println!("   version: {}\n", library.version());

    // 2. Available archs
    println!("2. Available archs:");
    for arch in library.available_archs()? {
        let kind = if arch.is_cpu() { "cpu" } else { "gpu" };
        println!("   {arch} ({kind})");
    }
    println!();

    // 3. GPU-first selection
    println!("3. Arch selection:");
    let runtime_config = RuntimeConfig::default();
    let arch = select_arch(&library, &runtime_config)?;
    warn_if_cpu(arch);
    println!("   selected: {arch}\n");

    // 4. Capabilities
    println!("4. Device capabilities:");
    let runtime = Runtime::create(library, arch, runtime_config.device_index)?;
    let capabilities = runtime.capabilities()?;
    if capabilities.is_empty() {
        println!("   (none reported)");
    }
    for cap in capabilities {
        println!("   {:<40} {}", cap.capability.name(), cap.level);
    }
    runtime.destroy()?;

    println!("\n=== Example Complete ===");
    Ok(())
}
