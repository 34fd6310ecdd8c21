//! Example: Launching an AOT Kernel
//!
//! This example loads an AOT module, copies 1 KiB between two device
//! allocations, then launches the module's `copy` kernel on host arrays and
//! on a Candle tensor, and finally runs the `copy_graph` compute graph.
//!
//! The module must export a kernel `copy(src, dst)` and a compute graph
//! `copy_graph(src=, dst=)`.
//!
//! Run with:
//!
//! ```bash
//! cargo run --example copy_kernel -- path/to/copy_module
//! ```

use candle_core::{Device, Tensor};
use taichi_aot::{
    init_logging, AotModule, HostArray, LogConfig, Loader, LoaderConfig, Memory,
    MemoryAllocateInfo, Result, Runtime, RuntimeConfig,
};

fn main() -> Result<()> {
    init_logging(&LogConfig::default());
    println!("=== AOT Kernel Launch Example ===\n");

    let module_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/copy_module".to_string());

    let library = Loader::new(LoaderConfig::default()).load()?;
    let runtime = Runtime::from_config(library, &RuntimeConfig::default())?;
    println!("Runtime on {}\n", runtime.arch());

    // 1. Device-to-device copy
    println!("1. Device-to-device copy:");
    let src = Memory::allocate(&runtime, &MemoryAllocateInfo::staging(1024))?;
    let dst = Memory::allocate(&runtime, &MemoryAllocateInfo::staging(1024))?;
    let pattern: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
    src.write_bytes(&pattern)?;
    Memory::copy_device_to_device(&runtime, &dst.slice(0, 1024)?, &src.slice(0, 1024)?)?;
    runtime.wait()?;
    println!("   copied 1024 bytes, match: {}\n", dst.read_bytes()? == pattern);
    src.free()?;
    dst.free()?;

    // 2. Kernel launch with host arrays
    let module = AotModule::load(&runtime, &module_path)?;
    println!("2. Kernel launch ({}):", module.origin());
    let copy = module.get_kernel("copy")?;
    let input = HostArray::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])?;
    let output = HostArray::from_slice(&[0.0f32; 6], &[2, 3])?;
    let results = copy.run(vec![input.into(), output.into()])?;
    println!("   dst = {:?}\n", results[1].to_vec::<f32>()?);

    // 3. Kernel launch with a Candle tensor
    println!("3. Kernel launch with a tensor:");
    let tensor = Tensor::arange(0i64, 8, &Device::Cpu)?.reshape((2, 4))?;
    let zeros = tensor.zeros_like()?;
    let results = copy.run(vec![
        HostArray::from_tensor(&tensor)?.into(),
        HostArray::from_tensor(&zeros)?.into(),
    ])?;
    println!("   dst = {}\n", results[1].to_tensor(&Device::Cpu)?);

    // 4. Compute graph
    println!("4. Compute graph:");
    let graph = module.get_compute_graph("copy_graph")?;
    let src = HostArray::from_slice(&[7i32, 8, 9], &[3])?;
    let dst = HostArray::from_slice(&[0i32; 3], &[3])?;
    let results = graph.run(vec![("src", src.into()), ("dst", dst.into())])?;
    println!("   dst = {:?}", results[1].to_vec::<i32>()?);

    drop(copy);
    drop(graph);
    module.destroy()?;
    runtime.destroy()?;

    println!("\n=== Example Complete ===");
    Ok(())
}
