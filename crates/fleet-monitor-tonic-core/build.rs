/// Builds the gRPC client and server code for the `fleet.proto` definition
/// using `tonic-prost-build`.
///
/// The Protocol Buffer definitions in the `proto` directory are compiled into
/// Rust modules with gRPC bindings in the crate's `OUT_DIR`. A file descriptor
/// set is written alongside them so the server can expose gRPC reflection.
///
/// # Files and Paths
///
/// - Proto file: `proto/fleet.proto`
/// - Includes: `proto/`
/// - Descriptor set: `$OUT_DIR/fleet_descriptor.bin`
///
/// # Panics
///
/// This function will `panic!` if code generation fails.
///
/// # Output
///
/// Generated code is accessible via:
///
/// ```rust
/// pub mod proto {
///     tonic::include_proto!("fleet");
/// }
/// ```
use std::env;
use std::path::PathBuf;
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("fleet_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    println!("cargo:rerun-if-changed=proto/fleet.proto");

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/fleet.proto"], &["proto"])
        .unwrap();
}
