use std::env;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OPENVINO_INSTALL_DIR");

    if cfg!(feature = "openvino") {
        // openvino-sys does the actual linking; this only widens the search path
        // for installations that keep the plugins next to the runtime libraries.
        match env::var("OPENVINO_INSTALL_DIR") {
            Ok(install_dir) => {
                let lib_dir = Path::new(&install_dir).join("deployment_tools/inference_engine/lib/intel64");
                if lib_dir.is_dir() {
                    println!("cargo:rustc-link-search=native={}", lib_dir.display());
                } else {
                    println!(
                        "cargo:warning=OPENVINO_INSTALL_DIR is set but {} does not exist",
                        lib_dir.display()
                    );
                }
            }
            Err(_) => {
                println!("cargo:warning=OPENVINO_INSTALL_DIR is not set; relying on openvino-sys to locate the libraries");
            }
        }
    }
}
