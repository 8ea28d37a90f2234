use std::env;
use std::path::PathBuf;
use std::process::Command;

const KERNEL_SRC: &str = "kernels/cuda/sma_kernel.cu";
const KERNEL_PTX: &str = "sma_kernel.ptx";
const DEFAULT_ARCH: &str = "compute_61";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    // PTX is only needed when the `cuda` feature is on.
    if env::var("CARGO_FEATURE_CUDA").is_ok() {
        compile_cuda_kernel();
    }
}

fn compile_cuda_kernel() {
    println!("cargo:rerun-if-changed={KERNEL_SRC}");
    println!("cargo:rerun-if-env-changed=NVCC");
    println!("cargo:rerun-if-env-changed=CUDA_PATH");
    println!("cargo:rerun-if-env-changed=CUDA_HOME");
    println!("cargo:rerun-if-env-changed=CUDA_ARCH");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR"));
    let ptx_path = out_dir.join(KERNEL_PTX);

    let nvcc = env::var("NVCC").unwrap_or_else(|_| format!("{}/bin/nvcc", find_cuda_path()));
    let arch = env::var("CUDA_ARCH")
        .map(|a| normalize_arch(&a))
        .ok()
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_ARCH.to_string());

    let status = Command::new(&nvcc)
        .args(["-ptx", "-O3", "-arch", &arch, "-o"])
        .arg(&ptx_path)
        .arg(KERNEL_SRC)
        .status()
        .unwrap_or_else(|e| panic!("failed to run nvcc at {nvcc}: {e}"));
    if !status.success() {
        panic!("nvcc failed to compile {KERNEL_SRC} ({status})");
    }
}

fn find_cuda_path() -> String {
    env::var("CUDA_PATH")
        .or_else(|_| env::var("CUDA_HOME"))
        .unwrap_or_else(|_| "/usr/local/cuda".to_string())
}

// Accepts 61, 6.1, sm_61 or compute_61.
fn normalize_arch(s: &str) -> String {
    let t = s.trim();
    if let Some(rest) = t.strip_prefix("sm_") {
        return format!("compute_{rest}");
    }
    if t.starts_with("compute_") {
        return t.to_string();
    }
    let digits: String = t.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        String::new()
    } else {
        format!("compute_{digits}")
    }
}
