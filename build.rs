use std::env;
use std::path::PathBuf;

// Windows-only hint for locating FFmpeg when the `ffmpeg` feature is on.
fn main() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
    println!("cargo:rerun-if-env-changed=VCPKG_ROOT");
    println!("cargo:rerun-if-env-changed=VCPKGRS_TRIPLET");

    if env::var_os("CARGO_FEATURE_FFMPEG").is_none() {
        return;
    }
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=video-slicer: FFMPEG_DIR is not set. Install FFmpeg via vcpkg and set FFMPEG_DIR, or build with --no-default-features to drop the FFmpeg backend."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let ffmpeg_dir = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if ffmpeg_dir.exists() {
        println!(
            "cargo:warning=video-slicer: found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to use it explicitly.",
            ffmpeg_dir.display()
        );
    } else {
        println!(
            "cargo:warning=video-slicer: VCPKG_ROOT is set but {} holds no FFmpeg install.",
            ffmpeg_dir.display()
        );
    }
}
