//! Build script for drivermatch
//!
//! Windows only: embeds the application manifest so that driver-store paths
//! longer than MAX_PATH (260 chars) can be opened. The manifest
//! (`drivermatch.manifest`) sets `longPathAware=true`, which together with the
//! Windows 10 v1607+ `LongPathsEnabled` policy allows paths up to 32,767
//! characters. Deeply nested driver packages on network shares hit this limit
//! routinely.
//!
//! On other platforms this script does nothing.

fn main() {
    #[cfg(windows)]
    {
        // The .rc file references the manifest as an RT_MANIFEST resource
        embed_resource::compile("drivermatch.rc", embed_resource::NONE);

        println!("cargo:rerun-if-changed=drivermatch.rc");
        println!("cargo:rerun-if-changed=drivermatch.manifest");
    }
}
