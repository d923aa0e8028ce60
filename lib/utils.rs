//! Output helpers.

use std::{ fs, path::Path };
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::error::Result;

#[doc(hidden)]
pub use ndarray_npy::NpzWriter;

/// Create a directory and all of its parents, if they don't already exist.
pub fn mkdir<P>(dir: P) -> Result<()>
where P: AsRef<Path>
{
    fs::create_dir_all(dir)?;
    Ok(())
}

#[doc(hidden)]
pub fn mkdir_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => mkdir(parent),
        _ => Ok(()),
    }
}

/// Write a set of named arrays to a `.npz` archive, creating parent
/// directories as needed. Evaluates to a [`Result`][crate::error::Result].
///
/// ```ignore
/// write_npz!(
///     outdir.join("run.npz"),
///     arrays: {
///         "protocol" => &protocol,
///         "fidelities" => &fidelities,
///     }
/// )?;
/// ```
#[macro_export]
macro_rules! write_npz {
    (
        $path:expr,
        arrays: { $( $name:expr => $arr:expr ),+ $(,)? } $(,)?
    ) => {
        (|| -> $crate::error::Result<()> {
            let path: ::std::path::PathBuf
                = ::std::convert::AsRef::<::std::path::Path>::as_ref(&$path)
                .to_path_buf();
            $crate::utils::mkdir_parent(&path)?;
            let mut npz = $crate::utils::NpzWriter::new(::std::fs::File::create(&path)?);
            $( npz.add_array($name, $arr)?; )+
            npz.finish()?;
            Ok(())
        })()
    }
}

/// Write a state trajectory (time on the last axis) along with its initial and
/// target states to a `.npz` archive.
///
/// Complex arrays are split into real and imaginary parts, giving arrays
/// `trajectory_re`, `trajectory_im`, `initial_re`, `initial_im`, `target_re`,
/// and `target_im`.
pub fn write_trajectory_npz<P>(
    path: P,
    trajectory: &nd::Array2<C64>,
    initial: &nd::Array1<C64>,
    target: &nd::Array1<C64>,
) -> Result<()>
where P: AsRef<Path>
{
    write_npz!(
        path,
        arrays: {
            "trajectory_re" => &trajectory.mapv(|a| a.re),
            "trajectory_im" => &trajectory.mapv(|a| a.im),
            "initial_re" => &initial.mapv(|a| a.re),
            "initial_im" => &initial.mapv(|a| a.im),
            "target_re" => &target.mapv(|a| a.re),
            "target_im" => &target.mapv(|a| a.im),
        }
    )
}
