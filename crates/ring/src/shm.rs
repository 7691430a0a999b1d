//! POSIX shared-memory segment creation and attachment.
//!
//! A segment is named `SEG4xRING_<ring_name>` and holds a [`SegmentHeader`]
//! immediately followed by an [`crate::mpmc::MpmcQueue`] and its slot array.
//! The segment itself is a process-wide, externally-named resource: `Drop`
//! only unmaps and closes this process's view (mirrors `ring_free`); nothing
//! in the ordinary lifecycle calls `shm_unlink`. [`SharedSegment::destroy`]
//! is the explicit, separate operation for tearing the segment down, mainly
//! useful for tests that want a clean slate between runs.

use std::ffi::CString;
use std::os::unix::io::RawFd;
use std::ptr;

use crate::error::{Result, RingError};

/// Max bytes in a ring name, matching `SEGM_NAMESIZE`/`RING_NAMESIZE` in the
/// original implementation.
pub const NAME_MAX: usize = 64;

pub(crate) fn segment_name(ring_name: &str) -> Result<String> {
    if ring_name.len() >= NAME_MAX {
        return Err(RingError::NameTooLong {
            name: ring_name.to_string(),
            max: NAME_MAX - 1,
        });
    }
    Ok(format!("/SEG4xRING_{ring_name}"))
}

/// A mapped POSIX shared-memory region.
#[derive(Debug)]
pub(crate) struct SharedSegment {
    ptr: *mut u8,
    len: usize,
    fd: RawFd,
    shm_name: String,
}

// SAFETY: the region is backed by shm_open/mmap and all access to the data
// inside it goes through atomics placed there by `MpmcQueue`.
unsafe impl Send for SharedSegment {}
unsafe impl Sync for SharedSegment {}

impl SharedSegment {
    /// Creates a brand-new segment of exactly `len` bytes. Fails with
    /// [`RingError::AlreadyExists`] if one by this name is already present.
    pub(crate) fn create(ring_name: &str, len: usize) -> Result<Self> {
        let shm_name = segment_name(ring_name)?;
        let c_name = CString::new(shm_name.clone()).expect("shm name has no interior NUL");

        unsafe {
            let fd: RawFd = libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_RDWR | libc::O_EXCL,
                0o600,
            );
            if fd < 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() == Some(libc::EEXIST) {
                    return Err(RingError::AlreadyExists { name: shm_name });
                }
                return Err(RingError::SegmentCreateFailed {
                    name: shm_name,
                    source: err,
                });
            }

            if libc::ftruncate(fd, len as libc::off_t) < 0 {
                let err = std::io::Error::last_os_error();
                libc::close(fd);
                libc::shm_unlink(c_name.as_ptr());
                return Err(RingError::SegmentCreateFailed {
                    name: shm_name,
                    source: err,
                });
            }

            let ptr = map(fd, len, &shm_name)?;
            Ok(Self {
                ptr,
                len,
                fd,
                shm_name,
            })
        }
    }

    /// Attaches to an existing segment, discovering its size via `fstat`
    /// rather than requiring the caller to already know it.
    pub(crate) fn open(ring_name: &str) -> Result<Self> {
        let shm_name = segment_name(ring_name)?;
        let c_name = CString::new(shm_name.clone()).expect("shm name has no interior NUL");

        unsafe {
            let fd: RawFd = libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0);
            if fd < 0 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() == Some(libc::ENOENT) {
                    return Err(RingError::NotFound { name: shm_name });
                }
                return Err(RingError::SegmentOpenFailed {
                    name: shm_name,
                    source: err,
                });
            }

            let mut stat: libc::stat = std::mem::zeroed();
            if libc::fstat(fd, &mut stat) < 0 {
                let err = std::io::Error::last_os_error();
                libc::close(fd);
                return Err(RingError::SegmentOpenFailed {
                    name: shm_name,
                    source: err,
                });
            }
            let len = stat.st_size as usize;

            let ptr = map(fd, len, &shm_name)?;
            Ok(Self {
                ptr,
                len,
                fd,
                shm_name,
            })
        }
    }

    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Explicitly removes the segment from the system. Existing mappings
    /// in other processes remain valid until they unmap; no new attach by
    /// name will succeed afterward. Intended for test teardown, matching
    /// the design note that segment destruction is not part of the
    /// ordinary `ring_init`/`ring_lookup`/`ring_free` lifecycle.
    pub fn destroy(self) -> Result<()> {
        let c_name = CString::new(self.shm_name.clone()).expect("shm name has no interior NUL");
        unsafe {
            if libc::shm_unlink(c_name.as_ptr()) < 0 {
                let err = std::io::Error::last_os_error();
                return Err(RingError::SegmentOpenFailed {
                    name: self.shm_name.clone(),
                    source: err,
                });
            }
        }
        Ok(())
    }
}

unsafe fn map(fd: RawFd, len: usize, shm_name: &str) -> Result<*mut u8> {
    let ptr = libc::mmap(
        ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_SHARED,
        fd,
        0,
    );
    if ptr == libc::MAP_FAILED {
        let err = std::io::Error::last_os_error();
        libc::close(fd);
        return Err(RingError::SegmentOpenFailed {
            name: shm_name.to_string(),
            source: err,
        });
    }
    Ok(ptr as *mut u8)
}

impl Drop for SharedSegment {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr as *mut libc::c_void, self.len);
            libc::close(self.fd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_name_formats_with_prefix() {
        assert_eq!(segment_name("foo").unwrap(), "/SEG4xRING_foo");
    }

    #[test]
    fn segment_name_rejects_overlong_names() {
        let long = "x".repeat(NAME_MAX);
        assert!(matches!(
            segment_name(&long),
            Err(RingError::NameTooLong { .. })
        ));
    }

    #[test]
    fn create_then_open_round_trips_size() {
        let name = format!("shm-test-{}", std::process::id());
        let seg = SharedSegment::create(&name, 4096).unwrap();
        assert_eq!(seg.len(), 4096);
        let seg2 = SharedSegment::open(&name).unwrap();
        assert_eq!(seg2.len(), 4096);
        drop(seg2);
        seg.destroy().unwrap();
    }

    #[test]
    fn create_twice_fails_with_already_exists() {
        let name = format!("shm-test-dup-{}", std::process::id());
        let seg = SharedSegment::create(&name, 4096).unwrap();
        let err = SharedSegment::create(&name, 4096).unwrap_err();
        assert!(matches!(err, RingError::AlreadyExists { .. }));
        seg.destroy().unwrap();
    }

    #[test]
    fn open_missing_segment_fails_with_not_found() {
        let name = format!("shm-test-missing-{}", std::process::id());
        let err = SharedSegment::open(&name).unwrap_err();
        assert!(matches!(err, RingError::NotFound { .. }));
    }
}
