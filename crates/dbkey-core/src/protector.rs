// Platform key protection
//
// The master key is sealed by an OS service bound to the current user and
// machine. Only the unprotect direction is needed here.

use zeroize::Zeroizing;

use crate::error::Result;
#[cfg(not(windows))]
use crate::error::Error;

/// Reverses OS-level data protection. Implementations must not log or cache
/// the returned bytes.
pub trait PlatformKeyProtector {
    fn unprotect(&self, protected: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

/// Protector for the build target.
pub fn platform_protector() -> Box<dyn PlatformKeyProtector> {
    #[cfg(windows)]
    {
        Box::new(DpapiProtector)
    }
    #[cfg(not(windows))]
    {
        Box::new(UnsupportedProtector)
    }
}

/// Windows DPAPI (`CryptUnprotectData`) with no entropy and no prompt.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct DpapiProtector;

#[cfg(windows)]
impl PlatformKeyProtector for DpapiProtector {
    fn unprotect(&self, protected: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        use crate::error::Error;
        use std::ptr;
        use windows_sys::Win32::Foundation::LocalFree;
        use windows_sys::Win32::Security::Cryptography::{CryptUnprotectData, CRYPT_INTEGER_BLOB};

        let len = u32::try_from(protected.len())
            .map_err(|_| Error::PlatformProtection("protected blob too large".into()))?;
        let input = CRYPT_INTEGER_BLOB {
            cbData: len,
            pbData: protected.as_ptr() as *mut u8,
        };
        let mut output = CRYPT_INTEGER_BLOB {
            cbData: 0,
            pbData: ptr::null_mut(),
        };

        // SAFETY: `input` points at `protected` for the duration of the call
        // and DPAPI does not write through it. Optional arguments are null.
        let ok = unsafe {
            CryptUnprotectData(
                &input,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                0,
                &mut output,
            )
        };
        if ok == 0 {
            let os_error = std::io::Error::last_os_error();
            return Err(Error::PlatformProtection(format!(
                "CryptUnprotectData failed: {os_error}"
            )));
        }

        // SAFETY: on success DPAPI returns a LocalAlloc'd buffer of cbData
        // bytes which we own until LocalFree.
        let plaintext = unsafe {
            let raw = std::slice::from_raw_parts_mut(output.pbData, output.cbData as usize);
            let copy = Zeroizing::new(raw.to_vec());
            zeroize::Zeroize::zeroize(raw);
            LocalFree(output.pbData as _);
            copy
        };
        Ok(plaintext)
    }
}

/// Stand-in for targets without a supported protection service.
#[cfg(not(windows))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProtector;

#[cfg(not(windows))]
impl PlatformKeyProtector for UnsupportedProtector {
    fn unprotect(&self, _protected: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        Err(Error::PlatformProtection(format!(
            "DPAPI is not available on {}",
            std::env::consts::OS
        )))
    }
}
