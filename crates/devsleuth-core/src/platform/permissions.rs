/// Token elevation query.
///
/// Enable, disable, restart and uninstall change device state and are only
/// offered when the process token is elevated.
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

/// Process token, closed on drop.
struct ProcessToken(HANDLE);

impl ProcessToken {
    fn open_current() -> Option<Self> {
        let mut handle = HANDLE::default();
        // SAFETY: GetCurrentProcess returns a pseudo handle that needs no
        // closing; `handle` is a valid out pointer.
        unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut handle) }.ok()?;
        Some(Self(handle))
    }

    fn elevation(&self) -> Option<TOKEN_ELEVATION> {
        let mut elevation = TOKEN_ELEVATION::default();
        let mut return_length = 0u32;
        // SAFETY: the buffer is a TOKEN_ELEVATION of exactly the size passed.
        unsafe {
            GetTokenInformation(
                self.0,
                TokenElevation,
                Some(&mut elevation as *mut _ as *mut _),
                std::mem::size_of::<TOKEN_ELEVATION>() as u32,
                &mut return_length,
            )
        }
        .ok()?;
        Some(elevation)
    }
}

impl Drop for ProcessToken {
    fn drop(&mut self) {
        // SAFETY: the handle came from OpenProcessToken and is closed once.
        let _ = unsafe { CloseHandle(self.0) };
    }
}

/// `true` if the current process token is elevated.
pub fn is_elevated() -> bool {
    ProcessToken::open_current()
        .and_then(|token| token.elevation())
        .is_some_and(|elevation| elevation.TokenIsElevated != 0)
}
