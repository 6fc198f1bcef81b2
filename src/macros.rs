/// Calls a `libc` function and turns a `-1` return into `io::Error::last_os_error()`.
macro_rules! syscall {
    ($fn:ident ( $($arg:expr),* $(,)? )) => {{
        #[allow(unused_unsafe)]
        let r = unsafe { ::libc::$fn($($arg),*) };
        if r == -1 {
            Err(::std::io::Error::last_os_error())
        } else {
            Ok(r)
        }
    }};
}
