//! Process-wide fatal-error hook.
//!
//! Contract violations (for example a compaction count that disagrees with
//! the mask) are not recoverable. They are reported through [`abort`], which
//! hands the formatted message to the installed handler and then terminates
//! the process.
//!
//! The handler is a single global slot. Reads and writes are atomic, but
//! concurrent writers race and the last one wins; install handlers during
//! single-threaded startup.

use std::fmt;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Handler called with the source file, line and formatted message.
///
/// Expected not to return. If it does, the process is aborted anyway.
pub type AbortFn = fn(file: &str, line: u32, message: &str);

static HANDLER: AtomicPtr<()> = AtomicPtr::new(std::ptr::null_mut());

/// Installs `handler`, returning the previous one.
pub fn set_abort_fn(handler: Option<AbortFn>) -> Option<AbortFn> {
    let new = handler.map_or(std::ptr::null_mut(), |f| f as *mut ());
    decode(HANDLER.swap(new, Ordering::AcqRel))
}

/// The currently installed handler, if any.
pub fn abort_fn() -> Option<AbortFn> {
    decode(HANDLER.load(Ordering::Acquire))
}

fn decode(ptr: *mut ()) -> Option<AbortFn> {
    if ptr.is_null() {
        None
    } else {
        // SAFETY: non-null values in `HANDLER` only ever come from an
        // `AbortFn` in `set_abort_fn`.
        Some(unsafe { std::mem::transmute::<*mut (), AbortFn>(ptr) })
    }
}

/// Reports a fatal error and terminates the process.
///
/// Without a handler the report is `Abort at {file}:{line}: {message}` on
/// stderr.
#[cold]
#[inline(never)]
pub fn abort(file: &str, line: u32, args: fmt::Arguments<'_>) -> ! {
    let message = fmt::format(args);
    log::error!("abort at {}:{}: {}", file, line, message);
    match abort_fn() {
        Some(handler) => handler(file, line, &message),
        None => eprintln!("Abort at {}:{}: {}", file, line, message),
    }
    std::process::abort()
}

/// Formats a message and calls [`abort::abort`](crate::abort::abort) with
/// the caller's file and line.
#[macro_export]
macro_rules! abort {
    ($($arg:tt)+) => {
        $crate::abort::abort(file!(), line!(), format_args!($($arg)+))
    };
}

/// Aborts through the hook when `cond` is false.
#[macro_export]
macro_rules! compress_assert {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::abort!("Assert {}", stringify!($cond));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::abort!($($arg)+);
        }
    };
}
